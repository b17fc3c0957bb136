pub mod lifecycle;
pub mod principal;

pub use lifecycle::{LifecycleEvent, RequestType, Status, StatusRecord};
pub use principal::{Principal, Privileges};
