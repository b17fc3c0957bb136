pub mod config;
pub mod credentials;
pub mod db;
pub mod error;
pub mod provision;
pub mod secrets;
pub mod types;

pub use config::{Config, RoleConflictPolicy};
pub use error::ProvisionError;
pub use provision::{ProvisionService, Provisioner};
pub use types::{LifecycleEvent, RequestType, StatusRecord};
