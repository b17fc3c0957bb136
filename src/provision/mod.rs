//! Idempotent bootstrap of the registry database.
//!
//! - `schema.rs`: tables, dedup function and trigger
//! - `principals.rs`: maintenance and analytics roles with their grants
//! - `orchestrator.rs`: lifecycle dispatch and the single-transaction `Create` run

pub mod orchestrator;
pub mod principals;
pub mod schema;

pub use orchestrator::{ProvisionReport, ProvisionService, ProvisionState, Provisioner};
pub use principals::{PrincipalOutcome, PrincipalProvisioner};
pub use schema::SchemaProvisioner;
