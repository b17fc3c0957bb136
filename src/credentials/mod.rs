//! Credential generation and persistence.
//!
//! Layout:
//! - `generator.rs`: OS-RNG backed password generation
//! - `store.rs`: the secure parameter store seam and its SSM backend

pub mod generator;
pub mod store;

pub use generator::{DEFAULT_PASSWORD_LENGTH, PASSWORD_ALPHABET, generate_distinct, generate_password};
pub use store::{ParameterStore, SsmParameterStore};

use crate::error::ProvisionError;
use crate::types::Principal;

/// A freshly generated secret bound to one principal and its parameter name.
///
/// `Debug` never prints the secret.
#[derive(Clone)]
pub struct Credential {
    principal: Principal,
    parameter_name: String,
    secret: String,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("principal", &self.principal)
            .field("parameter_name", &self.parameter_name)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl Credential {
    pub fn new(principal: Principal, prefix: &str, secret: String) -> Self {
        Self {
            principal,
            parameter_name: principal.parameter_name(prefix),
            secret,
        }
    }

    /// One credential per principal, with pairwise distinct secrets.
    pub fn generate_all(prefix: &str, length: usize) -> Vec<Credential> {
        Principal::ALL
            .into_iter()
            .zip(generate_distinct(Principal::ALL.len(), length))
            .map(|(principal, secret)| Credential::new(principal, prefix, secret))
            .collect()
    }

    pub fn principal(&self) -> Principal {
        self.principal
    }

    pub fn parameter_name(&self) -> &str {
        &self.parameter_name
    }

    /// Raw secret value. Only for the parameter store and bound SQL parameters.
    pub fn expose_secret(&self) -> &str {
        &self.secret
    }

    /// Persist this credential as a secure parameter, overwriting any prior value.
    pub async fn persist(&self, store: &dyn ParameterStore) -> Result<(), ProvisionError> {
        store.put_secure(&self.parameter_name, &self.secret).await
    }
}
