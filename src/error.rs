use aws_sdk_ssm::error::SdkError;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum ProvisionError {
    #[error("secret access failed: {0}")]
    SecretAccess(String),

    #[error("secret payload is not usable: {0}")]
    SecretFormat(String),

    #[error("secure parameter write failed for {name}: {message}")]
    SecretWrite { name: String, message: String },

    #[error("database connection failed: {0}")]
    Connect(String),

    #[error("schema provisioning failed on {object}: {message}")]
    Schema {
        object: &'static str,
        message: String,
    },

    #[error("principal provisioning failed for role {role}: {message}")]
    PrincipalCreation { role: &'static str, message: String },

    #[error("provisioning did not finish within {0:?}")]
    DeadlineExceeded(std::time::Duration),

    #[error("unsupported lifecycle payload: {0}")]
    UnsupportedEvent(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] SqlxError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProvisionError {
    /// Short stage label used in structured log fields.
    pub fn stage(&self) -> &'static str {
        match self {
            ProvisionError::SecretAccess(_) | ProvisionError::SecretFormat(_) => "secret_access",
            ProvisionError::SecretWrite { .. } => "secret_write",
            ProvisionError::Connect(_) => "connect",
            ProvisionError::Schema { .. } => "schema",
            ProvisionError::PrincipalCreation { .. } => "principal",
            ProvisionError::DeadlineExceeded(_) => "deadline",
            ProvisionError::UnsupportedEvent(_) => "event",
            ProvisionError::Config(_) => "config",
            ProvisionError::Database(_) => "database",
            ProvisionError::Json(_) => "json",
        }
    }
}

impl From<figment::Error> for ProvisionError {
    fn from(e: figment::Error) -> Self {
        ProvisionError::Config(e.to_string())
    }
}

/// Marks failures worth another attempt under a backoff policy.
pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}

impl<E, R> IsRetryable for SdkError<E, R> {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) | SdkError::ResponseError(_)
        )
    }
}

impl IsRetryable for SqlxError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            SqlxError::Io(_) | SqlxError::PoolTimedOut | SqlxError::WorkerCrashed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_labels_follow_taxonomy() {
        assert_eq!(
            ProvisionError::SecretAccess("denied".into()).stage(),
            "secret_access"
        );
        assert_eq!(
            ProvisionError::SecretWrite {
                name: "/db/maintenance_password".into(),
                message: "throttled".into()
            }
            .stage(),
            "secret_write"
        );
        assert_eq!(
            ProvisionError::PrincipalCreation {
                role: "maintenance",
                message: "role already exists".into()
            }
            .stage(),
            "principal"
        );
    }

    #[test]
    fn io_failures_are_retryable_but_database_errors_are_not() {
        let io = SqlxError::Io(std::io::Error::from(std::io::ErrorKind::ConnectionRefused));
        assert!(io.is_retryable());
        assert!(!SqlxError::RowNotFound.is_retryable());
    }
}
