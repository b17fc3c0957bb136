use crate::error::{IsRetryable, ProvisionError};
use async_trait::async_trait;
use aws_sdk_ssm::error::DisplayErrorContext;
use aws_sdk_ssm::types::ParameterType;
use backon::{ExponentialBuilder, Retryable};
use std::time::Duration;
use tracing::{info, warn};

pub(crate) fn default_retry_policy() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_secs(1))
        .with_max_delay(Duration::from_secs(3))
        .with_max_times(3)
        .with_jitter()
}

/// Write-only view of a secure parameter store.
#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// Store `value` encrypted under `name`, replacing any previous value.
    async fn put_secure(&self, name: &str, value: &str) -> Result<(), ProvisionError>;
}

/// SSM Parameter Store backend.
#[derive(Clone)]
pub struct SsmParameterStore {
    client: aws_sdk_ssm::Client,
}

impl std::fmt::Debug for SsmParameterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SsmParameterStore").finish_non_exhaustive()
    }
}

impl SsmParameterStore {
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_ssm::Client::new(sdk_config),
        }
    }

    pub fn from_client(client: aws_sdk_ssm::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ParameterStore for SsmParameterStore {
    async fn put_secure(&self, name: &str, value: &str) -> Result<(), ProvisionError> {
        (|| async {
            self.client
                .put_parameter()
                .name(name)
                .value(value)
                .r#type(ParameterType::SecureString)
                .overwrite(true)
                .send()
                .await
        })
        .retry(default_retry_policy())
        .when(|e| e.is_retryable())
        .notify(|err, dur: Duration| {
            warn!(
                parameter = name,
                "put_parameter retrying after error {}, sleeping {:?}",
                DisplayErrorContext(err),
                dur
            );
        })
        .await
        .map_err(|e| ProvisionError::SecretWrite {
            name: name.to_string(),
            message: DisplayErrorContext(&e).to_string(),
        })?;

        info!(parameter = name, "secure parameter written");
        Ok(())
    }
}
