use crate::config::Config;
use crate::credentials::{Credential, ParameterStore, SsmParameterStore};
use crate::error::{IsRetryable, ProvisionError};
use crate::provision::principals::{PrincipalOutcome, PrincipalProvisioner};
use crate::provision::schema::SchemaProvisioner;
use crate::secrets::{AwsSecretResolver, DbCredentials, SecretResolver, UrlSecretResolver};
use crate::types::{LifecycleEvent, RequestType, StatusRecord};
use backon::{ExponentialBuilder, Retryable};
use futures::future::BoxFuture;
use serde_json::Value;
use sqlx::{Connection, PgConnection};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Progress of one `Create` run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionState {
    Start,
    ResolvingSecret,
    Generating,
    Provisioning,
    Committed,
    Failed,
}

impl fmt::Display for ProvisionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProvisionState::Start => "start",
            ProvisionState::ResolvingSecret => "resolving_secret",
            ProvisionState::Generating => "generating",
            ProvisionState::Provisioning => "provisioning",
            ProvisionState::Committed => "committed",
            ProvisionState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Bookkeeping for a single run: where it got to and which parameters were
/// already overwritten (those are not rolled back on failure).
#[derive(Debug)]
struct ProvisionRun {
    state: ProvisionState,
    reached: ProvisionState,
    parameters_written: Vec<String>,
}

impl ProvisionRun {
    fn new() -> Self {
        Self {
            state: ProvisionState::Start,
            reached: ProvisionState::Start,
            parameters_written: Vec::new(),
        }
    }

    fn advance(&mut self, next: ProvisionState) {
        info!(from = %self.state, state = %next, "provisioning state change");
        self.state = next;
        if next != ProvisionState::Failed {
            self.reached = next;
        }
    }

    fn failure_detail(&self) -> String {
        if self.parameters_written.is_empty() {
            format!("failed while {}; no parameters were written", self.reached)
        } else {
            format!(
                "failed while {}; parameters already overwritten: {}",
                self.reached,
                self.parameters_written.join(", ")
            )
        }
    }
}

/// What a successful `Create` ensured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionReport {
    pub schema_objects: Vec<&'static str>,
    pub principals: Vec<PrincipalOutcome>,
    pub parameters: Vec<String>,
}

impl ProvisionReport {
    pub fn describe(&self) -> String {
        let roles: Vec<String> = self
            .principals
            .iter()
            .map(|o| match o {
                PrincipalOutcome::Created(p) => format!("{} (created)", p.role_name()),
                PrincipalOutcome::Rotated(p) => format!("{} (rotated)", p.role_name()),
            })
            .collect();
        format!(
            "Database, tables, trigger, and user accounts created successfully: \
             schema [{}]; roles [{}]; parameters [{}]",
            self.schema_objects.join(", "),
            roles.join(", "),
            self.parameters.join(", ")
        )
    }
}

type Handler = for<'a> fn(&'a Provisioner, RequestType) -> BoxFuture<'a, StatusRecord>;

fn create_handler(p: &Provisioner, _: RequestType) -> BoxFuture<'_, StatusRecord> {
    Box::pin(p.on_create())
}

fn no_action_handler(p: &Provisioner, request_type: RequestType) -> BoxFuture<'_, StatusRecord> {
    Box::pin(p.on_no_action(request_type))
}

/// Lifecycle handler: resolves admin credentials, mints and stores role
/// passwords, then creates schema and roles in one transaction.
#[derive(Clone)]
pub struct Provisioner {
    config: Config,
    resolver: Arc<dyn SecretResolver>,
    store: Arc<dyn ParameterStore>,
}

impl Provisioner {
    pub fn new(
        config: Config,
        resolver: Arc<dyn SecretResolver>,
        store: Arc<dyn ParameterStore>,
    ) -> Self {
        Self {
            config,
            resolver,
            store,
        }
    }

    /// Build AWS-backed collaborators from `config`. A configured
    /// `database_url` replaces the secret store lookup.
    pub async fn from_config(config: Config) -> Result<Self, ProvisionError> {
        config.validate()?;
        let local = config
            .database_url
            .as_deref()
            .map(UrlSecretResolver::new)
            .transpose()?;

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = config.region.clone() {
            loader = loader.region(aws_sdk_ssm::config::Region::new(region));
        }
        let sdk_config = loader.load().await;

        let resolver: Arc<dyn SecretResolver> = match local {
            Some(resolver) => Arc::new(resolver),
            None => Arc::new(AwsSecretResolver::new(&sdk_config)),
        };
        let store = Arc::new(SsmParameterStore::new(&sdk_config));
        Ok(Self::new(config, resolver, store))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn handler_for(request_type: RequestType) -> Handler {
        match request_type {
            RequestType::Create => create_handler,
            RequestType::Update | RequestType::Delete => no_action_handler,
        }
    }

    /// Dispatch one lifecycle event. Always returns a well-formed record.
    pub async fn handle(&self, event: &LifecycleEvent) -> StatusRecord {
        let record = Self::handler_for(event.request_type)(self, event.request_type).await;
        match serde_json::to_string(&record) {
            Ok(json) => info!(request_type = ?event.request_type, status = %json, "lifecycle event handled"),
            Err(e) => warn!(error = %e, "failed to serialize status record"),
        }
        record
    }

    /// Decode a raw invocation payload, then [`handle`](Self::handle) it.
    pub async fn handle_payload(&self, payload: Value) -> StatusRecord {
        match LifecycleEvent::from_payload(payload) {
            Ok(event) => self.handle(&event).await,
            Err(e) => {
                error!(stage = e.stage(), error = %e, "rejecting lifecycle payload");
                StatusRecord::failure(&e, "Failed to process event")
            }
        }
    }

    async fn on_no_action(&self, request_type: RequestType) -> StatusRecord {
        info!(request_type = ?request_type, "no action for lifecycle event");
        StatusRecord::no_action(request_type)
    }

    async fn on_create(&self) -> StatusRecord {
        let mut run = ProvisionRun::new();
        let deadline = self.config.deadline();

        let result = match tokio::time::timeout(deadline, self.create(&mut run)).await {
            Ok(result) => result,
            Err(_) => Err(ProvisionError::DeadlineExceeded(deadline)),
        };

        match result {
            Ok(report) => StatusRecord::success(report.describe()),
            Err(e) => {
                run.advance(ProvisionState::Failed);
                error!(stage = e.stage(), reached = %run.reached, error = %e, "provisioning failed");
                StatusRecord::failure(&e, run.failure_detail())
            }
        }
    }

    async fn create(&self, run: &mut ProvisionRun) -> Result<ProvisionReport, ProvisionError> {
        run.advance(ProvisionState::ResolvingSecret);
        let admin = self.resolver.resolve(&self.config.secret_arn).await?;

        run.advance(ProvisionState::Generating);
        let credentials =
            Credential::generate_all(&self.config.parameter_prefix, self.config.password_length);
        for credential in &credentials {
            credential.persist(self.store.as_ref()).await?;
            run.parameters_written
                .push(credential.parameter_name().to_string());
        }

        run.advance(ProvisionState::Provisioning);
        let mut conn = self.connect(&admin).await?;
        let mut tx = conn.begin().await?;

        let schema_objects = SchemaProvisioner::ensure(&mut tx).await?;

        let principals = PrincipalProvisioner::new(&admin.dbname, self.config.role_conflict);
        let mut outcomes = Vec::with_capacity(credentials.len());
        for credential in &credentials {
            outcomes.push(principals.ensure(&mut tx, credential).await?);
        }

        tx.commit().await?;
        if let Err(e) = conn.close().await {
            warn!(error = %e, "closing admin connection failed after commit");
        }
        run.advance(ProvisionState::Committed);

        Ok(ProvisionReport {
            schema_objects,
            principals: outcomes,
            parameters: run.parameters_written.clone(),
        })
    }

    async fn connect(&self, admin: &DbCredentials) -> Result<PgConnection, ProvisionError> {
        let options = admin.connect_options();
        let timeout = self.config.connect_timeout();
        let policy = ExponentialBuilder::default()
            .with_min_delay(Duration::from_secs(1))
            .with_max_delay(Duration::from_secs(3))
            .with_max_times(self.config.connect_retries)
            .with_jitter();

        let attempt = || async {
            match tokio::time::timeout(timeout, PgConnection::connect_with(&options)).await {
                Ok(result) => result,
                Err(_) => Err(sqlx::Error::Io(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("connect timed out after {timeout:?}"),
                ))),
            }
        };

        let conn = attempt
            .retry(policy)
            .when(|e: &sqlx::Error| e.is_retryable())
            .notify(|err, dur: Duration| {
                warn!(host = %admin.host, "connect retrying after error {}, sleeping {:?}", err, dur);
            })
            .await
            .map_err(|e| ProvisionError::Connect(e.to_string()))?;

        info!(host = %admin.host, dbname = %admin.dbname, "connected to target database");
        Ok(conn)
    }
}

/// What the Lambda runtime serves. A startup failure (bad configuration,
/// unusable `DATABASE_URL`) is kept and answered on every event instead of
/// aborting the runtime during init.
pub enum ProvisionService {
    Ready(Provisioner),
    Rejected(ProvisionError),
}

impl ProvisionService {
    /// Build from a config load result.
    pub async fn build(config: Result<Config, ProvisionError>) -> Self {
        let built = match config {
            Ok(config) => Provisioner::from_config(config).await,
            Err(e) => Err(e),
        };
        match built {
            Ok(provisioner) => ProvisionService::Ready(provisioner),
            Err(e) => {
                error!(stage = e.stage(), error = %e, "provisioner unavailable");
                ProvisionService::Rejected(e)
            }
        }
    }

    pub async fn handle_payload(&self, payload: Value) -> StatusRecord {
        match self {
            ProvisionService::Ready(provisioner) => provisioner.handle_payload(payload).await,
            ProvisionService::Rejected(e) => {
                warn!(stage = e.stage(), "answering event with startup failure");
                StatusRecord::failure(e, "configuration invalid")
            }
        }
    }
}
