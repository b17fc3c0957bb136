use jet_trails::{Config, LifecycleEvent, ProvisionService, Provisioner, RequestType};
use lambda_runtime::{Error, LambdaEvent, service_fn};
use mimalloc::MiMalloc;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenvy::dotenv().ok();

    let loaded = Config::load();
    let in_lambda = std::env::var_os("AWS_LAMBDA_RUNTIME_API").is_some();

    let loglevel = match &loaded {
        Ok(cfg) => cfg.loglevel.clone(),
        Err(_) => Config::default().loglevel,
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(loglevel));
    // The log service stamps each line under Lambda.
    tracing_subscriber::registry()
        .with(env_filter)
        .with(in_lambda.then(|| {
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false)
                .without_time()
        }))
        .with((!in_lambda).then(|| {
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false)
        }))
        .init();

    if let Ok(cfg) = &loaded {
        info!(
            secret_id = %cfg.secret_arn,
            region = %cfg.region.as_deref().unwrap_or("<sdk default>"),
            parameter_prefix = %cfg.parameter_prefix,
            role_conflict = ?cfg.role_conflict,
            deadline_secs = cfg.deadline_secs,
            local_database = cfg.database_url.is_some(),
            loglevel = %cfg.loglevel
        );
    }

    if !in_lambda {
        let provisioner = Provisioner::from_config(loaded?).await?;
        let status = provisioner
            .handle(&LifecycleEvent::new(RequestType::Create))
            .await;
        println!("{}", serde_json::to_string(&status)?);
        return Ok(());
    }

    // Startup failures are reported per event rather than failing init.
    let service = Arc::new(ProvisionService::build(loaded).await);
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let service = service.clone();
        async move { Ok::<_, Error>(service.handle_payload(event.payload).await) }
    }))
    .await
}
