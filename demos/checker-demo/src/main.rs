use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use eno_api::HttpApi;
use eno_core::{Dispatcher, MemoryCollection, storage::DEFAULT_COLLECTION};
use eno_model::CheckerIdentity;
use eno_observe::{LoggerConfig, eno_info, logger_init};
use tracing::info;

mod checker;
use checker::EchoChecker;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1) Checker identity and service target
    let identity = CheckerIdentity::new(
        env_or("ENO_SERVICE_NAME", "Echo"),
        env_parse("ENO_CHECKER_PORT", 8000)?,
    )
    .with_variants(1, 1, 1);
    let service_port = env_parse("ENO_SERVICE_PORT", 7777)?;
    let io_timeout = Duration::from_millis(env_parse("ENO_IO_TIMEOUT_MS", 5000)?);

    // 2) Logger
    let cfg = LoggerConfig {
        format: env_or("ENO_LOG_FORMAT", "eno").parse()?,
        level: env_or("ENO_LOG_LEVEL", "info"),
        tool: Some(identity.checker_name()),
        ..Default::default()
    };
    logger_init(&cfg)?;
    info!("logger initialized");

    let checker = Arc::new(EchoChecker::new(identity, service_port).with_timeout(io_timeout));

    // 3) Dispatcher over a process-wide collection
    let dispatcher = Arc::new(Dispatcher::new(
        checker,
        MemoryCollection::new(DEFAULT_COLLECTION),
    ));
    eno_info!(
        dispatcher.logger(),
        "checker starting (service port {service_port})"
    );

    // 4) Serve until Ctrl+C
    HttpApi::new(dispatcher).serve().await?;
    Ok(())
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T>(key: &str, default: T) -> Result<T, Box<dyn std::error::Error>>
where
    T: FromStr,
    T::Err: std::error::Error + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| format!("invalid {key}={raw:?}: {e}").into()),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_variables_fall_back_to_defaults() {
        let timeout: u64 = env_parse("ENO_DEMO_UNSET_TIMEOUT_MS", 5000).unwrap();
        assert_eq!(timeout, 5000);
        assert_eq!(env_or("ENO_DEMO_UNSET_SERVICE", "Echo"), "Echo");
    }
}
