use std::time::Duration;

use async_trait::async_trait;
use eno_core::{Checker, CheckerError, CheckerResult, MemoryCollection, ResultExt};
use eno_model::{CheckerIdentity, CheckerTaskMessage};
use eno_observe::{TaskLogger, eno_debug, eno_info};
use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;

const IO_TIMEOUT: Duration = Duration::from_secs(5);

/// Checker for a service that echoes every line it receives.
pub struct EchoChecker {
    identity: CheckerIdentity,
    service_port: u16,
    io_timeout: Duration,
}

impl EchoChecker {
    pub fn new(identity: CheckerIdentity, service_port: u16) -> Self {
        Self {
            identity,
            service_port,
            io_timeout: IO_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, io_timeout: Duration) -> Self {
        self.io_timeout = io_timeout;
        self
    }

    /// Send one line and read the echoed line back.
    async fn exchange(
        &self,
        logger: &TaskLogger,
        address: &str,
        line: &str,
    ) -> CheckerResult<String> {
        let target = format!("{address}:{}", self.service_port);
        eno_debug!(logger, "connecting to {target}");

        let stream = timeout(self.io_timeout, TcpStream::connect(&target))
            .await
            .offline("connect timed out")?
            .offline("connect failed")?;
        let mut stream = BufReader::new(stream);

        let payload = format!("{line}\n");
        timeout(self.io_timeout, stream.get_mut().write_all(payload.as_bytes()))
            .await
            .offline("send timed out")?
            .offline("send failed")?;

        let mut response = String::new();
        let read = timeout(self.io_timeout, stream.read_line(&mut response))
            .await
            .offline("receive timed out")?
            .offline("receive failed")?;
        if read == 0 {
            return Err(CheckerError::mumble("connection closed without echo"));
        }

        Ok(response.trim_end_matches(['\r', '\n']).to_string())
    }

    async fn expect_echo(&self, logger: &TaskLogger, address: &str, line: &str) -> CheckerResult {
        let echoed = self.exchange(logger, address, line).await?;
        if echoed != line {
            return Err(CheckerError::mumble("service returned a wrong echo"));
        }
        Ok(())
    }
}

/// Storage key of a put/get pair: the task chain when given, otherwise
/// the related round, team and index.
fn storage_key(kind: &str, task: &CheckerTaskMessage) -> String {
    match &task.task_chain_id {
        Some(chain) => format!("{kind}_{chain}"),
        None => format!(
            "{kind}_r{}_t{}_i{}",
            task.related_round_id,
            task.team_id,
            task.flag_index.unwrap_or(0)
        ),
    }
}

fn stored_value(storage: &MemoryCollection, key: &str, field: &str) -> CheckerResult<String> {
    storage
        .get(key)
        .and_then(|doc| doc.get(field).and_then(|v| v.as_str()).map(str::to_string))
        .ok_or_else(|| CheckerError::internal(format!("nothing stored under {key}")))
}

#[async_trait]
impl Checker for EchoChecker {
    type Storage = MemoryCollection;

    fn identity(&self) -> &CheckerIdentity {
        &self.identity
    }

    async fn putflag(
        &self,
        logger: &TaskLogger,
        task: &CheckerTaskMessage,
        storage: &MemoryCollection,
    ) -> CheckerResult {
        let flag = task
            .flag
            .as_deref()
            .ok_or_else(|| CheckerError::internal("putflag task without a flag"))?;

        self.expect_echo(logger, &task.address, flag).await?;

        let key = storage_key("flag", task);
        storage.insert(key.clone(), json!({ "flag": flag }));
        eno_info!(logger, "flag stored as {key}");
        Ok(())
    }

    async fn getflag(
        &self,
        logger: &TaskLogger,
        task: &CheckerTaskMessage,
        storage: &MemoryCollection,
    ) -> CheckerResult {
        let key = storage_key("flag", task);
        let flag = stored_value(storage, &key, "flag")?;
        if task.flag.as_deref().is_some_and(|expected| expected != flag) {
            return Err(CheckerError::internal(format!(
                "stored flag under {key} differs from the task flag"
            )));
        }

        self.expect_echo(logger, &task.address, &flag).await
    }

    async fn putnoise(
        &self,
        logger: &TaskLogger,
        task: &CheckerTaskMessage,
        storage: &MemoryCollection,
    ) -> CheckerResult {
        let noise = format!("noise-{}-{}", task.run_id, task.team_id);
        self.expect_echo(logger, &task.address, &noise).await?;

        let key = storage_key("noise", task);
        storage.insert(key.clone(), json!({ "noise": noise }));
        eno_info!(logger, "noise stored as {key}");
        Ok(())
    }

    async fn getnoise(
        &self,
        logger: &TaskLogger,
        task: &CheckerTaskMessage,
        storage: &MemoryCollection,
    ) -> CheckerResult {
        let noise = stored_value(storage, &storage_key("noise", task), "noise")?;
        self.expect_echo(logger, &task.address, &noise).await
    }

    async fn havoc(
        &self,
        logger: &TaskLogger,
        task: &CheckerTaskMessage,
        _storage: &MemoryCollection,
    ) -> CheckerResult {
        self.expect_echo(logger, &task.address, "PING").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use eno_core::Dispatcher;
    use eno_model::{CheckerMethod, CheckerTaskResult, Severity};
    use eno_observe::MemorySink;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    /// Line-echo service; `mangle` makes it answer garbage instead.
    async fn spawn_service(mangle: bool) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            loop {
                let Ok((mut conn, _)) = listener.accept().await else {
                    return;
                };
                tokio::spawn(async move {
                    let mut buf = [0u8; 256];
                    let n = conn.read(&mut buf).await.unwrap_or(0);
                    let reply: &[u8] = if mangle { b"garbage\n" } else { &buf[..n] };
                    let _ = conn.write_all(reply).await;
                });
            }
        });
        port
    }

    async fn closed_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    }

    fn dispatcher(port: u16) -> (Arc<MemorySink>, Dispatcher<EchoChecker>) {
        let checker = EchoChecker::new(CheckerIdentity::new("Echo", 8000), port)
            .with_timeout(Duration::from_secs(2));
        let sink = Arc::new(MemorySink::new());
        let d = Dispatcher::with_sink(Arc::new(checker), MemoryCollection::default(), sink.clone());
        (sink, d)
    }

    fn task(method: CheckerMethod, run_id: u64) -> CheckerTaskMessage {
        CheckerTaskMessage {
            run_id,
            method,
            address: "127.0.0.1".into(),
            service_id: "1".into(),
            service_name: "echo".into(),
            team_id: "7".into(),
            team_name: "team7".into(),
            current_round_id: 4,
            related_round_id: 4,
            flag: Some("ENOFLAG123".into()),
            flag_index: Some(0),
            variant_id: Some(0),
            task_chain_id: None,
        }
    }

    #[tokio::test]
    async fn putflag_then_getflag_is_ok() {
        let (_sink, d) = dispatcher(spawn_service(false).await);

        let put = d.dispatch(task(CheckerMethod::Putflag, 1)).await;
        assert_eq!(put.result, CheckerTaskResult::Ok);

        let get = d.dispatch(task(CheckerMethod::Getflag, 2)).await;
        assert_eq!(get.result, CheckerTaskResult::Ok);
    }

    #[tokio::test]
    async fn noise_round_trip_and_havoc() {
        let (_sink, d) = dispatcher(spawn_service(false).await);

        for method in [CheckerMethod::Putnoise, CheckerMethod::Getnoise, CheckerMethod::Havoc] {
            let res = d.dispatch(task(method.clone(), 3)).await;
            assert_eq!(res.result, CheckerTaskResult::Ok, "method {method}");
        }
    }

    #[tokio::test]
    async fn getflag_without_putflag_is_internal_error() {
        let (sink, d) = dispatcher(spawn_service(false).await);

        let res = d.dispatch(task(CheckerMethod::Getflag, 1)).await;
        assert_eq!(res.result, CheckerTaskResult::InternalError);
        assert!(res.message.unwrap().contains("nothing stored"));
        assert_eq!(sink.records_at(Severity::Error).len(), 1);
    }

    #[tokio::test]
    async fn unreachable_service_is_down() {
        let (sink, d) = dispatcher(closed_port().await);

        let res = d.dispatch(task(CheckerMethod::Putflag, 1)).await;
        assert_eq!(res.result, CheckerTaskResult::Down);
        assert!(res.message.unwrap().starts_with("connect failed"));

        let warnings = sink.records_at(Severity::Warning);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].context.team_id.as_deref(), Some("7"));
    }

    #[tokio::test]
    async fn wrong_echo_is_mumble() {
        let (_sink, d) = dispatcher(spawn_service(true).await);

        let res = d.dispatch(task(CheckerMethod::Putflag, 1)).await;
        assert_eq!(res.result, CheckerTaskResult::Mumble);
        assert_eq!(res.message.as_deref(), Some("service returned a wrong echo"));
    }

    #[test]
    fn storage_key_prefers_task_chain() {
        let mut t = task(CheckerMethod::Putflag, 1);
        assert_eq!(storage_key("flag", &t), "flag_r4_t7_i0");

        t.task_chain_id = Some("chain-9".into());
        assert_eq!(storage_key("flag", &t), "flag_chain-9");
    }
}
