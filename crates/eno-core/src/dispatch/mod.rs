use std::sync::Arc;

use eno_model::{
    CheckerIdentity, CheckerInfoMessage, CheckerMethod, CheckerResultMessage, CheckerTaskMessage,
};
use eno_observe::{LogSink, TaskLogger, eno_error, eno_info, eno_warning};
use tracing::debug;

use crate::{
    checker::Checker,
    error::{CheckerError, CheckerResult},
};

mod guard;
use guard::CatchPanic;

/// Routes decoded tasks to the matching [`Checker`] operation.
///
/// Every call to [`execute`](Dispatcher::execute) or
/// [`dispatch`](Dispatcher::dispatch) produces exactly one result message;
/// operation failures and panics never escape.
pub struct Dispatcher<C: Checker> {
    checker: Arc<C>,
    storage: C::Storage,
    identity: Arc<CheckerIdentity>,
    logger: TaskLogger,
}

impl<C: Checker> Dispatcher<C> {
    /// Dispatcher logging through the global `tracing` subscriber.
    pub fn new(checker: Arc<C>, storage: C::Storage) -> Self {
        Self::with_logger(checker, storage, TaskLogger::tracing())
    }

    pub fn with_sink(checker: Arc<C>, storage: C::Storage, sink: Arc<dyn LogSink>) -> Self {
        Self::with_logger(checker, storage, TaskLogger::new(sink))
    }

    fn with_logger(checker: Arc<C>, storage: C::Storage, logger: TaskLogger) -> Self {
        let identity = Arc::new(checker.identity().clone());
        debug!(
            service = %identity.service_name,
            port = identity.checker_port,
            "checker dispatcher created"
        );
        Self {
            logger: logger.with_identity(Arc::clone(&identity)),
            checker,
            storage,
            identity,
        }
    }

    pub fn checker(&self) -> &Arc<C> {
        &self.checker
    }

    pub fn identity(&self) -> &CheckerIdentity {
        &self.identity
    }

    /// Logger bound to the checker identity but to no task.
    pub fn logger(&self) -> &TaskLogger {
        &self.logger
    }

    /// Capability descriptor.
    pub fn describe(&self) -> CheckerInfoMessage {
        self.identity.info()
    }

    /// Decode a raw request body and dispatch it.
    ///
    /// A body that is not a valid task yields `INTERNAL_ERROR`; the
    /// accompanying log record has no task context.
    pub async fn execute(&self, body: &[u8]) -> CheckerResultMessage {
        match CheckerTaskMessage::from_slice(body) {
            Ok(task) => self.dispatch(task).await,
            Err(e) => {
                let err = CheckerError::Internal(
                    anyhow::Error::new(e).context("failed to decode checker task"),
                );
                eno_error!(self.logger, "Task finished INTERNAL_ERROR: {}", err.trace());
                err.into_result_message()
            }
        }
    }

    /// Run the operation requested by `task` and map its outcome.
    pub async fn dispatch(&self, task: CheckerTaskMessage) -> CheckerResultMessage {
        let logger = self.logger.bind(&task);
        let task = Arc::new(task);
        eno_info!(
            logger,
            "Received task (id={}, teamid={}, method={}, index={})",
            task.run_id,
            task.team_id,
            task.method,
            display_index(task.flag_index)
        );

        match self.run(Arc::clone(&task), logger.clone()).await {
            Ok(()) => {
                eno_info!(
                    logger,
                    "Task finished OK (id={}, teamid={}, method={}, index={})",
                    task.run_id,
                    task.team_id,
                    task.method,
                    display_index(task.flag_index)
                );
                CheckerResultMessage::ok()
            }
            Err(err) => {
                let outcome = err.task_result().as_str();
                match &err {
                    CheckerError::Offline(_) | CheckerError::Mumble(_) => {
                        eno_warning!(logger, "Task finished {outcome}: {}", err.trace());
                    }
                    CheckerError::Internal(_) => {
                        eno_error!(logger, "Task finished {outcome}: {}", err.trace());
                    }
                }
                err.into_result_message()
            }
        }
    }

    /// The operation runs on its own tokio task; a panic inside it becomes
    /// `INTERNAL_ERROR` with the panic location.
    async fn run(&self, task: Arc<CheckerTaskMessage>, logger: TaskLogger) -> CheckerResult {
        let checker = Arc::clone(&self.checker);
        let storage = self.storage.clone();

        let handle = tokio::spawn(CatchPanic::new(async move {
            invoke(checker.as_ref(), &logger, &task, &storage).await
        }));

        match handle.await {
            Ok(result) => result,
            Err(join) if join.is_panic() => Err(CheckerError::from_panic(join.into_panic(), None)),
            Err(join) => Err(CheckerError::internal(format!(
                "checker operation aborted: {join}"
            ))),
        }
    }
}

async fn invoke<C: Checker>(
    checker: &C,
    logger: &TaskLogger,
    task: &CheckerTaskMessage,
    storage: &C::Storage,
) -> CheckerResult {
    match &task.method {
        CheckerMethod::Putflag => checker.putflag(logger, task, storage).await,
        CheckerMethod::Getflag => checker.getflag(logger, task, storage).await,
        CheckerMethod::Putnoise => checker.putnoise(logger, task, storage).await,
        CheckerMethod::Getnoise => checker.getnoise(logger, task, storage).await,
        CheckerMethod::Havoc => checker.havoc(logger, task, storage).await,
        CheckerMethod::Unknown(method) => Err(CheckerError::internal(format!(
            "Unknown rpc method {method}"
        ))),
    }
}

fn display_index(index: Option<u64>) -> String {
    index.map_or_else(|| "none".to_string(), |i| i.to_string())
}
