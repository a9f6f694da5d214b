use async_trait::async_trait;
use eno_model::{CheckerIdentity, CheckerTaskMessage};
use eno_observe::TaskLogger;

use crate::error::CheckerResult;

/// Service-specific checker implementation.
///
/// The dispatcher calls exactly one operation per task, passing a logger
/// bound to that task and the shared storage handle. Operations report
/// failures through [`CheckerError`](crate::CheckerError): `Offline` for an
/// unreachable service, `Mumble` for a misbehaving one, anything else is
/// treated as a checker fault.
///
/// Operations of unrelated tasks run concurrently; the storage handle is
/// shared between them and no locking is imposed on it here.
#[async_trait]
pub trait Checker: Send + Sync + 'static {
    /// Storage handle passed unchanged to every operation.
    type Storage: Clone + Send + Sync + 'static;

    /// Static identity: service name, port and per-round variant counts.
    fn identity(&self) -> &CheckerIdentity;

    /// Store `task.flag` in the service.
    async fn putflag(
        &self,
        logger: &TaskLogger,
        task: &CheckerTaskMessage,
        storage: &Self::Storage,
    ) -> CheckerResult;

    /// Verify that the flag stored in `task.related_round_id` is still retrievable.
    async fn getflag(
        &self,
        logger: &TaskLogger,
        task: &CheckerTaskMessage,
        storage: &Self::Storage,
    ) -> CheckerResult;

    async fn putnoise(
        &self,
        logger: &TaskLogger,
        task: &CheckerTaskMessage,
        storage: &Self::Storage,
    ) -> CheckerResult;

    async fn getnoise(
        &self,
        logger: &TaskLogger,
        task: &CheckerTaskMessage,
        storage: &Self::Storage,
    ) -> CheckerResult;

    async fn havoc(
        &self,
        logger: &TaskLogger,
        task: &CheckerTaskMessage,
        storage: &Self::Storage,
    ) -> CheckerResult;
}
