use std::future::Future;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::{Json, Router, body::Bytes, extract::State, routing::get};
use eno_core::{Checker, Dispatcher};
use eno_model::{CheckerInfoMessage, CheckerResultMessage};
use eno_observe::eno_info;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::error::ApiError;

/// HTTP surface of a checker.
pub struct HttpApi<C: Checker> {
    dispatcher: Arc<Dispatcher<C>>,
}

impl<C> HttpApi<C>
where
    C: Checker,
{
    pub fn new(dispatcher: Arc<Dispatcher<C>>) -> Self {
        Self { dispatcher }
    }

    /// Build axum router with mounted endpoints.
    ///
    /// Routes (the same handlers on both paths):
    /// - GET / and GET /service - capability descriptor
    /// - POST / and POST /service - run a task
    ///
    /// Task requests always answer 200; the outcome is in the body.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(describe::<C>).post(execute::<C>))
            .route("/service", get(describe::<C>).post(execute::<C>))
            .with_state(Arc::clone(&self.dispatcher))
    }

    /// `0.0.0.0:<checker_port>`.
    pub fn default_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.dispatcher.identity().checker_port))
    }

    /// Listen on [`default_addr`](Self::default_addr) until Ctrl+C.
    pub async fn serve(self) -> Result<(), ApiError> {
        let addr = self.default_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ApiError::Bind { addr, source })?;
        self.serve_on(listener).await
    }

    /// Serve on an already bound listener until Ctrl+C.
    pub async fn serve_on(self, listener: TcpListener) -> Result<(), ApiError> {
        self.serve_with_shutdown(listener, ctrl_c()).await
    }

    pub async fn serve_with_shutdown<F>(
        self,
        listener: TcpListener,
        signal: F,
    ) -> Result<(), ApiError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        info!(
            %addr,
            service = %self.dispatcher.identity().service_name,
            "checker listening"
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(signal)
            .await?;

        info!("checker stopped");
        Ok(())
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET / and GET /service
async fn describe<C>(State(dispatcher): State<Arc<Dispatcher<C>>>) -> Json<CheckerInfoMessage>
where
    C: Checker,
{
    eno_info!(dispatcher.logger(), "GET /");
    Json(dispatcher.describe())
}

/// POST / and POST /service
///
/// The body is taken raw so a malformed task still gets a result message.
async fn execute<C>(
    State(dispatcher): State<Arc<Dispatcher<C>>>,
    body: Bytes,
) -> Json<CheckerResultMessage>
where
    C: Checker,
{
    Json(dispatcher.execute(&body).await)
}

async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown requested"),
        Err(e) => {
            warn!(error = %e, "cannot listen for Ctrl+C; serving until killed");
            std::future::pending::<()>().await;
        }
    }
}
