use std::net::SocketAddr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("http server failed: {0}")]
    Serve(#[from] std::io::Error),
}
