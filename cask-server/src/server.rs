//! HTTP server: connection accept loop and per-connection service wiring

use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info};

use cask_engine::Store;

use crate::handlers::{handle_request, Context};

pub struct Server {
    ctx: Context,
}

impl Server {
    pub fn new(store: Store, api_token: Option<String>) -> Self {
        Server {
            ctx: Context { store, api_token },
        }
    }

    pub async fn serve(self, addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
        let listener = TcpListener::bind(addr).await?;
        info!("cask server listening on {}", addr);

        loop {
            let (stream, remote_addr) = listener.accept().await?;
            debug!("New connection from {}", remote_addr);

            let ctx = self.ctx.clone();
            tokio::spawn(async move {
                if let Err(err) = handle_connection(stream, ctx).await {
                    error!("Connection error from {}: {}", remote_addr, err);
                }
            });
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    ctx: Context,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let io = TokioIo::new(stream);

    let service = service_fn(move |req| {
        let ctx = ctx.clone();
        async move { handle_request(req, ctx).await }
    });

    auto::Builder::new(TokioExecutor::new())
        .serve_connection(io, service)
        .await
}
