//! Accepts sessions on TCP and echoes every stream back to its opener.
//!
//! Run with: cargo run --example echo_server

use muxado::Session;
use tokio::io::{self, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let listener = TcpListener::bind("127.0.0.1:4444").await?;
    info!("listening on {}", listener.local_addr()?);

    loop {
        let (tcp, peer) = listener.accept().await?;
        info!(%peer, "new session");

        tokio::spawn(async move {
            let session = Session::server(tcp);
            loop {
                let stream = match session.accept().await {
                    Ok(stream) => stream,
                    Err(e) => {
                        info!(%e, "session over");
                        break;
                    }
                };
                tokio::spawn(async move {
                    let id = stream.id();
                    let (mut rd, mut wr) = io::split(stream);
                    match io::copy(&mut rd, &mut wr).await {
                        Ok(n) => {
                            let _ = wr.shutdown().await;
                            info!(%id, bytes = n, "echoed stream");
                        }
                        Err(e) => error!(%id, %e, "echo failed"),
                    }
                });
            }
        });
    }
}
