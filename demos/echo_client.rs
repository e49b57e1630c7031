//! Opens a few streams against the echo server and prints the replies.
//!
//! Run with: cargo run --example echo_client

use muxado::Session;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let tcp = TcpStream::connect("127.0.0.1:4444").await?;
    let session = Session::client(tcp);

    for msg in ["hello", "muxado", "bye"] {
        let mut stream = session.open().await?;
        stream.write_all(msg.as_bytes()).await?;
        stream.shutdown().await?;

        let mut reply = String::new();
        stream.read_to_string(&mut reply).await?;
        println!("{} -> {} (stream {})", msg, reply, stream.id());
    }

    session.close().await?;
    Ok(())
}
