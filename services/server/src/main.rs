//! Exchange TCP server
//!
//! Listens on port 12345 and hands each accepted connection to a fixed
//! pool of worker threads over a bounded queue. One worker serves a
//! connection from start to finish, looping over length-prefixed XML
//! frames; the engine itself is shared and internally synchronized, so
//! workers only contend when they trade the same symbol.

use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

use anyhow::Context;
use crossbeam_channel::bounded;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use exchange_core::Exchange;
use wire::framing;
use wire::handler::RequestHandler;
use wire::response::render_request_error;
use wire::WireError;

const LISTEN_ADDR: &str = "0.0.0.0:12345";
const ACCEPT_QUEUE_DEPTH: usize = 1024;

fn worker_count() -> usize {
    std::env::var("CPU_CORES")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or_else(|| {
            thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        })
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let exchange = Arc::new(Exchange::new());
    let handler = RequestHandler::new(exchange);

    let workers = worker_count();
    let listener =
        TcpListener::bind(LISTEN_ADDR).with_context(|| format!("binding {LISTEN_ADDR}"))?;
    info!(addr = LISTEN_ADDR, workers, "exchange server listening");

    let (queue_tx, queue_rx) = bounded::<TcpStream>(ACCEPT_QUEUE_DEPTH);
    for n in 0..workers {
        let queue_rx = queue_rx.clone();
        let handler = handler.clone();
        thread::Builder::new()
            .name(format!("worker-{n}"))
            .spawn(move || {
                while let Ok(stream) = queue_rx.recv() {
                    let peer = stream
                        .peer_addr()
                        .map(|addr| addr.to_string())
                        .unwrap_or_else(|_| "unknown".to_string());
                    info!(%peer, "serving connection");
                    match serve_connection(stream, &handler) {
                        Ok(()) => info!(%peer, "connection closed"),
                        Err(err) => warn!(%peer, error = %err, "connection ended with error"),
                    }
                }
            })
            .context("spawning worker thread")?;
    }

    loop {
        match listener.accept() {
            Ok((stream, peer)) => {
                info!(%peer, "accepted connection");
                if queue_tx.send(stream).is_err() {
                    anyhow::bail!("worker pool is gone");
                }
            }
            Err(err) => error!(error = %err, "accept failed"),
        }
    }
}

/// Serve one connection until end-of-stream
///
/// Per-request failures inside a well-formed frame are already rendered
/// as `<error>` documents by the handler; only broken framing or I/O
/// ends the connection, with a final error document when the socket
/// still accepts one.
fn serve_connection(stream: TcpStream, handler: &RequestHandler) -> anyhow::Result<()> {
    let mut reader = std::io::BufReader::new(stream.try_clone().context("cloning stream")?);
    let mut writer = stream;
    loop {
        match framing::read_frame(&mut reader) {
            Ok(Some(request)) => {
                let response = handler.process(&request);
                framing::write_frame(&mut writer, &response)?;
            }
            Ok(None) => return Ok(()),
            Err(err @ WireError::Malformed(_)) => {
                let _ = framing::write_frame(&mut writer, &render_request_error(&err.to_string()));
                return Err(err.into());
            }
            Err(WireError::Io(err)) => return Err(err.into()),
        }
    }
}
