// src/utils/common.rs

use std::io::{BufRead, BufReader, Read};

use lapin::{Connection, ConnectionProperties, Result as LapinResult};
use tokio::sync::oneshot;
use tracing::{error, info};

/// Opens a connection to RabbitMQ on the tokio executor and reactor.
///
/// A single attempt is made; callers treat a failure as fatal.
pub async fn connect_rabbitmq(addr: &str) -> LapinResult<Connection> {
    let options = ConnectionProperties::default()
        .with_executor(tokio_executor_trait::Tokio::current())
        .with_reactor(tokio_reactor_trait::Tokio);

    match Connection::connect(addr, options).await {
        Ok(conn) => {
            info!("Successfully connected to RabbitMQ at {}", addr);
            Ok(conn)
        }
        Err(e) => {
            error!(error = %e, addr = %addr, "Failed to connect to RabbitMQ");
            Err(e)
        }
    }
}

pub fn consumer_tag(binary: &str) -> String {
    format!(
        "{}-{}-{}",
        binary,
        std::process::id(),
        chrono::Utc::now().timestamp()
    )
}

/// Resolves on Ctrl-C. If the handler can't be installed the future never
/// resolves and the process has to be killed.
pub async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Ctrl-C received");
}

/// Resolves when a line is read from `reader`. EOF or a read error never
/// resolves.
///
/// The read runs on a detached OS thread; a pending read never holds up
/// runtime shutdown.
async fn line_entered<R>(reader: R)
where
    R: Read + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    let spawned = std::thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            let mut line = String::new();
            let _ = tx.send(BufReader::new(reader).read_line(&mut line));
        });
    if let Err(e) = spawned {
        error!(error = %e, "Failed to spawn stdin reader thread");
        return std::future::pending::<()>().await;
    }

    match rx.await {
        Ok(Ok(0)) | Err(_) => std::future::pending::<()>().await,
        Ok(Ok(_)) => info!("Key press received"),
        Ok(Err(e)) => {
            error!(error = %e, "Failed to read stdin");
            std::future::pending::<()>().await
        }
    }
}

/// Resolves when Enter is pressed. A closed stdin never resolves, so a
/// detached consumer keeps running.
pub async fn enter_pressed() {
    line_entered(std::io::stdin()).await
}

/// Consumer stop signal: Enter on stdin or Ctrl-C, whichever comes first.
pub async fn keypress_or_ctrl_c() {
    tokio::select! {
        _ = enter_pressed() => {}
        _ = ctrl_c() => {}
    }
}
