//! Run one operation on a blocking thread, cancelling it on Ctrl-C.

use anyhow::{Context, Result};
use lro_core::cancel::CancelToken;
use lro_core::config::LroConfig;
use lro_core::http::CurlTransport;
use lro_core::lro::{Completed, OperationRequest, Orchestrator};
use std::fs;
use std::path::Path;

pub async fn drive(cfg: &LroConfig, req: OperationRequest) -> Result<Completed> {
    let orchestrator = Orchestrator::new(
        CurlTransport::new(cfg.curl_options()),
        cfg.orchestrator_config(),
    );
    let cancel = CancelToken::new();
    let worker_cancel = cancel.clone();
    let mut task =
        tokio::task::spawn_blocking(move || orchestrator.execute(&req, &worker_cancel));

    let result = tokio::select! {
        joined = &mut task => joined?,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("interrupt received, cancelling operation");
            eprintln!("Cancelling...");
            cancel.cancel();
            task.await?
        }
    };
    Ok(result?)
}

/// Print the final body: pretty JSON when it parses, raw text otherwise.
pub fn print_completed(completed: &Completed) {
    if completed.body.iter().all(u8::is_ascii_whitespace) {
        println!("Completed with HTTP {} (no body).", completed.status);
        return;
    }
    match serde_json::from_slice::<serde_json::Value>(&completed.body) {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(text) => println!("{}", text),
            Err(_) => println!("{}", String::from_utf8_lossy(&completed.body)),
        },
        Err(_) => println!("{}", String::from_utf8_lossy(&completed.body)),
    }
}

pub fn read_json_file(path: &Path) -> Result<serde_json::Value> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading request body from {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("parsing {} as JSON", path.display()))
}
