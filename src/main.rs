use anyhow::Context;
use arise_content::config::ServiceConfig;
use arise_content::ipc;
use arise_content::store::ContentStore;
use std::io::{self, BufRead, Write};

fn init_tracing(config: &ServiceConfig) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_env("ARISE_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));

    // stdout carries the protocol.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::load().context("invalid ARISE_* configuration")?;
    init_tracing(&config)?;

    let mut state = ipc::AppState::new(config.clone());
    if let Some(workspace) = config.workspace.as_deref() {
        match ContentStore::open(workspace) {
            Ok(store) => state.store = Some(store),
            Err(e) => tracing::warn!(error = %e, "startup workspace could not be opened"),
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // No id to echo back.
                let _ = writeln!(stdout, "{}", ipc::err("", "bad_json", e.to_string(), None));
                let _ = stdout.flush();
                continue;
            }
        };

        tracing::debug!(method = %req.method, id = %req.id, "request");
        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }

    if let Some(store) = state.store.take() {
        store.close().context("failed to close offline content store")?;
    }
    Ok(())
}
