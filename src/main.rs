use rollbookd::config::DaemonConfig;
use rollbookd::{ipc, logging};
use std::io::{self, BufRead, Write};
use tracing::{info, warn};

fn main() {
    let (config, config_err) = match DaemonConfig::load() {
        Ok(cfg) => (cfg, None),
        Err(e) => (DaemonConfig::default(), Some(e)),
    };
    logging::init(&config.log_level);
    if let Some(e) = config_err {
        warn!(error = %e, "invalid configuration; using defaults");
    }
    info!(version = env!("CARGO_PKG_VERSION"), "rollbookd starting");

    let startup_workspace = config.workspace.clone();
    let mut state = ipc::AppState::new(config);
    if let Some(path) = startup_workspace {
        if let Err(e) = state.select_workspace(&path) {
            warn!(workspace = %path.display(), error = %e, "failed to open configured workspace");
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
                let reply = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                let _ = writeln!(stdout, "{reply}");
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
    info!("stdin closed; shutting down");
}
