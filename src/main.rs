use brikksd::{ipc, logging};
use std::io::{self, BufRead, Stdout, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

/// One reply per line; the lock keeps lines from interleaving.
fn write_reply(stdout: &Mutex<Stdout>, resp: &serde_json::Value) {
    let line = serde_json::to_string(resp).unwrap_or_else(|_| "{\"ok\":false}".to_string());
    let mut out = match stdout.lock() {
        Ok(g) => g,
        Err(poisoned) => poisoned.into_inner(),
    };
    let _ = writeln!(out, "{}", line);
    let _ = out.flush();
}

fn main() {
    // Missing .env is the normal case.
    let _ = dotenvy::dotenv();
    logging::init();

    let mut state = ipc::AppState::default();

    let stdin = io::stdin();
    let stdout = Arc::new(Mutex::new(io::stdout()));
    let in_flight = Arc::new(AtomicUsize::new(0));
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "brikksd ready");

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(error = %e, "stdin read failed; exiting");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                let reply = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                write_reply(&stdout, &reply);
                continue;
            }
        };

        let id = req.id.clone();
        match ipc::dispatch(&mut state, req) {
            ipc::Dispatch::Reply(resp) => write_reply(&stdout, &resp),
            ipc::Dispatch::Deferred(job) => {
                // Network-bound work: later requests are answered while it runs,
                // so replies can arrive out of order.
                let out = Arc::clone(&stdout);
                let count = Arc::clone(&in_flight);
                count.fetch_add(1, Ordering::SeqCst);
                let spawned = thread::Builder::new()
                    .name("ipc-worker".to_string())
                    .spawn(move || {
                        let resp = job();
                        write_reply(&out, &resp);
                        count.fetch_sub(1, Ordering::SeqCst);
                    });
                if let Err(e) = spawned {
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    tracing::error!(error = %e, id = %id, "could not start worker");
                    let resp = ipc::err(&id, "internal", format!("could not start worker: {e}"), None);
                    write_reply(&stdout, &resp);
                }
            }
        }
    }

    let abandoned = in_flight.load(Ordering::SeqCst);
    if abandoned > 0 {
        tracing::warn!(abandoned, "stdin closed with requests still running");
    }
}
