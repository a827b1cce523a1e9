// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! Update-control daemon entry point, grounded on `main`/`do_communication`
//! in `original_source/trunk/backend/facund-be.c`/`facund-comms.c`: reads
//! the configuration, starts the patch watcher and the RPC accept/session
//! loop as the two long-lived tasks described in spec.md §5, and tears both
//! down cleanly on `SIGHUP`/`SIGINT`/`SIGTERM`.

mod cli;
mod config;
mod error;
mod handlers;
mod release;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{error, info, warn};
use nix::sys::signal::{self, SigHandler, Signal};

use facund_proto::{Engine, EngineConfig, HandlerSetBuilder};
use facund_transport::Connection;
use facund_watch::{WatchEntry, Watcher};

use error::Error;

/// Well-known socket path, matching `facund_connect_server("/tmp/facund")`.
const SOCKET_PATH: &str = "/tmp/facund";

/// Set by the signal handler, polled by the accept/session loop between
/// sessions -- the same "thread checks a flag at least once per iteration"
/// pattern `facund_watch::Watcher` uses, since Rust's standard library
/// retries a blocking syscall on `EINTR` rather than letting a signal
/// unblock it the way the original's unrestarted `read()`/`accept()` calls
/// did (see DESIGN.md).
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

extern "C" fn request_shutdown(_signal: std::ffi::c_int) {
    SHUTDOWN.store(true, Ordering::SeqCst);
}

/// Installs the same three handlers `facund-be.c`'s `main` registers via
/// `sigaction` over `facund_signals` (`SIGHUP`, `SIGINT`, `SIGTERM`).
fn install_signal_handlers() -> Result<(), nix::Error> {
    for sig in [Signal::SIGHUP, Signal::SIGINT, Signal::SIGTERM] {
        unsafe {
            signal::signal(sig, SigHandler::Handler(request_shutdown))?;
        }
    }
    Ok(())
}

fn main() {
    let cli = cli::Cli::parse_or_exit();
    env_logger::init();

    if let Err(e) = run(&cli) {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run(cli: &cli::Cli) -> Result<(), Error> {
    let config = config::Config::read(&cli.config)?;
    let release = Arc::new(release::current_release().map_err(Error::Uname)?);
    info!("running release {release}");

    install_signal_handlers()?;

    let entries: Arc<Vec<WatchEntry>> = Arc::new(
        config
            .base_dirs
            .iter()
            .map(|base| WatchEntry::new(base.clone()))
            .collect(),
    );

    let watcher = Watcher::spawn(Arc::clone(&entries));

    let engine_config = EngineConfig {
        password_hash: config.password_hash,
        require_auth: true,
    };
    let handler_set: Arc<HandlerSetBuilder> = Arc::new(handlers::build_handler_set(
        Arc::clone(&entries),
        Arc::clone(&release),
    ));
    let engine = Engine::new(engine_config, handler_set);

    let mut conn = Connection::listen(SOCKET_PATH)?;
    info!("listening on {SOCKET_PATH}");

    while !SHUTDOWN.load(Ordering::SeqCst) {
        if let Err(e) = conn.accept() {
            warn!("error accepting connection: {e}");
            break;
        }
        if SHUTDOWN.load(Ordering::SeqCst) {
            conn.close_peer();
            break;
        }
        if let Err(e) = engine.serve_session(&mut conn) {
            warn!("session ended with error: {e}");
        }
        conn.close_peer();
    }

    info!("shutting down");
    watcher.stop();
    Ok(())
}
