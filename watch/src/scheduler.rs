// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! Background watcher task, grounded on `look_for_updates` in
//! `original_source/trunk/backend/facund-comms.c`. Tries kqueue first (spec
//! §4.5.2, BSD/Darwin only); falls back to a fixed-period sleep loop
//! permanently once kqueue is unavailable or errors.
//!
//! Unlike the C original, shutdown is a polled `AtomicBool` rather than a
//! signal delivered to a specific pthread (REDESIGN FLAGS doesn't call this
//! out directly, but `pthread_kill`-to-one-thread has no safe stable
//! equivalent in `std::thread`); both the kqueue and the sleep path check
//! the flag at least once a second, so shutdown latency is bounded the same
//! way regardless of which wait strategy is active.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{info, warn};

use crate::entry::WatchEntry;
use crate::refresh::refresh;

/// Re-check period when no filesystem event has arrived (spec §4.5.2:
/// "fixed-period sleep (default 30 minutes)").
pub const DEFAULT_CHECK_PERIOD: Duration = Duration::from_secs(30 * 60);

/// How often the wait loop wakes up to check the termination flag.
const STOP_POLL_INTERVAL: Duration = Duration::from_secs(1);

fn refresh_all(entries: &[WatchEntry]) {
    for entry in entries {
        if let Err(e) = refresh(entry) {
            warn!("refresh of {} failed: {e}", entry.base);
        }
    }
}

/// A spawned watcher thread plus the flag used to ask it to stop.
pub struct Watcher {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Watcher {
    /// Spawns the watcher thread over `entries`: refreshes every entry
    /// once immediately, then keeps them current on whatever schedule the
    /// platform supports (spec §4.5.2).
    pub fn spawn(entries: Arc<Vec<WatchEntry>>) -> Watcher {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_for_thread = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("facund-watch".to_string())
            .spawn(move || run(&entries, &stop_for_thread))
            .expect("failed to spawn facund-watch thread");

        Watcher {
            stop,
            handle: Some(handle),
        }
    }

    /// Flips the termination flag and joins the thread (spec §4.5.3).
    pub fn stop(mut self) {
        self.request_stop();
        self.join();
    }

    fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Watcher {
    fn drop(&mut self) {
        self.request_stop();
        self.join();
    }
}

fn run(entries: &[WatchEntry], stop: &AtomicBool) {
    refresh_all(entries);

    #[cfg(any(
        target_os = "freebsd",
        target_os = "macos",
        target_os = "netbsd",
        target_os = "openbsd",
        target_os = "dragonfly"
    ))]
    {
        if kqueue_loop::run(entries, stop) {
            return;
        }
    }

    poll_loop(entries, stop);
}

/// Fixed-period sleep loop, used on platforms without kqueue and as the
/// kqueue path's permanent fallback on error (spec §4.5.2).
fn poll_loop(entries: &[WatchEntry], stop: &AtomicBool) {
    info!(
        "patch watcher running in polling mode ({}s period)",
        DEFAULT_CHECK_PERIOD.as_secs()
    );

    let mut waited = Duration::ZERO;
    while !stop.load(Ordering::SeqCst) {
        if waited >= DEFAULT_CHECK_PERIOD {
            refresh_all(entries);
            waited = Duration::ZERO;
        }
        thread::sleep(STOP_POLL_INTERVAL);
        waited += STOP_POLL_INTERVAL;
    }
}

#[cfg(any(
    target_os = "freebsd",
    target_os = "macos",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "dragonfly"
))]
mod kqueue_loop {
    use std::os::fd::AsRawFd;
    use std::sync::atomic::{AtomicBool, Ordering};

    use log::{debug, warn};
    use nix::sys::event::{kevent_ts, EventFilter, EventFlag, FilterFlag, KEvent};
    use nix::sys::time::TimeSpec;

    use crate::entry::WatchEntry;
    use crate::refresh::refresh;

    use super::{refresh_all, DEFAULT_CHECK_PERIOD, STOP_POLL_INTERVAL};

    /// Runs the kqueue-backed wait loop to completion. Returns `false` if
    /// kqueue setup failed and the caller should fall back to
    /// [`super::poll_loop`] instead; `true` once `stop` is observed or a
    /// later `kevent` error hands control back to the poll loop itself.
    pub fn run(entries: &[WatchEntry], stop: &AtomicBool) -> bool {
        let kq = match nix::sys::event::kqueue() {
            Ok(fd) => fd,
            Err(e) => {
                warn!("kqueue() unavailable ({e}), falling back to polling");
                return false;
            }
        };

        let mut watched_handles = Vec::with_capacity(entries.len());
        for (idx, entry) in entries.iter().enumerate() {
            let handle = match entry.open_dir_handle() {
                Ok(h) => h,
                Err(e) => {
                    warn!("could not open {} for watching: {e}", entry.dir.display());
                    continue;
                }
            };
            let change = KEvent::new(
                handle.as_raw_fd() as usize,
                EventFilter::EVFILT_VNODE,
                EventFlag::EV_ADD | EventFlag::EV_CLEAR,
                FilterFlag::NOTE_WRITE | FilterFlag::NOTE_DELETE | FilterFlag::NOTE_EXTEND,
                0,
                idx as isize,
            );
            if kevent_ts(kq.as_raw_fd(), &[change], &mut [], None).is_err() {
                warn!("failed to register kqueue watch for {}", entry.dir.display());
            }
            // keep the handle open for as long as the filter is registered
            watched_handles.push(handle);
        }

        let mut elapsed = std::time::Duration::ZERO;
        let timeout = TimeSpec::from_duration(STOP_POLL_INTERVAL);

        while !stop.load(Ordering::SeqCst) {
            let mut events = [KEvent::new(
                0,
                EventFilter::EVFILT_VNODE,
                EventFlag::empty(),
                FilterFlag::empty(),
                0,
                0,
            )];
            match kevent_ts(kq.as_raw_fd(), &[], &mut events, Some(timeout)) {
                Ok(0) => {
                    elapsed += STOP_POLL_INTERVAL;
                    if elapsed >= DEFAULT_CHECK_PERIOD {
                        refresh_all(entries);
                        elapsed = std::time::Duration::ZERO;
                    }
                }
                Ok(_) => {
                    elapsed = std::time::Duration::ZERO;
                    let idx = events[0].udata() as usize;
                    if let Some(entry) = entries.get(idx) {
                        debug!("kqueue fired for {}, refreshing", entry.base);
                        if let Err(e) = refresh(entry) {
                            warn!("refresh of {} failed: {e}", entry.base);
                        }
                    }
                }
                Err(e) => {
                    warn!("kevent() failed ({e}), falling back to polling");
                    return false;
                }
            }
        }
        true
    }
}
