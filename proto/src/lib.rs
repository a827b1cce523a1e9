// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! Streaming XML RPC protocol engine for the facund update-control daemon.
//!
//! Ties the typed value model (`facund-object`) to the Unix-domain
//! transport (`facund-transport`): a hand-rolled tokenizer drives the
//! session state machine described in
//! `original_source/trunk/lib/facund_server.c`, dispatching authenticated
//! calls to handlers supplied by the daemon binary.

mod error;
mod registry;
mod session;
mod xml;

pub use error::Error;
pub use registry::{CallRegistry, Handler};
pub use session::{Engine, EngineConfig, HandlerSetBuilder};
pub use xml::{Event, TokenError, Tokenizer};
