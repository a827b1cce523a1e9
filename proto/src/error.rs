// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

use std::fmt;

use crate::xml::TokenError;

/// Errors the protocol engine can raise, shaped like `rpc_protocol::Error`:
/// one variant per failure domain plus a blanket `Io`/`Transport` passthrough.
#[derive(Debug)]
pub enum Error {
    /// The wire grammar was malformed badly enough that the tokenizer itself
    /// could not make progress (not a protocol-level response-worthy error --
    /// those are handled entirely in-band via `Response`).
    Token(TokenError),

    /// The transport layer failed or the peer disconnected mid-session.
    Transport(facund_transport::Error),
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(e) => write!(f, "XML tokenizer error: {e:?}"),
            Self::Transport(e) => write!(f, "transport error: {e}"),
        }
    }
}

impl From<TokenError> for Error {
    fn from(e: TokenError) -> Self {
        Self::Token(e)
    }
}

impl From<facund_transport::Error> for Error {
    fn from(e: facund_transport::Error) -> Self {
        Self::Transport(e)
    }
}
