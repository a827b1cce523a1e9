// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

use std::fmt;
use std::io;

/// Startup-time failures, all of which map to exit code 1 (spec §6).
#[derive(Debug)]
pub enum Error {
    Config(crate::config::Error),
    Transport(facund_transport::Error),
    Privilege(nix::Error),
    Uname(io::Error),
    Io(io::Error),
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "configuration error: {e}"),
            Self::Transport(e) => write!(f, "transport error: {e}"),
            Self::Privilege(e) => write!(f, "privilege error: {e}"),
            Self::Uname(e) => write!(f, "could not determine the running release: {e}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl From<crate::config::Error> for Error {
    fn from(e: crate::config::Error) -> Self {
        Self::Config(e)
    }
}

impl From<facund_transport::Error> for Error {
    fn from(e: facund_transport::Error) -> Self {
        Self::Transport(e)
    }
}

impl From<nix::Error> for Error {
    fn from(e: nix::Error) -> Self {
        Self::Privilege(e)
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
