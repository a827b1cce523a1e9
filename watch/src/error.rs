// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

use std::fmt;
use std::io;

/// Errors raised while refreshing a watch entry. These are local to one
/// entry and one refresh cycle (spec §7): the caller logs and keeps the
/// entry's prior counters rather than propagating further.
#[derive(Debug)]
pub enum Error {
    Io(io::Error),
    Privilege(nix::Error),
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Privilege(e) => write!(f, "privilege elevation failed: {e}"),
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<nix::Error> for Error {
    fn from(e: nix::Error) -> Self {
        Self::Privilege(e)
    }
}
