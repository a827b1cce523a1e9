// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! Flat key=value configuration reader, grounded on `properties_read`/
//! `property_find` usage in `original_source/trunk/backend/facund-be.c`'s
//! `main`, re-expressed the way `xdr_codegen::scanner`/`parser` hand-roll
//! their own flat-file grammar rather than reaching for a parsing crate.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use log::debug;

#[derive(Debug)]
pub enum Error {
    Io(io::Error),
    MissingBaseDirs,
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "could not read configuration file: {e}"),
            Self::MissingBaseDirs => {
                write!(f, "no base dirs were given, set base_dirs in the configuration file")
            }
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// The daemon's resolved configuration: the base directories to watch and
/// the shared-secret bytes used in the authentication digest.
pub struct Config {
    pub base_dirs: Vec<String>,
    pub password_hash: Vec<u8>,
}

impl Config {
    /// Reads and parses `path`. A missing file is tolerated and treated as
    /// empty (spec §6); a present-but-unreadable file or one missing
    /// `base_dirs` is fatal.
    pub fn read(path: impl AsRef<Path>) -> Result<Config, Error> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };

        let properties = parse_properties(&contents);

        let base_dirs = properties
            .get("base_dirs")
            .map(|v| {
                v.split(' ')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        if base_dirs.is_empty() {
            return Err(Error::MissingBaseDirs);
        }

        let password_hash = properties
            .get("password")
            .map(|v| v.as_bytes().to_vec())
            .unwrap_or_default();

        Ok(Config {
            base_dirs,
            password_hash,
        })
    }
}

/// Splits `contents` into key/value pairs: blank lines and `#`-prefixed
/// comments are skipped, each remaining line is split on the first `=` with
/// both sides trimmed. Unrecognized keys are kept (the caller decides what
/// to use) but logged at `debug` so an operator can catch a typo.
fn parse_properties(contents: &str) -> std::collections::HashMap<String, String> {
    let mut map = std::collections::HashMap::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            debug!("ignoring unparseable configuration line: {line}");
            continue;
        };
        let key = key.trim().to_string();
        let value = value.trim().to_string();
        if key != "base_dirs" && key != "password" {
            debug!("ignoring unrecognized configuration key {key}");
        }
        map.insert(key, value);
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_is_tolerated_and_then_fatal_on_missing_base_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist.conf");
        assert!(matches!(Config::read(&path), Err(Error::MissingBaseDirs)));
    }

    #[test]
    fn parses_base_dirs_and_password() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("facund.conf");
        let mut f = fs::File::create(&path).unwrap();
        writeln!(f, "# a comment\nbase_dirs=/ /usr/jails/one\npassword=hunter2").unwrap();

        let config = Config::read(&path).unwrap();
        assert_eq!(config.base_dirs, vec!["/", "/usr/jails/one"]);
        assert_eq!(config.password_hash, b"hunter2");
    }

    #[test]
    fn unrecognized_keys_are_ignored_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("facund.conf");
        let mut f = fs::File::create(&path).unwrap();
        writeln!(f, "base_dirs=/\nsome_future_key=value").unwrap();

        let config = Config::read(&path).unwrap();
        assert_eq!(config.base_dirs, vec!["/"]);
    }

    #[test]
    fn empty_base_dirs_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("facund.conf");
        fs::write(&path, "base_dirs=   \n").unwrap();
        assert!(matches!(Config::read(&path), Err(Error::MissingBaseDirs)));
    }
}
