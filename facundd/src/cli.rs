// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! Command-line parsing, grounded on the `#[derive(Parser)]` usage in
//! `nfs3::bin::nfs_server`/`rpcbind::bin::rpcinfo`.

use std::path::PathBuf;

use clap::Parser;

const DEFAULT_CONFIG_PATH: &str = "/etc/freebsd-update-control.conf";

#[derive(Parser, Debug)]
#[command(about = "Privileged update-control daemon", disable_version_flag = true)]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
}

impl Cli {
    /// Parses `argv`, exiting with code 1 (not clap's default 2) on `-h`,
    /// `--help`, or an unrecognized argument -- spec §6's usage/exit-code
    /// contract for the `daemon [-c <config>] [-h]` CLI.
    pub fn parse_or_exit() -> Cli {
        match Cli::try_parse() {
            Ok(cli) => cli,
            Err(e) => {
                // clap already printed the usage/help text to the right stream.
                let _ = e.print();
                std::process::exit(1);
            }
        }
    }
}
