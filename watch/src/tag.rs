// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! Tag-file line decoding, grounded on `facund_tag_decode_line` in
//! `original_source/trunk/backend/facund-comms.c`. A tag file holds one
//! `|`-separated record per line; malformed lines are discarded and the
//! last successfully parsed line wins (spec §4.5.1 step 1).

const LITERAL: &str = "freebsd-update";
const TINDEXHASH_LEN: usize = 64;
const EOL_LEN: usize = 10;

/// One parsed tag-file record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagLine {
    pub platform: String,
    pub release: String,
    pub patch: u32,
    pub tindexhash: String,
    pub eol: String,
}

impl TagLine {
    /// Parses one line. Returns `None` for anything that doesn't match the
    /// fixed six-field `freebsd-update|platform|release|patch|hash|eol`
    /// grammar -- the caller discards malformed lines rather than treating
    /// them as fatal. The C original validates the `eol` field's length
    /// against the line's trailing newline (`strlen(str) != 11`); here the
    /// newline is trimmed first so the check is against the 10-character
    /// date itself.
    pub fn parse(line: &str) -> Option<TagLine> {
        let line = line.trim_end_matches(['\n', '\r']);
        let mut fields = line.splitn(6, '|');

        if fields.next()? != LITERAL {
            return None;
        }
        let platform = fields.next()?.to_string();
        let release = fields.next()?.to_string();
        let patch: u32 = fields.next()?.parse().ok()?;
        let tindexhash = fields.next()?.to_string();
        if tindexhash.len() != TINDEXHASH_LEN {
            return None;
        }
        let eol = fields.next()?.to_string();
        if eol.len() != EOL_LEN {
            return None;
        }
        if fields.next().is_some() {
            return None;
        }

        Some(TagLine {
            platform,
            release,
            patch,
            tindexhash,
            eol,
        })
    }

    /// Parses every non-empty line of `contents`, returning the last
    /// successfully parsed record.
    pub fn parse_last(contents: &str) -> Option<TagLine> {
        contents
            .lines()
            .filter(|l| !l.trim().is_empty())
            .filter_map(TagLine::parse)
            .last()
    }
}
