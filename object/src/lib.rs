// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! Typed value model and response envelope for the facund update-control
//! wire protocol.
//!
//! This crate only knows about values and how to render/parse them as XML
//! text; it has no notion of sockets, sessions, or call dispatch (see
//! `facund-proto` for that).

mod object;
mod response;
mod xml_text;

pub use object::{Object, ObjectError, ObjectType};
pub use response::{Response, ResponseCode};
pub use xml_text::{escape_into as escape, unescape};
