// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! Response envelope, grounded on `original_source/trunk/lib/facund_response.c`.
//! Every RPC call resolves to exactly one of these, rendered once onto the
//! wire and never mutated afterward -- `render` memoizes via a `OnceCell` the
//! same way the C original cached `resp_xml_string` on first render.

use std::cell::OnceCell;

use crate::object::Object;
use crate::xml_text;

/// Response status code, matching spec §7 exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseCode(pub i32);

impl ResponseCode {
    pub const SUCCESS: ResponseCode = ResponseCode(0);
    pub const GENERIC_FAILURE: ResponseCode = ResponseCode(1);
    pub const UNKNOWN_ELEMENT: ResponseCode = ResponseCode(100);
    pub const WRONG_CHILD_ELEMENT: ResponseCode = ResponseCode(101);
    pub const UNKNOWN_ATTRIBUTE: ResponseCode = ResponseCode(200);
    pub const NO_ATTRIBUTE: ResponseCode = ResponseCode(201);
    pub const REPEATED_ATTRIBUTE: ResponseCode = ResponseCode(202);
    pub const UNKNOWN_CALL: ResponseCode = ResponseCode(300);
    pub const EMPTY_VALUE: ResponseCode = ResponseCode(400);
    pub const INCORRECT_DATA: ResponseCode = ResponseCode(401);
}

/// A completed call result: a code, a human-readable message, and an
/// optional value object.
///
/// `id` carries the caller-supplied `id="..."` attribute from `<call>` back
/// onto `<response>` so pipelined callers can match replies to requests; it
/// is absent only when the call itself omitted it.
pub struct Response {
    id: Option<String>,
    code: ResponseCode,
    message: String,
    value: Option<Object>,
    rendered: OnceCell<String>,
}

impl Response {
    /// Builds a response. Returns `None` if `message` is empty -- every
    /// response must carry a human-readable explanation, even a success one.
    pub fn new(
        id: Option<String>,
        code: ResponseCode,
        message: impl Into<String>,
        value: Option<Object>,
    ) -> Option<Response> {
        let message = message.into();
        if message.is_empty() {
            return None;
        }
        Some(Response {
            id,
            code,
            message,
            value,
            rendered: OnceCell::new(),
        })
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
        // the id is part of the rendered envelope; invalidate any cached text
        self.rendered = OnceCell::new();
    }

    pub fn code(&self) -> ResponseCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn value(&self) -> Option<&Object> {
        self.value.as_ref()
    }

    /// Renders this response to `<response ...>...</response>`, computing
    /// the text once and returning the cached copy on subsequent calls.
    pub fn render(&self) -> &str {
        self.rendered.get_or_init(|| {
            let mut buf = String::with_capacity(64);
            buf.push_str("<response");
            if let Some(id) = &self.id {
                buf.push_str(" id=\"");
                xml_text::escape_into(&mut buf, id);
                buf.push('"');
            }
            buf.push_str(" code=\"");
            buf.push_str(&self.code.0.to_string());
            buf.push_str("\" message=\"");
            xml_text::escape_into(&mut buf, &self.message);
            buf.push_str("\">");
            if let Some(value) = &self.value {
                if let Some(xml) = value.to_xml() {
                    buf.push_str(&xml);
                }
            }
            buf.push_str("</response>");
            buf
        })
    }
}
