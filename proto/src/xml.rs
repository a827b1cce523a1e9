// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! Hand-rolled, incremental XML tokenizer for the fixed grammar in
//! `facund-server`/`facund-client` wire messages: start tags with
//! attributes, self-closing tags, end tags, and character data. This is not
//! a general-purpose XML parser -- no namespaces, comments, processing
//! instructions, or CDATA sections, since the wire grammar never uses them.

use facund_object::{escape, unescape};

/// One parsed token.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// `<name a="b" c="d">`. `self_closing` is set for `<name .../>`, in
    /// which case the caller should treat it as immediately followed by the
    /// matching `EndTag`.
    StartTag {
        name: String,
        attrs: Vec<(String, String)>,
        self_closing: bool,
    },
    EndTag { name: String },
    /// Character data between tags, already entity-unescaped.
    Text(String),
}

/// Errors recognized while tokenizing. These are wire-grammar violations,
/// distinct from the protocol engine's own `RepeatedAttribute`/etc
/// responses, which are built from the successfully-parsed attribute list.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenError {
    UnterminatedTag,
    UnterminatedAttribute,
    MalformedAttribute,
}

/// An incremental tokenizer: feed it bytes as they arrive off the socket and
/// drain whatever complete tokens are available with [`Tokenizer::next_event`].
#[derive(Default)]
pub struct Tokenizer {
    buf: String,
}

impl Tokenizer {
    pub fn new() -> Tokenizer {
        Tokenizer { buf: String::new() }
    }

    /// Appends newly-received bytes, interpreted as UTF-8 (the wire grammar
    /// never carries anything else). Invalid UTF-8 is replaced lossily
    /// rather than tearing down the session over a single bad byte.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buf.push_str(&String::from_utf8_lossy(bytes));
    }

    /// Pulls the next complete token out of the buffer, or `None` if more
    /// bytes are needed.
    pub fn next_event(&mut self) -> Result<Option<Event>, TokenError> {
        if self.buf.is_empty() {
            return Ok(None);
        }

        if self.buf.starts_with('<') {
            let end = match self.buf.find('>') {
                Some(pos) => pos,
                None => return Ok(None),
            };
            let tag_text = self.buf[1..end].to_string();
            let consumed = end + 1;

            if let Some(name) = tag_text.strip_prefix('/') {
                self.buf.drain(..consumed);
                return Ok(Some(Event::EndTag {
                    name: name.trim().to_string(),
                }));
            }

            let (body, self_closing) = match tag_text.strip_suffix('/') {
                Some(b) => (b, true),
                None => (tag_text.as_str(), false),
            };
            let (name, attrs) = parse_start_tag(body)?;
            self.buf.drain(..consumed);
            return Ok(Some(Event::StartTag {
                name,
                attrs,
                self_closing,
            }));
        }

        // Text runs until the next '<', or to the end of the buffered data
        // if no further markup has arrived yet (more text may still follow).
        match self.buf.find('<') {
            Some(pos) => {
                let text = self.buf[..pos].to_string();
                self.buf.drain(..pos);
                Ok(Some(Event::Text(unescape(&text))))
            }
            None => Ok(None),
        }
    }
}

fn parse_start_tag(body: &str) -> Result<(String, Vec<(String, String)>), TokenError> {
    let body = body.trim();
    let name_end = body
        .find(|c: char| c.is_whitespace())
        .unwrap_or(body.len());
    let name = body[..name_end].to_string();
    if name.is_empty() {
        return Err(TokenError::UnterminatedTag);
    }

    let mut attrs = Vec::new();
    let mut rest = body[name_end..].trim_start();
    while !rest.is_empty() {
        let eq = rest.find('=').ok_or(TokenError::MalformedAttribute)?;
        let key = rest[..eq].trim().to_string();
        if key.is_empty() {
            return Err(TokenError::MalformedAttribute);
        }
        rest = rest[eq + 1..].trim_start();
        let quote = rest.chars().next().ok_or(TokenError::UnterminatedAttribute)?;
        if quote != '"' && quote != '\'' {
            return Err(TokenError::MalformedAttribute);
        }
        rest = &rest[1..];
        let value_end = rest.find(quote).ok_or(TokenError::UnterminatedAttribute)?;
        let value = unescape(&rest[..value_end]);
        attrs.push((key, value));
        rest = rest[value_end + 1..].trim_start();
    }

    Ok((name, attrs))
}

/// Escapes `text` for use as an attribute value or character content.
pub fn escape_attr(text: &str) -> String {
    let mut buf = String::new();
    escape(&mut buf, text);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(tok: &mut Tokenizer) -> Vec<Event> {
        let mut out = Vec::new();
        while let Some(ev) = tok.next_event().unwrap() {
            out.push(ev);
        }
        out
    }

    #[test]
    fn parses_start_and_end_tags_with_attrs() {
        let mut tok = Tokenizer::new();
        tok.feed(br#"<call name="ping" id="a"></call>"#);
        let events = drain(&mut tok);
        assert_eq!(
            events,
            vec![
                Event::StartTag {
                    name: "call".into(),
                    attrs: vec![("name".into(), "ping".into()), ("id".into(), "a".into())],
                    self_closing: false,
                },
                Event::EndTag { name: "call".into() },
            ]
        );
    }

    #[test]
    fn self_closing_tag_is_flagged() {
        let mut tok = Tokenizer::new();
        tok.feed(br#"<call name="ping" id="a"/>"#);
        let events = drain(&mut tok);
        assert_eq!(
            events,
            vec![Event::StartTag {
                name: "call".into(),
                attrs: vec![("name".into(), "ping".into()), ("id".into(), "a".into())],
                self_closing: true,
            }]
        );
    }

    #[test]
    fn text_is_unescaped() {
        let mut tok = Tokenizer::new();
        tok.feed(b"<data type=\"string\">a &amp; b</data>");
        let events = drain(&mut tok);
        assert_eq!(
            events,
            vec![
                Event::StartTag {
                    name: "data".into(),
                    attrs: vec![("type".into(), "string".into())],
                    self_closing: false,
                },
                Event::Text("a & b".into()),
                Event::EndTag { name: "data".into() },
            ]
        );
    }

    #[test]
    fn incremental_feed_waits_for_full_tag() {
        let mut tok = Tokenizer::new();
        tok.feed(b"<call name=\"p");
        assert_eq!(tok.next_event().unwrap(), None);
        tok.feed(b"ing\" id=\"a\"/>");
        let events = drain(&mut tok);
        assert_eq!(events.len(), 1);
    }
}
