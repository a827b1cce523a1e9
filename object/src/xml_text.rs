// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! The five XML-predefined entities, used to keep string payloads safe to
//! embed in (and recover from) `<data type="string">...</data>` text.

/// Appends `text` to `buf`, escaping the characters that would otherwise be
/// read back as markup.
pub fn escape_into(buf: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => buf.push_str("&amp;"),
            '<' => buf.push_str("&lt;"),
            '>' => buf.push_str("&gt;"),
            '"' => buf.push_str("&quot;"),
            '\'' => buf.push_str("&apos;"),
            _ => buf.push(ch),
        }
    }
}

/// Reverses [`escape_into`]. Unknown entities are passed through verbatim
/// rather than rejected, since the tokenizer's grammar is fixed and doesn't
/// need to support arbitrary numeric character references.
pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let (replacement, consumed) = if let Some(r) = tail.strip_prefix("&amp;") {
            ('&', tail.len() - r.len())
        } else if let Some(r) = tail.strip_prefix("&lt;") {
            ('<', tail.len() - r.len())
        } else if let Some(r) = tail.strip_prefix("&gt;") {
            ('>', tail.len() - r.len())
        } else if let Some(r) = tail.strip_prefix("&quot;") {
            ('"', tail.len() - r.len())
        } else if let Some(r) = tail.strip_prefix("&apos;") {
            ('\'', tail.len() - r.len())
        } else {
            out.push('&');
            rest = &tail[1..];
            continue;
        };
        out.push(replacement);
        rest = &tail[consumed..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_special_characters() {
        let mut buf = String::new();
        escape_into(&mut buf, "<a & b> \"quoted\" 'x'");
        assert_eq!(unescape(&buf), "<a & b> \"quoted\" 'x'");
    }

    #[test]
    fn plain_text_is_unchanged() {
        let mut buf = String::new();
        escape_into(&mut buf, "13.2-RELEASE-p7");
        assert_eq!(buf, "13.2-RELEASE-p7");
    }
}
