// SPDX-FileCopyrightText: 2026 Sitesnap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Small HTML text helpers for rendered prompts.
//!
//! Prompts are rendered once at generation time and persisted with the
//! request, so the escaping lives here rather than in the transport.

/// Escape the characters Telegram's HTML parse mode treats specially.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wrap already-escaped text in bold tags.
pub fn bold(input: &str) -> String {
    format!("<b>{input}</b>")
}

/// Substitute the occurrence index into the first `#` numbering
/// placeholder of a caption template. Later `#` characters are left
/// alone; a template without one is returned unchanged.
pub fn number_caption(template: &str, index: u32) -> String {
    template.replacen('#', &format!("#{index}"), 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_html_entities() {
        assert_eq!(escape_html("a < b & c > d"), "a &lt; b &amp; c &gt; d");
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn numbers_only_the_first_placeholder() {
        assert_eq!(number_caption("serial plate #", 2), "serial plate #2");
        assert_eq!(number_caption("pump # near valve #", 3), "pump #3 near valve #");
        assert_eq!(number_caption("no placeholder", 1), "no placeholder");
    }

    #[test]
    fn bold_wraps_text() {
        assert_eq!(bold("Pump"), "<b>Pump</b>");
    }
}
