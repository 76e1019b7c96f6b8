//! AsciiDoc extraction: treated as plain text with a heading-aware splitter
//!
//! No asciidoctor crate exists in the dependency stack, so this strips the
//! `=`/`==` heading markers rather than rendering the document, and emits one
//! section boundary (a blank line) per heading so the downstream splitter
//! naturally keeps sections together.

use regex::Regex;
use std::sync::OnceLock;

fn heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^(=+)\s+(.*)$").unwrap())
}

pub fn extract_asciidoc(content: &str) -> String {
    heading_re()
        .replace_all(content, |caps: &regex::Captures| {
            format!("\n\n{}\n", &caps[2])
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_heading_markers() {
        let doc = "= Title\n\nSome body text.\n\n== Section\n\nMore text.";
        let out = extract_asciidoc(doc);
        assert!(!out.contains('='));
        assert!(out.contains("Title"));
        assert!(out.contains("Section"));
    }

    #[test]
    fn plain_text_without_headings_is_unchanged() {
        let doc = "Just a paragraph with no headings at all.";
        assert_eq!(extract_asciidoc(doc), doc);
    }
}
