//! HTML text extraction: walk text nodes, skip `<script>`/`<style>` subtrees

use scraper::{Html, Selector};

use crate::ExtractResult;

pub fn extract_html(content: &str) -> ExtractResult<String> {
    let document = Html::parse_document(content);
    let skip = Selector::parse("script, style").unwrap();
    let skip_nodes: std::collections::HashSet<_> =
        document.select(&skip).map(|e| e.id()).collect();

    let mut out = String::new();
    for node in document.tree.nodes() {
        if let Some(text) = node.value().as_text() {
            let is_skipped = node
                .ancestors()
                .any(|ancestor| skip_nodes.contains(&ancestor.id()));
            if !is_skipped {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    if !out.is_empty() {
                        out.push(' ');
                    }
                    out.push_str(trimmed);
                }
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_visible_text_only() {
        let html = "<html><body><p>Hello</p><script>evil()</script></body></html>";
        let text = extract_html(html).unwrap();
        assert_eq!(text, "Hello");
    }

    #[test]
    fn drops_style_blocks() {
        let html = "<html><head><style>body{color:red}</style></head><body>Visible</body></html>";
        let text = extract_html(html).unwrap();
        assert_eq!(text, "Visible");
    }
}
