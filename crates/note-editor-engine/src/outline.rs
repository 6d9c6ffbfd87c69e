//! A flat outline of the tracked blocks, for navigation panels.

use serde::Serialize;

use crate::model::{BlockId, BlockKind, Document};

const LABEL_LIMIT: usize = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlineEntry {
    pub id: BlockId,
    pub kind: &'static str,
    /// Heading level, for headings
    pub level: Option<u8>,
    pub label: String,
}

fn label_for(kind: &BlockKind, text: String) -> String {
    let label = match kind {
        BlockKind::Paragraph | BlockKind::Heading(_) if text.trim().is_empty() => "내용 없음".to_string(),
        BlockKind::Paragraph | BlockKind::Heading(_) => text,
        BlockKind::BulletList => "글머리 기호 목록".to_string(),
        BlockKind::OrderedList => "번호 매기기 목록".to_string(),
        BlockKind::Blockquote => "인용문".to_string(),
        BlockKind::CodeBlock => "코드 블록".to_string(),
        other => other.name().to_string(),
    };
    if label.chars().count() > LABEL_LIMIT {
        let mut truncated: String = label.chars().take(LABEL_LIMIT).collect();
        truncated.push_str("...");
        truncated
    } else {
        label
    }
}

/// Every tracked block that carries an id, in document order.
pub fn outline(doc: &Document) -> Vec<OutlineEntry> {
    let mut entries = Vec::new();
    doc.for_each_block(|_, block, _| {
        let Some(id) = &block.id else {
            return;
        };
        if !block.kind.is_tracked() {
            return;
        }
        let level = match block.kind {
            BlockKind::Heading(level) => Some(level.get()),
            _ => None,
        };
        entries.push(OutlineEntry {
            id: id.clone(),
            kind: block.kind.name(),
            level,
            label: label_for(&block.kind, block.text_content()),
        });
    });
    entries
}

/// Entries whose label contains `term`, ignoring case.
pub fn filter_outline<'a>(entries: &'a [OutlineEntry], term: &str) -> Vec<&'a OutlineEntry> {
    let term = term.to_lowercase();
    entries
        .iter()
        .filter(|entry| entry.label.to_lowercase().contains(&term))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::markup::parse_markup;
    use pretty_assertions::assert_eq;

    fn labels(entries: &[OutlineEntry]) -> Vec<(&str, &str)> {
        entries.iter().map(|entry| (entry.kind, entry.label.as_str())).collect()
    }

    #[test]
    fn test_outline_lists_tracked_blocks_with_ids() {
        let doc = parse_markup(
            r#"<h1 data-id="a">Title</h1><p data-id="b"></p><p>no id</p>
               <ul data-id="c"><li><p data-id="d">item</p></li></ul>
               <pre data-id="e"><code>x</code></pre><blockquote data-id="f"><p data-id="g">q</p></blockquote><hr>"#,
        )
        .unwrap();
        let entries = outline(&doc);
        assert_eq!(
            labels(&entries),
            vec![
                ("heading", "Title"),
                ("paragraph", "내용 없음"),
                ("bulletList", "글머리 기호 목록"),
                ("paragraph", "item"),
                ("codeBlock", "코드 블록"),
                ("blockquote", "인용문"),
                ("paragraph", "q"),
            ]
        );
        assert_eq!(entries[0].level, Some(1));
    }

    #[test]
    fn test_long_labels_are_truncated() {
        let text = "가".repeat(31);
        let doc = parse_markup(&format!(r#"<p data-id="a">{text}</p>"#)).unwrap();
        let label = &outline(&doc)[0].label;
        assert_eq!(label.chars().count(), 33);
        assert!(label.ends_with("..."));
    }

    #[test]
    fn test_filter_ignores_case() {
        let doc = parse_markup(r#"<h2 data-id="a">Hello World</h2><p data-id="b">other</p>"#).unwrap();
        let entries = outline(&doc);
        let found = filter_outline(&entries, "WORLD");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, BlockId::new("a"));
    }
}
