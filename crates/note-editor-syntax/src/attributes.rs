use std::sync::OnceLock;

use regex::Regex;

static ATTRIBUTE_REGEX: OnceLock<Regex> = OnceLock::new();

fn attribute_regex() -> &'static Regex {
    ATTRIBUTE_REGEX.get_or_init(|| {
        Regex::new(r#"([^\s"'<>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
            .expect("Invalid attribute regex")
    })
}

/// A single `name="value"` pair from a start tag.
///
/// Names are lowercased. Values are kept raw; entity decoding is left to the
/// consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// Parse the attribute portion of a start tag (everything after the tag name).
///
/// Boolean attributes (`<td hidden>`) get an empty value.
pub fn parse_attributes(source: &str) -> Vec<Attribute> {
    attribute_regex()
        .captures_iter(source)
        .map(|caps| {
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            Attribute {
                name: caps[1].to_ascii_lowercase(),
                value,
            }
        })
        .collect()
}
