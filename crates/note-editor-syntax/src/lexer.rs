//! # Lexer - Tokenizing Serialized Markup
//!
//! This module breaks markup text into tokens using the [Logos] lexer
//! generator.
//!
//! [Logos]: https://docs.rs/logos
//!
//! ## Token Design
//!
//! Tokens are context-free. The lexer doesn't know that `<li>` belongs inside
//! `<ul>` or that `<strong>` is a mark - that's the document builder's job.
//!
//! - `<name attrs…>` → [`TokenKind::StartTag`]
//! - `</name>` → [`TokenKind::EndTag`]
//! - `<!…>` (doctype, comments) → [`TokenKind::Declaration`]
//! - everything up to the next `<` → [`TokenKind::Text`]
//!
//! A `<` that opens none of the above is reported as [`Token::Invalid`] so the
//! caller can decide how strict to be.

use std::ops::Range;

use logos::Logos;

use crate::attributes::{Attribute, parse_attributes};

/// Token kinds produced by the Logos lexer.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `<p>`, `<td colspan="2">`, `<hr/>`
    #[regex(r#"<[a-zA-Z][a-zA-Z0-9]*([^<>"']|"[^"]*"|'[^']*')*>"#)]
    StartTag,

    /// `</p>`
    #[regex(r"</[a-zA-Z][a-zA-Z0-9]*[ \t\r\n]*>")]
    EndTag,

    /// `<!DOCTYPE html>`, `<!-- comment -->`
    #[regex(r"<![^>]*>")]
    Declaration,

    /// Character data between tags
    #[regex(r"[^<]+")]
    Text,
}

/// A start tag split into its name and attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Lowercased tag name
    pub name: String,
    pub attributes: Vec<Attribute>,
    /// Written as `<name/>`
    pub self_closing: bool,
}

impl Tag {
    /// Raw value of the first attribute with this (lowercase) name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }
}

/// A lexed token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    Start(Tag),
    /// Lowercased name of the closed element
    End(String),
    Text(&'a str),
    Declaration,
    /// Input Logos could not match (typically a stray `<`)
    Invalid(&'a str),
}

/// Lex the input into tokens along with their byte spans.
///
/// Every byte of the input is covered by exactly one span.
pub fn lex(input: &str) -> Vec<(Token<'_>, Range<usize>)> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(input);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let text = lexer.slice();
        let token = match result {
            Ok(TokenKind::StartTag) => Token::Start(split_start_tag(text)),
            Ok(TokenKind::EndTag) => Token::End(
                text.trim_start_matches("</")
                    .trim_end_matches('>')
                    .trim()
                    .to_ascii_lowercase(),
            ),
            Ok(TokenKind::Declaration) => Token::Declaration,
            Ok(TokenKind::Text) => Token::Text(text),
            Err(()) => Token::Invalid(text),
        };
        tokens.push((token, span));
    }

    tokens
}

fn split_start_tag(text: &str) -> Tag {
    let inner = &text[1..text.len() - 1];
    let self_closing = inner.ends_with('/');
    let inner = inner.trim_end_matches('/');
    let name_len = inner
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(inner.len());
    Tag {
        name: inner[..name_len].to_ascii_lowercase(),
        attributes: parse_attributes(&inner[name_len..]),
        self_closing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn tokens(input: &str) -> Vec<Token<'_>> {
        lex(input).into_iter().map(|(token, _)| token).collect()
    }

    fn start(name: &str) -> Token<'static> {
        Token::Start(Tag {
            name: name.to_string(),
            attributes: vec![],
            self_closing: false,
        })
    }

    #[test]
    fn lex_empty_input() {
        assert_eq!(tokens(""), vec![]);
    }

    #[test]
    fn lex_plain_text() {
        assert_eq!(tokens("hello"), vec![Token::Text("hello")]);
    }

    #[test]
    fn lex_simple_paragraph() {
        assert_eq!(
            tokens("<p>Hi</p>"),
            vec![start("p"), Token::Text("Hi"), Token::End("p".to_string())]
        );
    }

    #[test]
    fn lex_tag_with_attributes() {
        let lexed = tokens(r#"<h1 data-id="id-abc">T</h1>"#);
        let Token::Start(tag) = &lexed[0] else {
            panic!("expected start tag, got {:?}", lexed[0]);
        };
        assert_eq!(tag.name, "h1");
        assert_eq!(tag.attribute("data-id"), Some("id-abc"));
        assert!(!tag.self_closing);
    }

    #[test]
    fn lex_quoted_gt_inside_attribute() {
        let lexed = tokens(r#"<span title="a > b">x</span>"#);
        let Token::Start(tag) = &lexed[0] else {
            panic!("expected start tag, got {:?}", lexed[0]);
        };
        assert_eq!(tag.attribute("title"), Some("a > b"));
        assert_eq!(lexed[1], Token::Text("x"));
    }

    #[rstest]
    #[case("<hr>", false)]
    #[case("<hr/>", true)]
    #[case("<hr />", true)]
    fn lex_void_tag_forms(#[case] input: &str, #[case] self_closing: bool) {
        let lexed = tokens(input);
        assert_eq!(
            lexed,
            vec![Token::Start(Tag {
                name: "hr".to_string(),
                attributes: vec![],
                self_closing,
            })]
        );
    }

    #[test]
    fn lex_uppercase_names_are_lowercased() {
        assert_eq!(
            tokens("<P>x</P >"),
            vec![start("p"), Token::Text("x"), Token::End("p".to_string())]
        );
    }

    #[test]
    fn lex_declaration() {
        assert_eq!(
            tokens("<!DOCTYPE html><p></p>"),
            vec![Token::Declaration, start("p"), Token::End("p".to_string())]
        );
    }

    #[test]
    fn lex_stray_angle_bracket_is_invalid() {
        let lexed = tokens("a < b");
        assert_eq!(lexed[0], Token::Text("a "));
        assert!(matches!(lexed[1], Token::Invalid(_)));
    }

    #[test]
    fn spans_cover_all_bytes() {
        let input = r#"<ul data-id="x"><li><p>one &amp; two</p></li></ul>"#;
        let lexed = lex(input);
        let mut cursor = 0;
        for (_, span) in &lexed {
            assert_eq!(span.start, cursor);
            cursor = span.end;
        }
        assert_eq!(cursor, input.len());
    }
}
