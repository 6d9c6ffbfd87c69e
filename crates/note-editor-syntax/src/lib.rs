//! # note-editor-syntax
//!
//! Tokenizer for the serialized document markup exchanged with the page layer.
//!
//! The markup is the small HTML subset the editor emits (`<p>`, `<h1>`,
//! `<ul>`, `<table>`, `<strong>` and friends). This crate only knows about
//! *tokens*: start tags with their attributes, end tags, text runs and
//! declarations. Fitting tokens into the document schema is the engine's job.
//!
//! ```text
//! "<p data-id=\"a\">Hi</p>" → [Start(p, [data-id="a"]), Text("Hi"), End(p)]
//! ```
//!
//! ## Public API
//!
//! - [`lexer::lex`] - Tokenize input, returning `Vec<Token>`
//! - [`lexer::Token`] - A token with its byte span
//! - [`attributes::parse_attributes`] - Split a tag's attribute text

pub mod attributes;
pub mod lexer;

pub use attributes::{Attribute, parse_attributes};
pub use lexer::{Tag, Token, TokenKind, lex};
