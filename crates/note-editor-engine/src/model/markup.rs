//! Reading and writing the serialized markup.
//!
//! Writing is deterministic: block tags in tree order, then mark wrappers in
//! rank order (`strong`, `em`, `s`, font `span`) around each text run.
//!
//! Reading is tolerant about *shape* and strict about *syntax*. Unknown
//! elements are transparent, `h4`-`h6` become paragraphs, loose inline
//! content becomes a paragraph and empty containers get an empty paragraph.
//! A stray `<` or an end tag that closes nothing is a [`ParseError`].

use std::borrow::Cow;

use note_editor_syntax::{Attribute, Token, lex};

use crate::error::ParseError;

use super::{
    BlockId, BlockKind, BlockNode, CellAttrs, Content, Document, HeadingLevel, Mark, MarkSet,
    TextRun, inline,
};

const VOID_ELEMENTS: &[&str] = &["hr", "br", "img", "col", "input", "meta", "link", "wbr"];

const BLOCK_ELEMENTS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "li", "blockquote", "pre", "hr", "table",
    "thead", "tbody", "tfoot", "tr", "td", "th", "div", "section", "article", "header", "footer",
    "main", "body", "html", "head",
];

/// Content accepted by `insertContentAt` when given markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Inline(Vec<TextRun>),
    Blocks(Vec<BlockNode>),
}

#[derive(Debug)]
enum Dom {
    Element(Element),
    Text(String),
}

#[derive(Debug)]
struct Element {
    name: String,
    attributes: Vec<Attribute>,
    children: Vec<Dom>,
}

impl Element {
    fn new(name: String, attributes: Vec<Attribute>) -> Self {
        Self {
            name,
            attributes,
            children: Vec::new(),
        }
    }

    fn attribute(&self, name: &str) -> Option<Cow<'_, str>> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| html_escape::decode_html_entities(&attr.value))
    }

    fn block_id(&self) -> Option<BlockId> {
        self.attribute("data-id")
            .filter(|value| !value.is_empty())
            .map(|value| BlockId::new(value.into_owned()))
    }
}

fn is_block_element(node: &Dom) -> bool {
    matches!(node, Dom::Element(el) if BLOCK_ELEMENTS.contains(&el.name.as_str()))
}

fn build_dom(source: &str) -> Result<Vec<Dom>, ParseError> {
    let mut stack = vec![Element::new(String::new(), Vec::new())];

    for (token, span) in lex(source) {
        match token {
            Token::Start(tag) => {
                let void = tag.self_closing || VOID_ELEMENTS.contains(&tag.name.as_str());
                let element = Element::new(tag.name, tag.attributes);
                if void {
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(Dom::Element(element));
                    }
                } else {
                    stack.push(element);
                }
            }
            Token::End(name) => {
                if VOID_ELEMENTS.contains(&name.as_str()) {
                    continue;
                }
                let depth = stack
                    .iter()
                    .rposition(|element| element.name == name)
                    .filter(|depth| *depth > 0)
                    .ok_or(ParseError::UnmatchedEndTag {
                        name,
                        offset: span.start,
                    })?;
                close_to(&mut stack, depth);
            }
            Token::Text(text) => {
                if let Some(parent) = stack.last_mut() {
                    parent
                        .children
                        .push(Dom::Text(html_escape::decode_html_entities(text).into_owned()));
                }
            }
            Token::Declaration => {}
            Token::Invalid(_) => {
                return Err(ParseError::UnexpectedCharacter { offset: span.start });
            }
        }
    }

    close_to(&mut stack, 1);
    Ok(stack.pop().map(|root| root.children).unwrap_or_default())
}

/// Pop elements until `stack.len() == depth`, attaching each to its parent.
fn close_to(stack: &mut Vec<Element>, depth: usize) {
    while stack.len() > depth.max(1) {
        if let Some(element) = stack.pop()
            && let Some(parent) = stack.last_mut()
        {
            parent.children.push(Dom::Element(element));
        }
    }
}

#[derive(Default)]
struct BlockBuilder {
    blocks: Vec<BlockNode>,
    pending: Vec<TextRun>,
}

impl BlockBuilder {
    fn visit(&mut self, node: &Dom) {
        let element = match node {
            Dom::Text(text) => {
                if !(self.pending.is_empty() && text.trim().is_empty()) {
                    collect_inline(std::slice::from_ref(node), &MarkSet::new(), &mut self.pending);
                }
                return;
            }
            Dom::Element(element) => element,
        };

        match element.name.as_str() {
            "p" | "h4" | "h5" | "h6" => self.push(textblock(BlockKind::Paragraph, element)),
            "h1" => self.push(textblock(BlockKind::Heading(HeadingLevel::H1), element)),
            "h2" => self.push(textblock(BlockKind::Heading(HeadingLevel::H2), element)),
            "h3" => self.push(textblock(BlockKind::Heading(HeadingLevel::H3), element)),
            "pre" => {
                let mut code = String::new();
                raw_text(&element.children, &mut code);
                let mut block = BlockNode::textblock(BlockKind::CodeBlock, vec![TextRun::plain(code)]);
                block.id = element.block_id();
                self.push(block);
            }
            "ul" => self.push_list(BlockKind::BulletList, element),
            "ol" => self.push_list(BlockKind::OrderedList, element),
            "blockquote" => {
                let mut block = BlockNode::container(
                    BlockKind::Blockquote,
                    non_empty(blocks_from(&element.children)),
                );
                block.id = element.block_id();
                self.push(block);
            }
            "hr" => self.push(BlockNode::horizontal_rule()),
            "table" => {
                let mut rows = Vec::new();
                collect_rows(&element.children, &mut rows);
                if !rows.is_empty() {
                    let style = element.attribute("style").map(Cow::into_owned);
                    self.push(BlockNode::container(BlockKind::Table { style }, rows));
                }
            }
            _ if is_block_element(node) => {
                self.flush();
                for child in &element.children {
                    self.visit(child);
                }
            }
            _ => collect_inline(std::slice::from_ref(node), &MarkSet::new(), &mut self.pending),
        }
    }

    fn push_list(&mut self, kind: BlockKind, element: &Element) {
        let items: Vec<BlockNode> = element
            .children
            .iter()
            .filter_map(|child| match child {
                Dom::Element(item) if item.name == "li" => Some(BlockNode::container(
                    BlockKind::ListItem,
                    non_empty(blocks_from(&item.children)),
                )),
                Dom::Text(text) if text.trim().is_empty() => None,
                other => {
                    let blocks = blocks_from(std::slice::from_ref(other));
                    (!blocks.is_empty()).then(|| BlockNode::container(BlockKind::ListItem, blocks))
                }
            })
            .collect();
        if items.is_empty() {
            return;
        }
        let mut list = BlockNode::container(kind, items);
        list.id = element.block_id();
        self.push(list);
    }

    fn push(&mut self, block: BlockNode) {
        self.flush();
        self.blocks.push(block);
    }

    fn flush(&mut self) {
        let runs = finish_inline(std::mem::take(&mut self.pending), true);
        if !runs.is_empty() {
            self.blocks.push(BlockNode::textblock(BlockKind::Paragraph, runs));
        }
    }

    fn finish(mut self) -> Vec<BlockNode> {
        self.flush();
        self.blocks
    }
}

fn blocks_from(nodes: &[Dom]) -> Vec<BlockNode> {
    let mut builder = BlockBuilder::default();
    for node in nodes {
        builder.visit(node);
    }
    builder.finish()
}

fn non_empty(blocks: Vec<BlockNode>) -> Vec<BlockNode> {
    if blocks.is_empty() {
        vec![BlockNode::empty_paragraph()]
    } else {
        blocks
    }
}

fn textblock(kind: BlockKind, element: &Element) -> BlockNode {
    let mut runs = Vec::new();
    collect_inline(&element.children, &MarkSet::new(), &mut runs);
    let mut block = BlockNode::textblock(kind, finish_inline(runs, true));
    block.id = element.block_id();
    block
}

fn collect_rows(nodes: &[Dom], rows: &mut Vec<BlockNode>) {
    for node in nodes {
        let Dom::Element(element) = node else {
            continue;
        };
        match element.name.as_str() {
            "thead" | "tbody" | "tfoot" => collect_rows(&element.children, rows),
            "tr" => {
                let cells: Vec<BlockNode> = element
                    .children
                    .iter()
                    .filter_map(|child| match child {
                        Dom::Element(cell) if cell.name == "td" || cell.name == "th" => Some(cell),
                        _ => None,
                    })
                    .map(|cell| {
                        let attrs = cell_attrs(cell);
                        let kind = if cell.name == "th" {
                            BlockKind::TableHeader(attrs)
                        } else {
                            BlockKind::TableCell(attrs)
                        };
                        BlockNode::container(kind, non_empty(blocks_from(&cell.children)))
                    })
                    .collect();
                if !cells.is_empty() {
                    rows.push(BlockNode::container(BlockKind::TableRow, cells));
                }
            }
            _ => {}
        }
    }
}

fn cell_attrs(cell: &Element) -> CellAttrs {
    let span = |name: &str| {
        cell.attribute(name)
            .and_then(|value| value.trim().parse::<u32>().ok())
            .filter(|span| *span > 0)
            .unwrap_or(1)
    };
    CellAttrs {
        colspan: span("colspan"),
        rowspan: span("rowspan"),
        style: cell
            .attribute("style")
            .filter(|style| !style.trim().is_empty())
            .map(Cow::into_owned),
    }
}

fn raw_text(nodes: &[Dom], out: &mut String) {
    for node in nodes {
        match node {
            Dom::Text(text) => out.push_str(text),
            Dom::Element(element) => raw_text(&element.children, out),
        }
    }
}

fn font_family_from_style(style: &str) -> Option<String> {
    style.split(';').find_map(|declaration| {
        let (property, value) = declaration.split_once(':')?;
        let value = value.trim();
        (property.trim().eq_ignore_ascii_case("font-family") && !value.is_empty())
            .then(|| value.to_string())
    })
}

fn collect_inline(nodes: &[Dom], marks: &MarkSet, out: &mut Vec<TextRun>) {
    for node in nodes {
        match node {
            Dom::Text(text) => out.push(TextRun::new(text.as_str(), marks.clone())),
            Dom::Element(element) => {
                let mut marks = marks.clone();
                match element.name.as_str() {
                    "strong" | "b" => marks.add(Mark::Bold),
                    "em" | "i" => marks.add(Mark::Italic),
                    "s" | "strike" | "del" => marks.add(Mark::Strike),
                    "br" => {
                        out.push(TextRun::new(" ", marks));
                        continue;
                    }
                    _ => {}
                }
                if let Some(font) = element
                    .attribute("style")
                    .and_then(|style| font_family_from_style(&style))
                {
                    marks.add(Mark::FontFamily(font));
                }
                collect_inline(&element.children, &marks, out);
            }
        }
    }
}

/// Collapse ASCII whitespace across runs; with `trim`, also drop it at both
/// ends. Non-breaking spaces are content and survive.
fn finish_inline(runs: Vec<TextRun>, trim: bool) -> Vec<TextRun> {
    let mut collapsed: Vec<TextRun> = Vec::with_capacity(runs.len());
    let mut last_was_space = trim;
    for run in runs {
        let mut text = String::with_capacity(run.text.len());
        for c in run.text.chars() {
            if c.is_ascii_whitespace() {
                if !last_was_space {
                    text.push(' ');
                }
                last_was_space = true;
            } else {
                text.push(c);
                last_was_space = false;
            }
        }
        collapsed.push(TextRun::new(text, run.marks));
    }
    inline::normalize(&mut collapsed);
    if trim
        && let Some(last) = collapsed.last_mut()
        && last.text.ends_with(' ')
    {
        last.text.pop();
        inline::normalize(&mut collapsed);
    }
    collapsed
}

/// Parse serialized markup into a document.
pub fn parse_markup(source: &str) -> Result<Document, ParseError> {
    let dom = build_dom(source)?;
    Ok(Document::new(blocks_from(&dom)))
}

/// Parse markup for insertion: inline-only markup stays inline.
pub fn parse_fragment(source: &str) -> Result<Fragment, ParseError> {
    let dom = build_dom(source)?;
    if dom.iter().any(is_block_element) {
        return Ok(Fragment::Blocks(blocks_from(&dom)));
    }
    let mut runs = Vec::new();
    collect_inline(&dom, &MarkSet::new(), &mut runs);
    Ok(Fragment::Inline(finish_inline(runs, false)))
}

pub fn to_markup(doc: &Document) -> String {
    let mut out = String::new();
    for block in &doc.blocks {
        write_block(&mut out, block);
    }
    out
}

fn write_open(out: &mut String, tag: &str, block: &BlockNode, extra: &str) {
    out.push('<');
    out.push_str(tag);
    if let Some(id) = &block.id {
        out.push_str(" data-id=\"");
        out.push_str(&html_escape::encode_double_quoted_attribute(id.as_str()));
        out.push('"');
    }
    out.push_str(extra);
    out.push('>');
}

fn style_attr(style: Option<&String>) -> String {
    style
        .map(|style| {
            format!(
                " style=\"{}\"",
                html_escape::encode_double_quoted_attribute(style)
            )
        })
        .unwrap_or_default()
}

fn cell_extra(attrs: &CellAttrs) -> String {
    format!(
        " colspan=\"{}\" rowspan=\"{}\"{}",
        attrs.colspan,
        attrs.rowspan,
        style_attr(attrs.style.as_ref())
    )
}

fn write_block(out: &mut String, block: &BlockNode) {
    let (tag, extra) = match &block.kind {
        BlockKind::Paragraph => ("p".to_string(), String::new()),
        BlockKind::Heading(level) => (format!("h{}", level.get()), String::new()),
        BlockKind::BulletList => ("ul".to_string(), String::new()),
        BlockKind::OrderedList => ("ol".to_string(), String::new()),
        BlockKind::ListItem => ("li".to_string(), String::new()),
        BlockKind::Blockquote => ("blockquote".to_string(), String::new()),
        BlockKind::TableRow => ("tr".to_string(), String::new()),
        BlockKind::TableCell(attrs) => ("td".to_string(), cell_extra(attrs)),
        BlockKind::TableHeader(attrs) => ("th".to_string(), cell_extra(attrs)),
        BlockKind::HorizontalRule => {
            out.push_str("<hr>");
            return;
        }
        BlockKind::CodeBlock => {
            write_open(out, "pre", block, "");
            out.push_str("<code>");
            out.push_str(&html_escape::encode_text(&block.text_content()));
            out.push_str("</code></pre>");
            return;
        }
        BlockKind::Table { style } => {
            write_open(out, "table", block, &style_attr(style.as_ref()));
            out.push_str("<tbody>");
            for row in block.children().into_iter().flatten() {
                write_block(out, row);
            }
            out.push_str("</tbody></table>");
            return;
        }
    };

    write_open(out, &tag, block, &extra);
    match &block.content {
        Content::Inline(runs) => runs.iter().for_each(|run| write_run(out, run)),
        Content::Blocks(children) => children.iter().for_each(|child| write_block(out, child)),
        Content::Leaf => {}
    }
    out.push_str("</");
    out.push_str(&tag);
    out.push('>');
}

fn write_run(out: &mut String, run: &TextRun) {
    let mut closers = Vec::new();
    for mark in run.marks.iter() {
        match mark {
            Mark::Bold => {
                out.push_str("<strong>");
                closers.push("</strong>");
            }
            Mark::Italic => {
                out.push_str("<em>");
                closers.push("</em>");
            }
            Mark::Strike => {
                out.push_str("<s>");
                closers.push("</s>");
            }
            Mark::FontFamily(family) => {
                out.push_str(&format!(
                    "<span style=\"font-family: {}\">",
                    html_escape::encode_double_quoted_attribute(family)
                ));
                closers.push("</span>");
            }
        }
    }
    out.push_str(&html_escape::encode_text(&run.text));
    for closer in closers.iter().rev() {
        out.push_str(closer);
    }
}

impl Document {
    pub fn from_markup(source: &str) -> Result<Self, ParseError> {
        parse_markup(source)
    }

    /// Parse `source`, falling back to an empty document when it is malformed.
    pub fn from_markup_or_empty(source: &str) -> Self {
        parse_markup(source).unwrap_or_else(|err| {
            log::warn!("Malformed initial content, starting empty: {err}");
            Document::empty()
        })
    }

    pub fn to_markup(&self) -> String {
        to_markup(self)
    }
}
