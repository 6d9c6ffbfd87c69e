//! Stable block identifiers.
//!
//! After every change the assigner walks the tree and makes sure each tracked
//! block carries an id that no other block in the document uses. Existing ids
//! are never rewritten, except for the later copy of a duplicated id (which
//! happens when a block is split or pasted).

use std::collections::HashSet;

use crate::model::{BlockId, BlockNode, Content, Document};
use crate::options::IdentityOptions;

/// Source of fresh identifiers.
pub trait IdGenerator {
    fn generate(&mut self) -> BlockId;
}

/// `prefix` followed by `length` random base-36 characters.
#[derive(Debug, Clone)]
pub struct RandomIdGenerator {
    prefix: String,
    length: usize,
}

impl RandomIdGenerator {
    pub fn new(prefix: impl Into<String>, length: usize) -> Self {
        Self {
            prefix: prefix.into(),
            length: length.max(1),
        }
    }
}

impl Default for RandomIdGenerator {
    fn default() -> Self {
        let options = IdentityOptions::default();
        Self::new(options.prefix, options.length)
    }
}

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

impl IdGenerator for RandomIdGenerator {
    fn generate(&mut self) -> BlockId {
        let mut id = self.prefix.clone();
        let mut remaining = self.length;
        while remaining > 0 {
            let mut bits = uuid::Uuid::new_v4().as_u128();
            // 24 base-36 digits fit comfortably in the 122 random bits
            for _ in 0..remaining.min(24) {
                id.push(BASE36[(bits % 36) as usize] as char);
                bits /= 36;
                remaining -= 1;
            }
        }
        BlockId::new(id)
    }
}

/// Deterministic generator: `prefix` followed by an increasing counter.
#[derive(Debug, Clone, Default)]
pub struct SequentialIdGenerator {
    prefix: String,
    next: u64,
}

impl SequentialIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn generate(&mut self) -> BlockId {
        let id = BlockId::new(format!("{}{}", self.prefix, self.next));
        self.next += 1;
        id
    }
}

const MAX_ATTEMPTS: usize = 16;

pub struct IdentityAssigner {
    generator: Box<dyn IdGenerator>,
}

impl IdentityAssigner {
    pub fn new(generator: Box<dyn IdGenerator>) -> Self {
        Self { generator }
    }

    pub fn from_options(options: &IdentityOptions) -> Self {
        Self::new(Box::new(RandomIdGenerator::new(
            options.prefix.clone(),
            options.length,
        )))
    }

    /// Give every tracked block without a unique id a fresh one.
    ///
    /// Returns how many ids were assigned.
    pub fn assign(&mut self, doc: &mut Document) -> usize {
        let mut taken = HashSet::new();
        doc.for_each_block(|_, block, _| {
            if let Some(id) = &block.id {
                taken.insert(id.clone());
            }
        });

        let mut seen = HashSet::new();
        let mut assigned = 0;
        self.assign_in(&mut doc.blocks, &mut taken, &mut seen, &mut assigned);
        if assigned > 0 {
            log::debug!("Assigned {assigned} block id(s)");
        }
        assigned
    }

    fn assign_in(
        &mut self,
        blocks: &mut [BlockNode],
        taken: &mut HashSet<BlockId>,
        seen: &mut HashSet<BlockId>,
        assigned: &mut usize,
    ) {
        for block in blocks {
            if block.kind.is_tracked() {
                let unique = match &block.id {
                    Some(id) => seen.insert(id.clone()),
                    None => false,
                };
                if !unique {
                    let id = self.fresh(taken);
                    seen.insert(id.clone());
                    block.id = Some(id);
                    *assigned += 1;
                }
            }
            if let Content::Blocks(children) = &mut block.content {
                self.assign_in(children, taken, seen, assigned);
            }
        }
    }

    fn fresh(&mut self, taken: &mut HashSet<BlockId>) -> BlockId {
        let mut id = self.generator.generate();
        for _ in 1..MAX_ATTEMPTS {
            if !taken.contains(&id) {
                break;
            }
            log::trace!("Generated id {id} collides, retrying");
            id = self.generator.generate();
        }
        taken.insert(id.clone());
        id
    }
}

impl Default for IdentityAssigner {
    fn default() -> Self {
        Self::new(Box::new(RandomIdGenerator::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BlockKind, markup::parse_markup};
    use pretty_assertions::assert_eq;

    fn ids(doc: &Document) -> Vec<(&'static str, Option<String>)> {
        let mut out = Vec::new();
        doc.for_each_block(|_, block, _| {
            out.push((block.kind.name(), block.id.as_ref().map(|id| id.to_string())));
        });
        out
    }

    fn sequential() -> IdentityAssigner {
        IdentityAssigner::new(Box::new(SequentialIdGenerator::new("id-")))
    }

    #[test]
    fn test_random_ids_have_prefix_and_length() {
        let mut generator = RandomIdGenerator::new("id-", 9);
        let id = generator.generate();
        assert!(id.as_str().starts_with("id-"));
        assert_eq!(id.as_str().len(), 12);
        assert!(id.as_str()[3..].chars().all(|c| c.is_ascii_alphanumeric()));

        let long = RandomIdGenerator::new("", 40).generate();
        assert_eq!(long.as_str().len(), 40);
    }

    #[test]
    fn test_assigns_only_tracked_kinds() {
        let mut doc = parse_markup(
            "<ul><li><p>a</p></li></ul><hr><table><tr><td><p>c</p></td></tr></table>",
        )
        .unwrap();
        let assigned = sequential().assign(&mut doc);
        assert_eq!(assigned, 3);
        assert_eq!(
            ids(&doc),
            vec![
                ("bulletList", Some("id-1".into())),
                ("listItem", None),
                ("paragraph", Some("id-2".into())),
                ("horizontalRule", None),
                ("table", None),
                ("tableRow", None),
                ("tableCell", None),
                ("paragraph", Some("id-3".into())),
            ]
        );
    }

    #[test]
    fn test_existing_ids_are_kept() {
        let mut doc = parse_markup(r#"<p data-id="id-keep">a</p><p>b</p>"#).unwrap();
        let mut assigner = sequential();
        assert_eq!(assigner.assign(&mut doc), 1);
        assert_eq!(doc.blocks[0].id.as_ref().unwrap().as_str(), "id-keep");

        let before = doc.clone();
        assert_eq!(assigner.assign(&mut doc), 0);
        assert_eq!(doc, before);
    }

    #[test]
    fn test_later_duplicate_gets_fresh_id() {
        let mut doc = parse_markup(r#"<p data-id="id-1">a</p><p data-id="id-1">b</p>"#).unwrap();
        // the sequential generator would hand out id-1 first; it must skip it
        assert_eq!(sequential().assign(&mut doc), 1);
        assert_eq!(doc.blocks[0].id.as_ref().unwrap().as_str(), "id-1");
        assert_eq!(doc.blocks[1].id.as_ref().unwrap().as_str(), "id-2");
    }

    #[test]
    fn test_type_change_keeps_id() {
        let mut doc = parse_markup(r#"<p data-id="id-p">a</p>"#).unwrap();
        doc.blocks[0].convert_textblock(BlockKind::CodeBlock);
        assert_eq!(sequential().assign(&mut doc), 0);
        assert_eq!(doc.blocks[0].id.as_ref().unwrap().as_str(), "id-p");
    }
}
