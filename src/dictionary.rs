use std::borrow::Cow;
use std::collections::HashMap;

use tracing::debug;

use crate::block::{Block, BlockText};
use crate::hash::BlockHasher;

/// Chained hash index from block hash to every block with that hash, in
/// insertion order.
///
/// Holds the `BlockText` it was populated from so matches can be extended
/// past the block boundary.
#[derive(Debug, Default)]
pub struct Dictionary {
    buckets: HashMap<u64, Vec<Block>>,
    source: Option<BlockText>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, hash: u64, block: Block) {
        self.buckets.entry(hash).or_default().push(block);
    }

    /// Rebuild the index from `block_text`, dropping all prior state.
    ///
    /// Leaves `hasher` positioned on the last block hashed.
    pub fn populate<H: BlockHasher + ?Sized>(&mut self, block_text: BlockText, hasher: &mut H) {
        self.buckets.clear();
        self.source = None;
        for block in block_text.blocks() {
            let h = hasher.hash(block.chars());
            self.put(h, block.clone());
        }
        debug!(
            blocks = block_text.blocks().len(),
            buckets = self.buckets.len(),
            block_size = block_text.block_size(),
            "dictionary populated"
        );
        self.source = Some(block_text);
    }

    /// The block text indexed by the last `populate`, if any.
    pub fn source(&self) -> Option<&BlockText> {
        self.source.as_ref()
    }

    /// Number of distinct hash values indexed.
    pub fn num_buckets(&self) -> usize {
        self.buckets.len()
    }

    /// Resolve `hash` to the first indexed block equal to the first
    /// `block_size` chars of `target`.
    ///
    /// Only the bucket for `hash` is searched. A found block without a
    /// successor is greedily extended against the dictionary text; the
    /// extended block is returned as a new value and never indexed.
    pub fn get_match(&self, hash: u64, block_size: usize, target: &[char]) -> Option<Cow<'_, Block>> {
        let bucket = self.buckets.get(&hash)?;
        let prefix = &target[..block_size.min(target.len())];
        let candidate = bucket.iter().find(|b| b.chars() == prefix)?;

        let source = match &self.source {
            Some(s) if candidate.next_block().is_none() => s,
            _ => return Some(Cow::Borrowed(candidate)),
        };

        let dict_tail = source
            .original_text()
            .get(candidate.offset() + block_size..)
            .unwrap_or(&[]);
        let target_tail = target.get(block_size..).unwrap_or(&[]);
        let ext = dict_tail
            .iter()
            .zip(target_tail)
            .take_while(|(d, t)| d == t)
            .count();
        if ext == 0 {
            return Some(Cow::Borrowed(candidate));
        }

        let mut text = Vec::with_capacity(candidate.len() + ext);
        text.extend_from_slice(candidate.chars());
        text.extend_from_slice(&dict_tail[..ext]);
        Some(Cow::Owned(Block::from_chars(text, candidate.offset())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::RollingHash;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    /// Hands out 1, 2, 3, ... regardless of input.
    struct CountingHasher {
        next: u64,
    }

    impl BlockHasher for CountingHasher {
        fn hash(&mut self, _window: &[char]) -> u64 {
            let h = self.next;
            self.next += 1;
            h
        }
    }

    #[test]
    fn test_put_and_lookup() {
        let mut dict = Dictionary::new();
        dict.put(1, Block::new("abc", 0));
        assert!(dict.get_match(0, 3, &[]).is_none());
        let b = dict.get_match(1, 3, &chars("abc")).unwrap();
        assert_eq!(b.offset(), 0);
        assert_eq!(b.text(), "abc");
    }

    #[test]
    fn test_longest_block_text_match() {
        let mut dict = Dictionary::new();
        let text = BlockText::new("abcdef", 3).unwrap();
        dict.populate(text, &mut CountingHasher { next: 1 });

        let b = dict.get_match(2, 3, &chars("def")).unwrap();
        assert_eq!(b.text(), "def");
        assert_eq!(b.offset(), 3);

        let b = dict.get_match(1, 3, &chars("abcdef")).unwrap();
        assert_eq!(b.text(), "abcdef");
        assert_eq!(b.offset(), 0);
        assert!(matches!(b, Cow::Owned(_)));
    }

    #[test]
    fn test_extension_stops_at_mismatch() {
        let mut dict = Dictionary::new();
        dict.populate(BlockText::new("abcdefgh", 3).unwrap(), &mut CountingHasher { next: 1 });
        let b = dict.get_match(1, 3, &chars("abcdeXgh")).unwrap();
        assert_eq!(b.text(), "abcde");
        assert_eq!(b.offset(), 0);
    }

    #[test]
    fn test_extension_bounded_by_target() {
        let mut dict = Dictionary::new();
        dict.populate(BlockText::new("abcdefgh", 3).unwrap(), &mut CountingHasher { next: 1 });
        let b = dict.get_match(1, 3, &chars("abcd")).unwrap();
        assert_eq!(b.text(), "abcd");
    }

    #[test]
    fn test_extension_does_not_touch_index() {
        let mut dict = Dictionary::new();
        dict.populate(BlockText::new("abcdef", 3).unwrap(), &mut CountingHasher { next: 1 });
        for _ in 0..2 {
            assert_eq!(dict.get_match(1, 3, &chars("abcdef")).unwrap().len(), 6);
            assert_eq!(dict.get_match(1, 3, &chars("abc")).unwrap().len(), 3);
        }
    }

    #[test]
    fn test_block_with_successor_is_not_extended() {
        let mut dict = Dictionary::new();
        dict.populate(BlockText::new("abcdef", 3).unwrap(), &mut CountingHasher { next: 1 });
        let mut linked = Block::new("xyz", 0);
        linked.set_next_block(Block::new("def", 3));
        dict.put(7, linked);
        let b = dict.get_match(7, 3, &chars("xyzdef")).unwrap();
        assert_eq!(b.text(), "xyz");
        assert!(matches!(b, Cow::Borrowed(_)));
    }

    #[test]
    fn test_miss_on_absent_bucket_and_on_collision() {
        let mut dict = Dictionary::new();
        dict.put(5, Block::new("abc", 0));
        dict.put(5, Block::new("abd", 3));
        assert!(dict.get_match(6, 3, &chars("abc")).is_none());
        assert!(dict.get_match(5, 3, &chars("abx")).is_none());
        // First equal block in insertion order wins.
        assert_eq!(dict.get_match(5, 3, &chars("abd")).unwrap().offset(), 3);
    }

    #[test]
    fn test_populate_discards_previous_index() {
        let mut dict = Dictionary::new();
        let mut rh = RollingHash::new();
        dict.populate(BlockText::new("abcdef", 3).unwrap(), &mut rh);
        let h_abc = RollingHash::new().hash(&chars("abc"));
        assert!(dict.get_match(h_abc, 3, &chars("abc")).is_some());

        dict.populate(BlockText::new("uvwxyz", 3).unwrap(), &mut rh);
        assert!(dict.get_match(h_abc, 3, &chars("abc")).is_none());
        assert_eq!(dict.num_buckets(), 2);
        let src = dict.source().unwrap();
        assert_eq!(src.original_text().iter().collect::<String>(), "uvwxyz");
        assert_eq!(src.block_size(), 3);
        // Hasher is left on the last block.
        assert_eq!(rh.window(), "xyz");
    }
}
