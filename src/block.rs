use crate::types::CodecError;

/// A span of a text at a given char offset.
///
/// The optional successor marks a block whose extension has already been
/// materialized; `Dictionary::get_match` will not extend such a block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    text: Vec<char>,
    offset: usize,
    next: Option<Box<Block>>,
}

impl Block {
    pub fn new(text: &str, offset: usize) -> Self {
        Self::from_chars(text.chars().collect(), offset)
    }

    pub fn from_chars(text: Vec<char>, offset: usize) -> Self {
        Block { text, offset, next: None }
    }

    #[inline]
    pub fn chars(&self) -> &[char] {
        &self.text
    }

    pub fn text(&self) -> String {
        self.text.iter().collect()
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Length in chars.
    #[inline]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn set_next_block(&mut self, next: Block) {
        self.next = Some(Box::new(next));
    }

    pub fn next_block(&self) -> Option<&Block> {
        self.next.as_deref()
    }
}

/// A text cut into consecutive blocks of `block_size` chars; the final block
/// may be shorter.
#[derive(Clone, Debug)]
pub struct BlockText {
    text: Vec<char>,
    block_size: usize,
    blocks: Vec<Block>,
}

impl BlockText {
    pub fn new(text: &str, block_size: usize) -> Result<Self, CodecError> {
        Self::from_chars(text.chars().collect(), block_size)
    }

    pub fn from_chars(text: Vec<char>, block_size: usize) -> Result<Self, CodecError> {
        if block_size == 0 {
            return Err(CodecError::InvalidBlockSize);
        }
        Ok(Self::partition(text, block_size))
    }

    /// `block_size` must be >= 1.
    pub(crate) fn partition(text: Vec<char>, block_size: usize) -> Self {
        let blocks = text
            .chunks(block_size)
            .enumerate()
            .map(|(i, chunk)| Block::from_chars(chunk.to_vec(), i * block_size))
            .collect();
        BlockText { text, block_size, blocks }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn original_text(&self) -> &[char] {
        &self.text
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_size_larger_than_text() {
        let bt = BlockText::new("abc", 5).unwrap();
        assert_eq!(bt.blocks().len(), 1);
        assert_eq!(bt.blocks()[0].text(), "abc");
        assert_eq!(bt.blocks()[0].offset(), 0);
    }

    #[test]
    fn test_three_blocks() {
        let bt = BlockText::new("abcdefghi", 3).unwrap();
        assert_eq!(bt.blocks().len(), 3);
    }

    #[test]
    fn test_three_blocks_short_tail() {
        let bt = BlockText::new("abcdefgh", 3).unwrap();
        let got: Vec<(String, usize)> = bt
            .blocks()
            .iter()
            .map(|b| (b.text(), b.offset()))
            .collect();
        assert_eq!(
            got,
            vec![("abc".into(), 0), ("def".into(), 3), ("gh".into(), 6)]
        );
        assert_eq!(bt.block_size(), 3);
        assert_eq!(bt.original_text().iter().collect::<String>(), "abcdefgh");
    }

    #[test]
    fn test_partition_law() {
        let text: String = "0123456789abcdefghijklmnopqrstuvwxyz".repeat(3);
        let n = text.chars().count();
        for bs in 1..=n + 2 {
            let bt = BlockText::new(&text, bs).unwrap();
            let count = (n + bs - 1) / bs;
            assert_eq!(bt.blocks().len(), count, "bs={}", bs);
            for (i, b) in bt.blocks().iter().enumerate() {
                assert_eq!(b.offset(), i * bs);
                if i + 1 < count {
                    assert_eq!(b.len(), bs);
                }
            }
            assert_eq!(bt.blocks()[count - 1].len(), n - bs * (count - 1));
            let joined: String = bt.blocks().iter().map(|b| b.text()).collect();
            assert_eq!(joined, text);
        }
    }

    #[test]
    fn test_offsets_count_chars() {
        let bt = BlockText::new("äöüßxy", 2).unwrap();
        let offsets: Vec<usize> = bt.blocks().iter().map(Block::offset).collect();
        assert_eq!(offsets, vec![0, 2, 4]);
        assert_eq!(bt.blocks()[1].text(), "üß");
    }

    #[test]
    fn test_empty_text_has_no_blocks() {
        assert!(BlockText::new("", 4).unwrap().blocks().is_empty());
    }

    #[test]
    fn test_zero_block_size_rejected() {
        assert!(matches!(BlockText::new("abc", 0), Err(CodecError::InvalidBlockSize)));
    }

    #[test]
    fn test_successor_link() {
        let mut b = Block::new("abc", 0);
        assert!(b.next_block().is_none());
        b.set_next_block(Block::new("def", 3));
        assert_eq!(b.next_block().map(Block::offset), Some(3));
    }
}
