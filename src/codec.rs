use std::mem;

use tracing::{debug, trace, warn};

use crate::apply::apply_tokens;
use crate::block::BlockText;
use crate::dictionary::Dictionary;
use crate::hash::RollingHash;
use crate::types::{delta_summary, CodecError, CodecOptions, Token, DEFAULT_BLOCK_SIZE};

/// Emit shared debug statistics for an encoded token sequence.
pub(crate) fn log_token_stats(tokens: &[Token]) {
    let s = delta_summary(tokens);
    let copy_pct = if s.total_output_chars > 0 {
        s.copy_chars as f64 / s.total_output_chars as f64 * 100.0
    } else {
        0.0
    };
    debug!(
        copies = s.num_copies,
        copy_chars = s.copy_chars,
        literals = s.num_literals,
        literal_chars = s.literal_chars,
        "encode result: copy coverage {:.1}%",
        copy_pct
    );
}

/// Block-matching delta codec.
///
/// Owns the rolling hash and the dictionary index; both are reused (and
/// rebuilt) across calls, so one instance serves one caller at a time.
#[derive(Debug)]
pub struct Codec {
    hasher: RollingHash,
    dictionary: Dictionary,
    block_size: usize,
}

impl Default for Codec {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec {
    pub fn new() -> Self {
        Codec {
            hasher: RollingHash::new(),
            dictionary: Dictionary::new(),
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }

    pub fn with_options(opts: &CodecOptions) -> Result<Self, CodecError> {
        let mut codec = Self::new();
        codec.set_block_size(opts.block_size)?;
        codec.hasher = RollingHash::with_params(opts.prime_base, opts.prime_modulus)?;
        Ok(codec)
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn set_block_size(&mut self, block_size: usize) -> Result<(), CodecError> {
        if block_size == 0 {
            return Err(CodecError::InvalidBlockSize);
        }
        self.block_size = block_size;
        Ok(())
    }

    pub fn hasher(&self) -> &RollingHash {
        &self.hasher
    }

    pub fn hasher_mut(&mut self) -> &mut RollingHash {
        &mut self.hasher
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Encode `target` against `dictionary`.
    ///
    /// Scans the target one window at a time: a window whose hash resolves
    /// to an equal dictionary block becomes a copy (greedily extended), any
    /// other char is buffered as literal text. The final run shorter than
    /// one block is always literal.
    pub fn encode(&mut self, dictionary: &str, target: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        if dictionary == target {
            return tokens;
        }
        if target.is_empty() {
            tokens.push(Token::Literal(String::new()));
            return tokens;
        }

        let bs = self.block_size;
        let dict_chars: Vec<char> = dictionary.chars().collect();
        let v: Vec<char> = target.chars().collect();
        debug!(
            dictionary_len = dict_chars.len(),
            target_len = v.len(),
            block_size = bs,
            "encode"
        );

        // block_size was validated by set_block_size.
        self.dictionary
            .populate(BlockText::partition(dict_chars, bs), &mut self.hasher);

        let mut literal = String::new();
        let mut v_c: usize = 0;
        let mut rolling = false;

        while v_c < v.len() {
            if v.len() - v_c < bs {
                literal.extend(&v[v_c..]);
                tokens.push(Token::Literal(mem::take(&mut literal)));
                break;
            }

            let window = &v[v_c..v_c + bs];
            let h = if rolling {
                match self.hasher.next_hash(window[bs - 1]) {
                    Ok(h) => h,
                    Err(e) => {
                        warn!(offset = v_c, error = %e, "incremental hash failed, rehashing window");
                        self.hasher.hash(window)
                    }
                }
            } else {
                self.hasher.hash(window)
            };

            match self.dictionary.get_match(h, bs, &v[v_c..]) {
                None => {
                    literal.push(v[v_c]);
                    v_c += 1;
                    rolling = true;
                }
                Some(block) => {
                    if !literal.is_empty() {
                        tokens.push(Token::Literal(mem::take(&mut literal)));
                    }
                    trace!(target_offset = v_c, offset = block.offset(), length = block.len(), "match");
                    tokens.push(Token::Copy {
                        offset: block.offset(),
                        length: block.len(),
                    });
                    v_c += block.len();
                    rolling = false;
                }
            }
        }
        // With block_size == 1 the tail rule never fires.
        if !literal.is_empty() {
            tokens.push(Token::Literal(literal));
        }

        log_token_stats(&tokens);
        tokens
    }

    /// Rebuild the target from `dictionary` and `tokens`.
    pub fn decode(&self, dictionary: &str, tokens: &[Token]) -> Result<String, CodecError> {
        apply_tokens(dictionary, tokens)
    }
}
