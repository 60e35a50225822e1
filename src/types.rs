use std::fmt;

use thiserror::Error;

// ============================================================================
// Constants
//
// Hash parameters:
//   HASH_BASE = polynomial multiplier for the rolling hash
//   HASH_MOD  = prime modulus (10^9 + 7)
// Block size: window length for hashing and the unit of dictionary indexing.
// All lengths and offsets count chars (Unicode scalar values).
// ============================================================================

pub const DEFAULT_BLOCK_SIZE: usize = 20;
pub const HASH_BASE: u64 = 257;
pub const HASH_MOD: u64 = 1_000_000_007;
pub const DELTA_MAGIC: &[u8; 4] = b"VCD\x01";
pub const DELTA_REC_END: u8 = 0;
pub const DELTA_REC_COPY: u8 = 1;
pub const DELTA_REC_LITERAL: u8 = 2;
pub const DELTA_HEADER_SIZE: usize = 8; // magic(4) + target_len(4)
pub const DELTA_U32_SIZE: usize = 4;

// ============================================================================
// Tokens
// ============================================================================

/// Codec output: copy a span of the dictionary or insert literal text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    Copy { offset: usize, length: usize },
    Literal(String),
}

impl Token {
    /// Number of chars this token contributes to the decoded text.
    pub fn output_len(&self) -> usize {
        match self {
            Token::Copy { length, .. } => *length,
            Token::Literal(text) => text.chars().count(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Copy { offset, length } => write!(f, "COPY(off={}, len={})", offset, length),
            Token::Literal(text) => {
                let n = text.chars().count();
                if n <= 20 {
                    write!(f, "LITERAL({:?})", text)
                } else {
                    write!(f, "LITERAL(len={})", n)
                }
            }
        }
    }
}

// ============================================================================
// Options
// ============================================================================

/// Codec configuration, applied before the first encode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodecOptions {
    pub block_size: usize,
    pub prime_base: u64,
    pub prime_modulus: u64,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            prime_base: HASH_BASE,
            prime_modulus: HASH_MOD,
        }
    }
}

// ============================================================================
// Error type
// ============================================================================

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("block size must be >= 1")]
    InvalidBlockSize,

    #[error("hash modulus must be >= 2, got {0}")]
    InvalidModulus(u64),

    #[error("rolling hash has no window to advance; call hash() first")]
    HashNotPrimed,

    #[error("copy (offset={offset}, length={length}) exceeds dictionary of {dictionary_len} chars")]
    CopyOutOfRange {
        offset: usize,
        length: usize,
        dictionary_len: usize,
    },

    #[error("copy offset at element {index} has no length")]
    DanglingCopy { index: usize },

    #[error("invalid delta format: {0}")]
    InvalidFormat(String),

    #[error("unexpected end of delta data")]
    UnexpectedEof,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Summary statistics
// ============================================================================

#[derive(Debug, Default, PartialEq, Eq)]
pub struct DeltaSummary {
    pub num_tokens: usize,
    pub num_copies: usize,
    pub num_literals: usize,
    pub copy_chars: usize,
    pub literal_chars: usize,
    pub total_output_chars: usize,
}

/// Count tokens and output chars. Char totals saturate at `usize::MAX`.
pub fn delta_summary(tokens: &[Token]) -> DeltaSummary {
    let mut num_copies = 0;
    let mut num_literals = 0;
    let mut copy_chars: usize = 0;
    let mut literal_chars: usize = 0;
    for token in tokens {
        match token {
            Token::Copy { length, .. } => {
                num_copies += 1;
                copy_chars = copy_chars.saturating_add(*length);
            }
            Token::Literal(text) => {
                num_literals += 1;
                literal_chars = literal_chars.saturating_add(text.chars().count());
            }
        }
    }
    DeltaSummary {
        num_tokens: tokens.len(),
        num_copies,
        num_literals,
        copy_chars,
        literal_chars,
        total_output_chars: copy_chars.saturating_add(literal_chars),
    }
}
