pub mod types;
pub mod hash;
pub mod block;
pub mod dictionary;
pub mod codec;
pub mod apply;
pub mod encoding;

// Re-exports for convenience
pub use types::{
    delta_summary, CodecError, CodecOptions, DeltaSummary, Token, DEFAULT_BLOCK_SIZE,
    DELTA_MAGIC, HASH_BASE, HASH_MOD,
};
pub use hash::{fingerprint, power_mod, BlockHasher, RollingHash};
pub use block::{Block, BlockText};
pub use dictionary::Dictionary;
pub use codec::Codec;
pub use apply::{apply_tokens, apply_tokens_to, output_size};
pub use encoding::{
    decode_tokens, encode_tokens, from_json, is_binary_delta, to_json, tokens_from_elements,
    tokens_to_elements, Element,
};
