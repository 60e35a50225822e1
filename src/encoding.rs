use serde::{Deserialize, Serialize};

use crate::types::{
    CodecError, Token, DELTA_HEADER_SIZE, DELTA_MAGIC, DELTA_REC_COPY, DELTA_REC_END,
    DELTA_REC_LITERAL, DELTA_U32_SIZE,
};

fn put_u32(out: &mut Vec<u8>, value: usize, what: &str) -> Result<(), CodecError> {
    let v = u32::try_from(value)
        .map_err(|_| CodecError::InvalidFormat(format!("{} {} does not fit in u32", what, value)))?;
    out.extend_from_slice(&v.to_be_bytes());
    Ok(())
}

fn read_u32(data: &[u8], pos: &mut usize) -> Result<usize, CodecError> {
    let bytes = data
        .get(*pos..*pos + DELTA_U32_SIZE)
        .ok_or(CodecError::UnexpectedEof)?;
    *pos += DELTA_U32_SIZE;
    Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize)
}

/// Encode tokens to the binary delta format.
///
/// Format:
///   Header: magic (4 bytes) + target_len in chars (u32 BE)
///   Records:
///     END:     type=0
///     COPY:    type=1, offset:u32, length:u32
///     LITERAL: type=2, byte_len:u32, UTF-8 bytes
pub fn encode_tokens(tokens: &[Token], target_len: usize) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::with_capacity(DELTA_HEADER_SIZE + tokens.len() * 9 + 1);
    out.extend_from_slice(DELTA_MAGIC);
    put_u32(&mut out, target_len, "target length")?;

    for token in tokens {
        match token {
            Token::Copy { offset, length } => {
                out.push(DELTA_REC_COPY);
                put_u32(&mut out, *offset, "copy offset")?;
                put_u32(&mut out, *length, "copy length")?;
            }
            Token::Literal(text) => {
                out.push(DELTA_REC_LITERAL);
                put_u32(&mut out, text.len(), "literal length")?;
                out.extend_from_slice(text.as_bytes());
            }
        }
    }

    out.push(DELTA_REC_END);
    Ok(out)
}

/// Decode the binary delta format.
///
/// Returns (tokens, target_len).
pub fn decode_tokens(data: &[u8]) -> Result<(Vec<Token>, usize), CodecError> {
    if !is_binary_delta(data) {
        return Err(CodecError::InvalidFormat("not a delta file".into()));
    }
    let mut pos = DELTA_MAGIC.len();
    let target_len = read_u32(data, &mut pos)?;
    let mut tokens = Vec::new();

    loop {
        let t = *data.get(pos).ok_or(CodecError::UnexpectedEof)?;
        pos += 1;

        match t {
            DELTA_REC_END => break,

            DELTA_REC_COPY => {
                let offset = read_u32(data, &mut pos)?;
                let length = read_u32(data, &mut pos)?;
                tokens.push(Token::Copy { offset, length });
            }

            DELTA_REC_LITERAL => {
                let n = read_u32(data, &mut pos)?;
                let bytes = data.get(pos..pos + n).ok_or(CodecError::UnexpectedEof)?;
                let text = std::str::from_utf8(bytes).map_err(|e| {
                    CodecError::InvalidFormat(format!("literal at byte {} is not UTF-8: {}", pos, e))
                })?;
                tokens.push(Token::Literal(text.to_owned()));
                pos += n;
            }

            _ => {
                return Err(CodecError::InvalidFormat(format!(
                    "unknown record type: {}",
                    t
                )));
            }
        }
    }

    Ok((tokens, target_len))
}

/// Check if data starts with the binary delta magic.
pub fn is_binary_delta(data: &[u8]) -> bool {
    data.len() >= DELTA_HEADER_SIZE && &data[..DELTA_MAGIC.len()] == DELTA_MAGIC
}

// ── flat interchange: ["def", 0, 3] ──────────────────────────────────────

/// One element of the flat token list: a literal, or half of a copy pair.
///
/// Offsets and lengths count chars (Unicode scalar values). Producers that
/// count UTF-16 code units disagree on any text outside the BMP.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Element {
    Number(usize),
    Text(String),
}

/// Flatten tokens: a copy becomes two consecutive numbers (offset, length).
pub fn tokens_to_elements(tokens: &[Token]) -> Vec<Element> {
    let mut out = Vec::with_capacity(tokens.len() * 2);
    for token in tokens {
        match token {
            Token::Copy { offset, length } => {
                out.push(Element::Number(*offset));
                out.push(Element::Number(*length));
            }
            Token::Literal(text) => out.push(Element::Text(text.clone())),
        }
    }
    out
}

/// Rebuild tokens from the flat form.
///
/// A number must be followed by a second number; anything else is a
/// `DanglingCopy` at the index of the first.
pub fn tokens_from_elements(elements: &[Element]) -> Result<Vec<Token>, CodecError> {
    let mut tokens = Vec::new();
    let mut it = elements.iter().enumerate();
    while let Some((index, element)) = it.next() {
        match element {
            Element::Text(text) => tokens.push(Token::Literal(text.clone())),
            Element::Number(offset) => match it.next() {
                Some((_, Element::Number(length))) => tokens.push(Token::Copy {
                    offset: *offset,
                    length: *length,
                }),
                _ => return Err(CodecError::DanglingCopy { index }),
            },
        }
    }
    Ok(tokens)
}

pub fn to_json(tokens: &[Token]) -> Result<String, CodecError> {
    Ok(serde_json::to_string(&tokens_to_elements(tokens))?)
}

pub fn from_json(s: &str) -> Result<Vec<Token>, CodecError> {
    let elements: Vec<Element> = serde_json::from_str(s)?;
    tokens_from_elements(&elements)
}
