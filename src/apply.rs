use crate::types::{CodecError, Token};

/// Compute the total output size (in chars) of a token sequence.
///
/// Saturates at `usize::MAX` for lengths no dictionary could satisfy.
pub fn output_size(tokens: &[Token]) -> usize {
    tokens
        .iter()
        .map(Token::output_len)
        .fold(0, usize::saturating_add)
}

/// Output bytes to reserve before replay.
///
/// Each copy counts at most the dictionary's byte length, and the total
/// at most the dictionary plus all literal bytes.
fn reserve_size(dictionary: &str, tokens: &[Token]) -> usize {
    tokens
        .iter()
        .map(|token| match token {
            Token::Copy { length, .. } => (*length).min(dictionary.len()),
            Token::Literal(text) => text.len(),
        })
        .fold(0, usize::saturating_add)
        .min(dictionary.len().saturating_add(literal_bytes(tokens)))
}

fn literal_bytes(tokens: &[Token]) -> usize {
    tokens
        .iter()
        .filter_map(|token| match token {
            Token::Literal(text) => Some(text.len()),
            Token::Copy { .. } => None,
        })
        .fold(0, usize::saturating_add)
}

/// Replay tokens against the dictionary, appending to `out`.
///
/// Copies outside the dictionary are rejected rather than clamped.
/// Returns the number of chars appended.
pub fn apply_tokens_to(
    dictionary: &[char],
    tokens: &[Token],
    out: &mut String,
) -> Result<usize, CodecError> {
    let mut written = 0;
    for token in tokens {
        match token {
            Token::Literal(text) => {
                out.push_str(text);
                written += text.chars().count();
            }
            Token::Copy { offset, length } => {
                let span = offset
                    .checked_add(*length)
                    .and_then(|end| dictionary.get(*offset..end))
                    .ok_or(CodecError::CopyOutOfRange {
                        offset: *offset,
                        length: *length,
                        dictionary_len: dictionary.len(),
                    })?;
                out.extend(span);
                written += length;
            }
        }
    }
    Ok(written)
}

/// Reconstruct the target from the dictionary and a token sequence.
///
/// An empty sequence means the target equals the dictionary.
pub fn apply_tokens(dictionary: &str, tokens: &[Token]) -> Result<String, CodecError> {
    if tokens.is_empty() {
        return Ok(dictionary.to_owned());
    }
    let dict: Vec<char> = dictionary.chars().collect();
    let mut out = String::with_capacity(reserve_size(dictionary, tokens));
    apply_tokens_to(&dict, tokens, &mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_tokens_yield_dictionary() {
        assert_eq!(apply_tokens("abcdef", &[]).unwrap(), "abcdef");
    }

    #[test]
    fn test_replay_mixed() {
        let tokens = vec![
            Token::Copy { offset: 3, length: 3 },
            Token::Literal("ghi".into()),
            Token::Copy { offset: 0, length: 3 },
        ];
        assert_eq!(apply_tokens("abcdef", &tokens).unwrap(), "defghiabc");
        assert_eq!(output_size(&tokens), 9);
    }

    #[test]
    fn test_copy_offsets_are_char_based() {
        let tokens = vec![Token::Copy { offset: 1, length: 2 }];
        assert_eq!(apply_tokens("αβγδ", &tokens).unwrap(), "βγ");
    }

    #[test]
    fn test_empty_literal_yields_empty_text() {
        assert_eq!(apply_tokens("abc", &[Token::Literal(String::new())]).unwrap(), "");
    }

    #[test]
    fn test_copy_out_of_range_rejected() {
        let err = apply_tokens("abc", &[Token::Copy { offset: 2, length: 5 }]).unwrap_err();
        assert!(matches!(
            err,
            CodecError::CopyOutOfRange { offset: 2, length: 5, dictionary_len: 3 }
        ));
        assert!(apply_tokens("abc", &[Token::Copy { offset: usize::MAX, length: 2 }]).is_err());
    }

    #[test]
    fn test_huge_copy_length_rejected() {
        let err = apply_tokens("abc", &[Token::Copy { offset: 0, length: usize::MAX }]).unwrap_err();
        assert!(matches!(
            err,
            CodecError::CopyOutOfRange { offset: 0, length: usize::MAX, dictionary_len: 3 }
        ));

        let half = usize::MAX / 2 + 1;
        let tokens = vec![
            Token::Copy { offset: 0, length: half },
            Token::Copy { offset: 0, length: half },
        ];
        assert_eq!(output_size(&tokens), usize::MAX);
        assert!(matches!(
            apply_tokens("abc", &tokens),
            Err(CodecError::CopyOutOfRange { dictionary_len: 3, .. })
        ));
    }

    #[test]
    fn test_reserve_size_is_capped() {
        let tokens = vec![
            Token::Literal("xy".into()),
            Token::Copy { offset: 0, length: usize::MAX },
        ];
        assert_eq!(reserve_size("abc", &tokens), 5);
        let repeated = vec![Token::Copy { offset: 0, length: 3 }; 4];
        assert_eq!(reserve_size("abc", &repeated), 3);
    }

    #[test]
    fn test_apply_to_appends() {
        let dict: Vec<char> = "hello".chars().collect();
        let mut out = String::from(">");
        let n = apply_tokens_to(&dict, &[Token::Copy { offset: 0, length: 4 }], &mut out).unwrap();
        assert_eq!(n, 4);
        assert_eq!(out, ">hell");
    }
}
