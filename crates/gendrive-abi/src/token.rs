/// Wrapper for a model token (ID). Using a newtype avoids accidental
/// mixing with unrelated `i32`s and keeps conversions explicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct Token(pub i32);

// i32 matches the C ABI buffers (`Int32Array`). Backends with u32 vocabularies
// convert at the plugin boundary.

impl From<i32> for Token {
    #[inline]
    fn from(value: i32) -> Self {
        Token(value)
    }
}

impl From<Token> for i32 {
    #[inline]
    fn from(token: Token) -> i32 {
        token.0
    }
}

/// Raw ids for an ABI call.
#[inline]
pub fn raw_ids(tokens: &[Token]) -> Vec<i32> {
    tokens.iter().map(|t| t.0).collect()
}

/// Wrap raw ids coming back from a backend.
#[inline]
pub fn from_raw_ids(ids: &[i32]) -> Vec<Token> {
    ids.iter().copied().map(Token).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_ids_keep_order() {
        let toks = vec![Token(5), Token(-1), Token(42)];
        let raw = raw_ids(&toks);
        assert_eq!(raw, vec![5, -1, 42]);
        assert_eq!(from_raw_ids(&raw), toks);
    }
}
