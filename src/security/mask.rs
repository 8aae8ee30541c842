const MASK_CHAR: char = '*';
const VISIBLE_EDGE: usize = 4;

/// Mask a secret for logs: keep the first and last four characters and
/// replace the rest with `*`. Keys of eight characters or fewer are masked
/// entirely. Length is preserved, counted in characters.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let len = chars.len();

    if len <= VISIBLE_EDGE * 2 {
        return MASK_CHAR.to_string().repeat(len);
    }

    let mut masked = String::with_capacity(key.len());
    masked.extend(&chars[..VISIBLE_EDGE]);
    masked.extend(std::iter::repeat(MASK_CHAR).take(len - VISIBLE_EDGE * 2));
    masked.extend(&chars[len - VISIBLE_EDGE..]);
    masked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_keys_fully_masked() {
        for key in ["", "a", "abcd", "abcdefgh"] {
            let masked = mask_key(key);
            assert_eq!(masked.chars().count(), key.chars().count());
            assert!(masked.chars().all(|c| c == '*'));
        }
    }

    #[test]
    fn test_long_key_keeps_edges() {
        assert_eq!(mask_key("abcdefghi"), "abcd*fghi");
        assert_eq!(
            mask_key("18c98a659a174bd68c6380751ff821ac"),
            "18c9************************21ac"
        );
    }

    #[test]
    fn test_masked_length_matches() {
        let key = "k".repeat(40);
        let masked = mask_key(&key);
        assert_eq!(masked.len(), 40);
        assert_eq!(masked.matches('*').count(), 32);
    }

    #[test]
    fn test_multibyte_key() {
        assert_eq!(mask_key("ééééxxééé"), "éééé*xééé");
    }
}
