use regex::Regex;

/// Longest URI accepted in credential fields.
pub const MAX_URI_LEN: usize = 2048;

pub fn validate_string(s: &str, min_len: usize, max_len: usize) -> bool {
    (min_len..=max_len).contains(&s.len())
}

/// A scheme followed by a non-empty, whitespace free remainder.
pub fn validate_uri(uri: &str, max_len: usize) -> bool {
    lazy_static::lazy_static! {
        static ref RE: Regex = Regex::new(r"^[[:word:]]+:/?/?[[:^space:]]+$").unwrap();
    }
    validate_string(uri, 1, max_len) && RE.is_match(uri)
}
