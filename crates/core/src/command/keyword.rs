//! Abbreviated keyword matching.

/// Whether `token` abbreviates `keyword`.
///
/// True iff `token` is a prefix of `keyword`, so `b`, `bit` and `bitrate`
/// all match `bitrate`. An empty token matches every keyword. Callers try
/// keywords in a fixed priority order and take the first hit; there is no
/// ambiguity detection.
pub fn matches(keyword: &str, token: &str) -> bool {
    keyword.starts_with(token)
}

/// Return the first keyword in `keywords` that `token` abbreviates.
pub fn first_match<'k>(keywords: &[&'k str], token: &str) -> Option<&'k str> {
    keywords.iter().copied().find(|kw| matches(kw, token))
}
