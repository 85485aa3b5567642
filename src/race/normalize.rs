/// Reduces a submitted URL to the site identifier used for grouping.
///
/// Drops a leading `scheme://` (scheme made of word characters) or a bare
/// `//`, then keeps everything before the next `/`. No case folding or
/// decoding happens, so `https://Example.com/a` becomes `Example.com`.
pub fn normalize_site(raw: &str) -> &str {
    let rest = strip_scheme(raw);
    match rest.find('/') {
        Some(end) => &rest[..end],
        None => rest,
    }
}

fn strip_scheme(raw: &str) -> &str {
    if let Some(rest) = raw.strip_prefix("//") {
        return rest;
    }

    if let Some(pos) = raw.find("://") {
        let scheme = &raw[..pos];
        let is_word = !scheme.is_empty()
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if is_word {
            return &raw[pos + 3..];
        }
    }

    raw
}
