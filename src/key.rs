//! Naming rules for storage keys and URL parameters.

#[cfg(test)]
#[path = "key_test.rs"]
mod key_test;

/// Prefix of path-scoped storage keys when no explicit prefix is configured.
pub const DEFAULT_PATH_STORAGE_PREFIX: &str = "urlStorage";

/// Convert an identifier to kebab-case for use as a URL parameter name.
///
/// Word boundaries are lower-to-upper transitions (`userId` -> `user-id`), the
/// end of an acronym (`URLValue` -> `url-value`), a digit followed by an upper
/// case letter, and any run of non-alphanumeric characters. Underscores and
/// other punctuation therefore become hyphens (`my_key` -> `my-key`), so a
/// parameter name only ever contains lowercase alphanumerics and `-`.
#[must_use]
pub fn kebab_case(ident: &str) -> String {
    let chars: Vec<char> = ident.chars().collect();
    let mut out = String::with_capacity(ident.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            push_separator(&mut out);
            continue;
        }
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower) {
                push_separator(&mut out);
            }
        }
        out.extend(c.to_lowercase());
    }

    while out.ends_with('-') {
        out.pop();
    }
    out
}

fn push_separator(out: &mut String) {
    if !out.is_empty() && !out.ends_with('-') {
        out.push('-');
    }
}

/// Storage key for a URL-bound value.
///
/// `<prefix>_<key>` when a prefix is given, otherwise the key is scoped to the
/// page: `urlStorage_<path>_<key>`.
#[must_use]
pub fn storage_key(prefix: Option<&str>, path: &str, key: &str) -> String {
    match prefix {
        Some(prefix) => format!("{prefix}_{key}"),
        None => format!("{DEFAULT_PATH_STORAGE_PREFIX}_{path}_{key}"),
    }
}
