//! Module cache path escaping
//!
//! The module cache must work on case-insensitive file systems, so every
//! uppercase letter in a module path is stored as `!` followed by its
//! lowercase form: `github.com/BurntSushi/toml` lives under
//! `github.com/!burnt!sushi/toml@v1.3.2`.

/// Escape a module path or path segment for the module cache.
pub fn escape_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for c in path.chars() {
        if c.is_ascii_uppercase() {
            out.push('!');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Reverse [`escape_path`]. Returns `None` for malformed input (`!` not
/// followed by a lowercase letter, or a bare uppercase letter).
pub fn unescape_path(escaped: &str) -> Option<String> {
    let mut out = String::with_capacity(escaped.len());
    let mut chars = escaped.chars();
    while let Some(c) = chars.next() {
        match c {
            '!' => match chars.next() {
                Some(next) if next.is_ascii_lowercase() => out.push(next.to_ascii_uppercase()),
                _ => return None,
            },
            c if c.is_ascii_uppercase() => return None,
            c => out.push(c),
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_uppercase() {
        assert_eq!(
            escape_path("github.com/BurntSushi/toml"),
            "github.com/!burnt!sushi/toml"
        );
        assert_eq!(escape_path("github.com/samber/lo"), "github.com/samber/lo");
    }

    #[test]
    fn test_unescape() {
        assert_eq!(
            unescape_path("github.com/!burnt!sushi/toml").as_deref(),
            Some("github.com/BurntSushi/toml")
        );
        assert_eq!(unescape_path("bad!"), None);
        assert_eq!(unescape_path("Bad"), None);
    }
}
