//! Host allow-list
//!
//! Only imports whose first path element is an allow-listed host are
//! treated as external and inlined. Standard-library paths have no host.

/// Hosts inlined when no configuration says otherwise.
pub const DEFAULT_HOSTS: &[&str] = &["github.com", "golang.org"];

/// The host element of an import path (`github.com` for
/// `github.com/samber/lo`). Standard-library paths (`fmt`, `math/rand`)
/// have none.
pub fn host_of(import_path: &str) -> Option<&str> {
    let first = import_path.split('/').next()?;
    first.contains('.').then_some(first)
}

pub fn is_allowed(host: &str, allow_list: &[String]) -> bool {
    allow_list.iter().any(|h| h == host)
}

/// True if `import_path` comes from an allow-listed host.
pub fn is_external(import_path: &str, allow_list: &[String]) -> bool {
    host_of(import_path).is_some_and(|host| is_allowed(host, allow_list))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> Vec<String> {
        DEFAULT_HOSTS.iter().map(|h| h.to_string()).collect()
    }

    #[test]
    fn test_host_of() {
        assert_eq!(host_of("github.com/samber/lo"), Some("github.com"));
        assert_eq!(host_of("golang.org/x/exp/maps"), Some("golang.org"));
        assert_eq!(host_of("math/rand"), None);
        assert_eq!(host_of("fmt"), None);
    }

    #[test]
    fn test_is_external() {
        let hosts = defaults();
        assert!(is_external("github.com/samber/lo", &hosts));
        assert!(!is_external("gopkg.in/yaml.v3", &hosts));
        assert!(!is_external("strings", &hosts));
    }
}
