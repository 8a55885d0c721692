//! Symbol visibility extraction

/// "public" | "internal" | "private" from naming conventions: dunder names
/// are interface-public, single leading underscores are private, `internal`
/// path segments mark internal modules.
pub fn visibility_of(name: &str, file_path: &str) -> &'static str {
    if file_path.contains("/internal/") || file_path.starts_with("internal/") {
        return "internal";
    }
    if name.starts_with("__") && name.ends_with("__") {
        return "public";
    }
    if name.starts_with('_') {
        return "private";
    }
    "public"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_rules() {
        assert_eq!(visibility_of("run", "m.py"), "public");
        assert_eq!(visibility_of("_helper", "m.py"), "private");
        assert_eq!(visibility_of("__init__", "m.py"), "public");
        assert_eq!(visibility_of("run", "pkg/internal/m.py"), "internal");
    }
}
