//! Test code detection

/// A symbol is test code when its file or its own name follows the test
/// conventions of the supported languages.
pub fn is_test_symbol(name: &str, file_path: &str) -> bool {
    is_test_file(file_path) || name.starts_with("test_") || name.ends_with("_test")
}

pub fn is_test_file(file_path: &str) -> bool {
    let lowered = file_path.to_lowercase();
    if lowered.contains("/tests/") || lowered.contains("/test/") || lowered.starts_with("tests/") {
        return true;
    }
    let file_name = lowered.rsplit('/').next().unwrap_or(&lowered);
    file_name.starts_with("test_")
        || file_name.ends_with("_test.py")
        || file_name.ends_with("_test.go")
        || file_name.ends_with(".test.ts")
        || file_name.ends_with(".spec.ts")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_detection() {
        assert!(is_test_file("tests/test_auth.py"));
        assert!(is_test_file("pkg/handler_test.go"));
        assert!(is_test_file("src/app.test.ts"));
        assert!(!is_test_file("src/auth.py"));
    }

    #[test]
    fn test_symbol_detection() {
        assert!(is_test_symbol("test_login", "src/auth.py"));
        assert!(is_test_symbol("login", "tests/helpers.py"));
        assert!(!is_test_symbol("login", "src/auth.py"));
    }
}
