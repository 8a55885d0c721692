//! Module FQN derivation from file paths

const SOURCE_SUFFIXES: &[&str] = &[".py", ".pyi", ".ts", ".tsx", ".js", ".java", ".kt", ".rs", ".go"];
const ROOT_PREFIXES: &[&str] = &["./", "src/", "lib/"];

/// Build a dotted module path from a file path: strip the language suffix
/// and root prefix, replace separators with dots, and drop `__init__`.
///
/// `src/myapp/auth/__init__.py` → `myapp.auth`
/// `myapp/main.py` → `myapp.main`
pub fn module_path_from_file(file_path: &str) -> String {
    let mut path = file_path;
    for prefix in ROOT_PREFIXES {
        if let Some(stripped) = path.strip_prefix(prefix) {
            path = stripped;
            break;
        }
    }

    let mut path = path.to_string();
    for suffix in SOURCE_SUFFIXES {
        if let Some(stripped) = path.strip_suffix(suffix) {
            path = stripped.to_string();
            break;
        }
    }

    let mut dotted = path.replace(['/', '\\'], ".");
    if let Some(stripped) = dotted.strip_suffix(".__init__") {
        dotted = stripped.to_string();
    } else if dotted == "__init__" {
        dotted = String::new();
    }
    dotted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_module() {
        assert_eq!(module_path_from_file("myapp/main.py"), "myapp.main");
    }

    #[test]
    fn test_src_prefix_stripped() {
        assert_eq!(module_path_from_file("src/myapp/main.py"), "myapp.main");
    }

    #[test]
    fn test_init_dropped() {
        assert_eq!(module_path_from_file("myapp/auth/__init__.py"), "myapp.auth");
    }

    #[test]
    fn test_other_languages() {
        assert_eq!(module_path_from_file("pkg/util.go"), "pkg.util");
        assert_eq!(module_path_from_file("com/example/App.java"), "com.example.App");
    }
}
