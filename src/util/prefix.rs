/// Rewrites root relative paths into store keys under a fixed subfolder and back.
#[derive(Clone, Debug, Default)]
pub struct PathPrefixer {
    prefix: String,
}

impl PathPrefixer {
    /// `prefix` is expected in normalized form, empty or ending in `/`.
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
        }
    }

    pub fn prefix_path(&self, path: &str) -> String {
        format!("{}{}", self.prefix, path.trim_start_matches('/'))
    }

    /// Key prefix that matches only objects strictly below `path`.
    pub fn prefix_directory_path(&self, path: &str) -> String {
        let path = path.trim_matches('/');

        if path.is_empty() {
            self.prefix.clone()
        } else {
            format!("{}{}/", self.prefix, path)
        }
    }

    pub fn strip_prefix<'a>(&self, key: &'a str) -> &'a str {
        key.strip_prefix(self.prefix.as_str()).unwrap_or(key)
    }

    pub fn strip_directory_prefix<'a>(&self, key: &'a str) -> &'a str {
        self.strip_prefix(key).trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_path() {
        let cases = vec![
            ("", "a/b.txt", "a/b.txt"),
            ("ci/v3/", "a/b.txt", "ci/v3/a/b.txt"),
            ("ci/v3/", "/a/b.txt", "ci/v3/a/b.txt"),
        ];

        for (prefix, path, expected) in cases {
            let prefixer = PathPrefixer::new(prefix);
            assert_eq!(prefixer.prefix_path(path), expected, "failed for case: {}", path);
        }
    }

    #[test]
    fn test_prefix_directory_path() {
        let cases = vec![
            ("", "", ""),
            ("", "a", "a/"),
            ("ci/", "", "ci/"),
            ("ci/", "a/c/", "ci/a/c/"),
        ];

        for (prefix, path, expected) in cases {
            let prefixer = PathPrefixer::new(prefix);
            assert_eq!(
                prefixer.prefix_directory_path(path),
                expected,
                "failed for case: {}",
                path
            );
        }
    }

    #[test]
    fn test_strip_prefix() {
        let prefixer = PathPrefixer::new("ci/");

        assert_eq!(prefixer.strip_prefix("ci/a/b.txt"), "a/b.txt");
        assert_eq!(prefixer.strip_prefix("other/a"), "other/a");
        assert_eq!(prefixer.strip_directory_prefix("ci/a/c/"), "a/c");
    }
}
