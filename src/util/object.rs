use crate::model::fs::FSError;

/// Normalizes a caller supplied path into a root relative key.
///
/// Leading, trailing and repeated separators are dropped, `.` segments are
/// skipped and `..` pops the previous segment.
pub fn normalize_path(path: &str) -> Result<String, FSError> {
    let path = path.replace('\\', "/");
    let mut parts: Vec<&str> = Vec::new();

    for part in path.split('/') {
        match part {
            "" | "." => continue,
            ".." => {
                if parts.pop().is_none() {
                    return Err(FSError::PathTraversal {
                        location: path.to_string(),
                    });
                }
            }
            _ => parts.push(part),
        }
    }

    Ok(parts.join("/"))
}

/// Joins two root relative paths, either of which may be empty.
pub fn join_path(base: &str, rest: &str) -> String {
    let base = base.trim_end_matches('/');
    let rest = rest.trim_start_matches('/');

    if base.is_empty() {
        rest.to_string()
    } else if rest.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base, rest)
    }
}

/// Splits `path` into its parent and final segment.
pub fn split_path(path: &str) -> (&str, &str) {
    let path = path.trim_end_matches('/');

    match path.rfind('/') {
        Some(pos) => (&path[..pos], &path[pos + 1..]),
        None => ("", path),
    }
}

pub fn directory_key(path: &str) -> String {
    format!("{}/", path.trim_end_matches('/'))
}

pub fn normalize_endpoint(endpoint: &str) -> String {
    let endpoint = endpoint.trim();
    let endpoint = if endpoint.starts_with("http") {
        endpoint.to_string()
    } else {
        format!("https://{}", endpoint)
    };

    endpoint.trim_end_matches('/').to_string()
}

pub fn normalize_subfolder(subfolder: &str) -> String {
    let subfolder = subfolder.trim().trim_matches('/');

    if subfolder.is_empty() {
        String::new()
    } else {
        format!("{}/", subfolder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        let cases = vec![
            ("testing/test.txt", "testing/test.txt"),
            ("/testing/test.txt", "testing/test.txt"),
            ("a//b/", "a/b"),
            ("./a/./b", "a/b"),
            ("a/c/../b", "a/b"),
            ("a\\b", "a/b"),
            ("", ""),
            ("/", ""),
        ];

        for (input, expected) in cases {
            let result = normalize_path(input).unwrap();
            assert_eq!(result, expected, "failed for case: {}", input);
        }
    }

    #[test]
    fn test_normalize_path_traversal() {
        assert!(matches!(
            normalize_path("../etc/passwd"),
            Err(FSError::PathTraversal { .. })
        ));
        assert!(matches!(
            normalize_path("a/../../b"),
            Err(FSError::PathTraversal { .. })
        ));
    }

    #[test]
    fn test_join_path() {
        let cases = vec![
            ("z", "b.txt", "z/b.txt"),
            ("z", "/c/d.txt", "z/c/d.txt"),
            ("z", "", "z"),
            ("", "a/b.txt", "a/b.txt"),
            ("z/", "b.txt", "z/b.txt"),
        ];

        for (base, rest, expected) in cases {
            assert_eq!(join_path(base, rest), expected, "failed for case: {}", base);
        }
    }

    #[test]
    fn test_split_path() {
        let cases = vec![
            ("a/c", ("a", "c")),
            ("a/b/c/", ("a/b", "c")),
            ("a", ("", "a")),
            ("", ("", "")),
        ];

        for (input, expected) in cases {
            assert_eq!(split_path(input), expected, "failed for case: {}", input);
        }
    }

    #[test]
    fn test_normalize_endpoint() {
        let cases = vec![
            ("storage.bunnycdn.com", "https://storage.bunnycdn.com"),
            ("https://storage.bunnycdn.com/", "https://storage.bunnycdn.com"),
            ("http://localhost:9000", "http://localhost:9000"),
        ];

        for (input, expected) in cases {
            assert_eq!(normalize_endpoint(input), expected, "failed for case: {}", input);
        }
    }

    #[test]
    fn test_normalize_subfolder() {
        let cases = vec![
            ("", ""),
            ("ci/v3", "ci/v3/"),
            ("ci/v3/", "ci/v3/"),
            ("/ci/", "ci/"),
        ];

        for (input, expected) in cases {
            assert_eq!(normalize_subfolder(input), expected, "failed for case: {}", input);
        }
    }
}
