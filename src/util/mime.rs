/// Bytes read from an object when its extension says nothing about its type.
pub const SNIFF_LEN: u64 = 8192;

pub fn detect_from_path(path: &str) -> Option<String> {
    mime_guess::from_path(path).first_raw().map(str::to_string)
}

pub fn detect_from_content(bytes: &[u8]) -> Option<String> {
    if bytes.is_empty() {
        return Some("application/x-empty".to_string());
    }

    if let Some(kind) = infer::get(bytes) {
        return Some(kind.mime_type().to_string());
    }

    if bytes.contains(&0) {
        return None;
    }

    // a multi-byte char may be cut off at the end of the sniffed window
    match std::str::from_utf8(bytes) {
        Ok(_) => Some("text/plain".to_string()),
        Err(err) if err.error_len().is_none() => Some("text/plain".to_string()),
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_from_path() {
        let cases = vec![
            ("a/b.txt", Some("text/plain")),
            ("index.html", Some("text/html")),
            ("image.png", Some("image/png")),
            ("archive", None),
            ("dir/noext", None),
        ];

        for (input, expected) in cases {
            let result = detect_from_path(input);
            assert_eq!(result.as_deref(), expected, "failed for case: {}", input);
        }
    }

    #[test]
    fn test_detect_from_content() {
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];
        let cases: Vec<(&str, &[u8], Option<&str>)> = vec![
            ("png", &png, Some("image/png")),
            ("text", b"testing1982", Some("text/plain")),
            ("empty", b"", Some("application/x-empty")),
            ("binary", &[0x00, 0xff, 0x13, 0x37], None),
            ("cut utf8", &[b'a', 0xe2, 0x82], Some("text/plain")),
        ];

        for (name, input, expected) in cases {
            let result = detect_from_content(input);
            assert_eq!(result.as_deref(), expected, "failed for case: {}", name);
        }
    }
}
