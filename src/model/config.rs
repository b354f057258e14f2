use crate::model::entry::Visibility;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChecksumAlgo {
    #[default]
    Md5,
    Sha1,
    Sha256,
}

impl std::str::FromStr for ChecksumAlgo {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "md5" => Ok(ChecksumAlgo::Md5),
            "sha1" => Ok(ChecksumAlgo::Sha1),
            "sha256" => Ok(ChecksumAlgo::Sha256),
            other => Err(format!("unsupported checksum algorithm: {}", other)),
        }
    }
}

/// Per-operation options handed to the write and copy primitives.
#[derive(Clone, Debug, Default)]
pub struct Config {
    pub visibility: Option<Visibility>,
    pub mime_type: Option<String>,
    pub checksum_algo: ChecksumAlgo,
}

impl Config {
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }

    pub fn with_mime_type(mut self, mime_type: &str) -> Self {
        self.mime_type = Some(mime_type.to_string());
        self
    }

    pub fn with_checksum_algo(mut self, algo: ChecksumAlgo) -> Self {
        self.checksum_algo = algo;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_checksum_algo() {
        let cases = vec![
            ("md5", Some(ChecksumAlgo::Md5)),
            ("SHA1", Some(ChecksumAlgo::Sha1)),
            ("sha256", Some(ChecksumAlgo::Sha256)),
            ("crc32", None),
        ];

        for (input, expected) in cases {
            let result = input.parse::<ChecksumAlgo>().ok();
            assert_eq!(result, expected, "failed for case: {}", input);
        }
    }
}
