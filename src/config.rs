use std::{path::PathBuf, time::Duration};

use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::{adapters::s3::S3Settings, model::config::ChecksumAlgo, util::object};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Command line, every connection flag falls back to its environment variable.
#[derive(Parser, Debug)]
#[command(name = "cdnfs", version, about = "Filesystem operations on an S3 compatible storage zone")]
pub struct Args {
    /// Storage zone name, used as bucket and access key id
    #[arg(long, env = "CDNFS_STORAGE_NAME")]
    pub storage_name: String,

    /// Storage zone password
    #[arg(long, env = "CDNFS_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// S3 endpoint, `https://` is assumed when no scheme is given
    #[arg(long, env = "CDNFS_ENDPOINT", default_value = "storage.bunnycdn.com")]
    pub endpoint: String,

    /// Folder inside the storage zone every path is relative to
    #[arg(long, env = "CDNFS_SUBFOLDER", default_value = "")]
    pub subfolder: String,

    #[arg(long, env = "CDNFS_REGION", default_value = "us-east-1")]
    pub region: String,

    /// Seconds added to the timestamps the storage zone reports
    #[arg(long, env = "CDNFS_LAST_MODIFIED_SKEW", default_value_t = 5)]
    pub last_modified_skew: u64,

    /// Per request timeout in seconds
    #[arg(long, env = "CDNFS_REQUEST_TIMEOUT")]
    pub request_timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List a directory
    Ls {
        #[arg(long)]
        deep: bool,
        #[arg(default_value = "")]
        path: String,
    },
    /// Print a file to stdout
    Cat { path: String },
    /// Upload a local file
    Put { path: String, file: PathBuf },
    /// Copy a file or directory
    Cp { source: String, destination: String },
    /// Move a file or directory
    Mv { source: String, destination: String },
    /// Delete a file, missing files are ignored
    Rm { path: String },
    /// Delete a directory and everything below it
    Rmdir { path: String },
    /// Create an empty directory marker
    Mkdir { path: String },
    /// Print size, modification time, MIME type and visibility of a file
    Stat { path: String },
    /// Print the digest of a file's content
    Checksum {
        #[arg(long, default_value = "md5")]
        algo: ChecksumAlgo,
        path: String,
    },
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub s3: S3Settings,
    pub last_modified_skew: Duration,
}

impl AppConfig {
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let storage_name = args.storage_name.trim();
        if storage_name.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "storage name must be non-empty".to_string(),
            ));
        }

        let api_key = args.api_key.trim();
        if api_key.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "api key must be non-empty".to_string(),
            ));
        }

        let request_timeout = match args.request_timeout {
            Some(0) => {
                return Err(ConfigError::InvalidConfig(
                    "request timeout must be greater than zero".to_string(),
                ));
            }
            Some(seconds) => Some(Duration::from_secs(seconds)),
            None => None,
        };

        Ok(Self {
            s3: S3Settings {
                storage_name: storage_name.to_string(),
                api_key: api_key.to_string(),
                endpoint: object::normalize_endpoint(&args.endpoint),
                subfolder: object::normalize_subfolder(&args.subfolder),
                region: args.region.clone(),
                request_timeout,
            },
            last_modified_skew: Duration::from_secs(args.last_modified_skew),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_with(api_key: &str, extra: &[&str]) -> Args {
        let mut argv = vec!["cdnfs", "--storage-name", "zone", "--api-key", api_key];
        argv.extend_from_slice(extra);

        Args::try_parse_from(argv).unwrap()
    }

    fn parse(extra: &[&str]) -> Args {
        parse_with("secret", extra)
    }

    #[test]
    fn test_from_args() {
        let args = parse(&["--subfolder", "/ci/v3", "--endpoint", "storage.bunnycdn.com/", "ls"]);

        let config = AppConfig::from_args(&args).unwrap();

        assert_eq!(config.s3.storage_name, "zone");
        assert_eq!(config.s3.endpoint, "https://storage.bunnycdn.com");
        assert_eq!(config.s3.subfolder, "ci/v3/");
        assert_eq!(config.last_modified_skew, Duration::from_secs(5));
        assert_eq!(config.s3.request_timeout, None);
    }

    #[test]
    fn test_invalid_args() {
        let cases = vec![
            ("secret", vec!["--request-timeout", "0", "ls"]),
            (" ", vec!["ls"]),
        ];

        for (api_key, extra) in cases {
            let args = parse_with(api_key, &extra);
            assert!(AppConfig::from_args(&args).is_err(), "failed for case: {:?}", extra);
        }
    }

    #[test]
    fn test_parse_commands() {
        let cases = vec![
            (
                vec!["ls", "--deep", "a"],
                Command::Ls {
                    deep: true,
                    path: "a".to_string(),
                },
            ),
            (
                vec!["cp", "a", "z"],
                Command::Cp {
                    source: "a".to_string(),
                    destination: "z".to_string(),
                },
            ),
            (
                vec!["checksum", "--algo", "sha256", "a/b.txt"],
                Command::Checksum {
                    algo: ChecksumAlgo::Sha256,
                    path: "a/b.txt".to_string(),
                },
            ),
        ];

        for (extra, expected) in cases {
            let args = parse(&extra);
            assert_eq!(args.command, expected, "failed for case: {:?}", extra);
        }
    }
}
