use std::{io::Read, sync::Arc, time::Duration};

use tracing::{error, info, span, Level};

use crate::{
    adapters::ObjectAdapter,
    model::{config::Config, fs::FSError},
    util::object,
};

mod expand;
mod listing;
mod metadata;
mod transfer;

pub use expand::Files;
pub use listing::ListContents;

/// Storage zones report `last_modified` a few seconds early.
pub const DEFAULT_LAST_MODIFIED_SKEW: Duration = Duration::from_secs(5);

/// Hierarchical filesystem view over a flat object store.
///
/// Paths are normalized before they reach the client, so `/a/b.txt` and `a/b.txt`
/// address the same object. Directories exist only as key prefixes and optional
/// `/` terminated marker objects.
pub struct ObjectFS {
    pub client: Arc<dyn ObjectAdapter>,
    pub last_modified_skew: Duration,
}

impl ObjectFS {
    pub fn new(client: Arc<dyn ObjectAdapter>) -> Self {
        Self {
            client,
            last_modified_skew: DEFAULT_LAST_MODIFIED_SKEW,
        }
    }

    pub fn with_last_modified_skew(mut self, skew: Duration) -> Self {
        self.last_modified_skew = skew;
        self
    }

    pub fn exists(&self, path: &str) -> Result<bool, FSError> {
        let span = span!(Level::INFO, "exists", context = "exists");
        let _e = span.enter();
        info!(path = path, "called");

        let path = object::normalize_path(path)?;

        self.client
            .fs_object_exists(&path)
            .inspect_err(|err| error!(error_message = %err, error_group = err.group()))
    }

    pub fn read(&self, path: &str) -> Result<Vec<u8>, FSError> {
        let span = span!(Level::INFO, "read", context = "read");
        let _e = span.enter();
        info!(path = path, "called");

        let path = object::normalize_path(path)?;

        self.client
            .fs_read_object(&path)
            .inspect_err(|err| error!(error_message = %err, error_group = err.group()))
    }

    pub fn read_stream(&self, path: &str) -> Result<Box<dyn Read + Send>, FSError> {
        let span = span!(Level::INFO, "read_stream", context = "read_stream");
        let _e = span.enter();
        info!(path = path, "called");

        let path = object::normalize_path(path)?;

        self.client
            .fs_read_stream(&path)
            .inspect_err(|err| error!(error_message = %err, error_group = err.group()))
    }

    pub fn write(&self, path: &str, contents: &[u8], config: &Config) -> Result<(), FSError> {
        let span = span!(Level::INFO, "write", context = "write");
        let _e = span.enter();
        info!(path = path, size = contents.len(), "called");

        let path = object::normalize_path(path)?;

        self.client
            .fs_write_object(&path, contents.to_vec(), config)
            .inspect_err(|err| error!(error_message = %err, error_group = err.group()))
    }

    /// Deleting an object that is already gone succeeds.
    pub fn delete(&self, path: &str) -> Result<(), FSError> {
        let span = span!(Level::INFO, "delete", context = "delete");
        let _e = span.enter();
        info!(path = path, "called");

        let path = object::normalize_path(path)?;

        self.delete_key(&path)
    }

    /// The root is rejected: it is the whole storage zone, or the whole subfolder.
    pub fn delete_directory(&self, path: &str) -> Result<(), FSError> {
        let span = span!(Level::INFO, "delete_directory", context = "delete_directory");
        let _e = span.enter();
        info!(path = path, "called");

        let path = object::normalize_path(path)?;
        reject_root(&path, "refusing to delete the root directory")?;

        self.delete_key(&object::directory_key(&path))
    }

    /// Writes an empty marker object so the directory shows up in listings.
    pub fn create_directory(&self, path: &str, config: &Config) -> Result<(), FSError> {
        let span = span!(Level::INFO, "create_directory", context = "create_directory");
        let _e = span.enter();
        info!(path = path, "called");

        let path = object::normalize_path(path)?;
        reject_root(&path, "the root directory always exists")?;

        self.client
            .fs_write_object(&object::directory_key(&path), Vec::new(), config)
            .inspect_err(|err| error!(error_message = %err, error_group = err.group()))
    }

    fn delete_key(&self, key: &str) -> Result<(), FSError> {
        match self.client.fs_delete_object(key) {
            Err(err) if err.is_not_found() => {
                info!(key = key, "already absent");
                Ok(())
            }
            Err(err) => {
                error!(error_message = %err, error_group = err.group());
                Err(err)
            }
            Ok(()) => Ok(()),
        }
    }
}

fn reject_root(path: &str, reason: &str) -> Result<(), FSError> {
    if !path.is_empty() {
        return Ok(());
    }

    let err = FSError::UnsupportedOperation {
        location: "/".to_string(),
        reason: reason.to_string(),
    };
    error!(error_message = %err, error_group = err.group());

    Err(err)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::adapters::mock::MockClient;

    pub(crate) fn setup() -> (Arc<MockClient>, ObjectFS) {
        let client = Arc::new(MockClient::new("ci/v3/"));
        let fs = ObjectFS::new(client.clone());

        (client, fs)
    }

    pub(crate) fn write(fs: &ObjectFS, path: &str, contents: &str) {
        fs.write(path, contents.as_bytes(), &Config::default())
            .unwrap();
    }

    #[test]
    fn test_file_processes() {
        let (_, fs) = setup();

        assert!(!fs.exists("testing/test.txt").unwrap());

        write(&fs, "testing/test.txt", "testing1982");

        assert!(fs.exists("testing/test.txt").unwrap());
        assert!(fs.exists("/testing/test.txt").unwrap());
        assert_eq!(fs.read("/testing/test.txt").unwrap(), b"testing1982".to_vec());

        fs.delete("testing/test.txt").unwrap();

        assert!(!fs.exists("testing/test.txt").unwrap());
    }

    #[test]
    fn test_overwriting_a_file() {
        let (_, fs) = setup();

        write(&fs, "path.txt", "old");
        write(&fs, "path.txt", "new");

        assert_eq!(fs.read("path.txt").unwrap(), b"new".to_vec());
    }

    #[test]
    fn test_read_missing_file() {
        let (_, fs) = setup();

        assert!(fs.read("missing.txt").unwrap_err().is_not_found());
    }

    #[test]
    fn test_read_stream() {
        let (_, fs) = setup();
        write(&fs, "a/b.txt", "streamed");

        let mut body = String::new();
        fs.read_stream("a/b.txt")
            .unwrap()
            .read_to_string(&mut body)
            .unwrap();

        assert_eq!(body, "streamed");
    }

    #[test]
    fn test_delete_missing_is_ok() {
        let cases = vec!["missing.txt", "a/b/c.txt", "dir/"];

        for path in cases {
            let (_, fs) = setup();
            assert!(fs.delete(path).is_ok(), "failed for case: {}", path);
            assert!(fs.delete_directory(path).is_ok(), "failed for case: {}", path);
        }
    }

    #[test]
    fn test_delete_directory() {
        let (client, fs) = setup();
        write(&fs, "a/b.txt", "x");
        write(&fs, "a/c/d.txt", "y");
        write(&fs, "ab.txt", "z");

        fs.delete_directory("a/").unwrap();

        assert_eq!(client.keys(), vec!["ci/v3/ab.txt".to_string()]);
        assert!(fs.exists("ab.txt").unwrap());
    }

    #[test]
    fn test_delete_root_directory_is_rejected() {
        let cases = vec![("", ""), ("", "/"), ("ci/", ""), ("ci/", "/"), ("ci/", "a/..")];

        for (subfolder, path) in cases {
            let client = Arc::new(MockClient::new(subfolder));
            let fs = ObjectFS::new(client.clone());
            write(&fs, "a/b.txt", "x");
            client.reset_calls();

            assert!(
                matches!(
                    fs.delete_directory(path),
                    Err(FSError::UnsupportedOperation { .. })
                ),
                "failed for case: {:?}",
                (subfolder, path)
            );
            assert_eq!(client.calls(), 0, "failed for case: {:?}", (subfolder, path));
            assert!(fs.exists("a/b.txt").unwrap(), "failed for case: {:?}", (subfolder, path));
        }
    }

    #[test]
    fn test_create_directory() {
        let (client, fs) = setup();

        fs.create_directory("a/empty", &Config::default()).unwrap();

        assert_eq!(client.keys(), vec!["ci/v3/a/empty/".to_string()]);
        assert!(fs.directory_exists("a/empty").unwrap());
        assert!(matches!(
            fs.create_directory("/", &Config::default()),
            Err(FSError::UnsupportedOperation { .. })
        ));
    }

    #[test]
    fn test_path_traversal_is_rejected() {
        let (client, fs) = setup();

        assert!(matches!(
            fs.read("../outside.txt"),
            Err(FSError::PathTraversal { .. })
        ));
        assert_eq!(client.calls(), 0);
    }
}
