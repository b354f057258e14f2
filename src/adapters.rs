use std::io::{Cursor, Read};

use crate::{
    model::{config::Config, entry::Entry, entry::FileAttributes, fs::FSError},
    util::prefix::PathPrefixer,
};

pub mod mock;
pub mod s3;

/// Primitive operations of a flat object store.
///
/// Every key handed to an adapter is relative to the storage root; the adapter
/// applies its own subfolder prefix. None of these calls know about directories
/// beyond the one level listing and the recursive delete of a `/` terminated key.
pub trait ObjectAdapter: Send + Sync {
    fn fs_head_object(&self, key: &str) -> Result<Option<FileAttributes>, FSError>;

    fn fs_object_exists(&self, key: &str) -> Result<bool, FSError> {
        Ok(self.fs_head_object(key)?.is_some())
    }

    fn fs_read_object(&self, key: &str) -> Result<Vec<u8>, FSError>;

    fn fs_read_stream(&self, key: &str) -> Result<Box<dyn Read + Send>, FSError> {
        Ok(Box::new(Cursor::new(self.fs_read_object(key)?)))
    }

    fn fs_write_object(&self, key: &str, body: Vec<u8>, config: &Config) -> Result<(), FSError>;

    /// Removes `key`. A key ending in `/` removes every object under that prefix,
    /// its directory marker included.
    fn fs_delete_object(&self, key: &str) -> Result<(), FSError>;

    /// Entries directly under `path`, following every page the store returns.
    fn fs_list_one_level(&self, path: &str) -> Result<Vec<Entry>, FSError>;

    fn fs_copy_object(&self, source: &str, destination: &str, config: &Config)
        -> Result<(), FSError>;

    fn fs_move_object(
        &self,
        source: &str,
        destination: &str,
        config: &Config,
    ) -> Result<(), FSError> {
        self.fs_copy_object(source, destination, config)?;
        self.fs_delete_object(source)
    }
}

/// What a delete of `key` removes once the subfolder has been applied.
#[derive(Debug, PartialEq, Eq)]
pub enum DeleteTarget {
    Object(String),
    /// Every object whose key starts with the prefix.
    Prefix(String),
}

/// Resolves a delete key. The storage root is never a delete target, whatever
/// the subfolder.
pub fn delete_target(prefixer: &PathPrefixer, key: &str) -> Result<DeleteTarget, FSError> {
    if key.trim_matches('/').is_empty() {
        return Err(FSError::UnsupportedOperation {
            location: key.to_string(),
            reason: "refusing to delete the storage root".to_string(),
        });
    }

    if key.ends_with('/') {
        Ok(DeleteTarget::Prefix(prefixer.prefix_directory_path(key)))
    } else {
        Ok(DeleteTarget::Object(prefixer.prefix_path(key)))
    }
}
