use std::{
    collections::{BTreeMap, HashSet},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex, MutexGuard,
    },
    time::SystemTime,
};

use crate::{
    adapters::{self, DeleteTarget, ObjectAdapter},
    model::{
        config::Config,
        entry::{DirectoryAttributes, Entry, FileAttributes},
        fs::FSError,
    },
    util::prefix::PathPrefixer,
};

const DEFAULT_PAGE_SIZE: usize = 1000;

#[derive(Clone, Debug)]
struct StoredObject {
    body: Vec<u8>,
    modified: i64,
    mime_type: Option<String>,
}

/// In-memory flat object store with the same key semantics as the S3 adapter.
#[derive(Debug)]
pub struct MockClient {
    prefixer: PathPrefixer,
    page_size: usize,
    objects: Mutex<BTreeMap<String, StoredObject>>,
    failing: Mutex<HashSet<String>>,
    now: Mutex<Option<i64>>,
    calls: AtomicUsize,
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new("")
    }
}

impl MockClient {
    pub fn new(subfolder: &str) -> Self {
        Self {
            prefixer: PathPrefixer::new(subfolder),
            page_size: DEFAULT_PAGE_SIZE,
            objects: Mutex::new(BTreeMap::new()),
            failing: Mutex::new(HashSet::new()),
            now: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of raw keys returned per listing page.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Pins the timestamp recorded on subsequent writes.
    pub fn set_now(&self, now: i64) {
        *lock(&self.now) = Some(now);
    }

    /// Makes every read and write of `key` fail.
    pub fn fail_on(&self, key: &str) {
        lock(&self.failing).insert(key.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn reset_calls(&self) {
        self.calls.store(0, Ordering::SeqCst);
    }

    /// Raw store keys, subfolder included.
    pub fn keys(&self) -> Vec<String> {
        lock(&self.objects).keys().cloned().collect()
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn timestamp(&self) -> i64 {
        match *lock(&self.now) {
            Some(now) => now,
            None => SystemTime::now()
                .duration_since(SystemTime::UNIX_EPOCH)
                .map(|d| d.as_secs() as i64)
                .unwrap_or(0),
        }
    }

    fn check_failing(&self, key: &str) -> Result<(), String> {
        if lock(&self.failing).contains(key) {
            return Err(format!("injected failure for: {}", key));
        }

        Ok(())
    }

    fn file_attributes(&self, key: &str, object: &StoredObject) -> FileAttributes {
        let mut attributes = FileAttributes::new(self.prefixer.strip_prefix(key));
        attributes.file_size = Some(object.body.len() as u64);
        attributes.last_modified = Some(object.modified);
        attributes.mime_type = object.mime_type.clone();
        attributes
            .extra_metadata
            .insert("StorageClass".to_string(), "STANDARD".to_string());

        attributes
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ObjectAdapter for MockClient {
    fn fs_head_object(&self, key: &str) -> Result<Option<FileAttributes>, FSError> {
        self.record_call();

        let full_key = self.prefixer.prefix_path(key);
        let objects = lock(&self.objects);

        Ok(objects
            .get(&full_key)
            .map(|object| self.file_attributes(&full_key, object)))
    }

    fn fs_read_object(&self, key: &str) -> Result<Vec<u8>, FSError> {
        self.record_call();

        self.check_failing(key)
            .map_err(|reason| FSError::ReadFailure {
                location: key.to_string(),
                reason,
            })?;

        let full_key = self.prefixer.prefix_path(key);
        match lock(&self.objects).get(&full_key) {
            Some(object) => Ok(object.body.clone()),
            None => Err(FSError::not_found(key)),
        }
    }

    fn fs_write_object(&self, key: &str, body: Vec<u8>, config: &Config) -> Result<(), FSError> {
        self.record_call();

        self.check_failing(key)
            .map_err(|reason| FSError::WriteFailure {
                location: key.to_string(),
                reason,
            })?;

        let object = StoredObject {
            body,
            modified: self.timestamp(),
            mime_type: config.mime_type.clone(),
        };
        lock(&self.objects).insert(self.prefixer.prefix_path(key), object);

        Ok(())
    }

    fn fs_delete_object(&self, key: &str) -> Result<(), FSError> {
        self.record_call();

        let target = adapters::delete_target(&self.prefixer, key)?;
        let mut objects = lock(&self.objects);

        match target {
            DeleteTarget::Prefix(prefix) => {
                let doomed: Vec<String> = objects
                    .keys()
                    .filter(|k| k.starts_with(&prefix))
                    .cloned()
                    .collect();

                if doomed.is_empty() {
                    return Err(FSError::not_found(key));
                }

                for k in doomed {
                    objects.remove(&k);
                }

                Ok(())
            }
            DeleteTarget::Object(full_key) => match objects.remove(&full_key) {
                Some(_) => Ok(()),
                None => Err(FSError::not_found(key)),
            },
        }
    }

    fn fs_list_one_level(&self, path: &str) -> Result<Vec<Entry>, FSError> {
        self.record_call();

        let dir_prefix = self.prefixer.prefix_directory_path(path);
        let objects = lock(&self.objects);
        let keys: Vec<&String> = objects
            .keys()
            .filter(|k| k.starts_with(&dir_prefix))
            .collect();

        let mut entries = Vec::new();
        let mut seen_dirs = HashSet::new();

        for page in keys.chunks(self.page_size) {
            for key in page {
                let rest = &key[dir_prefix.len()..];
                if rest.is_empty() {
                    continue;
                }

                match rest.find('/') {
                    Some(pos) => {
                        let dir_key = format!("{}{}", dir_prefix, &rest[..pos]);
                        if seen_dirs.insert(dir_key.clone()) {
                            entries.push(Entry::Directory(DirectoryAttributes::new(
                                self.prefixer.strip_prefix(&dir_key),
                            )));
                        }
                    }
                    None => {
                        if let Some(object) = objects.get(*key) {
                            entries.push(Entry::File(self.file_attributes(key, object)));
                        }
                    }
                }
            }
        }

        Ok(entries)
    }

    fn fs_copy_object(
        &self,
        source: &str,
        destination: &str,
        config: &Config,
    ) -> Result<(), FSError> {
        self.record_call();

        self.check_failing(source)
            .map_err(|reason| FSError::ReadFailure {
                location: source.to_string(),
                reason,
            })?;
        self.check_failing(destination)
            .map_err(|reason| FSError::WriteFailure {
                location: destination.to_string(),
                reason,
            })?;

        let mut objects = lock(&self.objects);
        let mut object = match objects.get(&self.prefixer.prefix_path(source)) {
            Some(object) => object.clone(),
            None => return Err(FSError::not_found(source)),
        };

        object.modified = self.timestamp();
        if config.mime_type.is_some() {
            object.mime_type = config.mime_type.clone();
        }
        objects.insert(self.prefixer.prefix_path(destination), object);

        Ok(())
    }
}
