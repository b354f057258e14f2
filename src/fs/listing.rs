use std::vec;

use tracing::{debug, error, info, span, Level};

use crate::{
    fs::ObjectFS,
    model::{entry::Entry, fs::FSError},
    util::object,
};

/// Lazy pre-order walk over one level listings.
///
/// The store only lists a single level, so a deep walk lists each directory as
/// soon as it has been yielded and drains its entries before the remaining
/// siblings.
pub struct ListContents<'a> {
    fs: &'a ObjectFS,
    deep: bool,
    pending: Option<Result<String, FSError>>,
    stack: Vec<vec::IntoIter<Entry>>,
}

impl<'a> ListContents<'a> {
    fn new(fs: &'a ObjectFS, path: &str, deep: bool) -> Self {
        Self {
            fs,
            deep,
            pending: Some(object::normalize_path(path)),
            stack: Vec::new(),
        }
    }
}

impl Iterator for ListContents<'_> {
    type Item = Result<Entry, FSError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(pending) = self.pending.take() {
            let listed = pending.and_then(|path| {
                debug!(path = %path, "list_one_level");
                self.fs.client.fs_list_one_level(&path)
            });

            match listed {
                Ok(entries) => self.stack.push(entries.into_iter()),
                Err(err) => {
                    error!(error_message = %err, error_group = err.group());
                    self.stack.clear();
                    return Some(Err(err));
                }
            }
        }

        loop {
            let level = self.stack.last_mut()?;

            match level.next() {
                Some(entry) => {
                    if self.deep && entry.is_dir() {
                        self.pending = Some(Ok(entry.path().to_string()));
                    }

                    return Some(Ok(entry));
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

impl ObjectFS {
    pub fn list_contents(&self, path: &str, deep: bool) -> ListContents<'_> {
        let span = span!(Level::INFO, "list_contents", context = "list_contents");
        let _e = span.enter();
        info!(path = path, deep = deep, "called");

        ListContents::new(self, path, deep)
    }

    /// True when the parent's listing holds a directory with the same final segment.
    pub fn directory_exists(&self, path: &str) -> Result<bool, FSError> {
        let span = span!(Level::INFO, "directory_exists", context = "directory_exists");
        let _e = span.enter();
        info!(path = path, "called");

        let path = object::normalize_path(path)?;
        if path.is_empty() {
            return Ok(true);
        }

        let (parent, name) = object::split_path(&path);

        for entry in self.list_contents(parent, false) {
            let entry = entry?;
            if entry.is_dir() && object::split_path(entry.path()).1 == name {
                return Ok(true);
            }
        }

        Ok(false)
    }
}
