use tracing::{info, span, Level};

use crate::{
    fs::{ListContents, ObjectFS},
    model::fs::FSError,
    util::object,
};

/// Object keys a path stands for: every file below it, or the path itself
/// when nothing is below it.
pub struct Files<'a> {
    contents: ListContents<'a>,
    source: Option<String>,
    found: bool,
}

impl Iterator for Files<'_> {
    type Item = Result<String, FSError>;

    fn next(&mut self) -> Option<Self::Item> {
        for entry in self.contents.by_ref() {
            match entry {
                Ok(entry) if entry.is_file() => {
                    self.found = true;
                    return Some(Ok(entry.path().to_string()));
                }
                Ok(_) => continue,
                Err(err) => {
                    self.source = None;
                    return Some(Err(err));
                }
            }
        }

        if self.found {
            return None;
        }

        self.source.take().map(Ok)
    }
}

impl ObjectFS {
    pub fn files(&self, path: &str) -> Files<'_> {
        let span = span!(Level::INFO, "files", context = "files");
        let _e = span.enter();
        info!(path = path, "called");

        Files {
            contents: self.list_contents(path, true),
            source: object::normalize_path(path).ok(),
            found: false,
        }
    }
}
