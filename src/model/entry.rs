use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Visibility::Public => write!(f, "public"),
            Visibility::Private => write!(f, "private"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FileAttributes {
    pub path: String,
    pub file_size: Option<u64>,
    pub visibility: Option<Visibility>,
    /// Unix seconds.
    pub last_modified: Option<i64>,
    pub mime_type: Option<String>,
    pub extra_metadata: BTreeMap<String, String>,
}

impl FileAttributes {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DirectoryAttributes {
    pub path: String,
    pub visibility: Option<Visibility>,
    pub last_modified: Option<i64>,
    pub extra_metadata: BTreeMap<String, String>,
}

impl DirectoryAttributes {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            ..Default::default()
        }
    }
}

/// One listing result. Directories are synthetic: the store only has keys.
#[derive(Clone, Debug, PartialEq)]
pub enum Entry {
    File(FileAttributes),
    Directory(DirectoryAttributes),
}

impl Entry {
    pub fn path(&self) -> &str {
        match self {
            Entry::File(f) => &f.path,
            Entry::Directory(d) => &d.path,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Entry::File(_))
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Entry::Directory(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Entry::File(_) => "file",
            Entry::Directory(_) => "dir",
        }
    }

    pub fn last_modified(&self) -> Option<i64> {
        match self {
            Entry::File(f) => f.last_modified,
            Entry::Directory(d) => d.last_modified,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_kind() {
        let file = Entry::File(FileAttributes::new("a/b.txt"));
        let dir = Entry::Directory(DirectoryAttributes::new("a/c"));

        assert!(file.is_file());
        assert!(!file.is_dir());
        assert_eq!(file.kind(), "file");
        assert_eq!(file.path(), "a/b.txt");

        assert!(dir.is_dir());
        assert_eq!(dir.kind(), "dir");
        assert_eq!(dir.path(), "a/c");
    }
}
