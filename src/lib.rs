pub mod adapters;
pub mod config;
pub mod fs;
pub mod logging;
pub mod model;
pub mod util;

pub use adapters::ObjectAdapter;
pub use fs::ObjectFS;
pub use model::{
    config::{ChecksumAlgo, Config},
    entry::{DirectoryAttributes, Entry, FileAttributes, Visibility},
    fs::FSError,
};
