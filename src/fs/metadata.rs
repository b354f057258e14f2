use std::io::Read;

use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use tracing::{error, info, span, Level};

use crate::{
    fs::ObjectFS,
    model::{
        config::{ChecksumAlgo, Config},
        entry::{FileAttributes, Visibility},
        fs::{FSError, MetadataKind},
    },
    util::{mime, object},
};

const CHUNK_SIZE: usize = 64 * 1024;

impl ObjectFS {
    /// Extension first, then the object's leading bytes. The store's own
    /// content type is not trusted.
    pub fn mime_type(&self, path: &str) -> Result<FileAttributes, FSError> {
        let span = span!(Level::INFO, "mime_type", context = "mime_type");
        let _e = span.enter();
        info!(path = path, "called");

        let path = object::normalize_path(path)?;
        self.require_object(&path, MetadataKind::MimeType)?;

        let mime_type = match mime::detect_from_path(&path) {
            Some(mime_type) => Some(mime_type),
            None => {
                let mut head = Vec::new();
                self.client
                    .fs_read_stream(&path)
                    .and_then(|reader| {
                        reader
                            .take(mime::SNIFF_LEN)
                            .read_to_end(&mut head)
                            .map_err(|err| FSError::ReadFailure {
                                location: path.clone(),
                                reason: err.to_string(),
                            })
                    })
                    .map_err(|err| FSError::metadata(&path, MetadataKind::MimeType, err))?;

                mime::detect_from_content(&head)
            }
        };

        match mime_type {
            Some(mime_type) => {
                let mut attributes = FileAttributes::new(&path);
                attributes.mime_type = Some(mime_type);
                Ok(attributes)
            }
            None => {
                let err = FSError::metadata(&path, MetadataKind::MimeType, "unknown content");
                error!(error_message = %err, error_group = err.group());
                Err(err)
            }
        }
    }

    /// The store's timestamp shifted by `last_modified_skew`.
    pub fn last_modified(&self, path: &str) -> Result<FileAttributes, FSError> {
        let span = span!(Level::INFO, "last_modified", context = "last_modified");
        let _e = span.enter();
        info!(path = path, "called");

        let path = object::normalize_path(path)?;
        let mut attributes = self.head(&path, MetadataKind::LastModified)?;

        let shifted = match attributes.last_modified {
            Some(timestamp) => i64::try_from(self.last_modified_skew.as_secs())
                .ok()
                .and_then(|skew| timestamp.checked_add(skew))
                .ok_or_else(|| {
                    FSError::metadata(&path, MetadataKind::LastModified, "timestamp out of range")
                }),
            None => Err(FSError::metadata(
                &path,
                MetadataKind::LastModified,
                "no timestamp reported",
            )),
        };

        attributes.last_modified = Some(
            shifted.inspect_err(|err| error!(error_message = %err, error_group = err.group()))?,
        );

        Ok(attributes)
    }

    pub fn file_size(&self, path: &str) -> Result<FileAttributes, FSError> {
        let span = span!(Level::INFO, "file_size", context = "file_size");
        let _e = span.enter();
        info!(path = path, "called");

        let path = object::normalize_path(path)?;
        let attributes = self.head(&path, MetadataKind::FileSize)?;

        if attributes.file_size.is_none() {
            return Err(FSError::metadata(
                &path,
                MetadataKind::FileSize,
                "no size reported",
            ));
        }

        Ok(attributes)
    }

    /// Every object in a storage zone is public.
    pub fn visibility(&self, path: &str) -> Result<FileAttributes, FSError> {
        let span = span!(Level::INFO, "visibility", context = "visibility");
        let _e = span.enter();
        info!(path = path, "called");

        let path = object::normalize_path(path)?;
        self.require_object(&path, MetadataKind::Visibility)?;

        let mut attributes = FileAttributes::new(&path);
        attributes.visibility = Some(Visibility::Public);

        Ok(attributes)
    }

    pub fn set_visibility(&self, path: &str, visibility: Visibility) -> Result<(), FSError> {
        let span = span!(Level::INFO, "set_visibility", context = "set_visibility");
        let _e = span.enter();
        info!(path = path, visibility = %visibility, "called");

        let err = FSError::UnsupportedOperation {
            location: path.to_string(),
            reason: "not supported!".to_string(),
        };
        error!(error_message = %err, error_group = err.group());

        Err(err)
    }

    /// Hex digest of the full content, streamed; store ETags are ignored.
    pub fn checksum(&self, path: &str, config: &Config) -> Result<String, FSError> {
        let span = span!(Level::INFO, "checksum", context = "checksum");
        let _e = span.enter();
        info!(path = path, algo = ?config.checksum_algo, "called");

        let path = object::normalize_path(path)?;
        let mut reader = self
            .client
            .fs_read_stream(&path)
            .inspect_err(|err| error!(error_message = %err, error_group = err.group()))?;

        match config.checksum_algo {
            ChecksumAlgo::Md5 => digest_stream::<Md5>(&mut reader, &path),
            ChecksumAlgo::Sha1 => digest_stream::<Sha1>(&mut reader, &path),
            ChecksumAlgo::Sha256 => digest_stream::<Sha256>(&mut reader, &path),
        }
    }

    fn require_object(&self, path: &str, kind: MetadataKind) -> Result<(), FSError> {
        let result = match self.client.fs_object_exists(path) {
            Ok(true) => Ok(()),
            Ok(false) => Err(FSError::metadata(path, kind, "object does not exist")),
            Err(err) => Err(FSError::metadata(path, kind, err)),
        };

        result.inspect_err(|err| error!(error_message = %err, error_group = err.group()))
    }

    fn head(&self, path: &str, kind: MetadataKind) -> Result<FileAttributes, FSError> {
        let result = match self.client.fs_head_object(path) {
            Ok(Some(attributes)) => Ok(attributes),
            Ok(None) => Err(FSError::metadata(path, kind, "object does not exist")),
            Err(err) => Err(FSError::metadata(path, kind, err)),
        };

        result.inspect_err(|err| error!(error_message = %err, error_group = err.group()))
    }
}

fn digest_stream<D: Digest>(reader: &mut dyn Read, location: &str) -> Result<String, FSError> {
    let mut hasher = D::new();
    let mut buf = vec![0u8; CHUNK_SIZE];

    loop {
        let n = reader.read(&mut buf).map_err(|err| FSError::ReadFailure {
            location: location.to_string(),
            reason: err.to_string(),
        })?;
        if n == 0 {
            break;
        }

        hasher.update(&buf[..n]);
    }

    Ok(hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect())
}
