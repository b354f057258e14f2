use std::{
    io::{self, Read},
    sync::Arc,
    time::Duration,
};

use aws_config::{timeout::TimeoutConfig, BehaviorVersion, Region};
use aws_sdk_s3::{
    config::{Credentials, RequestChecksumCalculation, ResponseChecksumValidation},
    error::DisplayErrorContext,
    operation::list_objects_v2::ListObjectsV2Output,
    primitives::{ByteStream, DateTime},
    types::MetadataDirective,
};
use tracing::debug;

use crate::{
    adapters::{self, DeleteTarget, ObjectAdapter},
    model::{
        config::Config,
        entry::{DirectoryAttributes, Entry, FileAttributes},
        fs::FSError,
    },
    util::{mime, poll::Poller, prefix::PathPrefixer},
};

/// Connection settings for an S3 compatible storage zone.
#[derive(Clone, Debug)]
pub struct S3Settings {
    pub storage_name: String,
    pub api_key: String,
    /// Normalized, scheme included, no trailing `/`.
    pub endpoint: String,
    /// Normalized, empty or ending in `/`.
    pub subfolder: String,
    pub region: String,
    pub request_timeout: Option<Duration>,
}

pub struct S3Adapter {
    client: aws_sdk_s3::Client,
    bucket: String,
    prefixer: PathPrefixer,
    poller: Arc<Poller>,
}

impl S3Adapter {
    pub fn new(
        client: aws_sdk_s3::Client,
        bucket: &str,
        subfolder: &str,
        poller: Arc<Poller>,
    ) -> Self {
        Self {
            client,
            bucket: bucket.to_string(),
            prefixer: PathPrefixer::new(subfolder),
            poller,
        }
    }

    /// Builds a path style client for the storage zone. The storage name doubles
    /// as bucket and access key id.
    pub fn connect(settings: &S3Settings) -> io::Result<Self> {
        let poller = Arc::new(Poller::new()?);

        let credentials = Credentials::new(
            settings.storage_name.clone(),
            settings.api_key.clone(),
            None,
            None,
            "cdnfs",
        );

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .endpoint_url(settings.endpoint.clone())
            .credentials_provider(credentials);

        if let Some(timeout) = settings.request_timeout {
            loader = loader.timeout_config(
                TimeoutConfig::builder()
                    .operation_attempt_timeout(timeout)
                    .build(),
            );
        }

        let sdk_config = poller.poll_until_ready(loader.load());

        // storage zones reject aws-chunked uploads
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .request_checksum_calculation(RequestChecksumCalculation::WhenRequired)
            .response_checksum_validation(ResponseChecksumValidation::WhenRequired)
            .build();

        Ok(Self::new(
            aws_sdk_s3::Client::from_conf(s3_config),
            &settings.storage_name,
            &settings.subfolder,
            poller,
        ))
    }

    fn list_all_keys(&self, prefix: &str) -> Result<Vec<String>, FSError> {
        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let req = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .set_continuation_token(continuation_token.take());

            let lo = self
                .poller
                .poll_until_ready_error(req.send(), |err| FSError::ListFailure {
                    location: prefix.to_string(),
                    reason: DisplayErrorContext(&err).to_string(),
                })?;

            keys.extend(lo.contents().iter().filter_map(|o| o.key()).map(str::to_string));

            continuation_token = lo.next_continuation_token().map(str::to_string);
            if continuation_token.is_none() {
                break;
            }
        }

        Ok(keys)
    }
}

fn unix_secs(dt: Option<&DateTime>) -> Option<i64> {
    dt.map(|dt| dt.secs())
}

/// Entries of one delimited listing page under `prefix`: common prefixes become
/// directories, objects become files. The listed directory's own marker is skipped.
fn page_entries(prefixer: &PathPrefixer, prefix: &str, page: &ListObjectsV2Output) -> Vec<Entry> {
    let mut entries = Vec::new();

    for cp in page.common_prefixes() {
        if let Some(p) = cp.prefix() {
            entries.push(Entry::Directory(DirectoryAttributes::new(
                prefixer.strip_directory_prefix(p),
            )));
        }
    }

    for o in page.contents() {
        let key = o.key().unwrap_or("");
        if key.is_empty() || key == prefix {
            continue;
        }

        let mut attributes = FileAttributes::new(prefixer.strip_prefix(key));
        attributes.file_size = o.size().map(|size| size.max(0) as u64);
        attributes.last_modified = unix_secs(o.last_modified());

        if let Some(etag) = o.e_tag() {
            attributes
                .extra_metadata
                .insert("ETag".to_string(), etag.to_string());
        }
        if let Some(class) = o.storage_class() {
            attributes
                .extra_metadata
                .insert("StorageClass".to_string(), class.as_str().to_string());
        }

        entries.push(Entry::File(attributes));
    }

    entries
}

impl ObjectAdapter for S3Adapter {
    fn fs_head_object(&self, key: &str) -> Result<Option<FileAttributes>, FSError> {
        let full_key = self.prefixer.prefix_path(key);
        let req = self.client.head_object().bucket(&self.bucket).key(&full_key);

        let ho = match self.poller.poll_until_ready(req.send()) {
            Err(err) => {
                if let Some(svc_err) = err.as_service_error() {
                    if svc_err.is_not_found() {
                        return Ok(None);
                    }
                }

                return Err(FSError::ReadFailure {
                    location: key.to_string(),
                    reason: DisplayErrorContext(&err).to_string(),
                });
            }
            Ok(ho) => ho,
        };

        let mut attributes = FileAttributes::new(key);
        attributes.file_size = ho.content_length().map(|len| len.max(0) as u64);
        attributes.last_modified = unix_secs(ho.last_modified());
        attributes.mime_type = ho.content_type().map(str::to_string);

        if let Some(etag) = ho.e_tag() {
            attributes
                .extra_metadata
                .insert("ETag".to_string(), etag.to_string());
        }
        if let Some(class) = ho.storage_class() {
            attributes
                .extra_metadata
                .insert("StorageClass".to_string(), class.as_str().to_string());
        }
        if let Some(version) = ho.version_id() {
            attributes
                .extra_metadata
                .insert("VersionId".to_string(), version.to_string());
        }

        Ok(Some(attributes))
    }

    fn fs_read_object(&self, key: &str) -> Result<Vec<u8>, FSError> {
        let mut reader = self.fs_read_stream(key)?;
        let mut body = Vec::new();

        reader
            .read_to_end(&mut body)
            .map_err(|err| FSError::ReadFailure {
                location: key.to_string(),
                reason: err.to_string(),
            })?;

        Ok(body)
    }

    fn fs_read_stream(&self, key: &str) -> Result<Box<dyn Read + Send>, FSError> {
        let full_key = self.prefixer.prefix_path(key);
        let req = self.client.get_object().bucket(&self.bucket).key(&full_key);

        let o = match self.poller.poll_until_ready(req.send()) {
            Err(err) => {
                if let Some(svc_err) = err.as_service_error() {
                    if svc_err.is_no_such_key() {
                        return Err(FSError::not_found(key));
                    }
                }

                return Err(FSError::ReadFailure {
                    location: key.to_string(),
                    reason: DisplayErrorContext(&err).to_string(),
                });
            }
            Ok(o) => o,
        };

        Ok(Box::new(ObjectReader {
            poller: self.poller.clone(),
            body: o.body,
            chunk: Vec::new(),
            pos: 0,
        }))
    }

    fn fs_write_object(&self, key: &str, body: Vec<u8>, config: &Config) -> Result<(), FSError> {
        let full_key = self.prefixer.prefix_path(key);
        let content_type = config
            .mime_type
            .clone()
            .or_else(|| mime::detect_from_path(key));

        let req = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&full_key)
            .set_content_type(content_type)
            .body(ByteStream::from(body));

        self.poller
            .poll_until_ready_error(req.send(), |err| FSError::WriteFailure {
                location: key.to_string(),
                reason: DisplayErrorContext(&err).to_string(),
            })?;

        Ok(())
    }

    fn fs_delete_object(&self, key: &str) -> Result<(), FSError> {
        let keys = match adapters::delete_target(&self.prefixer, key)? {
            DeleteTarget::Prefix(prefix) => self.list_all_keys(&prefix)?,
            DeleteTarget::Object(full_key) => vec![full_key],
        };

        for k in keys {
            debug!(key = %k, "delete_object");
            let req = self.client.delete_object().bucket(&self.bucket).key(&k);

            self.poller
                .poll_until_ready_error(req.send(), |err| FSError::DeleteFailure {
                    location: self.prefixer.strip_prefix(&k).to_string(),
                    reason: DisplayErrorContext(&err).to_string(),
                })?;
        }

        Ok(())
    }

    fn fs_list_one_level(&self, path: &str) -> Result<Vec<Entry>, FSError> {
        let prefix = self.prefixer.prefix_directory_path(path);
        let mut entries = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let req = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(&prefix)
                .delimiter("/")
                .set_continuation_token(continuation_token.take());

            let lo = self
                .poller
                .poll_until_ready_error(req.send(), |err| FSError::ListFailure {
                    location: path.to_string(),
                    reason: DisplayErrorContext(&err).to_string(),
                })?;

            entries.extend(page_entries(&self.prefixer, &prefix, &lo));

            continuation_token = lo.next_continuation_token().map(str::to_string);
            if continuation_token.is_none() {
                break;
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
        let source_key = self.prefixer.prefix_path(source);
        let destination_key = self.prefixer.prefix_path(destination);

        let mut req = self
            .client
            .copy_object()
            .copy_source(format!(
                "{}/{}",
                self.bucket,
                urlencoding::encode(&source_key)
            ))
            .bucket(&self.bucket)
            .key(&destination_key);

        if let Some(mime_type) = &config.mime_type {
            req = req
                .content_type(mime_type)
                .metadata_directive(MetadataDirective::Replace);
        }

        self.poller
            .poll_until_ready_error(req.send(), |err| FSError::WriteFailure {
                location: destination.to_string(),
                reason: DisplayErrorContext(&err).to_string(),
            })?;

        Ok(())
    }
}

/// Pulls the object body chunk by chunk as it is read.
struct ObjectReader {
    poller: Arc<Poller>,
    body: ByteStream,
    chunk: Vec<u8>,
    pos: usize,
}

impl Read for ObjectReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.pos >= self.chunk.len() {
            match self.poller.poll_until_ready(self.body.try_next()) {
                Ok(Some(bytes)) => {
                    self.chunk = bytes.to_vec();
                    self.pos = 0;
                }
                Ok(None) => return Ok(0),
                Err(err) => return Err(io::Error::other(err)),
            }
        }

        let n = buf.len().min(self.chunk.len() - self.pos);
        buf[..n].copy_from_slice(&self.chunk[self.pos..self.pos + n]);
        self.pos += n;

        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use aws_sdk_s3::types::{CommonPrefix, Object, ObjectStorageClass};

    use super::*;

    fn page(prefixes: &[&str], keys: &[&str]) -> ListObjectsV2Output {
        let mut builder = ListObjectsV2Output::builder();

        for p in prefixes {
            builder = builder.common_prefixes(CommonPrefix::builder().prefix(*p).build());
        }
        for k in keys {
            builder = builder.contents(
                Object::builder()
                    .key(*k)
                    .size(3)
                    .last_modified(DateTime::from_secs(1_700_000_000))
                    .build(),
            );
        }

        builder.build()
    }

    fn listed(entries: &[Entry]) -> Vec<(&str, &str)> {
        entries.iter().map(|e| (e.kind(), e.path())).collect()
    }

    #[test]
    fn test_page_entries() {
        let cases = vec![
            // root, no subfolder
            ("", "", vec!["a/"], vec!["top.txt"], vec![("dir", "a"), ("file", "top.txt")]),
            // root under a subfolder, the subfolder marker is skipped
            (
                "ci/v3/",
                "",
                vec!["ci/v3/a/"],
                vec!["ci/v3/", "ci/v3/top.txt"],
                vec![("dir", "a"), ("file", "top.txt")],
            ),
            // nested directory with its own marker
            (
                "ci/v3/",
                "a",
                vec!["ci/v3/a/c/", "ci/v3/a/empty/"],
                vec!["ci/v3/a/", "ci/v3/a/b.txt"],
                vec![("dir", "a/c"), ("dir", "a/empty"), ("file", "a/b.txt")],
            ),
            ("", "a", vec![], vec![], vec![]),
        ];

        for (subfolder, path, prefixes, keys, expected) in cases {
            let prefixer = PathPrefixer::new(subfolder);
            let prefix = prefixer.prefix_directory_path(path);

            let entries = page_entries(&prefixer, &prefix, &page(&prefixes, &keys));

            assert_eq!(listed(&entries), expected, "failed for case: {:?}", (subfolder, path));
        }
    }

    #[test]
    fn test_page_entries_file_attributes() {
        let prefixer = PathPrefixer::new("ci/");
        let output = ListObjectsV2Output::builder()
            .contents(
                Object::builder()
                    .key("ci/a/b.txt")
                    .size(11)
                    .last_modified(DateTime::from_secs(1_700_000_000))
                    .e_tag("\"abc\"")
                    .storage_class(ObjectStorageClass::Standard)
                    .build(),
            )
            .build();

        let entries = page_entries(&prefixer, "ci/a/", &output);

        match entries.as_slice() {
            [Entry::File(file)] => {
                assert_eq!(file.path, "a/b.txt");
                assert_eq!(file.file_size, Some(11));
                assert_eq!(file.last_modified, Some(1_700_000_000));
                assert_eq!(file.extra_metadata.get("ETag").map(String::as_str), Some("\"abc\""));
                assert_eq!(
                    file.extra_metadata.get("StorageClass").map(String::as_str),
                    Some("STANDARD")
                );
            }
            other => panic!("unexpected entries: {:?}", other),
        }
    }
}
