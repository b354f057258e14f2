use tracing::{debug, error, info, span, Level};

use crate::{
    fs::ObjectFS,
    model::{config::Config, fs::FSError},
    util::object,
};

impl ObjectFS {
    /// Copies a file, or every file below a directory, re-rooting sub paths
    /// under `destination`.
    pub fn copy(&self, source: &str, destination: &str, config: &Config) -> Result<(), FSError> {
        let span = span!(Level::INFO, "copy", context = "copy");
        let _e = span.enter();
        info!(source = source, destination = destination, "called");

        let source = object::normalize_path(source)?;
        let destination = object::normalize_path(destination)?;

        self.transfer(&source, &destination, |from, to| {
            self.client.fs_copy_object(from, to, config)
        })
        .map_err(|cause| FSError::CopyFailure {
            source_path: source.clone(),
            destination: destination.clone(),
            cause: Box::new(cause),
        })
        .inspect_err(|err| error!(error_message = %err, error_group = err.group()))
    }

    /// Moves a file or a directory tree one object at a time. Not atomic: a
    /// failure part way leaves the tree split between both locations.
    pub fn move_path(
        &self,
        source: &str,
        destination: &str,
        config: &Config,
    ) -> Result<(), FSError> {
        let span = span!(Level::INFO, "move", context = "move");
        let _e = span.enter();
        info!(source = source, destination = destination, "called");

        let source = object::normalize_path(source)?;
        let destination = object::normalize_path(destination)?;

        if source == destination {
            return Ok(());
        }

        self.transfer(&source, &destination, |from, to| {
            self.client.fs_move_object(from, to, config)
        })
        .map_err(|cause| FSError::MoveFailure {
            source_path: source.clone(),
            destination: destination.clone(),
            cause: Box::new(cause),
        })
        .inspect_err(|err| error!(error_message = %err, error_group = err.group()))
    }

    fn transfer<F>(&self, source: &str, destination: &str, mut op: F) -> Result<(), FSError>
    where
        F: FnMut(&str, &str) -> Result<(), FSError>,
    {
        // the walk would pick up what it had just written
        if source.is_empty() || destination.starts_with(&object::directory_key(source)) {
            return Err(FSError::UnsupportedOperation {
                location: destination.to_string(),
                reason: format!("destination is inside source: {}", source),
            });
        }

        for file in self.files(source) {
            let file = file?;
            let suffix = file.strip_prefix(source).unwrap_or(&file);
            let target = object::join_path(destination, suffix);

            debug!(source = %file, destination = %target, "transfer");
            op(&file, &target)?;
        }

        Ok(())
    }
}
