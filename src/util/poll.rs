use std::{future::Future, io};

use tokio::runtime::{Builder, Runtime};

/// Drives SDK futures to completion for the synchronous adapter surface.
pub struct Poller {
    runtime: Runtime,
}

impl Poller {
    pub fn new() -> io::Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;

        Ok(Self { runtime })
    }

    pub fn poll_until_ready<Fut, T>(&self, future: Fut) -> T
    where
        Fut: Future<Output = T>,
    {
        self.runtime.block_on(future)
    }

    pub fn poll_until_ready_error<Fut, T, E, F, R>(&self, future: Fut, map_err: F) -> Result<T, R>
    where
        Fut: Future<Output = Result<T, E>>,
        F: FnOnce(E) -> R,
    {
        self.poll_until_ready(future).map_err(map_err)
    }
}

impl std::fmt::Debug for Poller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller").finish_non_exhaustive()
    }
}
