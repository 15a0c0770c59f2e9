//! Where playback status comes from.

use crate::error::Result;
use crate::status::FetchedStatus;
use async_trait::async_trait;

/// Anything that can produce a normalized [`FetchedStatus`].
///
/// The engine only talks to this trait, so the HTTP fetcher can be swapped for
/// an in-memory source in tests.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Returns a human-readable name for this source.
    fn name(&self) -> &'static str;

    /// Fetch the current playback status once.
    ///
    /// Implementations must not retry; retry timing belongs to the
    /// [`ProgressController`](crate::progress::ProgressController).
    ///
    /// # Errors
    ///
    /// Returns an error if the status could not be fetched or understood.
    async fn fetch_status(&self) -> Result<FetchedStatus>;
}
