//! Mock object storage.

use crate::gateway::AvatarStorage;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use storefront_api::ApiError;

/// Object storage that records uploads and can fail a number of times.
#[derive(Debug, Clone, Default)]
pub struct MockObjectStorage {
    failures_left: Arc<AtomicUsize>,
    attempts: Arc<AtomicUsize>,
    uploaded: Arc<Mutex<Vec<String>>>,
}

impl MockObjectStorage {
    /// Storage accepting every upload
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `failures` uploads
    #[must_use]
    pub fn failing(self, failures: usize) -> Self {
        self.failures_left.store(failures, Ordering::SeqCst);
        self
    }

    /// Uploads attempted, failed ones included
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Paths of the stored objects
    #[must_use]
    pub fn uploaded_paths(&self) -> Vec<String> {
        self.uploaded
            .lock()
            .map(|paths| paths.clone())
            .unwrap_or_default()
    }

    /// Public URL the mock returns for `path`
    #[must_use]
    pub fn public_url(path: &str) -> String {
        format!("https://storage.test/o/{path}?alt=media&token=test-token")
    }
}

impl AvatarStorage for MockObjectStorage {
    type Error = ApiError;

    fn upload(
        &self,
        path: &str,
        _bytes: Vec<u8>,
        _content_type: &str,
    ) -> impl Future<Output = Result<String, ApiError>> + Send {
        let path = path.to_string();
        let this = self.clone();

        async move {
            this.attempts.fetch_add(1, Ordering::SeqCst);

            let failed = this
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failed {
                return Err(ApiError::Status {
                    status: 503,
                    message: Some("Storage unavailable".to_string()),
                });
            }

            this.uploaded
                .lock()
                .map_err(|_| ApiError::RequestFailed("mock storage poisoned".into()))?
                .push(path.clone());
            Ok(Self::public_url(&path))
        }
    }
}
