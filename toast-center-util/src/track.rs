//! Loading toast that turns into a success or error toast when a future
//! settles.

use crate::{
    Category, NoticeOptions, NoticePatch, ToastError, Toaster, notice::validate_message,
};
use std::future::Future;

/// Messages shown over the lifetime of a tracked operation.
#[derive(Debug, Clone)]
pub struct TrackMessages {
    pub loading: String,
    pub success: String,
    pub error: String,
}

impl TrackMessages {
    pub fn new(
        loading: impl Into<String>,
        success: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            loading: loading.into(),
            success: success.into(),
            error: error.into(),
        }
    }
}

impl Toaster {
    /// Show a loading toast while `future` runs, then rewrite the same toast
    /// as success or error with that category's default lifetime.
    ///
    /// All three messages are validated before anything is shown. If the
    /// loading toast is dismissed while the future runs, the final update is
    /// silently skipped.
    pub async fn track<T, E, F>(
        &self,
        messages: TrackMessages,
        options: NoticeOptions,
        future: F,
    ) -> Result<Result<T, E>, ToastError>
    where
        F: Future<Output = Result<T, E>>,
    {
        validate_message(&messages.success)?;
        validate_message(&messages.error)?;
        let id = self.loading(messages.loading, options)?;

        let result = future.await;

        let (category, message) = match &result {
            Ok(_) => (Category::Success, messages.success),
            Err(_) => (Category::Error, messages.error),
        };
        let duration_ms = category.default_timeout(self.config());
        self.update(
            id,
            NoticePatch::new()
                .category(category)
                .message(message)
                .duration_ms(i64::try_from(duration_ms).unwrap_or(i64::MAX)),
        )?;
        Ok(result)
    }
}
