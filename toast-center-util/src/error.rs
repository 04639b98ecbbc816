use toast_center_config::ConfigError;

/// Errors surfaced by [`crate::Toaster`].
///
/// Operations on unknown toast ids are not errors: a timer or a stale UI
/// reference racing another removal is expected, so those calls are no-ops.
#[derive(Debug, thiserror::Error)]
pub enum ToastError {
    /// Empty message or negative duration. Nothing was changed.
    #[error("invalid toast: {0}")]
    InvalidNotice(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ToastError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        ToastError::InvalidNotice(reason.into())
    }
}
