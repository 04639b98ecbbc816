//! Toast data and the option/patch types callers use to build and edit it.

use crate::{ActionButton, Category, ClickAction, ToastError};
use serde::{Serialize, Serializer};
use std::{
    fmt,
    str::FromStr,
    sync::atomic::{AtomicU64, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Unique identifier for a toast. Never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoticeId(u64);

impl NoticeId {
    pub(crate) fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NoticeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "toast-{}", self.0)
    }
}

impl Serialize for NoticeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid toast id: {0}")]
pub struct ParseNoticeIdError(pub String);

/// Accepts both `toast-7` and a bare `7`.
impl FromStr for NoticeId {
    type Err = ParseNoticeIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix("toast-").unwrap_or(s);
        raw.parse()
            .map(NoticeId)
            .map_err(|_| ParseNoticeIdError(s.to_string()))
    }
}

/// One toast as the presentation layer sees it.
#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    pub id: NoticeId,
    pub category: Category,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Lifetime once visible. `0` means the toast stays until removed.
    pub duration_ms: u64,
    pub dismissible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub click_action: Option<ClickAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_button: Option<ActionButton>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(serialize_with = "serialize_unix_millis")]
    pub created_at: SystemTime,
}

impl Notice {
    pub(crate) fn new(
        category: Category,
        message: String,
        duration_ms: u64,
        options: NoticeOptions,
    ) -> Self {
        Notice {
            id: NoticeId::next(),
            category,
            message,
            title: options.title,
            duration_ms,
            dismissible: options.dismissible.unwrap_or(true),
            click_action: options.click_action,
            action_button: options.action_button,
            metadata: options.metadata,
            created_at: SystemTime::now(),
        }
    }

    /// Whether a countdown runs while the toast is visible.
    pub fn is_timed(&self) -> bool {
        self.duration_ms > 0
    }

    /// Apply an already validated patch. Returns `true` when the patch touched
    /// the duration, which restarts the countdown of a visible toast.
    pub(crate) fn apply(&mut self, patch: NoticePatch) -> bool {
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(message) = patch.message {
            self.message = message;
        }
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(dismissible) = patch.dismissible {
            self.dismissible = dismissible;
        }
        if let Some(button) = patch.action_button {
            self.action_button = button;
        }
        if let Some(metadata) = patch.metadata {
            self.metadata = metadata;
        }
        match patch.duration_ms {
            Some(duration) => {
                // validated as non-negative
                self.duration_ms = duration.unsigned_abs();
                true
            }
            None => false,
        }
    }
}

fn serialize_unix_millis<S: Serializer>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error> {
    let millis = time
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default();
    serializer.serialize_u64(millis)
}

pub(crate) fn validate_message(message: &str) -> Result<(), ToastError> {
    if message.trim().is_empty() {
        return Err(ToastError::invalid("message must not be empty"));
    }
    Ok(())
}

pub(crate) fn validate_duration(duration_ms: Option<i64>) -> Result<(), ToastError> {
    match duration_ms {
        Some(d) if d < 0 => Err(ToastError::invalid(format!(
            "duration must be non-negative, got {d}"
        ))),
        _ => Ok(()),
    }
}

/// Optional fields supplied when raising a toast.
#[derive(Debug, Clone, Default)]
pub struct NoticeOptions {
    pub title: Option<String>,
    /// Overrides the category default. Negative values are rejected.
    pub duration_ms: Option<i64>,
    /// Defaults to `true`.
    pub dismissible: Option<bool>,
    pub click_action: Option<ClickAction>,
    pub action_button: Option<ActionButton>,
    pub metadata: Option<Metadata>,
}

impl NoticeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn duration_ms(mut self, duration_ms: i64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    #[must_use]
    pub fn dismissible(mut self, dismissible: bool) -> Self {
        self.dismissible = Some(dismissible);
        self
    }

    #[must_use]
    pub fn click_action(mut self, action: ClickAction) -> Self {
        self.click_action = Some(action);
        self
    }

    #[must_use]
    pub fn action_button(mut self, button: ActionButton) -> Self {
        self.action_button = Some(button);
        self
    }

    #[must_use]
    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Fields [`crate::Toaster::update`] may rewrite. The id and creation time are
/// not representable here.
///
/// For `title`, `action_button` and `metadata` the outer `Option` says whether
/// the field is touched and the inner one is the new value, so they can be
/// cleared.
#[derive(Debug, Clone, Default)]
pub struct NoticePatch {
    pub category: Option<Category>,
    pub message: Option<String>,
    pub title: Option<Option<String>>,
    pub duration_ms: Option<i64>,
    pub dismissible: Option<bool>,
    pub action_button: Option<Option<ActionButton>>,
    pub metadata: Option<Option<Metadata>>,
}

impl NoticePatch {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(Some(title.into()));
        self
    }

    #[must_use]
    pub fn clear_title(mut self) -> Self {
        self.title = Some(None);
        self
    }

    #[must_use]
    pub fn duration_ms(mut self, duration_ms: i64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    #[must_use]
    pub fn dismissible(mut self, dismissible: bool) -> Self {
        self.dismissible = Some(dismissible);
        self
    }

    #[must_use]
    pub fn action_button(mut self, button: ActionButton) -> Self {
        self.action_button = Some(Some(button));
        self
    }

    #[must_use]
    pub fn clear_action_button(mut self) -> Self {
        self.action_button = Some(None);
        self
    }

    #[must_use]
    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(Some(metadata));
        self
    }

    pub(crate) fn validate(&self) -> Result<(), ToastError> {
        if let Some(message) = &self.message {
            validate_message(message)?;
        }
        validate_duration(self.duration_ms)
    }
}
