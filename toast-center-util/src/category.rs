use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use toast_center_config::ToastConfig;

/// Kind of toast. Picks the default lifetime and, on the rendering side, the
/// styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Success,
    Error,
    Warning,
    Info,
    /// Never expires on its own; must be updated or removed.
    Loading,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Success,
        Category::Error,
        Category::Warning,
        Category::Info,
        Category::Loading,
    ];

    /// Default lifetime in milliseconds when the caller gives none.
    pub fn default_timeout(self, config: &ToastConfig) -> u64 {
        match self {
            Category::Success => u64::from(config.success_timeout),
            Category::Info => u64::from(config.info_timeout),
            Category::Warning => u64::from(config.warning_timeout),
            Category::Error => u64::from(config.error_timeout),
            Category::Loading => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Success => "success",
            Category::Error => "error",
            Category::Warning => "warning",
            Category::Info => "info",
            Category::Loading => "loading",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown toast category: {0}")]
pub struct ParseCategoryError(pub String);

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseCategoryError(s.to_string()))
    }
}
