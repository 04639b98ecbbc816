//! Toast lifecycle management.
//!
//! A [`Toaster`] owns one bounded set of visible toasts plus a FIFO of toasts
//! waiting for room. Toasts expire on per-category timers driven by a
//! [`TimerScheduler`], can be rewritten in place with [`Toaster::update`], and
//! every change to the visible set is pushed to subscribers as an immutable
//! [`Snapshot`].

pub mod action;
pub mod category;
pub mod error;
pub mod notice;
pub mod subscribers;
pub mod timer;
pub mod toaster;
pub mod track;

mod store;

pub use action::{ActionButton, ClickAction};
pub use category::Category;
pub use error::ToastError;
pub use notice::{Notice, NoticeId, NoticeOptions, NoticePatch, ParseNoticeIdError};
pub use subscribers::{Snapshot, Subscription};
#[cfg(feature = "tokio")]
pub use timer::runtime::TokioScheduler;
pub use timer::{ManualScheduler, TimerCallback, TimerHandle, TimerScheduler};
pub use toaster::{QueueStatus, Toaster};
pub use track::TrackMessages;

pub use toast_center_config::ToastConfig;

/// Why a toast left the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloseReason {
    Expired,
    Dismissed,
    Cleared,
}
