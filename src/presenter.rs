//! JSON-lines output on stdout. Each visible-set change becomes one line.

use serde::Serialize;
use std::io::Write;
use toast_center_util::{Notice, NoticeId, QueueStatus, Snapshot, Subscription, Toaster};

#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event<'a> {
    Snapshot { toasts: &'a [Notice] },
    Created { id: NoticeId },
    Status(QueueStatus),
    Action { id: NoticeId, invoked: bool },
    Help { text: &'a str },
    Error { message: String },
}

pub fn attach(toaster: &Toaster) -> Subscription {
    toaster.subscribe(|snapshot: &Snapshot| emit(&Event::Snapshot { toasts: snapshot }))
}

pub fn render(event: &Event<'_>) -> serde_json::Result<String> {
    serde_json::to_string(event)
}

pub fn emit(event: &Event<'_>) {
    let line = match render(event) {
        Ok(line) => line,
        Err(err) => {
            tracing::error!("failed to encode event: {err}");
            return;
        }
    };
    let mut stdout = std::io::stdout().lock();
    if let Err(err) = writeln!(stdout, "{line}").and_then(|()| stdout.flush()) {
        tracing::error!("failed to write event: {err}");
    }
}
