use crate::commands::{Command, Fields, HELP};
use crate::presenter::{self, Event};
use tokio::io::{AsyncBufReadExt, BufReader};
use toast_center_util::{
    ActionButton, ClickAction, NoticeOptions, NoticePatch, ToastConfig, Toaster, TrackMessages,
};

/// Read commands from stdin until EOF or `quit`, writing every visible-set
/// change to stdout.
pub async fn run(config: ToastConfig) -> anyhow::Result<()> {
    let toaster = Toaster::with_tokio(config, tokio::runtime::Handle::current())?;
    tracing::info!(
        "toast center ready, showing at most {} toasts",
        toaster.config().max_concurrent
    );
    let subscription = presenter::attach(&toaster);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Ok(None) => continue,
            Ok(Some(Command::Quit)) => break,
            Ok(Some(command)) => execute(&toaster, command),
            Err(err) => {
                tracing::warn!("ignoring input {line:?}: {err:#}");
                presenter::emit(&Event::Error {
                    message: format!("{err:#}"),
                });
            }
        }
    }

    subscription.unsubscribe();
    toaster.clear();
    tracing::info!("toast center shutting down");
    Ok(())
}

pub fn execute(toaster: &Toaster, command: Command) {
    match command {
        Command::Raise { category, fields } => {
            match toaster.notify(category, fields.message.clone(), options(&fields)) {
                Ok(id) => presenter::emit(&Event::Created { id }),
                Err(err) => report(err),
            }
        }
        Command::Update {
            id,
            category,
            fields,
        } => {
            let mut patch = NoticePatch::new().category(category).message(fields.message);
            if let Some(duration_ms) = fields.duration_ms {
                patch = patch.duration_ms(duration_ms);
            }
            if let Some(title) = fields.title {
                patch = patch.title(title);
            }
            if let Err(err) = toaster.update(id, patch) {
                report(err);
            }
        }
        Command::Remove(id) => toaster.remove(id),
        Command::Action(id) => {
            let invoked = toaster.invoke_action(id);
            presenter::emit(&Event::Action { id, invoked });
        }
        Command::Track { after, succeed } => {
            let toaster = toaster.clone();
            tokio::spawn(async move {
                let job = async move {
                    tokio::time::sleep(after).await;
                    if succeed { Ok(()) } else { Err("simulated failure") }
                };
                let messages = TrackMessages::new("Working…", "Job finished", "Job failed");
                match toaster.track(messages, NoticeOptions::new(), job).await {
                    Ok(Ok(())) => tracing::debug!("tracked job finished"),
                    Ok(Err(reason)) => tracing::debug!("tracked job failed: {reason}"),
                    Err(err) => report(err),
                }
            });
        }
        Command::Clear => toaster.clear(),
        Command::Status => presenter::emit(&Event::Status(toaster.queue_status())),
        Command::Help => presenter::emit(&Event::Help { text: HELP }),
        Command::Quit => {}
    }
}

fn options(fields: &Fields) -> NoticeOptions {
    let mut options = NoticeOptions::new();
    if let Some(title) = &fields.title {
        options = options.title(title.clone());
    }
    if let Some(duration_ms) = fields.duration_ms {
        options = options.duration_ms(duration_ms);
    }
    if let Some(target) = &fields.goto {
        options = options.click_action(ClickAction::new(target.clone()));
    }
    if let Some(label) = &fields.action {
        let pressed = label.clone();
        options = options.action_button(ActionButton::new(label.clone(), move || {
            tracing::info!("action '{pressed}' pressed");
        }));
    }
    options
}

fn report(err: impl std::fmt::Display) {
    presenter::emit(&Event::Error {
        message: err.to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use toast_center_util::{Category, ManualScheduler};

    fn toaster() -> (Toaster, Arc<ManualScheduler>) {
        let scheduler = Arc::new(ManualScheduler::new());
        let toaster = Toaster::new(ToastConfig::default(), scheduler.clone()).unwrap();
        (toaster, scheduler)
    }

    fn run_line(toaster: &Toaster, line: &str) {
        execute(toaster, Command::parse(line).unwrap().unwrap());
    }

    #[test]
    fn test_raise_with_options() {
        let (toaster, scheduler) = toaster();
        run_line(&toaster, "info ms=1500 title=Sync action=Retry goto=settings Offline");

        let visible = toaster.active();
        assert_eq!(visible.len(), 1);
        let toast = &visible[0];
        assert_eq!(toast.category, Category::Info);
        assert_eq!(toast.title.as_deref(), Some("Sync"));
        assert_eq!(toast.duration_ms, 1500);
        assert_eq!(toast.click_action.as_ref().unwrap().target, "settings");
        assert_eq!(toast.action_button.as_ref().unwrap().label, "Retry");
        assert!(toaster.invoke_action(toast.id));

        scheduler.advance_ms(1500);
        assert!(toaster.active().is_empty());
    }

    #[test]
    fn test_invalid_input_changes_nothing() {
        let (toaster, _scheduler) = toaster();
        run_line(&toaster, "success ms=-5 Saved");
        run_line(&toaster, "error");
        assert_eq!(toaster.queue_status().active_count, 0);
    }

    #[test]
    fn test_update_and_remove() {
        let (toaster, _scheduler) = toaster();
        run_line(&toaster, "loading Uploading");
        let id = toaster.active()[0].id;

        run_line(&toaster, &format!("update {id} success ms=4000 Uploaded"));
        let toast = &toaster.active()[0];
        assert_eq!(toast.id, id);
        assert_eq!(toast.category, Category::Success);
        assert_eq!(toast.message, "Uploaded");
        assert_eq!(toast.duration_ms, 4000);

        run_line(&toaster, &format!("remove {id}"));
        assert!(toaster.active().is_empty());
    }

    #[test]
    fn test_clear() {
        let (toaster, _scheduler) = toaster();
        for n in 0..6 {
            run_line(&toaster, &format!("warning Item {n}"));
        }
        assert_eq!(toaster.queue_status().pending_count, 2);

        run_line(&toaster, "clear");
        let status = toaster.queue_status();
        assert_eq!(status.active_count, 0);
        assert_eq!(status.pending_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_track_command() {
        let (toaster, _scheduler) = toaster();
        run_line(&toaster, "track 200 fail");
        tokio::task::yield_now().await;
        assert_eq!(toaster.active()[0].category, Category::Loading);

        tokio::time::sleep(std::time::Duration::from_millis(250)).await;
        let toast = &toaster.active()[0];
        assert_eq!(toast.category, Category::Error);
        assert_eq!(toast.message, "Job failed");
    }
}
