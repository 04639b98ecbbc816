use anyhow::{Context, bail};
use std::time::Duration;
use toast_center_util::{Category, NoticeId};

/// Console input, one command per line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `<category> [key=value ...] <message>`
    Raise { category: Category, fields: Fields },
    /// `update <id> <category> [key=value ...] <message>`
    Update {
        id: NoticeId,
        category: Category,
        fields: Fields,
    },
    /// `remove <id>`
    Remove(NoticeId),
    /// `action <id>`
    Action(NoticeId),
    /// `track <ms> ok|fail`
    Track { after: Duration, succeed: bool },
    Clear,
    Status,
    Help,
    Quit,
}

/// Optional `key=value` tokens followed by the message text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    pub message: String,
    pub duration_ms: Option<i64>,
    pub title: Option<String>,
    pub action: Option<String>,
    pub goto: Option<String>,
}

pub const HELP: &str = "\
commands:
  success|error|warning|info|loading [ms=N] [title=T] [action=LABEL] [goto=TARGET] <message>
  update <id> <category> [ms=N] [title=T] <message>
  remove <id>
  action <id>
  track <ms> ok|fail
  clear | status | help | quit";

impl Command {
    pub fn parse(line: &str) -> anyhow::Result<Option<Command>> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Ok(None);
        };
        let rest: Vec<&str> = words.collect();

        let command = match head.to_ascii_lowercase().as_str() {
            "clear" => Command::Clear,
            "status" => Command::Status,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            "remove" | "dismiss" => Command::Remove(parse_id(rest.first())?),
            "action" => Command::Action(parse_id(rest.first())?),
            "update" => {
                let id = parse_id(rest.first())?;
                let category = rest
                    .get(1)
                    .context("update needs a category")?
                    .parse::<Category>()?;
                Command::Update {
                    id,
                    category,
                    fields: Fields::parse(rest.get(2..).unwrap_or_default())?,
                }
            }
            "track" => {
                let ms: u64 = rest
                    .first()
                    .context("track needs a duration in ms")?
                    .parse()
                    .context("track duration must be a whole number of ms")?;
                let succeed = match rest.get(1).copied() {
                    None | Some("ok") => true,
                    Some("fail") => false,
                    Some(other) => bail!("track outcome must be ok or fail, got {other}"),
                };
                Command::Track {
                    after: Duration::from_millis(ms),
                    succeed,
                }
            }
            other => {
                let category = other.parse::<Category>()?;
                Command::Raise {
                    category,
                    fields: Fields::parse(&rest)?,
                }
            }
        };
        Ok(Some(command))
    }
}

impl Fields {
    fn parse(words: &[&str]) -> anyhow::Result<Fields> {
        let mut fields = Fields::default();
        let mut index = 0;
        while let Some((key, value)) = words.get(index).and_then(|w| w.split_once('=')) {
            match key {
                "ms" => {
                    fields.duration_ms = Some(value.parse().context("ms must be an integer")?)
                }
                "title" => fields.title = Some(value.replace('_', " ")),
                "action" => fields.action = Some(value.to_string()),
                "goto" => fields.goto = Some(value.to_string()),
                // not a recognised key, so the message starts here
                _ => break,
            }
            index += 1;
        }
        fields.message = words[index..].join(" ");
        Ok(fields)
    }
}

fn parse_id(word: Option<&&str>) -> anyhow::Result<NoticeId> {
    let word = word.context("missing toast id")?;
    Ok(word.parse::<NoticeId>()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Command {
        Command::parse(line).unwrap().unwrap()
    }

    #[test]
    fn test_blank_line() {
        assert_eq!(Command::parse("   ").unwrap(), None);
    }

    #[test]
    fn test_raise_plain_message() {
        assert_eq!(
            parse("success Invoice saved"),
            Command::Raise {
                category: Category::Success,
                fields: Fields {
                    message: "Invoice saved".to_string(),
                    ..Fields::default()
                },
            }
        );
    }

    #[test]
    fn test_raise_with_fields() {
        let Command::Raise { category, fields } =
            parse("warning ms=9000 title=Stock_alert action=Reorder goto=inventory Low on A-1")
        else {
            panic!("expected a raise command");
        };
        assert_eq!(category, Category::Warning);
        assert_eq!(fields.duration_ms, Some(9000));
        assert_eq!(fields.title.as_deref(), Some("Stock alert"));
        assert_eq!(fields.action.as_deref(), Some("Reorder"));
        assert_eq!(fields.goto.as_deref(), Some("inventory"));
        assert_eq!(fields.message, "Low on A-1");
    }

    #[test]
    fn test_unknown_key_starts_message() {
        let Command::Raise { fields, .. } = parse("info ratio=2:1 is fine") else {
            panic!("expected a raise command");
        };
        assert_eq!(fields.message, "ratio=2:1 is fine");
    }

    #[test]
    fn test_negative_ms_parses_and_is_left_to_validation() {
        let Command::Raise { fields, .. } = parse("info ms=-1 hi") else {
            panic!("expected a raise command");
        };
        assert_eq!(fields.duration_ms, Some(-1));
    }

    #[test]
    fn test_update() {
        let Command::Update { id, category, fields } = parse("update toast-3 success ms=4000 Done")
        else {
            panic!("expected an update command");
        };
        assert_eq!(id, "3".parse().unwrap());
        assert_eq!(category, Category::Success);
        assert_eq!(fields.duration_ms, Some(4000));
        assert_eq!(fields.message, "Done");
    }

    #[test]
    fn test_remove_and_action() {
        assert_eq!(parse("remove 5"), Command::Remove("toast-5".parse().unwrap()));
        assert_eq!(parse("dismiss toast-5"), Command::Remove("5".parse().unwrap()));
        assert_eq!(parse("action 9"), Command::Action("9".parse().unwrap()));
    }

    #[test]
    fn test_track() {
        assert_eq!(
            parse("track 1500 fail"),
            Command::Track {
                after: Duration::from_millis(1500),
                succeed: false
            }
        );
        assert_eq!(
            parse("track 10"),
            Command::Track {
                after: Duration::from_millis(10),
                succeed: true
            }
        );
        assert!(Command::parse("track soon").is_err());
        assert!(Command::parse("track 10 maybe").is_err());
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(parse("clear"), Command::Clear);
        assert_eq!(parse("STATUS"), Command::Status);
        assert_eq!(parse("?"), Command::Help);
        assert_eq!(parse("exit"), Command::Quit);
    }

    #[test]
    fn test_errors() {
        assert!(Command::parse("shout hello").is_err());
        assert!(Command::parse("remove").is_err());
        assert!(Command::parse("remove abc").is_err());
        assert!(Command::parse("update 3").is_err());
        assert!(Command::parse("update 3 loud hi").is_err());
    }
}
