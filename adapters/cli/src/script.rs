//! Timed session scripts that stand in for a live chat feed.
//!
//! Each line reads `t=<seconds> <action> [arguments]`. Blank lines and lines
//! starting with `#` are skipped. Entries run in time order, ties in file order.

use std::time::Duration;

use stream_siege_core::{Command, QueuedUnit, UnitType, ViewerId};
use thiserror::Error;

/// Display name used for units bought from the shop.
const SHOP_OWNER: &str = "shop";

/// Action performed by a script entry.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum ScriptAction {
    /// A chat line from a viewer.
    Chat {
        viewer: ViewerId,
        name: String,
        text: String,
    },
    /// A world command issued by the streamer or a platform event.
    Command(Command),
}

/// Action scheduled at a point of simulated time.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ScriptEntry {
    pub(crate) at: Duration,
    pub(crate) action: ScriptAction,
}

/// Parsed script in execution order.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Script {
    entries: Vec<ScriptEntry>,
    cursor: usize,
}

impl Script {
    /// Parses a script document.
    pub(crate) fn parse(source: &str) -> Result<Self, ScriptError> {
        let mut entries = Vec::new();
        for (index, raw) in source.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let entry = parse_line(line).map_err(|kind| ScriptError {
                line: index + 1,
                kind,
            })?;
            entries.push(entry);
        }
        entries.sort_by_key(|entry| entry.at);
        Ok(Self { entries, cursor: 0 })
    }

    /// Number of entries in the script.
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns the entries due at `now` that were not returned before.
    pub(crate) fn due(&mut self, now: Duration) -> &[ScriptEntry] {
        let start = self.cursor;
        while self
            .entries
            .get(self.cursor)
            .is_some_and(|entry| entry.at <= now)
        {
            self.cursor += 1;
        }
        &self.entries[start..self.cursor]
    }
}

/// Failure to parse a script line.
#[derive(Debug, Error)]
#[error("script line {line}: {kind}")]
pub(crate) struct ScriptError {
    line: usize,
    #[source]
    kind: ScriptErrorKind,
}

#[derive(Debug, Error, PartialEq)]
pub(crate) enum ScriptErrorKind {
    #[error("expected a `t=<seconds>` timestamp, found `{0}`")]
    InvalidTimestamp(String),
    #[error("missing action after the timestamp")]
    MissingAction,
    #[error("unknown action `{0}`")]
    UnknownAction(String),
    #[error("`{action}` is missing its {argument}")]
    MissingArgument {
        action: String,
        argument: &'static str,
    },
    #[error("`{0}` is not a number")]
    InvalidNumber(String),
    #[error("unknown unit type `{0}`")]
    UnknownUnit(String),
}

fn parse_line(line: &str) -> Result<ScriptEntry, ScriptErrorKind> {
    let (stamp, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let at = parse_timestamp(stamp)?;
    let rest = rest.trim_start();
    let (action, arguments) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    let mut arguments = Arguments::new(action, arguments.trim());

    let action = match action {
        "" => return Err(ScriptErrorKind::MissingAction),
        "chat" => {
            let viewer = arguments.word("viewer")?;
            let name = arguments.word("name")?;
            ScriptAction::Chat {
                viewer: ViewerId::new(viewer),
                name: name.to_owned(),
                text: arguments.remainder("message")?.to_owned(),
            }
        }
        "start" => ScriptAction::Command(Command::StartWave),
        "place-all" => ScriptAction::Command(Command::PlaceAllQueued),
        "buy" => {
            let kind = parse_unit(arguments.word("unit type")?)?;
            ScriptAction::Command(Command::PurchaseUnit {
                unit: QueuedUnit::new(kind, SHOP_OWNER, ViewerId::anonymous()),
            })
        }
        "subscribe" => ScriptAction::Command(Command::GrantSubscription {
            viewer: arguments.viewer()?,
        }),
        "member" => ScriptAction::Command(Command::GrantMembership {
            viewer: arguments.viewer()?,
        }),
        "superchat" => ScriptAction::Command(Command::GrantSuperChat {
            viewer: arguments.viewer()?,
            tier: arguments.number("tier")?,
            amount: arguments.number("amount")?,
        }),
        "gift" => ScriptAction::Command(Command::GrantGift {
            viewer: arguments.viewer()?,
            tier: arguments.number("tier")?,
            coins: arguments.number("coin value")?,
        }),
        "team" => ScriptAction::Command(Command::GrantTeamJoin {
            viewer: arguments.viewer()?,
            level: arguments.number("level")?,
        }),
        "like" => ScriptAction::Command(Command::ReachLikeMilestone {
            index: arguments.number("milestone index")?,
        }),
        other => return Err(ScriptErrorKind::UnknownAction(other.to_owned())),
    };
    Ok(ScriptEntry { at, action })
}

fn parse_timestamp(stamp: &str) -> Result<Duration, ScriptErrorKind> {
    let invalid = || ScriptErrorKind::InvalidTimestamp(stamp.to_owned());
    let seconds = stamp
        .strip_prefix("t=")
        .ok_or_else(invalid)?
        .parse::<f32>()
        .map_err(|_| invalid())?;
    Duration::try_from_secs_f32(seconds).map_err(|_| invalid())
}

fn parse_unit(name: &str) -> Result<UnitType, ScriptErrorKind> {
    UnitType::ALL
        .into_iter()
        .find(|kind| format!("{kind:?}").eq_ignore_ascii_case(name))
        .ok_or_else(|| ScriptErrorKind::UnknownUnit(name.to_owned()))
}

struct Arguments<'line> {
    action: &'line str,
    rest: &'line str,
}

impl<'line> Arguments<'line> {
    fn new(action: &'line str, rest: &'line str) -> Self {
        Self { action, rest }
    }

    fn missing(&self, argument: &'static str) -> ScriptErrorKind {
        ScriptErrorKind::MissingArgument {
            action: self.action.to_owned(),
            argument,
        }
    }

    fn word(&mut self, argument: &'static str) -> Result<&'line str, ScriptErrorKind> {
        let (word, rest) = self
            .rest
            .split_once(char::is_whitespace)
            .unwrap_or((self.rest, ""));
        if word.is_empty() {
            return Err(self.missing(argument));
        }
        self.rest = rest.trim_start();
        Ok(word)
    }

    fn remainder(&mut self, argument: &'static str) -> Result<&'line str, ScriptErrorKind> {
        if self.rest.is_empty() {
            return Err(self.missing(argument));
        }
        Ok(std::mem::take(&mut self.rest))
    }

    fn viewer(&mut self) -> Result<ViewerId, ScriptErrorKind> {
        self.word("viewer").map(ViewerId::new)
    }

    fn number<T: std::str::FromStr>(&mut self, argument: &'static str) -> Result<T, ScriptErrorKind> {
        let word = self.word(argument)?;
        word.parse()
            .map_err(|_| ScriptErrorKind::InvalidNumber(word.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_lines_keep_the_whole_message() {
        let script = Script::parse("t=1.5 chat u1 Alice send a knight please").expect("parses");
        assert_eq!(
            script.entries,
            vec![ScriptEntry {
                at: Duration::from_millis(1500),
                action: ScriptAction::Chat {
                    viewer: ViewerId::new("u1"),
                    name: "Alice".to_owned(),
                    text: "send a knight please".to_owned(),
                },
            }]
        );
    }

    #[test]
    fn entries_run_in_time_order() {
        let mut script = Script::parse(
            "# opening\n\
             t=5 start\n\
             t=0 buy Archer\n\
             \n\
             t=0 place-all\n",
        )
        .expect("parses");
        assert_eq!(script.len(), 3);

        let opening: Vec<_> = script
            .due(Duration::from_secs(1))
            .iter()
            .map(|entry| entry.action.clone())
            .collect();
        assert!(matches!(
            opening[0],
            ScriptAction::Command(Command::PurchaseUnit { .. })
        ));
        assert_eq!(opening[1], ScriptAction::Command(Command::PlaceAllQueued));
        assert!(script.due(Duration::from_secs(4)).is_empty());
        assert_eq!(script.due(Duration::from_secs(5)).len(), 1);
        assert!(script.due(Duration::from_secs(60)).is_empty());
    }

    #[test]
    fn platform_events_parse_their_arguments() {
        let script = Script::parse("t=2 gift u7 5 30000\nt=3 like 2").expect("parses");
        assert_eq!(
            script.entries[0].action,
            ScriptAction::Command(Command::GrantGift {
                viewer: ViewerId::new("u7"),
                tier: 5,
                coins: 30_000,
            })
        );
        assert_eq!(
            script.entries[1].action,
            ScriptAction::Command(Command::ReachLikeMilestone { index: 2 })
        );
    }

    #[test]
    fn errors_name_the_offending_line() {
        let error = Script::parse("t=0 start\nsoon start").expect_err("bad timestamp");
        assert_eq!(error.line, 2);
        assert_eq!(
            error.kind,
            ScriptErrorKind::InvalidTimestamp("soon".to_owned())
        );

        let error = Script::parse("t=0 buy dragon").expect_err("bad unit");
        assert_eq!(error.kind, ScriptErrorKind::UnknownUnit("dragon".to_owned()));

        let error = Script::parse("t=0 superchat u1 two 500").expect_err("bad tier");
        assert_eq!(error.kind, ScriptErrorKind::InvalidNumber("two".to_owned()));

        let error = Script::parse("t=0 chat u1").expect_err("missing name");
        assert_eq!(
            error.kind,
            ScriptErrorKind::MissingArgument {
                action: "chat".to_owned(),
                argument: "name",
            }
        );
    }
}
