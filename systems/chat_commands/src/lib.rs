#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Keyword matcher that maps chat lines onto world commands.
//!
//! A line yields at most one command. Ultimate keywords win over stance
//! keywords, which win over summon keywords. Matching is a case-insensitive
//! substring search against the keyword table of the active locale.

use std::{fmt, str::FromStr};

use serde::Deserialize;
use stream_siege_core::{
    Appearance, Command, GamePhase, QueuedUnit, Stance, UnitType, ViewerId,
};

/// Number of palette variants a summoned unit may wear.
const APPEARANCE_VARIANTS: u16 = 8;

/// Language whose keywords are recognised in chat.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// English keywords.
    #[default]
    English,
    /// Japanese keywords.
    Japanese,
}

impl Locale {
    fn keywords(self) -> &'static Keywords {
        match self {
            Self::English => &ENGLISH,
            Self::Japanese => &JAPANESE,
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::English => f.write_str("english"),
            Self::Japanese => f.write_str("japanese"),
        }
    }
}

/// Error returned when a locale name is not recognised.
#[derive(Debug, thiserror::Error)]
#[error("unknown locale `{0}` (expected `english` or `japanese`)")]
pub struct UnknownLocale(String);

impl FromStr for Locale {
    type Err = UnknownLocale;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "english" | "en" => Ok(Self::English),
            "japanese" | "ja" | "jp" => Ok(Self::Japanese),
            _ => Err(UnknownLocale(value.to_owned())),
        }
    }
}

struct Keywords {
    ultimate: &'static [&'static str],
    attack: &'static [&'static str],
    defend: &'static [&'static str],
    units: [(UnitType, &'static [&'static str]); 6],
}

const ENGLISH: Keywords = Keywords {
    ultimate: &["ultimate", "special"],
    attack: &["attack", "charge"],
    defend: &["defend", "retreat"],
    units: [
        (UnitType::Knight, &["knight"]),
        (UnitType::Warrior, &["warrior", "soldier"]),
        (UnitType::Lancer, &["lancer", "spear"]),
        (UnitType::Archer, &["archer", "bow"]),
        (UnitType::Monk, &["monk", "healer"]),
        (UnitType::Mage, &["mage", "wizard"]),
    ],
};

const JAPANESE: Keywords = Keywords {
    ultimate: &["必殺", "奥義"],
    attack: &["攻撃", "突撃"],
    defend: &["防御", "守れ"],
    units: [
        (UnitType::Knight, &["騎士", "ナイト"]),
        (UnitType::Warrior, &["戦士", "剣士"]),
        (UnitType::Lancer, &["槍", "ランサー"]),
        (UnitType::Archer, &["弓", "アーチャー"]),
        (UnitType::Monk, &["僧侶", "回復"]),
        (UnitType::Mage, &["魔法", "魔導"]),
    ],
};

/// What a chat line asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatIntent {
    /// Summon a unit of the given type.
    Summon(UnitType),
    /// Switch the viewer's units to a stance.
    Stance(Stance),
    /// Cast the viewer's ultimate.
    Ultimate,
}

/// One chat line delivered by a platform adapter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatLine {
    /// Stable identifier of the author.
    pub viewer: ViewerId,
    /// Display name of the author.
    pub name: String,
    /// Raw message text.
    pub text: String,
}

impl ChatLine {
    /// Creates a chat line.
    #[must_use]
    pub fn new(viewer: ViewerId, name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            viewer,
            name: name.into(),
            text: text.into(),
        }
    }
}

/// Chat command system bound to one locale.
#[derive(Debug, Default)]
pub struct ChatCommands {
    locale: Locale,
}

impl ChatCommands {
    /// Creates a matcher for the locale.
    #[must_use]
    pub const fn new(locale: Locale) -> Self {
        Self { locale }
    }

    /// Active locale.
    #[must_use]
    pub const fn locale(&self) -> Locale {
        self.locale
    }

    /// Classifies a message, or returns `None` when no keyword matches.
    #[must_use]
    pub fn parse(&self, text: &str) -> Option<ChatIntent> {
        let text = text.to_lowercase();
        let keywords = self.locale.keywords();
        let mentions = |words: &[&str]| words.iter().any(|word| text.contains(word));

        if mentions(keywords.ultimate) {
            return Some(ChatIntent::Ultimate);
        }
        if mentions(keywords.defend) {
            return Some(ChatIntent::Stance(Stance::Defend));
        }
        if mentions(keywords.attack) {
            return Some(ChatIntent::Stance(Stance::Attack));
        }
        keywords
            .units
            .iter()
            .find(|(_, words)| mentions(*words))
            .map(|(kind, _)| ChatIntent::Summon(*kind))
    }

    /// Emits the command requested by the chat line, if any.
    ///
    /// Lines are ignored on the title and result screens.
    pub fn handle(&self, phase: GamePhase, line: &ChatLine, out: &mut Vec<Command>) {
        if !phase.accepts_commands() {
            return;
        }
        let Some(intent) = self.parse(&line.text) else {
            return;
        };
        tracing::debug!(viewer = line.viewer.as_str(), ?intent, "chat command");
        out.push(match intent {
            ChatIntent::Ultimate => Command::CastUltimate {
                viewer: line.viewer.clone(),
            },
            ChatIntent::Stance(stance) => Command::SetStance {
                viewer: line.viewer.clone(),
                stance,
            },
            ChatIntent::Summon(kind) => Command::SummonUnit {
                unit: QueuedUnit::new(kind, line.name.clone(), line.viewer.clone())
                    .with_appearance(appearance_for(&line.viewer)),
            },
        });
    }
}

/// Stable palette variant derived from the viewer id.
fn appearance_for(viewer: &ViewerId) -> Appearance {
    let hash = viewer
        .as_str()
        .bytes()
        .fold(0_u16, |hash, byte| hash.wrapping_mul(31).wrapping_add(u16::from(byte)));
    Appearance::new(hash % APPEARANCE_VARIANTS)
}
