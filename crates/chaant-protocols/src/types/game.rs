//! Game-level values: time controls, resolved moves and bot profiles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{PieceKind, Square};

/// Online time-control presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeControl {
    Rapid,
    Blitz,
    Bullet,
    Classical,
}

impl TimeControl {
    /// Label of the preset button. `min_unit` is the localized minute unit.
    pub fn label(&self, min_unit: &str) -> String {
        match self {
            TimeControl::Rapid => format!("10 {}", min_unit),
            TimeControl::Blitz => format!("5 {}", min_unit),
            TimeControl::Bullet => "1 | 1".to_string(),
            TimeControl::Classical => format!("30 {}", min_unit),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeControl::Rapid => "rapid",
            TimeControl::Blitz => "blitz",
            TimeControl::Bullet => "bullet",
            TimeControl::Classical => "classical",
        }
    }
}

impl fmt::Display for TimeControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeControl {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rapid" => Ok(TimeControl::Rapid),
            "blitz" => Ok(TimeControl::Blitz),
            "bullet" => Ok(TimeControl::Bullet),
            "classical" => Ok(TimeControl::Classical),
            other => Err(format!("unknown time control: {}", other)),
        }
    }
}

/// A notation resolved against the live position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedMove {
    pub from: Square,
    pub to: Square,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promote_to: Option<PieceKind>,
}

impl ResolvedMove {
    pub fn new(from: Square, to: Square, promote_to: Option<PieceKind>) -> Self {
        Self {
            from,
            to,
            promote_to,
        }
    }

    /// Long algebraic form, e.g. `e2e4` or `e7e8q`.
    pub fn uci(&self) -> String {
        match self.promote_to {
            Some(piece) => format!("{}{}{}", self.from, self.to, piece.letter()),
            None => format!("{}{}", self.from, self.to),
        }
    }
}

impl fmt::Display for ResolvedMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uci())
    }
}

/// One entry of the site's bot catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotProfile {
    pub name: String,
    pub elo: u32,
    pub selector_group: String,
}

impl BotProfile {
    pub fn new(name: impl Into<String>, elo: u32, selector_group: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            elo,
            selector_group: selector_group.into(),
        }
    }
}
