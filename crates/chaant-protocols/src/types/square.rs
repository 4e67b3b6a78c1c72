//! Board coordinates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AgentError;

const FILE_NOTATIONS: [char; 8] = ['a', 'b', 'c', 'd', 'e', 'f', 'g', 'h'];

/// An immutable board coordinate. `file` and `rank` are always in `0..8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Square {
    file: u8,
    rank: u8,
}

impl Square {
    pub fn new(file: u8, rank: u8) -> Result<Self, AgentError> {
        if file >= 8 || rank >= 8 {
            return Err(AgentError::InvalidNotation(format!(
                "file {} / rank {} is outside the board",
                file, rank
            )));
        }
        Ok(Self { file, rank })
    }

    /// Build from indices already known to be on the board.
    pub(crate) const fn at(file: u8, rank: u8) -> Self {
        Self { file, rank }
    }

    /// Parse a square from notation such as `e4`.
    pub fn parse(notation: &str) -> Result<Self, AgentError> {
        let not = notation.trim();
        let mut chars = not.chars();
        let (Some(file_char), Some(rank_char), None) = (chars.next(), chars.next(), chars.next())
        else {
            return Err(AgentError::InvalidNotation(notation.to_string()));
        };

        let file = Self::file_index(file_char)?;
        let rank = match rank_char.to_digit(10) {
            Some(d @ 1..=8) => (d - 1) as u8,
            _ => return Err(AgentError::InvalidNotation(notation.to_string())),
        };
        Ok(Self { file, rank })
    }

    /// Map a file letter (case-insensitive) to its index.
    pub fn file_index(file: char) -> Result<u8, AgentError> {
        let lower = file.to_ascii_lowercase();
        FILE_NOTATIONS
            .iter()
            .position(|&f| f == lower)
            .map(|idx| idx as u8)
            .ok_or_else(|| {
                AgentError::InvalidNotation(format!("file {} is not on the board", file))
            })
    }

    /// Iterate all 64 squares, a1 first.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..8u8).flat_map(|file| (0..8u8).map(move |rank| Square { file, rank }))
    }

    pub fn file(&self) -> u8 {
        self.file
    }

    pub fn rank(&self) -> u8 {
        self.rank
    }

    pub fn file_notation(&self) -> char {
        FILE_NOTATIONS[self.file as usize]
    }

    pub fn rank_notation(&self) -> char {
        (b'1' + self.rank) as char
    }

    pub fn notation(&self) -> String {
        format!("{}{}", self.file_notation(), self.rank_notation())
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file_notation(), self.rank_notation())
    }
}

impl FromStr for Square {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Square {
    type Error = AgentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Square> for String {
    fn from(square: Square) -> Self {
        square.notation()
    }
}

#[cfg(test)]
#[path = "square_tests.rs"]
mod tests;
