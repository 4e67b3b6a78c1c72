//! Move notation grammar.
//!
//! Accepts standard algebraic notation in the forms players actually type:
//! `e4`, `Nf3`, `exd5`, `Nbd2`, `R1a3`, `e8=Q`, `e8q`, `O-O`, `0-0-0`, with
//! optional check and annotation suffixes. A lowercase `b` is always read as
//! a file, so `bxc4` is a pawn capture while `Bxc4` is a bishop capture.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::AgentError;
use crate::types::{Color, PieceKind, Square};

static CASTLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:o-o(-o)?|0-0(-0)?)[+#]?[!?]*$").expect("castle pattern")
});

static MOVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([KQRBNkqrn])?([a-h])?([1-8])?(x)?([a-hA-H][1-8])(?:=?([QRBNqrbn]))?[+#]?[!?]*$")
        .expect("move pattern")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CastleSide {
    King,
    Queen,
}

impl CastleSide {
    /// King origin and destination for `color`.
    pub fn king_squares(&self, color: Color) -> (Square, Square) {
        let back_rank = match color {
            Color::White => 0,
            Color::Black => 7,
        };
        let to_file = match self {
            CastleSide::King => 6,
            CastleSide::Queen => 2,
        };
        (Square::at(4, back_rank), Square::at(to_file, back_rank))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedNotation {
    Castle(CastleSide),
    Standard {
        piece: PieceKind,
        /// Lowercase origin fragment (file, rank or both), empty when absent.
        origin_hint: String,
        dest: Square,
        promote_to: Option<PieceKind>,
    },
}

/// Parse a move notation. Whitespace anywhere in the input is ignored.
pub fn parse_notation(input: &str) -> Result<ParsedNotation, AgentError> {
    let cleaned: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return Err(AgentError::InvalidNotation(input.to_string()));
    }

    if let Some(caps) = CASTLE_RE.captures(&cleaned) {
        let long = caps.get(1).is_some() || caps.get(2).is_some();
        let side = if long {
            CastleSide::Queen
        } else {
            CastleSide::King
        };
        return Ok(ParsedNotation::Castle(side));
    }

    let caps = MOVE_RE
        .captures(&cleaned)
        .ok_or_else(|| AgentError::InvalidNotation(input.to_string()))?;

    let piece = match caps.get(1) {
        Some(m) => m
            .as_str()
            .chars()
            .next()
            .and_then(PieceKind::from_letter)
            .ok_or_else(|| AgentError::InvalidNotation(input.to_string()))?,
        None => PieceKind::Pawn,
    };

    let mut origin_hint = String::new();
    if let Some(file) = caps.get(2) {
        origin_hint.push_str(file.as_str());
    }
    if let Some(rank) = caps.get(3) {
        origin_hint.push_str(rank.as_str());
    }

    let dest = Square::parse(&caps[5])?;

    let promote_to = caps
        .get(6)
        .and_then(|m| m.as_str().chars().next())
        .and_then(PieceKind::from_letter);

    if promote_to.is_some() && piece != PieceKind::Pawn {
        return Err(AgentError::InvalidNotation(input.to_string()));
    }

    Ok(ParsedNotation::Standard {
        piece,
        origin_hint,
        dest,
        promote_to,
    })
}

#[cfg(test)]
#[path = "notation_tests.rs"]
mod tests;
