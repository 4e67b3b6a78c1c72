//! Move resolution.
//!
//! Turns a parsed notation into concrete squares by asking the page which of
//! the agent's pieces can legally reach the destination. Legality itself is
//! always the page's call.

use tracing::debug;

use chaant_protocols::{
    AgentError, BoardCapability, Color, ParsedNotation, PieceKind, ResolvedMove, Square,
};

/// Resolve `parsed` for `color` against the live position on `board`.
///
/// `notation` is only used for error messages. Board failures surface as
/// `AgentUnreachable`.
pub async fn resolve_move<B>(
    board: &B,
    color: Color,
    parsed: &ParsedNotation,
    notation: &str,
) -> Result<ResolvedMove, AgentError>
where
    B: BoardCapability + ?Sized,
{
    let (piece, origin_hint, dest, promote_to) = match parsed {
        ParsedNotation::Castle(side) => {
            let (from, to) = side.king_squares(color);
            return Ok(ResolvedMove::new(from, to, None));
        }
        ParsedNotation::Standard {
            piece,
            origin_hint,
            dest,
            promote_to,
        } => (*piece, origin_hint.as_str(), *dest, *promote_to),
    };

    let mut candidates: Vec<Square> = Vec::new();
    for on_board in board.pieces(color).await? {
        if on_board.kind != piece || on_board.color != color {
            continue;
        }
        let legal = board.legal_moves_for_square(on_board.square).await?;
        if legal.contains(&dest) {
            candidates.push(on_board.square);
        }
    }

    if candidates.len() > 1 {
        candidates.retain(|sq| sq.notation().contains(origin_hint));
        if candidates.len() > 1 {
            return Err(AgentError::AmbiguousMove(notation.to_string()));
        }
    }

    let Some(&from) = candidates.first() else {
        return Err(AgentError::NoLegalMove(notation.to_string()));
    };

    let promoting = piece == PieceKind::Pawn && dest.rank() == color.promotion_rank();
    match (promoting, promote_to) {
        (true, None) => return Err(AgentError::PromotionRequired(notation.to_string())),
        (false, Some(_)) => return Err(AgentError::InvalidNotation(notation.to_string())),
        _ => {}
    }

    debug!("Resolved {} to {}{}", notation, from, dest);
    Ok(ResolvedMove::new(from, dest, promote_to))
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
