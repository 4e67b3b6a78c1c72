use super::*;
use crate::testing::{piece, sq, ScriptedPage};
use chaant_protocols::parse_notation;

async fn resolve(page: &ScriptedPage, color: Color, notation: &str) -> Result<ResolvedMove, AgentError> {
    let parsed = parse_notation(notation)?;
    resolve_move(page, color, &parsed, notation).await
}

#[tokio::test]
async fn test_pawn_push_from_opening() {
    let page = ScriptedPage::opening("p");
    let mv = resolve(&page, Color::White, "e4").await.unwrap();
    assert_eq!(mv.uci(), "e2e4");

    let mv = resolve(&page, Color::Black, "c5").await.unwrap();
    assert_eq!(mv.uci(), "c7c5");
}

#[tokio::test]
async fn test_single_knight() {
    let page = ScriptedPage::opening("p");
    let mv = resolve(&page, Color::White, "Nf3").await.unwrap();
    assert_eq!(mv.from, sq("g1"));
    assert_eq!(mv.to, sq("f3"));
}

#[tokio::test]
async fn test_two_knights_need_disambiguation() {
    let page = ScriptedPage::new("p");
    page.set_pieces(vec![
        piece(PieceKind::Knight, Color::White, "b1"),
        piece(PieceKind::Knight, Color::White, "f3"),
        piece(PieceKind::King, Color::White, "e1"),
    ]);
    page.set_legal("b1", &["a3", "c3", "d2"]);
    page.set_legal("f3", &["d2", "d4", "e5", "g5", "h4"]);

    let err = resolve(&page, Color::White, "Nd2").await.unwrap_err();
    assert!(matches!(err, AgentError::AmbiguousMove(_)));

    let mv = resolve(&page, Color::White, "Nbd2").await.unwrap();
    assert_eq!(mv.from, sq("b1"));

    let mv = resolve(&page, Color::White, "Nfd2").await.unwrap();
    assert_eq!(mv.from, sq("f3"));
}

#[tokio::test]
async fn test_wrong_disambiguator_is_no_legal_move() {
    let page = ScriptedPage::new("p");
    page.set_pieces(vec![
        piece(PieceKind::Knight, Color::White, "b1"),
        piece(PieceKind::Knight, Color::White, "f3"),
    ]);
    page.set_legal("b1", &["d2"]);
    page.set_legal("f3", &["d2"]);

    let err = resolve(&page, Color::White, "Ncd2").await.unwrap_err();
    assert!(matches!(err, AgentError::NoLegalMove(_)));
}

#[tokio::test]
async fn test_no_piece_reaches_destination() {
    let page = ScriptedPage::opening("p");
    let err = resolve(&page, Color::White, "Nd4").await.unwrap_err();
    assert!(matches!(err, AgentError::NoLegalMove(_)));

    let err = resolve(&page, Color::White, "e5").await.unwrap_err();
    assert!(matches!(err, AgentError::NoLegalMove(_)));
}

#[tokio::test]
async fn test_only_own_color_is_considered() {
    let page = ScriptedPage::opening("p");
    // e5 is legal for black's e-pawn only.
    let err = resolve(&page, Color::White, "e5").await.unwrap_err();
    assert!(matches!(err, AgentError::NoLegalMove(_)));
    assert!(resolve(&page, Color::Black, "e5").await.is_ok());
}

#[tokio::test]
async fn test_castling_uses_table_without_board_queries() {
    let page = ScriptedPage::new("p");
    let mv = resolve(&page, Color::White, "O-O").await.unwrap();
    assert_eq!(mv.uci(), "e1g1");
    let mv = resolve(&page, Color::Black, "0-0-0").await.unwrap();
    assert_eq!(mv.uci(), "e8c8");
    assert_eq!(page.calls(), 0);
}

#[tokio::test]
async fn test_promotion_required_on_last_rank() {
    let page = ScriptedPage::new("p");
    page.set_pieces(vec![
        piece(PieceKind::Pawn, Color::White, "e7"),
        piece(PieceKind::Pawn, Color::Black, "d2"),
    ]);
    page.set_legal("e7", &["e8"]);
    page.set_legal("d2", &["d1"]);

    let err = resolve(&page, Color::White, "e8").await.unwrap_err();
    assert!(matches!(err, AgentError::PromotionRequired(_)));

    let mv = resolve(&page, Color::White, "e8=Q").await.unwrap();
    assert_eq!(mv.promote_to, Some(PieceKind::Queen));

    let err = resolve(&page, Color::Black, "d1").await.unwrap_err();
    assert!(matches!(err, AgentError::PromotionRequired(_)));

    let mv = resolve(&page, Color::Black, "d1n").await.unwrap();
    assert_eq!(mv.uci(), "d2d1n");
}

#[tokio::test]
async fn test_promotion_piece_off_last_rank_is_invalid() {
    let page = ScriptedPage::opening("p");
    let err = resolve(&page, Color::White, "e4=Q").await.unwrap_err();
    assert!(matches!(err, AgentError::InvalidNotation(_)));
}

#[tokio::test]
async fn test_board_failure_is_unreachable() {
    let page = ScriptedPage::opening("p");
    page.set_unreachable();
    let err = resolve(&page, Color::White, "e4").await.unwrap_err();
    assert!(matches!(err, AgentError::AgentUnreachable(_)));
}
