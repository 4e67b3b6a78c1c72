use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chaant_protocols::{MoveRecord, PieceKind};

use crate::site;
use crate::testing::{piece, sq, ScriptedPage};

fn attach(page: &Arc<ScriptedPage>) -> ChesscomAgent {
    ChesscomAgent::attach(page.clone(), &PageRegistry::new(), AgentConfig::default()).unwrap()
}

fn bot() -> BotProfile {
    BotProfile::new("Martin", 250, "Beginner")
}

async fn playing_as(color: Color) -> (Arc<ScriptedPage>, ChesscomAgent) {
    let page = ScriptedPage::opening("tab");
    page.set_playing_as(Some(color));
    let agent = attach(&page);
    agent.play_computer(&bot(), color.is_black()).await.unwrap();
    (page, agent)
}

#[test]
fn test_last_ply_of_parity() {
    let history: Vec<String> = ["e4", "e5", "Nf3"].iter().map(|s| s.to_string()).collect();
    assert_eq!(last_ply_of(&history, Color::White).as_deref(), Some("nf3"));
    assert_eq!(last_ply_of(&history, Color::Black).as_deref(), Some("e5"));
    assert_eq!(last_ply_of(&history[..1], Color::Black), None);
    assert_eq!(last_ply_of(&[], Color::White), None);
}

#[tokio::test(start_paused = true)]
async fn test_play_computer_as_white() {
    let (page, agent) = playing_as(Color::White).await;

    assert_eq!(agent.status(), AgentState::TakingTurn);
    assert_eq!(agent.black_or_white().unwrap(), "white");
    assert_eq!(agent.play_state(), PlayState::AgainstComputer);
    assert_eq!(agent.move_counter(), 0);
    assert_eq!(page.url(), site::COMPUTER_URL);

    let clicks = page.clicks();
    assert!(clicks.contains(&site::bot_tile(&bot())));
    assert!(clicks.contains(&site::CHOOSE_BUTTON.to_string()));
    assert!(clicks.contains(&site::color_radio(false)));
    assert!(clicks.contains(&site::play_button("Play")));
}

#[tokio::test(start_paused = true)]
async fn test_play_computer_as_black_waits_for_first_turn() {
    let page = ScriptedPage::opening("tab");
    page.set_playing_as(Some(Color::Black));
    let agent = attach(&page);

    let state = agent.play_computer(&bot(), true).await.unwrap();
    assert_eq!(state, AgentState::FirstWaitingTurn);
    assert_eq!(agent.black_or_white().unwrap(), "black");
    assert_eq!(agent.move_counter(), 1);

    let opponent = page.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(2)).await;
        opponent.opponent_move("e4");
    });

    assert_eq!(agent.wait_turn().await.unwrap(), AgentState::TakingTurn);
}

#[tokio::test(start_paused = true)]
async fn test_move_e4_as_white() {
    let (page, agent) = playing_as(Color::White).await;

    let state = agent.move_piece("e4").await.unwrap();
    assert_eq!(state, AgentState::MovedWaitingTurn);
    assert_eq!(agent.status(), AgentState::MovedWaitingTurn);
    assert_eq!(agent.agent_last_move().await.unwrap(), "e4");
    assert_eq!(agent.move_counter(), 2);
    assert_eq!(page.drags(), vec![(sq("e2"), sq("e4"))]);
}

#[tokio::test(start_paused = true)]
async fn test_black_moves_on_flipped_board() {
    let (page, agent) = playing_as(Color::Black).await;
    page.opponent_move("e4");

    assert_eq!(agent.move_piece("e5").await.unwrap(), AgentState::MovedWaitingTurn);
    assert_eq!(page.drags(), vec![(sq("e7"), sq("e5"))]);
    assert_eq!(agent.last_move().await.unwrap(), "e5");
    assert_eq!(agent.agent_last_move().await.unwrap(), "e5");
    assert_eq!(agent.move_counter(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_move_waits_for_turn_after_previous_move() {
    let (page, agent) = playing_as(Color::White).await;
    page.queue_replies(&["e5"], Duration::from_secs(3));

    agent.move_piece("e4").await.unwrap();
    assert_eq!(agent.move_piece("Nf3").await.unwrap(), AgentState::MovedWaitingTurn);
    assert_eq!(page.history(), vec!["e4", "e5", "Nf3"]);
    assert_eq!(agent.last_move().await.unwrap(), "nf3");
}

#[tokio::test(start_paused = true)]
async fn test_last_move_versus_agent_last_move() {
    let (page, agent) = playing_as(Color::White).await;
    assert_eq!(agent.last_move().await.unwrap(), "");
    assert_eq!(agent.agent_last_move().await.unwrap(), "");

    agent.move_piece("e4").await.unwrap();
    page.opponent_move("e5");

    assert_eq!(agent.last_move().await.unwrap(), "e5");
    assert_eq!(agent.agent_last_move().await.unwrap(), "e4");
}

#[tokio::test(start_paused = true)]
async fn test_wait_turn_when_not_playing_touches_nothing() {
    let page = ScriptedPage::opening("tab");
    let agent = attach(&page);

    let err = agent.wait_turn().await.unwrap_err();
    assert!(matches!(err.cause, AgentError::NotPlaying));
    assert_eq!(err.state, AgentState::Idle);
    assert_eq!(page.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_second_agent_on_same_page_is_rejected() {
    let page = ScriptedPage::opening("tab");
    let registry = PageRegistry::new();

    let first = ChesscomAgent::attach(page.clone(), &registry, AgentConfig::default()).unwrap();
    let err = ChesscomAgent::attach(page.clone(), &registry, AgentConfig::default())
        .err()
        .unwrap();
    assert!(matches!(err, AgentError::PageAlreadyAttached(_)));

    first.dispose().await.unwrap();
    assert!(ChesscomAgent::attach(page.clone(), &registry, AgentConfig::default()).is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_color_undefined_before_play() {
    let page = ScriptedPage::opening("tab");
    let agent = attach(&page);
    assert!(matches!(agent.color(), Err(AgentError::ColorUndefined)));
    assert!(agent.black_or_white().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_unconfirmed_move_reloads_and_retries() {
    let (page, agent) = playing_as(Color::White).await;
    page.ignore_drags(1);

    assert_eq!(agent.move_piece("d4").await.unwrap(), AgentState::MovedWaitingTurn);
    assert_eq!(page.reloads(), 1);
    assert_eq!(page.drags().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_retry_waits_for_board_after_reload() {
    let (page, agent) = playing_as(Color::White).await;
    page.ignore_drags(1);
    page.hide_board_on_reload(Duration::from_secs(2));

    assert_eq!(agent.move_piece("d4").await.unwrap(), AgentState::MovedWaitingTurn);
    assert_eq!(page.reloads(), 1);
    assert_eq!(page.drags().len(), 2);
    assert_eq!(page.history(), vec!["d4"]);
}

#[tokio::test(start_paused = true)]
async fn test_board_missing_after_reload_is_unconfirmed() {
    let (page, agent) = playing_as(Color::White).await;
    page.ignore_drags(1);
    page.hide_board_on_reload(Duration::from_secs(60));

    let err = agent.move_piece("d4").await.unwrap_err();
    assert!(matches!(err.cause, AgentError::MoveTimedOut(ref m) if m == "d2d4"));
    assert_eq!(err.state, AgentState::MovedIllegal);
    assert_eq!(agent.status(), AgentState::MovedIllegal);
    assert_eq!(page.drags().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_move_never_confirmed_is_illegal() {
    let (page, agent) = playing_as(Color::White).await;
    page.ignore_drags(2);

    let err = agent.move_piece("d4").await.unwrap_err();
    assert!(matches!(err.cause, AgentError::MoveTimedOut(ref m) if m == "d2d4"));
    assert_eq!(err.state, AgentState::MovedIllegal);
    assert_eq!(agent.status(), AgentState::MovedIllegal);
    assert_eq!(page.reloads(), 1);
    assert_eq!(agent.move_counter(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_illegal_notation_keeps_turn() {
    let (_page, agent) = playing_as(Color::White).await;

    let err = agent.move_piece("Qh5").await.unwrap_err();
    assert!(matches!(err.cause, AgentError::NoLegalMove(_)));
    assert_eq!(err.state, AgentState::TakingTurn);

    let err = agent.move_piece("z9").await.unwrap_err();
    assert!(matches!(err.cause, AgentError::InvalidNotation(_)));
    assert_eq!(agent.status(), AgentState::TakingTurn);
}

#[tokio::test(start_paused = true)]
async fn test_promotion_clicks_picker() {
    let (page, agent) = playing_as(Color::White).await;
    page.set_pieces(vec![
        piece(PieceKind::King, Color::White, "e1"),
        piece(PieceKind::Pawn, Color::White, "b7"),
        piece(PieceKind::King, Color::Black, "h8"),
    ]);
    page.set_legal("b7", &["b8"]);

    let err = agent.move_piece("b8").await.unwrap_err();
    assert!(matches!(err.cause, AgentError::PromotionRequired(_)));
    assert_eq!(err.state, AgentState::TakingTurn);

    assert_eq!(agent.move_piece("b8=Q").await.unwrap(), AgentState::MovedWaitingTurn);
    assert!(page
        .clicks()
        .contains(&site::promotion_piece(Color::White, PieceKind::Queen)));
    assert_eq!(page.history(), vec!["b8=Q"]);
    assert_eq!(agent.agent_last_move().await.unwrap(), "b8=q");
}

#[tokio::test(start_paused = true)]
async fn test_game_over_while_waiting_returns_idle() {
    let (page, agent) = playing_as(Color::Black).await;
    let ended = Arc::new(AtomicUsize::new(0));
    let counter = ended.clone();
    agent.set_game_over_handler(Arc::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    let opponent = page.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        opponent.end_game();
    });

    assert_eq!(agent.wait_turn().await.unwrap(), AgentState::Idle);
    assert_eq!(agent.play_state(), PlayState::NotPlaying);
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(ended.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_watcher_observes_game_over() {
    let (page, agent) = playing_as(Color::White).await;
    let ended = Arc::new(AtomicUsize::new(0));
    let counter = ended.clone();
    agent.set_game_over_handler(Arc::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    page.end_game();
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(agent.status(), AgentState::Idle);
    assert_eq!(agent.play_state(), PlayState::NotPlaying);
    assert_eq!(ended.load(Ordering::SeqCst), 1);

    let err = agent.wait_turn().await.unwrap_err();
    assert!(matches!(err.cause, AgentError::NotPlaying));
}

#[tokio::test(start_paused = true)]
async fn test_wait_turn_times_out() {
    let (_page, agent) = playing_as(Color::Black).await;

    let err = agent.wait_turn().await.unwrap_err();
    assert!(matches!(err.cause, AgentError::WaitTimedOut(d) if d == Duration::from_secs(240)));
    assert_eq!(err.state, AgentState::BrowserPageOutOfReach);
    assert!(err.is_unreachable());
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_page_is_out_of_reach() {
    let (page, agent) = playing_as(Color::White).await;
    page.set_unreachable();

    let err = agent.move_piece("e4").await.unwrap_err();
    assert!(matches!(err.cause, AgentError::AgentUnreachable(_)));
    assert_eq!(err.state, AgentState::BrowserPageOutOfReach);
    assert_eq!(agent.status(), AgentState::BrowserPageOutOfReach);
}

#[tokio::test(start_paused = true)]
async fn test_page_not_in_game_is_idle_illegal_play() {
    let page = ScriptedPage::opening("tab");
    page.set_playing_as(Some(Color::White));
    page.set_game_active(false);
    let agent = attach(&page);

    let err = agent.play_computer(&bot(), false).await.unwrap_err();
    assert!(matches!(err.cause, AgentError::IdleIllegalPlay));
    assert_eq!(err.state, AgentState::IdleIllegalPlay);
    assert_eq!(agent.play_state(), PlayState::NotPlaying);
}

#[tokio::test(start_paused = true)]
async fn test_missing_bot_is_out_of_reach() {
    let page = ScriptedPage::opening("tab");
    page.set_playing_as(Some(Color::White));
    page.set_missing(&site::bot_tile(&bot()));
    let agent = attach(&page);

    let err = agent.play_computer(&bot(), false).await.unwrap_err();
    assert!(matches!(err.cause, AgentError::AgentUnreachable(_)));
    assert_eq!(err.state, AgentState::BrowserPageOutOfReach);
}

#[tokio::test(start_paused = true)]
async fn test_play_online_as_guest() {
    let page = ScriptedPage::opening("tab");
    page.set_playing_as(Some(Color::White));
    page.set_guest(true);
    let agent = attach(&page);

    let state = agent.play_blitz().await.unwrap();
    assert_eq!(state, AgentState::TakingTurn);
    assert_eq!(agent.play_state(), PlayState::AgainstHuman);
    assert_eq!(page.url(), site::ONLINE_URL);
    assert!(page.clicks().contains(&site::GUEST_BUTTON.to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_play_online_ignores_missing_guest_button() {
    let page = ScriptedPage::opening("tab");
    page.set_playing_as(Some(Color::Black));
    page.set_guest(true);
    page.set_missing(site::GUEST_BUTTON);
    let agent = attach(&page);

    assert_eq!(agent.play_rapid().await.unwrap(), AgentState::FirstWaitingTurn);
    assert!(!page.clicks().contains(&site::GUEST_BUTTON.to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_play_online_without_preset_fails() {
    let page = ScriptedPage::opening("tab");
    page.set_playing_as(Some(Color::White));
    page.set_missing("30 min");
    let agent = attach(&page);

    let err = agent.play_classical().await.unwrap_err();
    assert_eq!(err.state, AgentState::BrowserPageOutOfReach);
    assert_eq!(agent.play_state(), PlayState::NotPlaying);
}

#[tokio::test(start_paused = true)]
async fn test_listeners_see_own_moves_only() {
    let (page, agent) = playing_as(Color::White).await;
    page.queue_replies(&["e5", "d5"], Duration::from_secs(1));

    let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let sink = seen.clone();
    let guard = agent.on_move(Arc::new(move |record: &MoveRecord| {
        sink.lock().push((record.notation.clone(), record.plies));
        Ok(())
    }));
    let _failing = agent.on_move(Arc::new(|_: &MoveRecord| Err(AgentError::NotPlaying)));

    agent.move_piece("e4").await.unwrap();
    agent.move_piece("Nc3").await.unwrap();
    assert_eq!(
        *seen.lock(),
        vec![("e4".to_string(), 1), ("Nc3".to_string(), 3)]
    );

    drop(guard);
    agent.move_piece("d4").await.unwrap();
    assert_eq!(seen.lock().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_dispose_closes_page_and_releases_claim() {
    let page = ScriptedPage::opening("tab");
    let registry = PageRegistry::new();
    let agent = ChesscomAgent::attach(page.clone(), &registry, AgentConfig::default()).unwrap();
    assert!(registry.is_claimed(agent.page_id()));

    agent.dispose().await.unwrap();
    assert!(page.is_closed());
    assert!(registry.is_empty());
}
