use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use chaant_agent::testing::ScriptedPage;
use chaant_config::CatalogConfig;

use super::*;

/// Hands out scripted opening positions where the agent plays white.
#[derive(Default)]
pub(crate) struct ScriptedPages {
    opened: Mutex<Vec<Arc<ScriptedPage>>>,
    next: AtomicUsize,
}

impl ScriptedPages {
    pub(crate) fn page(&self, index: usize) -> Arc<ScriptedPage> {
        self.opened.lock()[index].clone()
    }

    pub(crate) fn count(&self) -> usize {
        self.opened.lock().len()
    }
}

#[async_trait]
impl PageFactory for ScriptedPages {
    async fn open_page(&self) -> Result<Arc<dyn ChessPage>, BrowserError> {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        let page = ScriptedPage::opening(&format!("tab-{}", n));
        page.set_playing_as(Some(Color::White));
        self.opened.lock().push(page.clone());
        let page: Arc<dyn ChessPage> = page;
        Ok(page)
    }
}

pub(crate) fn catalog() -> Arc<BotCatalog> {
    Arc::new(BotCatalog::with_bots(
        CatalogConfig::default(),
        vec![
            BotProfile::new("martin", 250, "beginner"),
            BotProfile::new("nelson", 1300, "intermediate"),
        ],
    ))
}

pub(crate) fn hub_with_pages() -> (AgentHub, Arc<ScriptedPages>) {
    let pages = Arc::new(ScriptedPages::default());
    let hub = AgentHub::new(Config::default(), pages.clone(), catalog());
    (hub, pages)
}

pub(crate) fn hub() -> AgentHub {
    hub_with_pages().0
}

fn martin() -> PlayRequest {
    PlayRequest::Computer {
        bot: "Martin".to_string(),
        as_black: false,
    }
}

#[tokio::test(start_paused = true)]
async fn test_create_agent_starts_idle() {
    let (hub, pages) = hub_with_pages();
    let id = hub.create(Platform::Chesscom).await.unwrap();

    assert_eq!(hub.len(), 1);
    assert_eq!(pages.count(), 1);
    let status = hub.status(&id).unwrap();
    assert_eq!(status.state, AgentState::Idle);
    assert_eq!(status.play_state, PlayState::NotPlaying);
    assert_eq!(status.color, None);
    assert_eq!(status.collective.total, 0);
}

#[tokio::test(start_paused = true)]
async fn test_each_agent_gets_its_own_page() {
    let (hub, pages) = hub_with_pages();
    let a = hub.create(Platform::Chesscom).await.unwrap();
    let b = hub.create(Platform::Chesscom).await.unwrap();
    assert_ne!(a, b);
    assert_eq!(pages.count(), 2);
    assert_eq!(hub.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_lichess_is_unsupported() {
    let (hub, pages) = hub_with_pages();
    let err = hub.create(Platform::Lichess).await.unwrap_err();
    assert!(matches!(err, ApiError::UnsupportedPlatform(_)));
    assert_eq!(pages.count(), 0);
    assert!(hub.is_empty());
}

#[test]
fn test_platform_and_versus_parse() {
    assert_eq!("ChessCom".parse::<Platform>().unwrap(), Platform::Chesscom);
    assert_eq!("lichess".parse::<Platform>().unwrap(), Platform::Lichess);
    assert!(matches!(
        "fics".parse::<Platform>(),
        Err(ApiError::UnknownPlatform(_))
    ));
    assert_eq!("online".parse::<Versus>().unwrap(), Versus::Online);
    assert!("human".parse::<Versus>().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_play_computer_uses_catalog_bot() {
    let (hub, pages) = hub_with_pages();
    let id = hub.create(Platform::Chesscom).await.unwrap();

    assert_eq!(hub.play(&id, martin()).await.unwrap(), AgentState::TakingTurn);
    let status = hub.status(&id).unwrap();
    assert_eq!(status.play_state, PlayState::AgainstComputer);
    assert_eq!(status.color, Some(Color::White));

    let tile = chaant_agent::site::bot_tile(&BotProfile::new("martin", 250, "beginner"));
    assert!(pages.page(0).clicks().contains(&tile));
}

#[tokio::test(start_paused = true)]
async fn test_play_unknown_bot() {
    let (hub, pages) = hub_with_pages();
    let id = hub.create(Platform::Chesscom).await.unwrap();

    let request = PlayRequest::Computer {
        bot: "stockfish".to_string(),
        as_black: false,
    };
    assert!(matches!(
        hub.play(&id, request).await,
        Err(ApiError::UnknownBot(_))
    ));
    assert!(pages.page(0).clicks().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_play_online() {
    let hub = hub();
    let id = hub.create(Platform::Chesscom).await.unwrap();
    let state = hub
        .play(&id, PlayRequest::Online(TimeControl::Blitz))
        .await
        .unwrap();
    assert_eq!(state, AgentState::TakingTurn);
    assert_eq!(hub.status(&id).unwrap().play_state, PlayState::AgainstHuman);
}

#[tokio::test(start_paused = true)]
async fn test_move_waits_then_plays() {
    let (hub, pages) = hub_with_pages();
    let id = hub.create(Platform::Chesscom).await.unwrap();
    hub.play(&id, martin()).await.unwrap();

    assert_eq!(
        hub.move_piece(&id, "e4").await.unwrap(),
        AgentState::MovedWaitingTurn
    );
    assert_eq!(pages.page(0).history(), vec!["e4"]);
}

#[tokio::test(start_paused = true)]
async fn test_move_before_playing_reports_state() {
    let hub = hub();
    let id = hub.create(Platform::Chesscom).await.unwrap();

    match hub.move_piece(&id, "e4").await {
        Err(ApiError::Agent(failure)) => assert_eq!(failure.state, AgentState::Idle),
        other => panic!("expected agent failure, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test(start_paused = true)]
async fn test_votes_are_tallied_and_committed() {
    let (hub, pages) = hub_with_pages();
    let id = hub.create(Platform::Chesscom).await.unwrap();
    hub.play(&id, martin()).await.unwrap();

    assert!(hub.vote(&id, "d4").await.unwrap());
    assert!(hub.vote(&id, "d2d4").await.unwrap());
    assert!(!hub.vote(&id, "Ke4").await.unwrap());

    let tally = hub.status(&id).unwrap().collective;
    assert!(tally.armed);
    assert_eq!(tally.votes[0].notation, "d4");
    assert_eq!(tally.votes[0].votes, 2);
    assert_eq!(tally.total, 2);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(pages.page(0).history(), vec!["d4"]);
    assert_eq!(hub.status(&id).unwrap().collective.total, 0);
}

#[tokio::test(start_paused = true)]
async fn test_dispose_closes_page_and_forgets_agent() {
    let (hub, pages) = hub_with_pages();
    let id = hub.create(Platform::Chesscom).await.unwrap();

    hub.dispose(&id).await.unwrap();
    assert!(pages.page(0).is_closed());
    assert!(hub.is_empty());
    assert!(matches!(hub.get(&id), Err(ApiError::UnknownAgent(_))));
    assert!(matches!(
        hub.dispose(&id).await,
        Err(ApiError::UnknownAgent(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_disposes_everything() {
    let (hub, pages) = hub_with_pages();
    hub.create(Platform::Chesscom).await.unwrap();
    hub.create(Platform::Chesscom).await.unwrap();

    hub.shutdown().await;
    assert!(hub.is_empty());
    assert!(pages.page(0).is_closed());
    assert!(pages.page(1).is_closed());
}

#[test]
fn test_unknown_agent() {
    let hub = hub();
    assert!(matches!(
        hub.status(&Uuid::new_v4()),
        Err(ApiError::UnknownAgent(_))
    ));
}
