use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
};
use serde_json::Value;
use tower::ServiceExt;

use super::*;
use crate::http::AGENT_ID_HEADER;
use crate::hub::tests::hub_with_pages;

fn router() -> Router {
    create_router(Arc::new(hub_with_pages().0))
}

fn request(method: &str, uri: &str, agent: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(agent) = agent {
        builder = builder.header(AGENT_ID_HEADER, agent);
    }
    builder.body(Body::empty()).unwrap()
}

async fn json(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> Response {
    app.clone().oneshot(req).await.unwrap()
}

async fn new_agent(app: &Router) -> String {
    let response = send(app, request("POST", "/agents?platform=chesscom", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    json(response).await["agent_id"].as_str().unwrap().to_string()
}

#[tokio::test(start_paused = true)]
async fn test_health() {
    let app = router();
    let response = send(&app, request("GET", "/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["agents"], 0);
}

#[tokio::test(start_paused = true)]
async fn test_create_requires_known_platform() {
    let app = router();

    let response = send(&app, request("POST", "/agents", None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, request("POST", "/agents?platform=lichess", None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json(response).await;
    assert!(body["error"].as_str().unwrap().contains("lichess"));
    assert!(body.get("state").is_none());
}

#[tokio::test(start_paused = true)]
async fn test_agent_header_is_required() {
    let app = router();

    let response = send(&app, request("POST", "/wait", None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json(response).await["error"], "Agent Id is not defined");

    let response = send(&app, request("POST", "/wait", Some("not-a-uuid"))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let stranger = uuid::Uuid::new_v4().to_string();
    let response = send(&app, request("GET", "/agents/status", Some(&stranger))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test(start_paused = true)]
async fn test_play_and_move_flow() {
    let app = router();
    let id = new_agent(&app).await;

    let response = send(&app, request("POST", "/play?versus=computer&bot=martin&as=white", Some(&id))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(response).await["state"], "TakingTurn");

    let response = send(&app, request("POST", "/move?move=e4", Some(&id))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(response).await["state"], "MovedWaitingTurn");

    let response = send(&app, request("GET", "/agents/status", Some(&id))).await;
    let status = json(response).await;
    assert_eq!(status["state"], "MovedWaitingTurn");
    assert_eq!(status["play_state"], "AgainstComputer");
    assert_eq!(status["color"], "white");
    assert_eq!(status["platform"], "chesscom");
}

#[tokio::test(start_paused = true)]
async fn test_play_validation() {
    let app = router();
    let id = new_agent(&app).await;

    let response = send(&app, request("POST", "/play", Some(&id))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json(response).await["error"], "Opponent is not specified");

    let response = send(&app, request("POST", "/play?versus=computer", Some(&id))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, request("POST", "/play?versus=computer&bot=martin&as=red", Some(&id))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, request("POST", "/play?versus=online&time=hyper", Some(&id))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, request("POST", "/play?versus=computer&bot=deep-blue", Some(&id))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test(start_paused = true)]
async fn test_illegal_move_keeps_turn() {
    let app = router();
    let id = new_agent(&app).await;
    send(&app, request("POST", "/play?versus=computer&bot=martin", Some(&id))).await;

    let response = send(&app, request("POST", "/move?move=Ke4", Some(&id))).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json(response).await["state"], "TakingTurn");

    let response = send(&app, request("POST", "/move", Some(&id))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test(start_paused = true)]
async fn test_move_without_game_reports_idle() {
    let app = router();
    let id = new_agent(&app).await;

    let response = send(&app, request("POST", "/move?move=e4", Some(&id))).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(json(response).await["state"], "Idle");
}

#[tokio::test(start_paused = true)]
async fn test_collective_vote() {
    let app = router();
    let id = new_agent(&app).await;
    send(&app, request("POST", "/play?versus=computer&bot=martin", Some(&id))).await;

    let response = send(&app, request("POST", "/move/collective?move=Nf3", Some(&id))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json(response).await;
    assert_eq!(body["accepted"], true);
    assert_eq!(body["tally"]["total"], 1);
    assert_eq!(body["tally"]["votes"][0]["notation"], "Nf3");

    let response = send(&app, request("POST", "/move/collective?move=Qh5", Some(&id))).await;
    assert_eq!(json(response).await["accepted"], false);
}

#[tokio::test(start_paused = true)]
async fn test_bots_listing() {
    let app = router();
    let response = send(&app, request("GET", "/bots", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let bots = json(response).await;
    assert_eq!(bots.as_array().unwrap().len(), 2);
    assert_eq!(bots[0]["name"], "martin");
}

#[tokio::test(start_paused = true)]
async fn test_dispose() {
    let app = router();
    let id = new_agent(&app).await;

    let response = send(&app, request("DELETE", "/agents", Some(&id))).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, request("DELETE", "/agents", Some(&id))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
