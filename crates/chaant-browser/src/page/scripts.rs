//! Page scripts reading the site's board element.
//!
//! The board element (`wc-chess-board`) carries the live game object at
//! `board.game`. Colors are numeric there: 1 is white, 2 is black.

use chaant_protocols::{Color, Square};

use chaant_agent::site;

/// Name of the binding board events are reported through.
pub const EVENT_BINDING: &str = "chaantBoardEvent";

fn on_board(body: &str) -> String {
    format!(
        "(() => {{ const board = document.querySelector('{}'); if (!board || !board.game) {{ throw new Error('board not found'); }} const game = board.game; {} }})()",
        site::BOARD,
        body
    )
}

pub fn playing_color() -> String {
    on_board("const c = game.getPlayingAs(); return c === 1 || c === 2 ? c : null;")
}

pub fn plies_played() -> String {
    on_board("const last = game.getLastMove(); return last ? last.moveNumber + 1 : 0;")
}

pub fn pieces() -> String {
    on_board(
        "return Object.values(game.getPieces().getCollection()).map((p) => ({ type: p.type, color: p.color, square: p.square }));",
    )
}

pub fn legal_moves(square: Square) -> String {
    on_board(&format!(
        "return (game.getLegalMovesForSquare('{}') || []).map((m) => typeof m === 'string' ? m : m.to);",
        square
    ))
}

pub fn history_sans() -> String {
    on_board("return game.getHistorySANs() || [];")
}

pub fn is_game_over() -> String {
    on_board("return game.getPlayingAs() === undefined || (board.state && board.state.isGameOver === true);")
}

pub fn geometry() -> String {
    on_board(
        "const r = board.getBoundingClientRect(); return { left: r.left, top: r.top, squareSize: r.width / 8 };",
    )
}

/// Element query helpers. `index` picks among `querySelectorAll` matches.
pub fn count(selector: &str) -> String {
    format!(
        "document.querySelectorAll({}).length",
        site::js_string(selector)
    )
}

pub fn click(selector: &str, index: usize) -> String {
    format!(
        "(() => {{ const el = document.querySelectorAll({})[{}]; if (!el) {{ return false; }} el.scrollIntoView({{ block: 'center' }}); el.click(); return true; }})()",
        site::js_string(selector),
        index
    )
}

pub fn text(selector: &str, index: usize) -> String {
    format!(
        "(() => {{ const el = document.querySelectorAll({})[{}]; return el ? (el.innerText || '') : null; }})()",
        site::js_string(selector),
        index
    )
}

/// Installed in every document: attaches listeners to the game object once
/// the board shows up and reports moves and game end through the binding.
pub fn event_hook() -> String {
    format!(
        r#"(() => {{
    const report = (event) => {{
        try {{ window.{binding}(JSON.stringify(event)); }} catch (e) {{}}
    }};
    const attach = () => {{
        const board = document.querySelector('{board}');
        if (!board || !board.game || !board.game.listeners) {{ return false; }}
        const game = board.game;
        if (game.__chaantHooked) {{ return true; }}
        game.__chaantHooked = true;
        game.listeners.push({{ type: 'Move', handler: () => {{
            const last = game.getLastMove();
            report({{ kind: 'moved', plies: last ? last.moveNumber + 1 : 0 }});
            return false;
        }} }});
        game.listeners.unshift({{ type: 'ModeChanged', handler: () => {{
            if (game.getPlayingAs() === undefined) {{ report({{ kind: 'gameOver' }}); }}
            return false;
        }} }});
        return true;
    }};
    if (!attach()) {{
        const timer = setInterval(() => {{ if (attach()) {{ clearInterval(timer); }} }}, 250);
    }}
}})()"#,
        binding = EVENT_BINDING,
        board = site::BOARD
    )
}

/// Numeric site color to [`Color`].
pub fn color_from_site(value: i64) -> Option<Color> {
    match value {
        1 => Some(Color::White),
        2 => Some(Color::Black),
        _ => None,
    }
}
