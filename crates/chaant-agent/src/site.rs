//! chess.com DOM contract.
//!
//! Selectors, URLs and the small page scripts used while setting up a game.
//! Board queries live behind `BoardCapability`; this module only covers the
//! surrounding UI.

use chaant_protocols::{BotProfile, Color, PieceKind};

pub const SITE_HOST: &str = "chess.com";
pub const COMPUTER_URL: &str = "https://www.chess.com/play/computer";
pub const ONLINE_URL: &str = "https://www.chess.com/play/online";

pub const BOARD: &str = "wc-chess-board";
pub const SIDEBAR: &str = "#board-layout-sidebar";
pub const CLOSE_BUTTONS: &str = "button[aria-label='Close']";
pub const BOT_SELECTION: &str = "#board-layout-sidebar div.bot-selection-scroll";
pub const CHOOSE_BUTTON: &str = "#board-layout-sidebar button[title='Choose']";
pub const GUEST_BUTTON: &str = "#guest-button";
pub const NAV_TOP: &str = "div[data-nav-top]";
pub const LOGIN_LINK: &str = "a.login";

/// Truthy once no startup modal remains in the modal placeholder.
pub const MODALS_CLOSED: &str =
    "document.querySelector(\"div[id^='placeholder-'] div.ui_modal-component\") === null";

/// Truthy once the bot selection menu has been dismissed.
pub const SELECTION_MENU_CLOSED: &str =
    "document.querySelector('#board-layout-sidebar div.selection-menu-component') === null";

/// Truthy once the site's translation table is loaded.
pub const TRANSLATIONS_READY: &str =
    "typeof chesscom_translations !== 'undefined' && chesscom_translations !== null";

/// Scrolls the bot list until its height stops growing, loading every entry.
pub const SCROLL_BOT_LIST: &str = r#"(() => {
    const sel = document.querySelector('#board-layout-sidebar div.bot-selection-scroll');
    if (!sel) { return false; }
    let height = Number.MAX_SAFE_INTEGER;
    while (height > sel.scrollHeight) {
        height = sel.scrollHeight;
        sel.scrollBy(0, 100);
    }
    return true;
})()"#;

/// True when the board reports an active game for the logged-in side.
pub const GAME_ACTIVE: &str = r#"(() => {
    const board = document.querySelector('wc-chess-board');
    if (!board || !board.state) { return false; }
    return board.state.playingAs !== undefined && !board.state.isGameOver;
})()"#;

/// True once the board element and its game object are rebuilt.
pub const BOARD_READY: &str = r#"(() => {
    const board = document.querySelector('wc-chess-board');
    return !!(board && board.game);
})()"#;

/// Quote `value` as a JavaScript string literal.
pub fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// Localized UI message for `key`, `fallback` when the table lacks it.
pub fn translation(key: &str, fallback: &str) -> String {
    format!(
        "(() => {{ try {{ return chesscom_translations.messages[{}] ?? {}; }} catch (e) {{ return {}; }} }})()",
        js_string(key),
        js_string(fallback),
        js_string(fallback)
    )
}

pub fn bot_tile(bot: &BotProfile) -> String {
    format!(
        "div[data-bot-selection-name='{}'][data-bot-classification='{}']",
        css_quote(&bot.name),
        css_quote(&bot.selector_group)
    )
}

pub fn color_radio(as_black: bool) -> String {
    let color = if as_black { "black" } else { "white" };
    format!(
        "div.select-playing-as-radio-{} input[name=\"colorSelectionButton\"]",
        color
    )
}

pub fn play_button(play_label: &str) -> String {
    format!(
        "#board-layout-sidebar button[title='{}']",
        css_quote(play_label)
    )
}

/// Resign or abort control, visible only while a game is running.
pub fn resign_or_abort(resign_label: &str, abort_label: &str) -> String {
    format!(
        "#board-layout-sidebar button[aria-label='{}'],button[aria-label='{}']",
        css_quote(resign_label),
        css_quote(abort_label)
    )
}

/// Piece tile in the promotion picker for `color`.
pub fn promotion_piece(color: Color, piece: PieceKind) -> String {
    format!(
        "div[class*=promotion] > .{}{}",
        color.letter(),
        piece.letter()
    )
}

/// Index among `document.querySelectorAll('button')` of the first button
/// whose visible text matches `pattern`, or -1.
pub fn button_index(pattern: &str) -> String {
    format!(
        "(() => {{ const re = new RegExp({}); return Array.from(document.querySelectorAll('button')).findIndex((b) => re.test(b.innerText || '')); }})()",
        js_string(pattern)
    )
}

/// Selector the index from [`button_index`] refers to.
pub const BUTTONS: &str = "button";

/// Button text pattern ending in `label`.
pub fn ends_with_label(label: &str) -> String {
    format!(r"{}\s*$", escape_js_regex(label))
}

/// Button text pattern equal to `label` modulo surrounding whitespace.
pub fn exact_label(label: &str) -> String {
    format!(r"^\s*{}\s*$", escape_js_regex(label))
}

fn escape_js_regex(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(
            c,
            '\\' | '^' | '$' | '.' | '|' | '?' | '*' | '+' | '(' | ')' | '[' | ']' | '{' | '}' | '/'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn css_quote(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_promotion_selector_uses_agent_color() {
        assert_eq!(
            promotion_piece(Color::White, PieceKind::Queen),
            "div[class*=promotion] > .wq"
        );
        assert_eq!(
            promotion_piece(Color::Black, PieceKind::Knight),
            "div[class*=promotion] > .bn"
        );
    }

    #[test]
    fn test_bot_tile() {
        let bot = BotProfile::new("martin", 250, "beginner");
        assert_eq!(
            bot_tile(&bot),
            "div[data-bot-selection-name='martin'][data-bot-classification='beginner']"
        );
    }

    #[test]
    fn test_quotes_are_escaped() {
        let bot = BotProfile::new("o'neil", 1000, "x");
        assert!(bot_tile(&bot).contains("o\\'neil"));
        assert_eq!(js_string("a\"b"), "\"a\\\"b\"");
    }

    #[test]
    fn test_label_patterns_escape_regex() {
        assert_eq!(exact_label("1 | 1"), r"^\s*1 \| 1\s*$");
        assert_eq!(ends_with_label("min."), r"min\.\s*$");
    }

    #[test]
    fn test_translation_script_embeds_fallback() {
        let script = translation("Play", "Play");
        assert!(script.contains("chesscom_translations.messages[\"Play\"]"));
        assert!(script.contains("?? \"Play\""));
    }

    #[test]
    fn test_color_radio() {
        assert!(color_radio(true).contains("radio-black"));
        assert!(color_radio(false).contains("radio-white"));
    }
}
