//! Typed view of the page's game object.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::Point;
use crate::error::SurfaceError;
use crate::types::{Color, PieceKind, Square};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceOnBoard {
    pub kind: PieceKind,
    pub color: Color,
    pub square: Square,
}

/// Board placement in the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoardGeometry {
    pub left: f64,
    pub top: f64,
    pub square_size: f64,
}

impl BoardGeometry {
    /// Top-left corner of `square` as seen from `perspective`'s side.
    ///
    /// White sees a8 top-left; black sees the board flipped, h1 top-left.
    pub fn square_origin(&self, square: Square, perspective: Color) -> Point {
        let (col, row) = match perspective {
            Color::White => (square.file(), 7 - square.rank()),
            Color::Black => (7 - square.file(), square.rank()),
        };
        Point::new(
            self.left + self.square_size * col as f64,
            self.top + self.square_size * row as f64,
        )
    }

    /// Point inside `square` offset by fractions of a square on each axis.
    pub fn point_in(&self, square: Square, perspective: Color, fx: f64, fy: f64) -> Point {
        let origin = self.square_origin(square, perspective);
        Point::new(
            origin.x + self.square_size * fx,
            origin.y + self.square_size * fy,
        )
    }

    /// Square under `point`, if it is on the board.
    pub fn locate(&self, point: Point, perspective: Color) -> Option<Square> {
        if self.square_size <= 0.0 {
            return None;
        }
        let col = ((point.x - self.left) / self.square_size).floor();
        let row = ((point.y - self.top) / self.square_size).floor();
        if !(0.0..8.0).contains(&col) || !(0.0..8.0).contains(&row) {
            return None;
        }
        let (col, row) = (col as u8, row as u8);
        let (file, rank) = match perspective {
            Color::White => (col, 7 - row),
            Color::Black => (7 - col, row),
        };
        Square::new(file, rank).ok()
    }
}

/// Events the page's game object emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardEvent {
    /// A ply was applied; `plies` is the total now played.
    Moved { plies: u32 },
    GameOver,
}

/// Live feed of board events. Dropping it unsubscribes.
pub type BoardSubscription = broadcast::Receiver<BoardEvent>;

#[async_trait]
pub trait BoardCapability: Send + Sync {
    /// Color the logged-in side plays, `None` when no game is active.
    async fn playing_color(&self) -> Result<Option<Color>, SurfaceError>;

    /// Half-moves played so far (last move index + 1, 0 before any move).
    async fn plies_played(&self) -> Result<u32, SurfaceError>;

    async fn pieces(&self, color: Color) -> Result<Vec<PieceOnBoard>, SurfaceError>;

    async fn legal_moves_for_square(&self, square: Square) -> Result<Vec<Square>, SurfaceError>;

    async fn history_sans(&self) -> Result<Vec<String>, SurfaceError>;

    async fn is_game_over(&self) -> Result<bool, SurfaceError>;

    async fn board_geometry(&self) -> Result<BoardGeometry, SurfaceError>;

    async fn subscribe(&self) -> Result<BoardSubscription, SurfaceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> BoardGeometry {
        BoardGeometry {
            left: 100.0,
            top: 50.0,
            square_size: 80.0,
        }
    }

    #[test]
    fn test_white_orientation() {
        let g = geometry();
        let a8 = g.square_origin(Square::parse("a8").unwrap(), Color::White);
        assert_eq!(a8, Point::new(100.0, 50.0));
        let h1 = g.square_origin(Square::parse("h1").unwrap(), Color::White);
        assert_eq!(h1, Point::new(100.0 + 7.0 * 80.0, 50.0 + 7.0 * 80.0));
    }

    #[test]
    fn test_black_orientation_is_flipped() {
        let g = geometry();
        let h1 = g.square_origin(Square::parse("h1").unwrap(), Color::Black);
        assert_eq!(h1, Point::new(100.0, 50.0));
        let a8 = g.square_origin(Square::parse("a8").unwrap(), Color::Black);
        assert_eq!(a8, Point::new(100.0 + 7.0 * 80.0, 50.0 + 7.0 * 80.0));
    }

    #[test]
    fn test_locate_inverts_point_in() {
        let g = geometry();
        for perspective in [Color::White, Color::Black] {
            for square in Square::all() {
                let p = g.point_in(square, perspective, 0.1, 0.9);
                assert_eq!(g.locate(p, perspective), Some(square));
            }
        }
    }

    #[test]
    fn test_locate_off_board() {
        let g = geometry();
        assert_eq!(g.locate(Point::new(0.0, 0.0), Color::White), None);
        assert_eq!(g.locate(Point::new(100.0 + 640.0, 60.0), Color::White), None);
    }
}
