//! # chaant Protocols
//!
//! Core protocol definitions for the chaant chess agent.
//! Contains value types, the error taxonomy and capability traits - no I/O.
//!
//! ## Core Traits
//!
//! - [`BrowserSurface`] - Page automation primitives an agent drives
//! - [`BoardCapability`] - Narrow view of the page's in-memory game object
//! - [`ChessPage`] - A page offering both of the above
//! - [`ChessAgent`] - The agent state machine surface used by control planes
//! - [`EvaluatesMoveLegality`] - Move resolution without submission
//! - [`CollectiveAgent`] - Agents eligible for collective (voted) play

pub mod agent;
pub mod error;
pub mod notation;
pub mod surface;
pub mod types;

pub use agent::{
    ChessAgent, CollectiveAgent, EvaluatesMoveLegality, GameOverHandler, ListenerGuard,
    MoveListener, MoveRecord,
};
pub use error::{AgentError, AgentFailure, AgentResult, SurfaceError};
pub use notation::{parse_notation, CastleSide, ParsedNotation};
pub use surface::{
    BoardCapability, BoardEvent, BoardGeometry, BoardSubscription, BrowserSurface, ChessPage,
    ElementHandle, PageId, PieceOnBoard, Point, PointerSequence,
};
pub use types::*;
