use serde::{Deserialize, Serialize};
use thiserror::Error;

mod model;
pub use model::*;
mod time;
pub use time::*;
pub mod collision;
pub mod snap;
pub use snap::{Snap, SnapKind, SnapOptions, SnapTarget};
mod trim;
pub use trim::*;
mod stretch;
pub use stretch::*;
mod drag;
pub use drag::*;
mod commands;
pub use commands::*;
mod store;
pub use store::*;

#[derive(Debug, Error)]
pub enum TimelineError {
    #[error("invalid edit: {0}")]
    InvalidEdit(String),
    #[error("item not found: {0}")]
    ItemNotFound(ItemId),
    #[error("item already exists: {0}")]
    ItemExists(ItemId),
    #[error("track not found: {0}")]
    TrackNotFound(TrackId),
    #[error("track is locked: {0}")]
    TrackLocked(TrackId),
    #[error("transition not found: {0}")]
    TransitionNotFound(TransitionId),
    #[error("no space on track {0} for {1} frames")]
    NoSpace(TrackId, Frame),
    #[error("source bounds corrupt for item {0}")]
    CorruptSource(ItemId),
    #[error("history empty: {0}")]
    HistoryEmpty(&'static str),
}

/// Timeline time in integer frames. Signed so intermediate deltas can go
/// negative; committed positions are always >= 0.
pub type Frame = i64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Fps {
    pub num: u32,
    pub den: u32,
}

impl Fps {
    pub const fn new(num: u32, den: u32) -> Self {
        Self { num, den }
    }

    pub fn as_f64(&self) -> f64 {
        self.num as f64 / self.den as f64
    }
}
