use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt};
use uuid::Uuid;

use crate::{Frame, TimelineError};

/// Minimum committed item length.
pub const MIN_ITEM_DURATION: Frame = 1;
/// Playback speed domain for media items.
pub const MIN_SPEED: f64 = 0.1;
pub const MAX_SPEED: f64 = 10.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ItemId(pub Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct TrackId(pub Uuid);

impl TrackId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct TransitionId(pub Uuid);

impl TransitionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for TransitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable identity that survives splits: both fragments of a split clip share
/// the origin of the clip they were cut from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct OriginId(pub Uuid);

impl OriginId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for OriginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Track {
    pub id: TrackId,
    pub name: String,
    /// Z-order and vertical position; lower order sits higher in the stack.
    pub order: i64,
    #[serde(default = "default_track_height")]
    pub height: f32,
    #[serde(default)]
    pub locked: bool,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub muted: bool,
    /// Group tracks organize child tracks and hold no items themselves.
    #[serde(default)]
    pub is_group: bool,
    #[serde(default)]
    pub parent_track_id: Option<TrackId>,
    #[serde(default)]
    pub is_collapsed: bool,
}

fn default_track_height() -> f32 {
    60.0
}

fn default_true() -> bool {
    true
}

impl Track {
    pub fn new(name: impl Into<String>, order: i64) -> Self {
        Self {
            id: TrackId::new(),
            name: name.into(),
            order,
            height: default_track_height(),
            locked: false,
            visible: true,
            muted: false,
            is_group: false,
            parent_track_id: None,
            is_collapsed: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemKind {
    Video,
    Audio,
    Image {
        /// Animated images (GIF-style) repeat indefinitely and are treated as
        /// looping media by the rate-stretch engine.
        #[serde(default)]
        animated: bool,
    },
    Text,
    Shape,
    Adjustment,
    Composition,
}

/// Window into source-media time, in source frames at speed 1.0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SourceBounds {
    pub start: Frame,
    pub end: Frame,
    /// Natural duration of the source media.
    pub duration: Frame,
}

impl SourceBounds {
    pub fn full(duration: Frame) -> Self {
        Self {
            start: 0,
            end: duration,
            duration,
        }
    }

    /// Width of the referenced window. Split fragments carry their own
    /// window, so rate stretching works against this rather than `duration`.
    pub fn window(&self) -> Frame {
        self.end - self.start
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelineItem {
    pub id: ItemId,
    pub track_id: TrackId,
    /// Timeline-absolute start frame.
    pub from: Frame,
    pub duration_in_frames: Frame,
    #[serde(flatten)]
    pub kind: ItemKind,
    #[serde(default)]
    pub media_id: Option<String>,
    pub origin_id: OriginId,
    #[serde(default = "default_speed")]
    pub speed: f64,
    #[serde(default)]
    pub source: Option<SourceBounds>,
    #[serde(default)]
    pub label: Option<String>,
}

fn default_speed() -> f64 {
    1.0
}

impl TimelineItem {
    pub fn new(track_id: TrackId, from: Frame, duration_in_frames: Frame, kind: ItemKind) -> Self {
        Self {
            id: ItemId::new(),
            track_id,
            from,
            duration_in_frames,
            kind,
            media_id: None,
            origin_id: OriginId::new(),
            speed: 1.0,
            source: None,
            label: None,
        }
    }

    pub fn end(&self) -> Frame {
        self.from + self.duration_in_frames
    }

    pub fn is_media(&self) -> bool {
        matches!(
            self.kind,
            ItemKind::Video | ItemKind::Audio | ItemKind::Image { .. } | ItemKind::Composition
        )
    }

    /// Looping items repeat their content indefinitely and carry no source
    /// bound along the timeline axis.
    pub fn can_loop(&self) -> bool {
        matches!(
            self.kind,
            ItemKind::Text | ItemKind::Shape | ItemKind::Adjustment
        ) || matches!(self.kind, ItemKind::Image { animated: true })
    }

    /// Speed-exempt kinds stretch freely; their `speed` stays 1.0.
    pub fn is_speed_exempt(&self) -> bool {
        matches!(
            self.kind,
            ItemKind::Text | ItemKind::Shape | ItemKind::Adjustment
        )
    }

    /// Whether trims against this item must be clamped to its source window.
    pub fn has_source_bounds(&self) -> bool {
        self.source.is_some() && !self.can_loop()
    }

    /// Corruption guard: refuse to compute geometry from a source window
    /// that cannot have come from a legal edit.
    pub fn check_source(&self) -> Result<(), TimelineError> {
        if let Some(src) = &self.source {
            if src.start < 0
                || src.end <= src.start
                || src.duration < src.end
                || src.start >= src.duration
            {
                return Err(TimelineError::CorruptSource(self.id));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    Dissolve,
    Wipe,
    Slide,
}

impl Default for TransitionKind {
    fn default() -> Self {
        Self::Dissolve
    }
}

/// A declared, permitted overlap between two adjacent clips on one track.
/// Expected geometry: `right.from == left.end() - duration_in_frames`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transition {
    pub id: TransitionId,
    pub left_item: ItemId,
    pub right_item: ItemId,
    pub duration_in_frames: Frame,
    #[serde(default)]
    pub kind: TransitionKind,
}

impl Transition {
    pub fn new(left_item: ItemId, right_item: ItemId, duration_in_frames: Frame) -> Self {
        Self {
            id: TransitionId::new(),
            left_item,
            right_item,
            duration_in_frames,
            kind: TransitionKind::default(),
        }
    }

    pub fn links(&self, a: ItemId, b: ItemId) -> bool {
        (self.left_item == a && self.right_item == b)
            || (self.left_item == b && self.right_item == a)
    }
}

/// The authoritative timeline aggregate: tracks, placed items, transitions.
/// Engines receive this as an immutable snapshot; only the store mutates it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Timeline {
    pub version: u16,
    pub tracks: Vec<Track>,
    pub items: HashMap<ItemId, TimelineItem>,
    pub transitions: HashMap<TransitionId, Transition>,
}

impl Default for Timeline {
    fn default() -> Self {
        Self {
            version: 1,
            tracks: Vec::new(),
            items: HashMap::new(),
            transitions: HashMap::new(),
        }
    }
}

impl Timeline {
    pub fn item(&self, id: ItemId) -> Result<&TimelineItem, TimelineError> {
        self.items.get(&id).ok_or(TimelineError::ItemNotFound(id))
    }

    pub fn track(&self, id: TrackId) -> Result<&Track, TimelineError> {
        self.tracks
            .iter()
            .find(|t| t.id == id)
            .ok_or(TimelineError::TrackNotFound(id))
    }

    pub fn items_on_track(&self, track_id: TrackId) -> impl Iterator<Item = &TimelineItem> {
        self.items.values().filter(move |i| i.track_id == track_id)
    }

    /// Item-bearing tracks in vertical order. Group tracks are skipped; they
    /// never hold items, so drag track-reassignment steps over them.
    pub fn editable_tracks(&self) -> Vec<&Track> {
        let mut tracks: Vec<&Track> = self.tracks.iter().filter(|t| !t.is_group).collect();
        tracks.sort_by_key(|t| t.order);
        tracks
    }

    pub fn transition_between(&self, a: ItemId, b: ItemId) -> Option<&Transition> {
        self.transitions.values().find(|t| t.links(a, b))
    }

    pub fn linked(&self, a: ItemId, b: ItemId) -> bool {
        self.transition_between(a, b).is_some()
    }

    pub fn transitions_for_item(&self, id: ItemId) -> Vec<&Transition> {
        self.transitions
            .values()
            .filter(|t| t.left_item == id || t.right_item == id)
            .collect()
    }

    /// Nearest item whose end sits at or before `frame` on the track.
    pub fn neighbor_left(&self, track_id: TrackId, frame: Frame, exclude: ItemId) -> Option<&TimelineItem> {
        self.items_on_track(track_id)
            .filter(|i| i.id != exclude && i.end() <= frame)
            .max_by_key(|i| i.end())
    }

    /// Nearest item starting at or after `frame` on the track.
    pub fn neighbor_right(&self, track_id: TrackId, frame: Frame, exclude: ItemId) -> Option<&TimelineItem> {
        self.items_on_track(track_id)
            .filter(|i| i.id != exclude && i.from >= frame)
            .min_by_key(|i| i.from)
    }
}
