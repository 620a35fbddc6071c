//! Trim engine: legal trim deltas against source bounds, neighbor adjacency,
//! and an optional rolling-edit partner.
//!
//! A gesture is a session: `begin` captures the grabbed item's geometry,
//! `preview` is pure per pointer tick, and commit goes through the store as
//! one undoable transition (even when a rolling edit changes two items).
//! Dropping the session without committing cancels the gesture with no
//! mutation anywhere.

use tracing::debug;

use crate::{
    snap, Frame, ItemId, SnapKind, SnapOptions, SourceBounds, Timeline, TimelineError,
    MIN_ITEM_DURATION,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimHandle {
    Start,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimMode {
    Normal,
    /// Move the cut point between this item and its adjacent neighbor; the
    /// neighbor's far edge and the total covered region stay fixed.
    Rolling,
}

/// Proposed post-trim geometry for one item.
#[derive(Debug, Clone, PartialEq)]
pub struct TrimmedItem {
    pub id: ItemId,
    pub from: Frame,
    pub duration_in_frames: Frame,
    pub source: Option<SourceBounds>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrimPreview {
    /// Effective edge delta after snapping and clamping.
    pub delta: Frame,
    pub item: TrimmedItem,
    pub neighbor: Option<TrimmedItem>,
    pub snap: Option<SnapKind>,
}

/// Inclusive range of legal edge deltas; clamps intersect ranges, so the
/// tighter constraint always wins.
#[derive(Debug, Clone, Copy)]
struct DeltaRange {
    lo: Frame,
    hi: Frame,
}

impl DeltaRange {
    fn unbounded() -> Self {
        Self {
            lo: Frame::MIN / 4,
            hi: Frame::MAX / 4,
        }
    }

    fn tighten_lo(&mut self, lo: Frame) {
        self.lo = self.lo.max(lo);
    }

    fn tighten_hi(&mut self, hi: Frame) {
        self.hi = self.hi.min(hi);
    }

    fn clamp(&self, delta: Frame) -> Frame {
        if self.lo > self.hi {
            // No legal movement at all; the gesture stays put.
            0
        } else {
            delta.clamp(self.lo, self.hi)
        }
    }
}

#[derive(Debug)]
pub struct TrimSession {
    item: ItemId,
    handle: TrimHandle,
    initial_from: Frame,
    initial_duration: Frame,
    neighbor: Option<ItemId>,
}

impl TrimSession {
    /// Start trimming `item_id` at `handle`. In rolling mode the adjacent
    /// neighbor on the trimmed side (exact edge contact) becomes the rolling
    /// partner; without one the session falls back to a normal trim.
    pub fn begin(
        timeline: &Timeline,
        item_id: ItemId,
        handle: TrimHandle,
        mode: TrimMode,
    ) -> Result<Self, TimelineError> {
        let item = timeline.item(item_id)?;
        let track = timeline.track(item.track_id)?;
        if track.locked {
            return Err(TimelineError::TrackLocked(track.id));
        }
        item.check_source()?;

        let neighbor = if mode == TrimMode::Rolling {
            let found = match handle {
                TrimHandle::Start => timeline
                    .neighbor_left(item.track_id, item.from, item_id)
                    .filter(|n| n.end() == item.from),
                TrimHandle::End => timeline
                    .neighbor_right(item.track_id, item.end(), item_id)
                    .filter(|n| n.from == item.end()),
            };
            if let Some(n) = found {
                n.check_source()?;
            }
            found.map(|n| n.id)
        } else {
            None
        };

        Ok(Self {
            item: item_id,
            handle,
            initial_from: item.from,
            initial_duration: item.duration_in_frames,
            neighbor,
        })
    }

    pub fn handle(&self) -> TrimHandle {
        self.handle
    }

    pub fn rolling_neighbor(&self) -> Option<ItemId> {
        self.neighbor
    }

    /// Compute the legal trim result for a pointer delta. Pure: nothing is
    /// mutated until the preview is committed through the store.
    pub fn preview(
        &self,
        timeline: &Timeline,
        delta_frames: Frame,
        snap_opts: Option<&SnapOptions>,
    ) -> Result<TrimPreview, TimelineError> {
        let item = timeline.item(self.item)?;
        item.check_source()?;
        let initial_end = self.initial_from + self.initial_duration;

        // 1. Snap the moving edge, ignoring our own edges and, during a
        //    rolling edit, the partner's.
        let mut exclude = vec![self.item];
        if let Some(n) = self.neighbor {
            exclude.push(n);
        }
        let raw_edge = match self.handle {
            TrimHandle::Start => self.initial_from + delta_frames,
            TrimHandle::End => initial_end + delta_frames,
        };
        let (snapped_edge, snap_kind) = match snap_opts
            .and_then(|opts| snap::snap_edge(timeline, &exclude, opts, raw_edge))
        {
            Some(s) => (s.frame, Some(s.kind)),
            None => (raw_edge, None),
        };
        let mut delta = match self.handle {
            TrimHandle::Start => snapped_edge - self.initial_from,
            TrimHandle::End => snapped_edge - initial_end,
        };

        // 2..4. Source-bound, adjacency, and minimum-duration clamps as one
        //       delta interval; rolling adds the partner's interval.
        let mut range = DeltaRange::unbounded();
        match self.handle {
            TrimHandle::Start => {
                range.tighten_hi(self.initial_duration - MIN_ITEM_DURATION);
                range.tighten_lo(-self.initial_from);
                if item.has_source_bounds() {
                    let src = item.source.as_ref().ok_or_else(|| {
                        TimelineError::InvalidEdit("media item without source".into())
                    })?;
                    range.tighten_lo((-(src.start as f64) / item.speed).ceil() as Frame);
                }
                if self.neighbor.is_none() {
                    if let Some(bound) = self.left_bound(timeline) {
                        range.tighten_lo(bound - self.initial_from);
                    }
                }
            }
            TrimHandle::End => {
                range.tighten_lo(MIN_ITEM_DURATION - self.initial_duration);
                if item.has_source_bounds() {
                    let src = item.source.as_ref().ok_or_else(|| {
                        TimelineError::InvalidEdit("media item without source".into())
                    })?;
                    let max_duration =
                        ((src.duration - src.start) as f64 / item.speed).floor() as Frame;
                    range.tighten_hi(max_duration - self.initial_duration);
                }
                if self.neighbor.is_none() {
                    if let Some(bound) = self.right_bound(timeline) {
                        range.tighten_hi(bound - initial_end);
                    }
                }
            }
        }

        // 5. Rolling edit: the same delta moves the neighbor's opposite
        //    handle, so its clamps intersect ours and the tighter one wins.
        let neighbor = match self.neighbor {
            Some(id) => Some(timeline.item(id)?),
            None => None,
        };
        if let Some(n) = neighbor {
            match self.handle {
                // Our start edge is the neighbor's end.
                TrimHandle::Start => {
                    range.tighten_lo(MIN_ITEM_DURATION - n.duration_in_frames);
                    if n.has_source_bounds() {
                        let src = n.source.as_ref().ok_or_else(|| {
                            TimelineError::InvalidEdit("media item without source".into())
                        })?;
                        let max_duration =
                            ((src.duration - src.start) as f64 / n.speed).floor() as Frame;
                        range.tighten_hi(max_duration - n.duration_in_frames);
                    }
                }
                // Our end edge is the neighbor's start.
                TrimHandle::End => {
                    range.tighten_hi(n.duration_in_frames - MIN_ITEM_DURATION);
                    if n.has_source_bounds() {
                        let src = n.source.as_ref().ok_or_else(|| {
                            TimelineError::InvalidEdit("media item without source".into())
                        })?;
                        range.tighten_lo((-(src.start as f64) / n.speed).ceil() as Frame);
                    }
                }
            }
        }

        let snapped_delta = delta;
        delta = range.clamp(delta);
        debug!(item = %self.item, handle = ?self.handle, delta, "trim preview");

        let trimmed = self.derive_item(item, delta);
        let trimmed_neighbor = neighbor.map(|n| self.derive_neighbor(n, delta));

        Ok(TrimPreview {
            delta,
            item: trimmed,
            neighbor: trimmed_neighbor,
            // A clamp that overrides the snapped position also voids the snap.
            snap: snap_kind.filter(|_| delta == snapped_delta),
        })
    }

    /// Nearest legal position for the start edge against left-side items.
    /// Transition-linked neighbors permit overlap up to the transition width.
    fn left_bound(&self, timeline: &Timeline) -> Option<Frame> {
        let item = timeline.items.get(&self.item)?;
        timeline
            .items_on_track(item.track_id)
            .filter(|o| o.id != self.item && o.from < self.initial_from)
            .map(|o| match timeline.transition_between(self.item, o.id) {
                Some(t) => o.end() - t.duration_in_frames,
                None => o.end(),
            })
            .max()
    }

    /// Nearest legal position for the end edge against right-side items.
    fn right_bound(&self, timeline: &Timeline) -> Option<Frame> {
        let item = timeline.items.get(&self.item)?;
        timeline
            .items_on_track(item.track_id)
            .filter(|o| o.id != self.item && o.from > self.initial_from)
            .map(|o| match timeline.transition_between(self.item, o.id) {
                Some(t) => o.from + t.duration_in_frames,
                None => o.from,
            })
            .min()
    }

    fn derive_item(&self, item: &crate::TimelineItem, delta: Frame) -> TrimmedItem {
        let mut source = item.source;
        let (from, duration) = match self.handle {
            TrimHandle::Start => {
                if let (Some(src), true) = (source.as_mut(), item.has_source_bounds()) {
                    // Start trims move the source window start by the
                    // speed-adjusted delta; the stored end is untouched.
                    src.start = (src.start + (delta as f64 * item.speed).round() as Frame)
                        .clamp(0, src.end - 1);
                }
                (self.initial_from + delta, self.initial_duration - delta)
            }
            TrimHandle::End => {
                let duration = self.initial_duration + delta;
                if let (Some(src), true) = (source.as_mut(), item.has_source_bounds()) {
                    // End trims recompute the window end from the new
                    // duration against the fixed start.
                    src.end = (src.start + (duration as f64 * item.speed).round() as Frame)
                        .clamp(src.start + 1, src.duration);
                }
                (self.initial_from, duration)
            }
        };
        TrimmedItem {
            id: item.id,
            from,
            duration_in_frames: duration,
            source,
        }
    }

    fn derive_neighbor(&self, n: &crate::TimelineItem, delta: Frame) -> TrimmedItem {
        let mut source = n.source;
        let (from, duration) = match self.handle {
            // Neighbor sits to the left; its end follows our start edge.
            TrimHandle::Start => {
                let duration = n.duration_in_frames + delta;
                if let (Some(src), true) = (source.as_mut(), n.has_source_bounds()) {
                    src.end = (src.start + (duration as f64 * n.speed).round() as Frame)
                        .clamp(src.start + 1, src.duration);
                }
                (n.from, duration)
            }
            // Neighbor sits to the right; its start follows our end edge.
            TrimHandle::End => {
                if let (Some(src), true) = (source.as_mut(), n.has_source_bounds()) {
                    src.start = (src.start + (delta as f64 * n.speed).round() as Frame)
                        .clamp(0, src.end - 1);
                }
                (n.from + delta, n.duration_in_frames - delta)
            }
        };
        TrimmedItem {
            id: n.id,
            from,
            duration_in_frames: duration,
            source,
        }
    }
}
