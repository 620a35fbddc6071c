//! Rate-stretch engine: changes playback speed by changing timeline duration
//! while the source content window stays fixed.
//!
//! `speed = window / duration`, where the window is the item's own portion of
//! the source (`source.end - source.start`), so split fragments stretch
//! against their fragment rather than the full media. Looping media is the
//! exception:
//! duration and position hold still and drag distance maps to a speed delta.

use tracing::debug;

use crate::{
    Frame, ItemId, Timeline, TimelineError, MAX_SPEED, MIN_ITEM_DURATION, MIN_SPEED,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StretchHandle {
    /// Dragging the start edge; the clip end stays fixed.
    Start,
    /// Dragging the end edge; `from` stays fixed.
    End,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StretchPreview {
    pub from: Frame,
    pub duration_in_frames: Frame,
    pub speed: f64,
}

#[derive(Debug)]
pub struct RateStretchSession {
    item: ItemId,
    handle: StretchHandle,
    initial_from: Frame,
    initial_duration: Frame,
    initial_speed: f64,
    /// Source window width, absent for looping items.
    window: Option<Frame>,
    looping: bool,
}

impl RateStretchSession {
    pub fn begin(
        timeline: &Timeline,
        item_id: ItemId,
        handle: StretchHandle,
    ) -> Result<Self, TimelineError> {
        let item = timeline.item(item_id)?;
        let track = timeline.track(item.track_id)?;
        if track.locked {
            return Err(TimelineError::TrackLocked(track.id));
        }
        item.check_source()?;
        if item.is_speed_exempt() {
            return Err(TimelineError::InvalidEdit(format!(
                "item {} is speed-exempt",
                item.id
            )));
        }

        let looping = item.can_loop();
        let window = item.source.as_ref().map(|s| s.window());
        if !looping && window.is_none() {
            return Err(TimelineError::InvalidEdit(format!(
                "item {} has no source window to stretch against",
                item.id
            )));
        }

        Ok(Self {
            item: item_id,
            handle,
            initial_from: item.from,
            initial_duration: item.duration_in_frames,
            initial_speed: item.speed,
            window,
            looping,
        })
    }

    /// Pure per-tick computation of the stretched geometry.
    pub fn preview(&self, delta_frames: Frame) -> StretchPreview {
        if self.looping {
            // Looping content repeats indefinitely; only the rate moves.
            let speed = (self.initial_speed
                + delta_frames as f64 / self.initial_duration as f64)
                .clamp(MIN_SPEED, MAX_SPEED);
            return StretchPreview {
                from: self.initial_from,
                duration_in_frames: self.initial_duration,
                speed,
            };
        }

        // window is checked present for non-looping items in `begin`.
        let window = self.window.unwrap_or(self.initial_duration);
        let initial_end = self.initial_from + self.initial_duration;

        let mut duration = match self.handle {
            StretchHandle::End => self.initial_duration + delta_frames,
            StretchHandle::Start => self.initial_duration - delta_frames,
        }
        .max(MIN_ITEM_DURATION);
        if self.handle == StretchHandle::Start {
            // The end stays fixed, so the start may not cross frame 0.
            duration = duration.min(initial_end);
        }

        let raw_speed = window as f64 / duration as f64;
        let speed = raw_speed.clamp(MIN_SPEED, MAX_SPEED);
        if speed != raw_speed {
            // Speed hit its limit; duration follows the clamped speed so the
            // window stays fully covered.
            duration = ((window as f64 / speed).round() as Frame).max(MIN_ITEM_DURATION);
        }
        // Rounding may still push the consumed source past the window.
        if ((duration as f64) * speed).round() as Frame > window {
            duration = ((window as f64 / speed).floor() as Frame).max(MIN_ITEM_DURATION);
        }

        let from = match self.handle {
            StretchHandle::End => self.initial_from,
            StretchHandle::Start => initial_end - duration,
        };
        debug!(item = %self.item, duration, speed, "rate-stretch preview");
        StretchPreview {
            from,
            duration_in_frames: duration,
            speed,
        }
    }
}
