//! Snap target generation and nearest-target resolution.
//!
//! Targets are grid ticks at a zoom-adaptive density, other items' edges
//! (magnetic snap), and the playhead. The threshold is a constant on-screen
//! pixel tolerance translated to frames at the current zoom, so snap feel is
//! zoom-invariant.

use serde::{Deserialize, Serialize};

use crate::{Frame, ItemId, Timeline, Viewport};

/// On-screen tolerance within which an edge snaps to a target.
pub const SNAP_THRESHOLD_PX: f64 = 8.0;
/// Minimum on-screen spacing between grid ticks.
const MIN_TICK_SPACING_PX: f64 = 50.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SnapKind {
    Grid,
    ItemEdge,
    TransitionMidpoint,
    Playhead,
}

impl SnapKind {
    /// Magnetic targets come from real timeline geometry and win ties
    /// against grid ticks.
    pub fn is_magnetic(&self) -> bool {
        !matches!(self, SnapKind::Grid)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapTarget {
    pub frame: Frame,
    pub kind: SnapKind,
}

/// Inputs the snap calculator consumes from collaborators: current zoom and
/// the playhead position (used only as a target).
#[derive(Debug, Clone, Copy)]
pub struct SnapOptions {
    pub view: Viewport,
    pub playhead: Option<Frame>,
}

/// A resolved snap: the corrected `from` (or edge) position and the target
/// that attracted it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snap {
    pub frame: Frame,
    pub kind: SnapKind,
    /// Signed correction that was applied, in frames.
    pub distance: Frame,
}

pub fn threshold_frames(view: &Viewport) -> Frame {
    let t = (SNAP_THRESHOLD_PX / view.pixels_per_second * view.fps.as_f64()).round() as Frame;
    t.max(1)
}

/// Grid tick spacing in frames, chosen so ticks stay at least
/// `MIN_TICK_SPACING_PX` apart at the current zoom.
pub fn grid_interval(view: &Viewport) -> Frame {
    let fps = view.fps.as_f64();
    let mut candidates: Vec<Frame> = vec![1, 5];
    for seconds in [1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 300.0, 600.0] {
        candidates.push((seconds * fps).round() as Frame);
    }
    for interval in &candidates {
        if view.frames_to_pixels(*interval) >= MIN_TICK_SPACING_PX {
            return *interval;
        }
    }
    *candidates.last().unwrap_or(&1)
}

/// Magnetic snap targets: every non-excluded item's start/end edge, except
/// edges inside a transition's overlap zone (replaced by one visual midpoint
/// at `right.from + ceil(transition.duration / 2)`), plus the playhead.
pub fn collect_targets(
    timeline: &Timeline,
    exclude: &[ItemId],
    playhead: Option<Frame>,
) -> Vec<SnapTarget> {
    let mut suppressed: Vec<(ItemId, Frame)> = Vec::new();
    let mut targets = Vec::new();

    for transition in timeline.transitions.values() {
        let (left, right) = match (
            timeline.items.get(&transition.left_item),
            timeline.items.get(&transition.right_item),
        ) {
            (Some(l), Some(r)) => (l, r),
            _ => continue,
        };
        if exclude.contains(&left.id) || exclude.contains(&right.id) {
            continue;
        }
        suppressed.push((left.id, left.end()));
        suppressed.push((right.id, right.from));
        targets.push(SnapTarget {
            frame: right.from + (transition.duration_in_frames + 1) / 2,
            kind: SnapKind::TransitionMidpoint,
        });
    }

    for item in timeline.items.values() {
        if exclude.contains(&item.id) {
            continue;
        }
        for edge in [item.from, item.end()] {
            if suppressed.contains(&(item.id, edge)) {
                continue;
            }
            targets.push(SnapTarget {
                frame: edge,
                kind: SnapKind::ItemEdge,
            });
        }
    }

    if let Some(frame) = playhead {
        targets.push(SnapTarget {
            frame,
            kind: SnapKind::Playhead,
        });
    }

    targets
}

fn best_for_edge(
    edge: Frame,
    targets: &[SnapTarget],
    interval: Frame,
    threshold: Frame,
) -> Option<(Frame, SnapKind)> {
    let mut best: Option<(Frame, SnapKind, Frame)> = None;

    let mut consider = |frame: Frame, kind: SnapKind| {
        let dist = (frame - edge).abs();
        if dist > threshold {
            return;
        }
        let replace = match best {
            None => true,
            // Strictly closer wins; on a tie the magnetic target wins.
            Some((_, best_kind, best_dist)) => {
                dist < best_dist
                    || (dist == best_dist && kind.is_magnetic() && !best_kind.is_magnetic())
            }
        };
        if replace {
            best = Some((frame, kind, dist));
        }
    };

    for target in targets {
        consider(target.frame, target.kind);
    }
    if interval > 0 {
        let tick = ((edge as f64 / interval as f64).round() as Frame) * interval;
        consider(tick, SnapKind::Grid);
    }

    best.map(|(frame, kind, _)| (frame, kind))
}

/// Snap a single edge (used by trims, where only one handle moves).
pub fn snap_edge(
    timeline: &Timeline,
    exclude: &[ItemId],
    opts: &SnapOptions,
    edge: Frame,
) -> Option<Snap> {
    let targets = collect_targets(timeline, exclude, opts.playhead);
    let (frame, kind) = best_for_edge(
        edge,
        &targets,
        grid_interval(&opts.view),
        threshold_frames(&opts.view),
    )?;
    Some(Snap {
        frame,
        kind,
        distance: frame - edge,
    })
}

/// Snap a moving item by evaluating both its start and end edge against all
/// targets; whichever edge yields the smaller distance wins. The returned
/// `frame` is the corrected `from`.
pub fn snap_item(
    timeline: &Timeline,
    exclude: &[ItemId],
    opts: &SnapOptions,
    from: Frame,
    duration: Frame,
) -> Option<Snap> {
    let targets = collect_targets(timeline, exclude, opts.playhead);
    let interval = grid_interval(&opts.view);
    let threshold = threshold_frames(&opts.view);

    let start = best_for_edge(from, &targets, interval, threshold)
        .map(|(frame, kind)| (frame, kind, frame - from));
    let end = best_for_edge(from + duration, &targets, interval, threshold)
        .map(|(frame, kind)| (frame - duration, kind, frame - (from + duration)));

    let chosen = match (start, end) {
        (None, None) => return None,
        (Some(s), None) => s,
        (None, Some(e)) => e,
        (Some(s), Some(e)) => {
            let end_wins = e.2.abs() < s.2.abs()
                || (e.2.abs() == s.2.abs() && e.1.is_magnetic() && !s.1.is_magnetic());
            if end_wins {
                e
            } else {
                s
            }
        }
    };
    Some(Snap {
        frame: chosen.0,
        kind: chosen.1,
        distance: chosen.2,
    })
}
