//! End-to-end editing scenarios driven through the store, checking the
//! invariants every commit must preserve: no illegal overlap, minimum
//! duration, source windows inside their media, and exact undo.

use timeline::{
    collision, DragSession, Fps, ItemId, ItemKind, ItemMove, RateStretchSession, SnapOptions,
    SourceBounds, StretchHandle, Timeline, TimelineEvent, TimelineItem, TimelineStore, Track,
    TrackId, TrimHandle, TrimMode, TrimSession, Viewport,
};

const FPS_30: Fps = Fps::new(30, 1);

fn view() -> Viewport {
    Viewport::new(30.0, FPS_30)
}

fn project(track_count: usize) -> (TimelineStore, Vec<TrackId>) {
    let mut tl = Timeline::default();
    let mut tracks = Vec::new();
    for i in 0..track_count {
        let track = Track::new(format!("V{}", i + 1), i as i64);
        tracks.push(track.id);
        tl.tracks.push(track);
    }
    (TimelineStore::with_timeline(tl), tracks)
}

fn clip(track: TrackId, from: i64, dur: i64, source_dur: i64) -> TimelineItem {
    let mut item = TimelineItem::new(track, from, dur, ItemKind::Video);
    item.media_id = Some("clip.mp4".to_string());
    item.source = Some(SourceBounds {
        start: 0,
        end: dur.min(source_dur),
        duration: source_dur,
    });
    item
}

/// Every pair of non-linked items on a track occupies disjoint frame ranges.
fn assert_no_illegal_overlap(timeline: &Timeline) {
    let items: Vec<&TimelineItem> = timeline.items.values().collect();
    for (i, a) in items.iter().enumerate() {
        for b in items.iter().skip(i + 1) {
            if a.track_id != b.track_id {
                continue;
            }
            if collision::overlaps(a.from, a.duration_in_frames, b.from, b.duration_in_frames) {
                assert!(
                    timeline.linked(a.id, b.id),
                    "items {} and {} overlap without a transition",
                    a.id,
                    b.id
                );
            }
        }
    }
    for item in &items {
        assert!(item.from >= 0);
        assert!(item.duration_in_frames >= 1);
        if let Some(src) = &item.source {
            assert!(0 <= src.start && src.start < src.end && src.end <= src.duration);
        }
    }
}

#[test]
fn drag_sequence_preserves_track_consistency() {
    let (mut store, tracks) = project(2);
    let a = clip(tracks[0], 0, 30, 300);
    let b = clip(tracks[0], 40, 30, 300);
    let c = clip(tracks[1], 0, 50, 300);
    let (a_id, b_id) = (a.id, b.id);
    store.insert_item(a).unwrap();
    store.insert_item(b).unwrap();
    store.insert_item(c).unwrap();

    // Drag A rightwards into B; the resolver pushes it past B.
    let mut session = DragSession::begin(store.timeline(), a_id, &[], false).unwrap();
    session
        .update(store.timeline(), &view(), 35.0, 0.0, None, None)
        .unwrap();
    session.commit(&mut store).unwrap();
    assert_eq!(store.timeline().item(a_id).unwrap().from, 70);
    assert_no_illegal_overlap(store.timeline());

    // Then drag B onto the lower track where C sits at 0..50.
    let mut session = DragSession::begin(store.timeline(), b_id, &[], false).unwrap();
    session
        .update(store.timeline(), &view(), 0.0, 60.0, Some(tracks[1]), None)
        .unwrap();
    session.commit(&mut store).unwrap();
    let b_item = store.timeline().item(b_id).unwrap();
    assert_eq!(b_item.track_id, tracks[1]);
    assert_eq!(b_item.from, 50);
    assert_no_illegal_overlap(store.timeline());
}

#[test]
fn rolling_edit_conserves_covered_region() {
    let (mut store, tracks) = project(1);
    let a = clip(tracks[0], 0, 50, 300);
    let b = clip(tracks[0], 50, 50, 300);
    let (a_id, b_id) = (a.id, b.id);
    store.insert_item(a).unwrap();
    store.insert_item(b).unwrap();

    let session =
        TrimSession::begin(store.timeline(), a_id, TrimHandle::End, TrimMode::Rolling).unwrap();
    assert_eq!(session.rolling_neighbor(), Some(b_id));
    let preview = session.preview(store.timeline(), 5, None).unwrap();
    store.commit_trim(&preview).unwrap();

    let a_item = store.timeline().item(a_id).unwrap();
    let b_item = store.timeline().item(b_id).unwrap();
    assert_eq!(a_item.duration_in_frames, 55);
    assert_eq!(b_item.from, 55);
    assert_eq!(b_item.duration_in_frames, 45);
    assert_eq!(a_item.from, 0);
    assert_eq!(b_item.end(), 100);
    assert_no_illegal_overlap(store.timeline());

    // Both halves of the rolling edit revert in a single undo.
    store.undo().unwrap();
    assert_eq!(store.timeline().item(a_id).unwrap().duration_in_frames, 50);
    assert_eq!(store.timeline().item(b_id).unwrap().from, 50);
}

#[test]
fn rate_stretch_round_trip_is_exact() {
    let (mut store, tracks) = project(1);
    let item = clip(tracks[0], 0, 30, 30);
    let id = item.id;
    store.insert_item(item).unwrap();

    let session = RateStretchSession::begin(store.timeline(), id, StretchHandle::End).unwrap();
    let preview = session.preview(30);
    assert_eq!(preview.duration_in_frames, 60);
    assert_eq!(preview.speed, 0.5);
    store.commit_rate_stretch(id, &preview).unwrap();

    let session = RateStretchSession::begin(store.timeline(), id, StretchHandle::End).unwrap();
    let preview = session.preview(-30);
    assert_eq!(preview.duration_in_frames, 30);
    assert_eq!(preview.speed, 1.0);
    store.commit_rate_stretch(id, &preview).unwrap();

    let item = store.timeline().item(id).unwrap();
    assert_eq!(item.duration_in_frames, 30);
    assert_eq!(item.speed, 1.0);
    assert_no_illegal_overlap(store.timeline());
}

#[test]
fn alt_drag_duplicate_then_undo_removes_only_the_copy() {
    let (mut store, tracks) = project(1);
    let item = clip(tracks[0], 0, 30, 300);
    let id = item.id;
    store.insert_item(item).unwrap();

    let mut session = DragSession::begin(store.timeline(), id, &[], true).unwrap();
    session
        .update(store.timeline(), &view(), 40.0, 0.0, None, None)
        .unwrap();
    let commit = session.commit(&mut store).unwrap().unwrap();
    let copy_id = commit.created[0];

    assert_eq!(store.timeline().item(id).unwrap().from, 0);
    assert_eq!(store.timeline().item(copy_id).unwrap().from, 40);
    assert_no_illegal_overlap(store.timeline());

    store.undo().unwrap();
    assert!(store.timeline().items.contains_key(&id));
    assert!(!store.timeline().items.contains_key(&copy_id));
}

#[test]
fn transition_breakage_is_undoable() {
    let (mut store, tracks) = project(1);
    let a = clip(tracks[0], 0, 50, 300);
    let b = clip(tracks[0], 50, 50, 300);
    let (a_id, b_id) = (a.id, b.id);
    store.insert_item(a).unwrap();
    store.insert_item(b).unwrap();
    let transition_id = store.add_transition(a_id, b_id, 10).unwrap();

    // Moving A far left separates the pair past the overlap zone.
    let commit = store.move_item(a_id, tracks[0], 0).unwrap();
    assert!(commit.events.is_empty(), "flush move must not break the link");

    let session =
        TrimSession::begin(store.timeline(), a_id, TrimHandle::End, TrimMode::Normal).unwrap();
    let preview = session.preview(store.timeline(), -25, None).unwrap();
    let commit = store.commit_trim(&preview).unwrap();
    assert_eq!(
        commit.events,
        vec![TimelineEvent::TransitionBroken {
            transition: transition_id,
            left: a_id,
            right: b_id,
        }]
    );
    assert!(store.timeline().transitions.is_empty());
    assert_no_illegal_overlap(store.timeline());

    // The trim and the transition removal revert together.
    store.undo().unwrap();
    assert!(store.timeline().transitions.contains_key(&transition_id));
    assert_eq!(store.timeline().item(a_id).unwrap().duration_in_frames, 50);
}

#[test]
fn split_ripple_delete_and_snap_compose() {
    let (mut store, tracks) = project(1);
    let a = clip(tracks[0], 0, 60, 300);
    let b = clip(tracks[0], 80, 40, 300);
    let (a_id, b_id) = (a.id, b.id);
    store.insert_item(a).unwrap();
    store.insert_item(b).unwrap();

    let (right_id, _) = store.split_item(a_id, 20).unwrap();
    store.ripple_delete(right_id).unwrap();
    // Removing the 40-frame fragment pulls B forward by its duration.
    assert_eq!(store.timeline().item(b_id).unwrap().from, 40);
    assert_no_illegal_overlap(store.timeline());

    // Dragging B near the remaining fragment's end snaps flush to it.
    let opts = SnapOptions {
        view: view(),
        playhead: None,
    };
    let mut session = DragSession::begin(store.timeline(), b_id, &[], false).unwrap();
    let preview = session
        .update(store.timeline(), &view(), -15.0, 0.0, None, Some(&opts))
        .unwrap()
        .unwrap();
    assert_eq!(preview.frame_offset, -20);
    session.commit(&mut store).unwrap();
    assert_eq!(store.timeline().item(b_id).unwrap().from, 20);
    assert_no_illegal_overlap(store.timeline());
}

#[test]
fn edited_project_serializes_round_trip() {
    let (mut store, tracks) = project(2);
    let a = clip(tracks[0], 0, 50, 300);
    let b = clip(tracks[0], 50, 50, 300);
    let (a_id, b_id) = (a.id, b.id);
    store.insert_item(a).unwrap();
    store.insert_item(b).unwrap();
    store.add_transition(a_id, b_id, 10).unwrap();
    store
        .move_items(vec![ItemMove {
            item_id: b_id,
            track_id: tracks[0],
            from: 40,
        }])
        .unwrap();

    let json = serde_json::to_string(store.timeline()).unwrap();
    let restored: Timeline = serde_json::from_str(&json).unwrap();
    assert_eq!(&restored, store.timeline());

    // A restored project supports further edits.
    let mut reopened = TimelineStore::with_timeline(restored);
    reopened.delete_item(a_id).unwrap();
    assert!(reopened.timeline().transitions.is_empty());
    assert_no_illegal_overlap(reopened.timeline());
}

// Distinct ids even under rapid duplication.
#[test]
fn duplicates_get_fresh_identity() {
    let (mut store, tracks) = project(1);
    let item = clip(tracks[0], 0, 10, 300);
    let id = item.id;
    store.insert_item(item).unwrap();

    let mut created: Vec<ItemId> = Vec::new();
    for i in 1..=3 {
        let commit = store
            .duplicate_items(vec![ItemMove {
                item_id: id,
                track_id: tracks[0],
                from: i * 20,
            }])
            .unwrap();
        created.extend(commit.created);
    }
    created.push(id);
    created.sort_by_key(|i| i.0);
    created.dedup();
    assert_eq!(created.len(), 4);
    assert_no_illegal_overlap(store.timeline());
}
