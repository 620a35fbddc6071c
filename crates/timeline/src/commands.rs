use serde::{Deserialize, Serialize};

use crate::{
    ItemId, Timeline, TimelineError, TimelineItem, Track, TrackId, Transition, TransitionId,
};

/// Primitive mutations of the timeline aggregate. Applying a command returns
/// its inverse, which is what the history stacks store. `Batch` groups the
/// primitives of one user gesture into a single undoable step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum EditCommand {
    InsertItem {
        item: TimelineItem,
    },
    RemoveItem {
        item_id: ItemId,
    },
    UpdateItem {
        item: TimelineItem,
    },
    UpsertTrack {
        track: Track,
    },
    RemoveTrack {
        track_id: TrackId,
    },
    AddTransition {
        transition: Transition,
    },
    UpdateTransition {
        transition: Transition,
    },
    RemoveTransition {
        transition_id: TransitionId,
    },
    Batch {
        commands: Vec<EditCommand>,
    },
}

pub fn apply_command(
    timeline: &mut Timeline,
    command: EditCommand,
) -> Result<EditCommand, TimelineError> {
    match command {
        EditCommand::InsertItem { item } => insert_item(timeline, item),
        EditCommand::RemoveItem { item_id } => remove_item(timeline, item_id),
        EditCommand::UpdateItem { item } => update_item(timeline, item),
        EditCommand::UpsertTrack { track } => upsert_track(timeline, track),
        EditCommand::RemoveTrack { track_id } => remove_track(timeline, track_id),
        EditCommand::AddTransition { transition } => add_transition(timeline, transition),
        EditCommand::UpdateTransition { transition } => update_transition(timeline, transition),
        EditCommand::RemoveTransition { transition_id } => {
            remove_transition(timeline, transition_id)
        }
        EditCommand::Batch { commands } => apply_batch(timeline, commands),
    }
}

fn insert_item(
    timeline: &mut Timeline,
    item: TimelineItem,
) -> Result<EditCommand, TimelineError> {
    if timeline.items.contains_key(&item.id) {
        return Err(TimelineError::ItemExists(item.id));
    }
    timeline.track(item.track_id)?;
    let item_id = item.id;
    timeline.items.insert(item_id, item);
    Ok(EditCommand::RemoveItem { item_id })
}

fn remove_item(timeline: &mut Timeline, item_id: ItemId) -> Result<EditCommand, TimelineError> {
    let item = timeline
        .items
        .remove(&item_id)
        .ok_or(TimelineError::ItemNotFound(item_id))?;
    Ok(EditCommand::InsertItem { item })
}

fn update_item(
    timeline: &mut Timeline,
    item: TimelineItem,
) -> Result<EditCommand, TimelineError> {
    let item_id = item.id;
    if let Some(entry) = timeline.items.get_mut(&item_id) {
        let previous = std::mem::replace(entry, item);
        Ok(EditCommand::UpdateItem { item: previous })
    } else {
        Err(TimelineError::ItemNotFound(item_id))
    }
}

fn upsert_track(timeline: &mut Timeline, track: Track) -> Result<EditCommand, TimelineError> {
    if let Some(idx) = timeline.tracks.iter().position(|t| t.id == track.id) {
        let previous = std::mem::replace(&mut timeline.tracks[idx], track);
        Ok(EditCommand::UpsertTrack { track: previous })
    } else {
        let track_id = track.id;
        timeline.tracks.push(track);
        Ok(EditCommand::RemoveTrack { track_id })
    }
}

fn remove_track(
    timeline: &mut Timeline,
    track_id: TrackId,
) -> Result<EditCommand, TimelineError> {
    if timeline.items.values().any(|i| i.track_id == track_id) {
        return Err(TimelineError::InvalidEdit(format!(
            "track {} still holds items",
            track_id
        )));
    }
    if let Some(idx) = timeline.tracks.iter().position(|t| t.id == track_id) {
        let track = timeline.tracks.remove(idx);
        Ok(EditCommand::UpsertTrack { track })
    } else {
        Err(TimelineError::TrackNotFound(track_id))
    }
}

fn add_transition(
    timeline: &mut Timeline,
    transition: Transition,
) -> Result<EditCommand, TimelineError> {
    timeline.item(transition.left_item)?;
    timeline.item(transition.right_item)?;
    if timeline.transitions.contains_key(&transition.id) {
        return Err(TimelineError::InvalidEdit(format!(
            "transition exists: {}",
            transition.id
        )));
    }
    let transition_id = transition.id;
    timeline.transitions.insert(transition_id, transition);
    Ok(EditCommand::RemoveTransition { transition_id })
}

fn update_transition(
    timeline: &mut Timeline,
    transition: Transition,
) -> Result<EditCommand, TimelineError> {
    let id = transition.id;
    if let Some(entry) = timeline.transitions.get_mut(&id) {
        let previous = std::mem::replace(entry, transition);
        Ok(EditCommand::UpdateTransition {
            transition: previous,
        })
    } else {
        Err(TimelineError::TransitionNotFound(id))
    }
}

fn remove_transition(
    timeline: &mut Timeline,
    transition_id: TransitionId,
) -> Result<EditCommand, TimelineError> {
    let transition = timeline
        .transitions
        .remove(&transition_id)
        .ok_or(TimelineError::TransitionNotFound(transition_id))?;
    Ok(EditCommand::AddTransition { transition })
}

/// Apply a gesture's commands in order; the inverse is the reversed list of
/// member inverses. A failure mid-batch rolls the applied prefix back so the
/// aggregate is never left partially mutated.
fn apply_batch(
    timeline: &mut Timeline,
    commands: Vec<EditCommand>,
) -> Result<EditCommand, TimelineError> {
    let mut inverses = Vec::with_capacity(commands.len());
    for command in commands {
        match apply_command(timeline, command) {
            Ok(inverse) => inverses.push(inverse),
            Err(err) => {
                while let Some(inverse) = inverses.pop() {
                    // Undoing a just-applied primitive cannot fail.
                    let _ = apply_command(timeline, inverse);
                }
                return Err(err);
            }
        }
    }
    inverses.reverse();
    Ok(EditCommand::Batch { commands: inverses })
}

#[derive(Debug, Default, Clone)]
pub struct CommandHistory {
    undo_stack: Vec<EditCommand>,
    redo_stack: Vec<EditCommand>,
}

impl CommandHistory {
    pub fn apply(
        &mut self,
        timeline: &mut Timeline,
        command: EditCommand,
    ) -> Result<(), TimelineError> {
        let inverse = apply_command(timeline, command)?;
        self.undo_stack.push(inverse);
        self.redo_stack.clear();
        Ok(())
    }

    pub fn undo(&mut self, timeline: &mut Timeline) -> Result<(), TimelineError> {
        let command = self
            .undo_stack
            .pop()
            .ok_or(TimelineError::HistoryEmpty("undo stack"))?;
        let inverse = apply_command(timeline, command)?;
        self.redo_stack.push(inverse);
        Ok(())
    }

    pub fn redo(&mut self, timeline: &mut Timeline) -> Result<(), TimelineError> {
        let command = self
            .redo_stack
            .pop()
            .ok_or(TimelineError::HistoryEmpty("redo stack"))?;
        let inverse = apply_command(timeline, command)?;
        self.undo_stack.push(inverse);
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
