use serde::{Deserialize, Serialize};

use crate::error::MoveError;
use crate::model::{Collection, GroupId, ItemId, RowKey};
use crate::sync::MoveSink;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMove {
    pub group_id: GroupId,
    pub position: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemMove {
    pub item_id: ItemId,
    pub group_id: GroupId,
    pub position_in_group: usize,
}

/// The canonical description of a reorder, as understood by the ordering authority.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MoveCommand {
    Group(GroupMove),
    Item(ItemMove),
}

/// Position of a committed move in this client's commit order.
///
/// The first committed move is `MoveSeq(1)`; `MoveSeq::default()` sorts before every move.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct MoveSeq(pub u64);

impl MoveSeq {
    pub fn next(self) -> Self {
        MoveSeq(self.0 + 1)
    }
}

/// A committed move tagged with its place in the commit order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencedMove {
    pub seq: MoveSeq,
    pub command: MoveCommand,
}

/// Apply the move implied by dropping `dragged` on `target`, mutating `groups` in place.
///
/// Returns `Ok(None)` for drops that mean "nothing to do": no target, the dragged row itself, or
/// a group over an item. All ids are resolved before the first mutation, so an error always
/// leaves `groups` untouched.
pub fn resolve_move(
    groups: &mut Collection,
    dragged: RowKey,
    target: Option<RowKey>,
) -> Result<Option<MoveCommand>, MoveError> {
    let Some(target) = target else {
        return Ok(None);
    };
    if target == dragged {
        return Ok(None);
    }

    match (dragged, target) {
        (RowKey::Group(dragged_id), RowKey::Group(target_id)) => {
            move_group(groups, dragged_id, target_id).map(Some)
        }
        (RowKey::Group(_), RowKey::Item(_)) => Ok(None),
        (RowKey::Item(item_id), RowKey::Group(group_id)) => {
            move_item_to_group(groups, item_id, group_id).map(Some)
        }
        (RowKey::Item(item_id), RowKey::Item(target_id)) => {
            move_item_onto_item(groups, item_id, target_id).map(Some)
        }
    }
}

/// The dragged group takes the target's index: it lands after the target when it came from
/// above, before the target when it came from below.
fn move_group(
    groups: &mut Collection,
    dragged_id: GroupId,
    target_id: GroupId,
) -> Result<MoveCommand, MoveError> {
    let from = groups
        .group_position(dragged_id)
        .ok_or(MoveError::StaleDragged(RowKey::Group(dragged_id)))?;
    let to = groups
        .group_position(target_id)
        .ok_or(MoveError::StaleTarget(RowKey::Group(target_id)))?;

    let groups = groups.groups_mut();
    let group = groups.remove(from);
    let to = to.min(groups.len());
    groups.insert(to, group);

    Ok(MoveCommand::Group(GroupMove {
        group_id: dragged_id,
        position: to,
    }))
}

/// Items dropped on a group header always land at the front of that group.
fn move_item_to_group(
    groups: &mut Collection,
    item_id: ItemId,
    group_id: GroupId,
) -> Result<MoveCommand, MoveError> {
    let (from_group_ix, from_item_ix) = groups
        .locate_item(item_id)
        .ok_or(MoveError::StaleDragged(RowKey::Item(item_id)))?;
    let to_group_ix = groups
        .group_position(group_id)
        .ok_or(MoveError::StaleTarget(RowKey::Group(group_id)))?;

    let groups = groups.groups_mut();
    let item = groups[from_group_ix].items.remove(from_item_ix);
    groups[to_group_ix].items.insert(0, item);

    Ok(MoveCommand::Item(ItemMove {
        item_id,
        group_id,
        position_in_group: 0,
    }))
}

fn move_item_onto_item(
    groups: &mut Collection,
    item_id: ItemId,
    target_id: ItemId,
) -> Result<MoveCommand, MoveError> {
    let (from_group_ix, _) = groups
        .locate_item(item_id)
        .ok_or(MoveError::StaleDragged(RowKey::Item(item_id)))?;
    let (target_group_ix, _) = groups
        .locate_item(target_id)
        .ok_or(MoveError::StaleTarget(RowKey::Item(target_id)))?;

    // Crossing groups: hop to the front of the target's group first, then reorder within it.
    if from_group_ix != target_group_ix {
        let target_group_id = groups.groups()[target_group_ix].id;
        move_item_to_group(groups, item_id, target_group_id)?;
    }

    let (group_ix, from) = groups
        .locate_item(item_id)
        .ok_or(MoveError::StaleDragged(RowKey::Item(item_id)))?;
    let (_, to) = groups
        .locate_item(target_id)
        .ok_or(MoveError::StaleTarget(RowKey::Item(target_id)))?;

    let group = &mut groups.groups_mut()[group_ix];
    let item = group.items.remove(from);
    let to = to.min(group.items.len());
    group.items.insert(to, item);

    Ok(MoveCommand::Item(ItemMove {
        item_id,
        group_id: group.id,
        position_in_group: to,
    }))
}

/// Applies optimistic moves during a gesture and remembers the latest one for the commit.
///
/// The engine never owns the collection; callers pass the view model's collection in for each
/// mutation.
#[derive(Debug, Default)]
pub struct OrderingEngine {
    last_move: Option<MoveCommand>,
    committed: MoveSeq,
}

impl OrderingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget any move left over from a previous gesture.
    pub fn begin_gesture(&mut self) {
        self.last_move = None;
    }

    pub fn last_move(&self) -> Option<&MoveCommand> {
        self.last_move.as_ref()
    }

    /// Handle a drag-enter. Returns the applied move, or `None` when nothing changed.
    ///
    /// A move that can't be resolved against `groups` is dropped without touching the
    /// collection or the recorded move.
    pub fn apply_optimistic_move(
        &mut self,
        groups: &mut Collection,
        dragged: RowKey,
        target: Option<RowKey>,
    ) -> Option<&MoveCommand> {
        match resolve_move(groups, dragged, target) {
            Ok(Some(command)) => {
                tracing::debug!(?dragged, ?target, ?command, "applied optimistic move");
                self.last_move = Some(command);
                self.last_move.as_ref()
            }
            Ok(None) => None,
            Err(err) => {
                tracing::warn!(%err, "skipped move against a stale snapshot");
                None
            }
        }
    }

    /// Send the recorded move, if any, and clear it. Called once per completed drag.
    ///
    /// Each sent move gets the next [`MoveSeq`].
    pub fn commit_move(&mut self, sink: &dyn MoveSink) -> Option<MoveCommand> {
        let command = self.last_move.take()?;
        self.committed = self.committed.next();
        tracing::debug!(seq = self.committed.0, ?command, "committing move");
        sink.submit(SequencedMove {
            seq: self.committed,
            command,
        });
        Some(command)
    }

    /// The sequence number of the most recently committed move.
    pub fn committed_seq(&self) -> MoveSeq {
        self.committed
    }

    /// Whether a snapshot read after the move `seen` reached the authority already contains
    /// every move committed locally. Older snapshots would undo newer local moves.
    pub fn accepts(&self, seen: MoveSeq) -> bool {
        seen >= self.committed
    }
}
