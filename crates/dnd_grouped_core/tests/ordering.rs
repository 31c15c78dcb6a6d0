use std::cell::RefCell;

use gpui_dnd_grouped_core::{
    Collection, Group, GroupId, GroupMove, Item, ItemId, ItemMove, MoveCommand, MoveSeq,
    MoveSink, OrderingEngine, RowKey, SequencedMove,
};
use pretty_assertions::assert_eq;

#[derive(Default)]
struct RecordingSink {
    sent: RefCell<Vec<SequencedMove>>,
}

impl MoveSink for RecordingSink {
    fn submit(&self, command: SequencedMove) {
        self.sent.borrow_mut().push(command);
    }
}

fn collection(layout: &[(u64, &[u64])]) -> Collection {
    Collection::try_new(
        layout
            .iter()
            .map(|(group_id, items)| {
                Group::new(GroupId(*group_id)).items(items.iter().map(|id| {
                    Item::new(ItemId(*id), format!("link {id}"), format!("https://{id}.test"))
                }))
            })
            .collect::<Vec<_>>(),
    )
    .unwrap()
}

fn order(collection: &Collection) -> Vec<(u64, Vec<u64>)> {
    collection
        .groups()
        .iter()
        .map(|group| {
            (
                group.id.0,
                group.items.iter().map(|item| item.id.0).collect(),
            )
        })
        .collect()
}

fn all_keys(collection: &Collection) -> Vec<RowKey> {
    collection
        .groups()
        .iter()
        .flat_map(|group| {
            std::iter::once(RowKey::Group(group.id))
                .chain(group.items.iter().map(|item| RowKey::Item(item.id)))
        })
        .collect()
}

#[test]
fn missing_or_self_target_never_mutates() {
    let mut groups = collection(&[(1, &[10, 11]), (2, &[20])]);
    let before = groups.clone();
    let mut engine = OrderingEngine::new();

    for key in all_keys(&before) {
        assert!(engine.apply_optimistic_move(&mut groups, key, None).is_none());
        assert!(
            engine
                .apply_optimistic_move(&mut groups, key, Some(key))
                .is_none()
        );
    }
    assert_eq!(groups, before);
    assert_eq!(engine.last_move(), None);
}

#[test]
fn same_group_item_takes_target_slot() {
    // A=1, B=2, C=3. Past C's midpoint the detector reports C.
    let mut groups = collection(&[(10, &[1, 2, 3])]);
    let mut engine = OrderingEngine::new();
    engine.apply_optimistic_move(&mut groups, ItemId(1).into(), Some(ItemId(3).into()));
    assert_eq!(order(&groups), vec![(10, vec![2, 3, 1])]);

    // Until the dragged rect reaches C, B is the reported target.
    let mut groups = collection(&[(10, &[1, 2, 3])]);
    let mut engine = OrderingEngine::new();
    engine.apply_optimistic_move(&mut groups, ItemId(1).into(), Some(ItemId(2).into()));
    assert_eq!(order(&groups), vec![(10, vec![2, 1, 3])]);
}

#[test]
fn item_onto_group_header_lands_at_front() {
    let mut groups = collection(&[(1, &[10]), (2, &[20])]);
    let mut engine = OrderingEngine::new();

    let applied = engine
        .apply_optimistic_move(&mut groups, ItemId(10).into(), Some(GroupId(2).into()))
        .copied();

    assert_eq!(order(&groups), vec![(1, vec![]), (2, vec![10, 20])]);
    assert_eq!(
        applied,
        Some(MoveCommand::Item(ItemMove {
            item_id: ItemId(10),
            group_id: GroupId(2),
            position_in_group: 0,
        }))
    );
}

#[test]
fn group_takes_target_index() {
    let mut groups = collection(&[(1, &[]), (2, &[]), (3, &[])]);
    let mut engine = OrderingEngine::new();
    let applied = engine
        .apply_optimistic_move(&mut groups, GroupId(1).into(), Some(GroupId(3).into()))
        .copied();
    assert_eq!(order(&groups), vec![(2, vec![]), (3, vec![]), (1, vec![])]);
    assert_eq!(
        applied,
        Some(MoveCommand::Group(GroupMove {
            group_id: GroupId(1),
            position: 2,
        }))
    );

    let mut groups = collection(&[(1, &[]), (2, &[]), (3, &[])]);
    let applied = engine
        .apply_optimistic_move(&mut groups, GroupId(3).into(), Some(GroupId(1).into()))
        .copied();
    assert_eq!(order(&groups), vec![(3, vec![]), (1, vec![]), (2, vec![])]);
    assert_eq!(
        applied,
        Some(MoveCommand::Group(GroupMove {
            group_id: GroupId(3),
            position: 0,
        }))
    );
}

#[test]
fn one_command_per_gesture_matching_last_move() {
    let mut groups = collection(&[(1, &[10, 11, 12]), (2, &[20])]);
    let mut engine = OrderingEngine::new();
    let sink = RecordingSink::default();

    engine.begin_gesture();
    let enters = [
        Some(RowKey::Item(ItemId(11))),
        None,
        Some(RowKey::Item(ItemId(12))),
        Some(RowKey::Item(ItemId(99))),
        Some(RowKey::Group(GroupId(2))),
        Some(RowKey::Item(ItemId(20))),
    ];
    let mut last_applied = None;
    for target in enters {
        if let Some(applied) =
            engine.apply_optimistic_move(&mut groups, ItemId(10).into(), target)
        {
            last_applied = Some(*applied);
        }
    }

    let committed = engine.commit_move(&sink);
    assert_eq!(committed, last_applied);
    assert_eq!(
        *sink.sent.borrow(),
        vec![SequencedMove {
            seq: MoveSeq(1),
            command: last_applied.unwrap(),
        }]
    );
    assert_eq!(order(&groups), vec![(1, vec![11, 12]), (2, vec![20, 10])]);

    // Nothing left to send.
    assert_eq!(engine.commit_move(&sink), None);
    assert_eq!(sink.sent.borrow().len(), 1);
}

#[test]
fn gesture_without_target_commits_nothing() {
    let mut groups = collection(&[(1, &[10, 11])]);
    let mut engine = OrderingEngine::new();
    let sink = RecordingSink::default();

    engine.apply_optimistic_move(&mut groups, ItemId(10).into(), Some(ItemId(11).into()));
    engine.commit_move(&sink);

    engine.begin_gesture();
    engine.apply_optimistic_move(&mut groups, ItemId(11).into(), None);
    assert_eq!(engine.commit_move(&sink), None);
    assert_eq!(sink.sent.borrow().len(), 1);
    // Nothing was sent, so the sequence does not advance.
    assert_eq!(engine.committed_seq(), MoveSeq(1));
}

#[test]
fn random_move_sequences_keep_ids_unique_and_owned_once() {
    let mut groups = collection(&[
        (1, &[10, 11, 12, 13]),
        (2, &[]),
        (3, &[30, 31]),
        (4, &[40]),
        (5, &[50, 51, 52]),
    ]);
    let keys = all_keys(&groups);
    let group_count = groups.len();
    let item_count = groups.item_count();
    let mut engine = OrderingEngine::new();

    let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
    let mut next = move || {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        seed
    };

    for step in 0..2_000 {
        let dragged = keys[(next() % keys.len() as u64) as usize];
        let pick = next() % (keys.len() as u64 + 1);
        let target = keys.get(pick as usize).copied();

        engine.apply_optimistic_move(&mut groups, dragged, target);

        assert_eq!(groups.validate(), Ok(()), "step {step}");
        assert_eq!(groups.len(), group_count, "step {step}");
        assert_eq!(groups.item_count(), item_count, "step {step}");
        for key in &keys {
            assert!(groups.contains(*key), "step {step}: lost {key:?}");
        }
    }
}
