use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use manos_board_core::{
    AutoSaveConfig, Board, BoardConfig, Container, DndId, DropOutcome, IdScheme, ManualClock,
    PersistError, SaveStatus,
};

type Flushes = Rc<RefCell<Vec<Vec<String>>>>;

const QUIET: Duration = Duration::from_millis(2000);

fn menu() -> Vec<Container<&'static str>> {
    vec![
        Container::new("Cat1", "Starters")
            .item("item1", "Soup")
            .item("item2", "Salad")
            .item("item3", "Bread"),
        Container::new("Cat2", "Mains").item("item4", "Steak"),
        Container::new("Cat3", "Desserts").item("item5", "Pie"),
    ]
}

fn recording_board(containers: Vec<Container<&'static str>>) -> (Board<&'static str>, Flushes) {
    let flushes: Flushes = Rc::default();
    let sink = flushes.clone();
    let config = BoardConfig::default().auto_save(AutoSaveConfig::default().quiet_interval(QUIET));
    let board = Board::with_config(containers, config, ManualClock::new())
        .unwrap()
        .on_flush(move |containers: &[Container<&'static str>]| {
            sink.borrow_mut()
                .push(containers.iter().map(|c| c.id.clone()).collect());
            Ok::<(), PersistError>(())
        });
    (board, flushes)
}

fn advance<T: 'static>(board: &mut Board<T>, by: Duration) -> Option<Result<(), PersistError>> {
    let timer = board.scheduler_mut().advance(by)?;
    board.fire_timer(timer)
}

fn item_ids<T>(container: &Container<T>) -> Vec<&str> {
    container.item_ids().collect()
}

#[test]
fn dropping_item_onto_sibling_reorders_within_container() {
    let (mut board, _) = recording_board(menu());

    assert!(board.on_drag_start("item-item1"));
    assert_eq!(board.active_id(), Some(&DndId::item("item1")));
    let outcome = board.on_drag_end("item-item1", Some("item-item3"));

    assert_eq!(
        outcome,
        DropOutcome::ItemReordered {
            container_id: "Cat1".to_string(),
            from: 0,
            to: 2,
        }
    );
    let cat1 = &board.containers()[0];
    assert_eq!(item_ids(cat1), vec!["item2", "item3", "item1"]);
    assert_eq!(
        cat1.items.iter().map(|i| i.order).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
    assert!(board.active_id().is_none());
    assert!(board.is_dirty());
}

#[test]
fn dropping_item_across_containers_appends() {
    let containers = vec![
        Container::new("A", "A").item("x", "x").item("y", "y"),
        Container::new("B", "B").item("z", "z"),
    ];
    let (mut board, _) = recording_board(containers);

    board.on_drag_start("item-x");
    board.on_drag_end("item-x", Some("item-z"));

    let a = &board.containers()[0];
    let b = &board.containers()[1];
    assert_eq!(item_ids(a), vec!["y"]);
    assert_eq!(a.items[0].order, 0);
    assert_eq!(item_ids(b), vec!["z", "x"]);
    assert_eq!(b.items.iter().map(|i| i.order).collect::<Vec<_>>(), vec![0, 1]);
    assert_eq!(b.items[1].container_id, "B");
}

#[test]
fn container_drag_reorders_and_restores_collapse_state() {
    let (board, _) = recording_board(menu());
    let mut board = board.collapsed_containers(["Cat2"]);

    board.on_drag_start("container-Cat1");
    let during: Vec<_> = board.collapsed().iter().collect();
    assert_eq!(during, vec!["Cat1", "Cat2", "Cat3"]);

    let outcome = board.on_drag_end("container-Cat1", Some("container-Cat3"));

    assert_eq!(outcome, DropOutcome::ContainersReordered { from: 0, to: 2 });
    let order: Vec<_> = board
        .containers()
        .iter()
        .map(|c| (c.id.as_str(), c.order))
        .collect();
    assert_eq!(order, vec![("Cat2", 0), ("Cat3", 1), ("Cat1", 2)]);
    assert_eq!(board.collapsed().iter().collect::<Vec<_>>(), vec!["Cat2"]);
}

#[test]
fn cancelled_container_drag_still_restores_collapse_state() {
    let (board, _) = recording_board(menu());
    let mut board = board.collapsed_containers(["Cat3"]);

    board.on_drag_start("container-Cat2");
    let outcome = board.on_drag_end("container-Cat2", None);

    assert_eq!(outcome, DropOutcome::Cancelled);
    assert_eq!(board.collapsed().iter().collect::<Vec<_>>(), vec!["Cat3"]);
    assert!(!board.is_dirty());
}

#[test]
fn drop_outside_any_target_changes_nothing() {
    let (mut board, _) = recording_board(menu());
    let before = board.containers().to_vec();

    board.on_drag_start("item-item5");
    let outcome = board.on_drag_end("item-item5", None);

    assert_eq!(outcome, DropOutcome::Cancelled);
    assert_eq!(board.containers(), before.as_slice());
    assert!(!board.is_dirty());
    assert!(board.scheduler().pending().is_none());
}

#[test]
fn unresolvable_target_is_treated_as_cancel() {
    let (mut board, _) = recording_board(menu());

    board.on_drag_start("item-item1");
    assert_eq!(
        board.on_drag_end("item-item1", Some("item-missing")),
        DropOutcome::Cancelled
    );
    board.on_drag_start("item-item1");
    assert_eq!(
        board.on_drag_end("item-item1", Some("bogus")),
        DropOutcome::Cancelled
    );
    assert!(!board.is_dirty());
}

#[test]
fn self_drop_does_not_mark_changed() {
    let (mut board, _) = recording_board(menu());

    board.on_drag_start("item-item2");
    assert_eq!(
        board.on_drag_end("item-item2", Some("item-item2")),
        DropOutcome::Unchanged
    );
    assert!(!board.is_dirty());
}

#[test]
fn burst_of_changes_flushes_once_after_quiet_interval() {
    let (mut board, flushes) = recording_board(menu());

    for _ in 0..5 {
        board.mark_changed();
        assert!(advance(&mut board, Duration::from_millis(100)).is_none());
    }
    // The fifth change happened 100ms ago.
    assert!(advance(&mut board, Duration::from_millis(1899)).is_none());
    assert!(flushes.borrow().is_empty());

    assert!(matches!(
        advance(&mut board, Duration::from_millis(1)),
        Some(Ok(()))
    ));
    assert_eq!(flushes.borrow().len(), 1);
    assert!(!board.is_dirty());
    assert!(board.last_saved_at().is_some());

    assert!(advance(&mut board, Duration::from_secs(60)).is_none());
    assert_eq!(flushes.borrow().len(), 1);
}

#[test]
fn flush_carries_the_full_current_structure() {
    let (mut board, flushes) = recording_board(menu());

    board.on_drag_start("container-Cat3");
    board.on_drag_end("container-Cat3", Some("container-Cat1"));
    advance(&mut board, QUIET);

    assert_eq!(
        flushes.borrow().as_slice(),
        &[vec![
            "Cat3".to_string(),
            "Cat1".to_string(),
            "Cat2".to_string()
        ]]
    );
}

#[test]
fn save_now_cancels_pending_timer() {
    let (mut board, flushes) = recording_board(menu());

    board.mark_changed();
    board.save_now().unwrap();

    assert_eq!(flushes.borrow().len(), 1);
    assert!(board.scheduler().pending().is_none());
    assert!(advance(&mut board, QUIET).is_none());
    assert_eq!(flushes.borrow().len(), 1);
}

#[test]
fn failed_flush_stays_dirty_until_next_change_retries() {
    let attempts = Rc::new(RefCell::new(0));
    let counter = attempts.clone();
    let config = BoardConfig::default().auto_save(AutoSaveConfig::default().quiet_interval(QUIET));
    let mut board = Board::with_config(menu(), config, ManualClock::new())
        .unwrap()
        .on_flush(move |_: &[Container<&'static str>]| {
            *counter.borrow_mut() += 1;
            if *counter.borrow() == 1 {
                Err(PersistError::other("offline"))
            } else {
                Ok(())
            }
        });

    board.mark_changed();
    assert!(matches!(advance(&mut board, QUIET), Some(Err(_))));
    assert!(board.is_dirty());
    assert_eq!(
        board.save_status(),
        SaveStatus::Failed {
            message: "offline".to_string()
        }
    );

    // Nothing retries on its own.
    assert!(advance(&mut board, QUIET * 10).is_none());
    assert_eq!(*attempts.borrow(), 1);

    board.mark_changed();
    assert!(matches!(advance(&mut board, QUIET), Some(Ok(()))));
    assert_eq!(*attempts.borrow(), 2);
    assert!(!board.is_dirty());
}

#[test]
fn auto_save_toggle_preserves_quirk() {
    let (mut board, flushes) = recording_board(menu());

    board.set_auto_save_enabled(false);
    board.mark_changed();
    assert!(advance(&mut board, QUIET).is_none());
    assert_eq!(board.save_status(), SaveStatus::Unsaved);

    board.set_auto_save_enabled(true);
    assert!(advance(&mut board, QUIET).is_none());
    assert!(flushes.borrow().is_empty());
    assert!(board.is_dirty());

    board.mark_changed();
    assert!(matches!(advance(&mut board, QUIET), Some(Ok(()))));
    assert_eq!(flushes.borrow().len(), 1);
}

#[test]
fn flush_completing_after_new_edits_keeps_board_dirty() {
    let (mut board, _) = recording_board(menu());

    board.mark_changed();
    let ticket = board.begin_flush();
    board.on_drag_start("item-item1");
    board.on_drag_end("item-item1", Some("item-item2"));

    board.finish_flush(ticket, Ok(())).unwrap();

    assert!(board.is_dirty());
    assert_eq!(board.save_status(), SaveStatus::Pending);
}

#[test]
fn deleting_container_mid_drag_cancels_the_drop() {
    let (mut board, _) = recording_board(menu());

    board.on_drag_start("item-item4");
    board.remove_container("Cat2").unwrap();
    let outcome = board.on_drag_end("item-item4", Some("item-item1"));

    assert_eq!(outcome, DropOutcome::Cancelled);
    assert_eq!(item_ids(&board.containers()[0]), vec!["item1", "item2", "item3"]);
}

#[test]
fn deleting_container_mid_container_drag_drops_it_from_restored_collapse_set() {
    let (board, _) = recording_board(menu());
    let mut board = board.collapsed_containers(["Cat2"]);

    board.on_drag_start("container-Cat1");
    board.remove_container("Cat2").unwrap();
    board.on_drag_end("container-Cat1", Some("container-Cat3"));

    assert!(board.collapsed().is_empty());
    let order: Vec<_> = board.containers().iter().map(|c| c.id.as_str()).collect();
    assert_eq!(order, vec!["Cat3", "Cat1"]);
}

#[test]
fn custom_prefixes_drive_classification() {
    let ids = IdScheme::new("table-", "area-").unwrap();
    let containers = vec![
        Container::new("patio", "Patio").item("t1", "T1"),
        Container::new("bar", "Bar").item("t2", "T2"),
    ];
    let mut board =
        Board::with_config(containers, BoardConfig::default().ids(ids), ManualClock::new())
            .unwrap();

    assert!(!board.on_drag_start("item-t1"));
    assert!(board.on_drag_start("table-t1"));
    let outcome = board.on_drag_end("table-t1", Some("area-bar"));

    assert!(matches!(outcome, DropOutcome::ItemMoved { .. }));
    assert_eq!(item_ids(&board.containers()[1]), vec!["t2", "t1"]);
}

#[test]
fn snapshot_reflects_drag_and_save_state() {
    let (mut board, _) = recording_board(menu());

    board.on_drag_start("container-Cat2");
    let snapshot = board.snapshot();
    assert_eq!(snapshot.active_id, Some(&DndId::container("Cat2")));
    assert_eq!(snapshot.collapsed.len(), 3);
    assert!(!snapshot.is_dirty);
    assert!(snapshot.is_auto_save_enabled);
    assert!(snapshot.last_saved_at.is_none());
    assert_eq!(snapshot.containers.len(), 3);
}
