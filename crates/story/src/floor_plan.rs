use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use gpui::prelude::FluentBuilder as _;
use gpui::*;
use gpui_component::ActiveTheme as _;
use gpui_component::list::ListItem;
use gpui_component::{Icon, IconName, Sizable as _, h_flex, v_flex};
use gpui_dnd_board::{DndBoardEntry, DndBoardRowState, DndBoardState, dnd_board};
use manos_board_core::{
    ActiveTarget, AutoSaveConfig, BoardConfig, Container, DropOutcome, IdScheme,
    JsonFilePersistence,
};
use serde::{Deserialize, Serialize};

use crate::support::load_board;
use crate::toolbar::board_toolbar;

const FLOOR_PLAN_PATH: &str = "./data/floor-plan.json";

/// A table placed in a dining area.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub label: String,
    pub seats: u8,
}

impl Table {
    pub fn new(label: impl Into<String>, seats: u8) -> Self {
        Self {
            label: label.into(),
            seats,
        }
    }
}

pub struct FloorPlanExample {
    board: Entity<DndBoardState<Table>>,
    last_move: Rc<RefCell<Option<String>>>,
}

impl FloorPlanExample {
    pub fn view(window: &mut Window, cx: &mut App) -> Entity<Self> {
        let storage = JsonFilePersistence::new(FLOOR_PLAN_PATH);
        let board = load_board(&storage, floor_plan_config(), demo_floor);
        let last_move: Rc<RefCell<Option<String>>> = Rc::default();
        let board = cx.new(|cx| {
            let last_move = last_move.clone();
            DndBoardState::new(cx)
                .board(board)
                .save_to(storage)
                .drag_label(|target| match target {
                    ActiveTarget::Item(table) => {
                        format!("{} ({} seats)", table.data.label, table.data.seats).into()
                    }
                    ActiveTarget::Container(area) => area.name.clone().into(),
                })
                .on_drop(move |outcome, _areas| {
                    *last_move.borrow_mut() = describe_outcome(outcome);
                })
        });
        board.update(cx, |board, cx| board.save_before_close(window, cx));

        cx.new(|cx| {
            cx.observe(&board, |_, _, cx| cx.notify()).detach();
            Self { board, last_move }
        })
    }
}

/// Tables and areas use their own id prefixes and a shorter quiet interval.
fn floor_plan_config() -> BoardConfig {
    let ids = IdScheme::new("table-", "area-").unwrap_or_default();
    BoardConfig::default()
        .ids(ids)
        .auto_save(AutoSaveConfig::default().quiet_interval(Duration::from_millis(1000)))
}

pub fn describe_outcome(outcome: &DropOutcome) -> Option<String> {
    match outcome {
        DropOutcome::Cancelled | DropOutcome::Unchanged => None,
        DropOutcome::ItemReordered { container_id, .. } => {
            Some(format!("Rearranged tables in {container_id}"))
        }
        DropOutcome::ItemMoved {
            item_id,
            to_container,
            ..
        } => Some(format!("Moved {item_id} to {to_container}")),
        DropOutcome::ContainersReordered { .. } => Some("Reordered areas".to_string()),
    }
}

impl Render for FloorPlanExample {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        let board = self.board.read(cx).board_ref();
        let seats: u32 = board
            .containers()
            .iter()
            .flat_map(|area| area.items.iter())
            .map(|table| u32::from(table.data.seats))
            .sum();
        let summary = board
            .containers()
            .iter()
            .map(|area| {
                let seats: u32 = area.items.iter().map(|t| u32::from(t.data.seats)).sum();
                format!("{}: {} tables, {seats} seats", area.name, area.items.len())
            })
            .collect::<Vec<_>>();
        let last_move = self.last_move.borrow().clone();

        v_flex()
            .size_full()
            .p(px(16.))
            .gap_y_3()
            .child(
                v_flex()
                    .gap_y_1()
                    .child(
                        div()
                            .text_xl()
                            .font_weight(FontWeight::BOLD)
                            .child("Floor Plan"),
                    )
                    .child(div().text_sm().text_color(theme.muted_foreground).child(
                        "Drag tables between areas. Dropping a table on an area header appends it to that area.",
                    ))
                    .child(
                        div()
                            .text_sm()
                            .text_color(theme.muted_foreground)
                            .child(format!("{seats} seats in total")),
                    )
                    .when_some(last_move, |this, last_move| {
                        this.child(
                            div()
                                .text_sm()
                                .text_color(theme.muted_foreground)
                                .child(last_move),
                        )
                    }),
            )
            .child(board_toolbar("floor-plan", &self.board, cx))
            .child(
                h_flex()
                    .flex_1()
                    .min_h(px(0.))
                    .gap_x_3()
                    .child(
                        div()
                            .w(px(360.))
                            .min_w(px(0.))
                            .h_full()
                            .rounded(px(12.))
                            .border_1()
                            .border_color(theme.border)
                            .bg(theme.background)
                            .child(dnd_board(
                                &self.board,
                                move |ix, entry, row_state, _window, cx| {
                                    render_floor_row(ix, entry, row_state, cx)
                                },
                            )),
                    )
                    .child(
                        v_flex()
                            .flex_1()
                            .min_w(px(0.))
                            .gap_y_1()
                            .children(
                                summary
                                    .into_iter()
                                    .map(|line| div().text_sm().child(line)),
                            ),
                    ),
            )
    }
}

fn render_floor_row(
    ix: usize,
    entry: DndBoardEntry<'_, Table>,
    row_state: DndBoardRowState,
    cx: &mut App,
) -> ListItem {
    let theme = cx.theme();

    let row = match entry {
        DndBoardEntry::Header { container, .. } => h_flex()
            .gap_x_2()
            .items_center()
            .child(
                Icon::from(IconName::Folder)
                    .small()
                    .text_color(theme.muted_foreground),
            )
            .child(container.name.clone()),
        DndBoardEntry::Item { item, .. } => h_flex()
            .pl(px(20.))
            .gap_x_2()
            .items_center()
            .child(div().flex_1().child(item.data.label.clone()))
            .child(
                div()
                    .text_sm()
                    .text_color(theme.muted_foreground)
                    .child(format!("{} seats", item.data.seats)),
            ),
    };

    ListItem::new(ix)
        .when(row_state.dragging, |this| this.opacity(0.4))
        .child(row)
}

fn demo_floor() -> Vec<Container<Table>> {
    vec![
        Container::new("main-hall", "Main hall")
            .item("t1", Table::new("T1", 2))
            .item("t2", Table::new("T2", 4))
            .item("t3", Table::new("T3", 4))
            .item("t4", Table::new("T4", 6)),
        Container::new("patio", "Patio")
            .item("p1", Table::new("P1", 2))
            .item("p2", Table::new("P2", 2)),
        Container::new("bar", "Bar").item("b1", Table::new("Counter", 8)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::prelude::v1::test;
    use manos_board_core::{Board, ManualClock};

    #[test]
    fn floor_plan_ids_use_table_and_area_prefixes() {
        let mut board =
            Board::with_config(demo_floor(), floor_plan_config(), ManualClock::new()).unwrap();

        assert!(board.on_drag_start("table-t1"));
        let outcome = board.on_drag_end("table-t1", Some("area-bar"));

        assert_eq!(
            describe_outcome(&outcome).as_deref(),
            Some("Moved t1 to bar")
        );
        assert_eq!(board.tracker().quiet_interval(), Duration::from_millis(1000));
    }
}
