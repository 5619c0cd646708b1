use gpui::prelude::FluentBuilder as _;
use gpui::*;
use gpui_component::ActiveTheme as _;
use gpui_component::button::{Button, ButtonVariants as _};
use gpui_component::list::ListItem;
use gpui_component::{Icon, IconName, Sizable as _, h_flex, v_flex};
use gpui_dnd_board::{DndBoardEntry, DndBoardRowState, DndBoardState, dnd_board};
use manos_board_core::{ActiveTarget, Container, JsonFilePersistence};
use serde::{Deserialize, Serialize};

use crate::support::{load_board, load_config};
use crate::toolbar::board_toolbar;

const MENU_PATH: &str = "./data/menu-board.json";
const MENU_CONFIG_PATH: &str = "./data/menu-board.config.json";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub name: String,
    pub price_cents: u32,
}

impl MenuItem {
    pub fn new(name: impl Into<String>, price_cents: u32) -> Self {
        Self {
            name: name.into(),
            price_cents,
        }
    }

    pub fn price_label(&self) -> String {
        format!("${}.{:02}", self.price_cents / 100, self.price_cents % 100)
    }
}

pub struct MenuBoardExample {
    board: Entity<DndBoardState<MenuItem>>,
    next_item: usize,
}

impl MenuBoardExample {
    pub fn view(window: &mut Window, cx: &mut App) -> Entity<Self> {
        let storage = JsonFilePersistence::new(MENU_PATH);
        let board = load_board(&storage, load_config(MENU_CONFIG_PATH), demo_menu);
        let next_item = next_special_number(board.containers());

        let board = cx.new(|cx| {
            DndBoardState::new(cx)
                .board(board)
                .save_to(storage)
                .drag_label(|target| match target {
                    ActiveTarget::Item(item) => item.data.name.clone().into(),
                    ActiveTarget::Container(category) => category.name.clone().into(),
                })
                .on_drop(|outcome, _categories| {
                    tracing::info!(?outcome, "menu rearranged");
                })
        });
        board.update(cx, |board, cx| board.save_before_close(window, cx));
        cx.new(|cx| {
            cx.observe(&board, |_, _, cx| cx.notify()).detach();
            Self { board, next_item }
        })
    }

    fn add_special(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        let item_id = format!("special-{}", self.next_item);
        let name = format!("Special #{}", self.next_item);
        self.next_item += 1;

        let result = self.board.update(cx, |board, cx| {
            board.update_board(window, cx, |board| {
                let Some(category) = board.containers().first().map(|c| c.id.clone()) else {
                    return Ok(());
                };
                board.add_item(&category, item_id, MenuItem::new(name, 1250))
            })
        });
        if let Err(err) = result {
            tracing::warn!(%err, "could not add menu item");
        }
    }

    fn remove_selected(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        self.board.update(cx, |board, cx| {
            let Some(selected) = board.selected().cloned() else {
                return;
            };
            board.update_board(window, cx, |board| {
                if selected.is_item() {
                    board.remove_item(&selected.entity_id).is_some()
                } else {
                    board.remove_container(&selected.entity_id).is_some()
                }
            });
        });
    }
}

impl Render for MenuBoardExample {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        let state = self.board.read(cx);
        let selected = state
            .selected()
            .map(ToString::to_string)
            .unwrap_or_else(|| "<none>".to_string());
        let dump = serde_json::to_string_pretty(state.board_ref().containers())
            .unwrap_or_else(|err| err.to_string());

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
                            .child("Menu Board"),
                    )
                    .child(div().text_sm().text_color(theme.muted_foreground).child(
                        "Drag dishes within or between categories, or drag a category header to reorder categories. Changes are saved after two quiet seconds.",
                    ))
                    .child(
                        div()
                            .text_sm()
                            .text_color(theme.muted_foreground)
                            .child(format!("Selected: {selected}")),
                    ),
            )
            .child(
                h_flex()
                    .gap_x_2()
                    .items_center()
                    .child(board_toolbar("menu", &self.board, cx))
                    .child(
                        Button::new("menu-add-special")
                            .label("Add special")
                            .ghost()
                            .on_click(cx.listener(|this, _, window, cx| {
                                this.add_special(window, cx);
                            })),
                    )
                    .child(
                        Button::new("menu-remove-selected")
                            .label("Remove selected")
                            .ghost()
                            .on_click(cx.listener(|this, _, window, cx| {
                                this.remove_selected(window, cx);
                            })),
                    ),
            )
            .child(
                h_flex()
                    .flex_1()
                    .min_h(px(0.))
                    .gap_x_3()
                    .child(
                        div()
                            .w(px(420.))
                            .min_w(px(0.))
                            .h_full()
                            .rounded(px(12.))
                            .border_1()
                            .border_color(theme.border)
                            .bg(theme.background)
                            .child(dnd_board(
                                &self.board,
                                move |ix, entry, row_state, _window, cx| {
                                    render_menu_row(ix, entry, row_state, cx)
                                },
                            )),
                    )
                    .child(
                        div()
                            .flex_1()
                            .min_w(px(0.))
                            .h_full()
                            .rounded(px(12.))
                            .border_1()
                            .border_color(theme.border)
                            .bg(theme.background)
                            .p(px(12.))
                            .overflow_hidden()
                            .child(render_dump(dump)),
                    ),
            )
    }
}

/// The number for the next `special-N` item, past every special already on the board.
fn next_special_number(categories: &[Container<MenuItem>]) -> usize {
    categories
        .iter()
        .flat_map(|category| category.items.iter())
        .filter_map(|item| item.id.strip_prefix("special-")?.parse::<usize>().ok())
        .max()
        .map_or(1, |last| last + 1)
}

fn render_menu_row(
    ix: usize,
    entry: DndBoardEntry<'_, MenuItem>,
    row_state: DndBoardRowState,
    cx: &mut App,
) -> ListItem {
    let theme = cx.theme();

    let row = match entry {
        DndBoardEntry::Header {
            container,
            collapsed,
        } => h_flex()
            .gap_x_2()
            .items_center()
            .child(
                Icon::from(if collapsed {
                    IconName::Folder
                } else {
                    IconName::FolderOpen
                })
                .small()
                .text_color(theme.muted_foreground),
            )
            .child(div().flex_1().child(container.name.clone()))
            .child(
                div()
                    .text_xs()
                    .text_color(theme.muted_foreground)
                    .child(format!("{} dishes", container.items.len())),
            ),
        DndBoardEntry::Item { item, .. } => h_flex()
            .pl(px(20.))
            .gap_x_2()
            .items_center()
            .child(
                Icon::from(IconName::Menu)
                    .small()
                    .text_color(theme.muted_foreground),
            )
            .child(div().flex_1().child(item.data.name.clone()))
            .child(
                div()
                    .text_sm()
                    .text_color(theme.muted_foreground)
                    .child(item.data.price_label()),
            ),
    };

    ListItem::new(ix)
        .when(row_state.dragging, |this| this.opacity(0.4))
        .child(row)
}

fn render_dump(text: String) -> impl IntoElement {
    let lines = text
        .lines()
        .map(|line| div().text_xs().child(line.to_string()));
    v_flex().children(lines)
}

fn demo_menu() -> Vec<Container<MenuItem>> {
    vec![
        Container::new("starters", "Starters")
            .item("soup", MenuItem::new("Tomato soup", 650))
            .item("salad", MenuItem::new("House salad", 700))
            .item("bread", MenuItem::new("Garlic bread", 450)),
        Container::new("mains", "Mains")
            .item("steak", MenuItem::new("Ribeye", 2800))
            .item("risotto", MenuItem::new("Mushroom risotto", 1900)),
        Container::new("desserts", "Desserts")
            .item("pie", MenuItem::new("Apple pie", 800))
            .item("sorbet", MenuItem::new("Lemon sorbet", 600)),
        Container::new("drinks", "Drinks"),
    ]
}
