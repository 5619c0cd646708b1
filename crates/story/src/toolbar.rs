use gpui::*;
use gpui_component::ActiveTheme as _;
use gpui_component::button::{Button, ButtonVariants as _};
use gpui_component::h_flex;
use gpui_dnd_board::DndBoardState;

use crate::support::save_status_label;

/// Auto-save toggle, save-now and collapse controls plus the save status of a board.
pub fn board_toolbar<T: 'static>(
    id: &'static str,
    board: &Entity<DndBoardState<T>>,
    cx: &App,
) -> impl IntoElement {
    let theme = cx.theme();
    let saving = board.read(cx).is_saving();
    let state = board.read(cx).board_ref();
    let auto_save = state.is_auto_save_enabled();
    let status = if saving {
        "Saving...".to_string()
    } else {
        save_status_label(&state.save_status())
    };

    h_flex()
        .gap_x_2()
        .items_center()
        .child(
            Button::new(SharedString::from(format!("{id}-auto-save")))
                .label(if auto_save {
                    "Auto-save: On"
                } else {
                    "Auto-save: Off"
                })
                .ghost()
                .on_click({
                    let board = board.clone();
                    move |_, window, cx| {
                        board.update(cx, |board, cx| {
                            board.set_auto_save_enabled(!auto_save, window, cx);
                        });
                    }
                }),
        )
        .child(
            Button::new(SharedString::from(format!("{id}-save-now")))
                .label("Save now")
                .ghost()
                .on_click({
                    let board = board.clone();
                    move |_, window, cx| {
                        board.update(cx, |board, cx| board.save_now(window, cx));
                    }
                }),
        )
        .child(
            Button::new(SharedString::from(format!("{id}-collapse-all")))
                .label("Collapse all")
                .ghost()
                .on_click({
                    let board = board.clone();
                    move |_, _window, cx| {
                        board.update(cx, |board, cx| board.collapse_all(cx));
                    }
                }),
        )
        .child(
            Button::new(SharedString::from(format!("{id}-expand-all")))
                .label("Expand all")
                .ghost()
                .on_click({
                    let board = board.clone();
                    move |_, _window, cx| {
                        board.update(cx, |board, cx| board.expand_all(cx));
                    }
                }),
        )
        .child(
            div()
                .text_sm()
                .text_color(theme.muted_foreground)
                .child(status),
        )
}
