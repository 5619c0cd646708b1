use std::{ops::Range, rc::Rc};

use gpui::{
    App, AppContext as _, Context, ElementId, Entity, EntityId, FocusHandle,
    InteractiveElement as _, IntoElement, ListSizingBehavior, ParentElement as _, Render,
    RenderOnce, SharedString, StatefulInteractiveElement as _, StyleRefinement, Styled, Task,
    Timer, UniformListScrollHandle, Window, div, prelude::FluentBuilder as _, px, uniform_list,
};
use gpui_component::list::ListItem;
use gpui_component::scroll::{Scrollbar, ScrollbarState};
use gpui_component::{ActiveTheme as _, StyledExt as _};
use manos_board_core::{
    ActiveTarget, Board, BoardConfig, CollapseSet, Container, DndId, DropOutcome, FlushTicket,
    IdScheme, Item, JsonFilePersistence, PersistError, QueuedScheduler, TimerId, TimerRequest,
};
use serde::Serialize;

use crate::writer::{BoardWriter, flush_blocking};

const CONTEXT: &str = "DndBoard";

/// Create a [`DndBoard`].
pub fn dnd_board<T, R>(state: &Entity<DndBoardState<T>>, render_item: R) -> DndBoard<T>
where
    T: 'static,
    R: Fn(usize, DndBoardEntry<'_, T>, DndBoardRowState, &mut Window, &mut App) -> ListItem
        + 'static,
{
    DndBoard::new(state, render_item)
}

/// One visible row: a container header, or an item of an expanded container.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DndBoardRow {
    Header { container_ix: usize },
    Item { container_ix: usize, item_ix: usize },
}

/// What a row renderer receives.
pub enum DndBoardEntry<'a, T> {
    Header {
        container: &'a Container<T>,
        collapsed: bool,
    },
    Item {
        container: &'a Container<T>,
        item: &'a Item<T>,
    },
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DndBoardRowState {
    pub selected: bool,
    pub dragging: bool,
}

/// Flatten containers into rows, skipping the items of collapsed containers.
pub fn build_rows<T>(containers: &[Container<T>], collapsed: &CollapseSet) -> Vec<DndBoardRow> {
    let mut rows = Vec::new();
    for (container_ix, container) in containers.iter().enumerate() {
        rows.push(DndBoardRow::Header { container_ix });
        if collapsed.is_collapsed(&container.id) {
            continue;
        }
        rows.extend(
            (0..container.items.len()).map(|item_ix| DndBoardRow::Item {
                container_ix,
                item_ix,
            }),
        );
    }
    rows
}

fn row_dnd_id<T>(containers: &[Container<T>], row: DndBoardRow) -> Option<DndId> {
    match row {
        DndBoardRow::Header { container_ix } => containers
            .get(container_ix)
            .map(|container| DndId::container(container.id.clone())),
        DndBoardRow::Item {
            container_ix,
            item_ix,
        } => containers
            .get(container_ix)
            .and_then(|container| container.items.get(item_ix))
            .map(|item| DndId::item(item.id.clone())),
    }
}

#[derive(Clone)]
struct DndBoardDrag {
    board_id: EntityId,
    raw_id: SharedString,
    label: SharedString,
}

struct DragGhost {
    label: SharedString,
}

impl DragGhost {
    fn new(label: SharedString) -> Self {
        Self { label }
    }
}

impl Render for DragGhost {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        div()
            .px(px(10.))
            .py(px(6.))
            .rounded(px(8.))
            .bg(theme.popover)
            .border_1()
            .border_color(theme.border)
            .shadow_md()
            .text_color(theme.popover_foreground)
            .text_sm()
            .child(self.label.clone())
    }
}

type RenderRow<T> =
    Rc<dyn Fn(usize, DndBoardEntry<'_, T>, DndBoardRowState, &mut Window, &mut App) -> ListItem>;

struct DndBoardStateCallbacks<T> {
    drag_label: Option<Rc<dyn Fn(ActiveTarget<'_, T>) -> SharedString>>,
    on_drop: Option<Rc<dyn Fn(&DropOutcome, &[Container<T>])>>,
}

impl<T> Default for DndBoardStateCallbacks<T> {
    fn default() -> Self {
        Self {
            drag_label: None,
            on_drop: None,
        }
    }
}

/// State for a two-level board of collapsible containers holding draggable items.
///
/// Structural changes are autosaved once the board has been quiet for its configured interval.
/// With [`DndBoardState::save_to`] the file is written on the background executor; otherwise
/// the wrapped [`Board`]'s persistence collaborator is called in place.
pub struct DndBoardState<T> {
    focus_handle: FocusHandle,
    board: Board<T, QueuedScheduler>,
    rows: Vec<DndBoardRow>,
    scrollbar_state: ScrollbarState,
    scroll_handle: UniformListScrollHandle,
    selected: Option<DndId>,
    autosave_task: Option<Task<()>>,
    writer: Option<BoardWriter<T>>,
    flush_task: Option<Task<()>>,
    flush_queued: bool,
    callbacks: DndBoardStateCallbacks<T>,
    render_item: RenderRow<T>,
}

impl<T: 'static> DndBoardState<T> {
    pub fn new(cx: &mut App) -> Self {
        Self {
            focus_handle: cx.focus_handle(),
            board: Board::empty(BoardConfig::default(), QueuedScheduler::new()),
            rows: Vec::new(),
            scrollbar_state: ScrollbarState::default(),
            scroll_handle: UniformListScrollHandle::default(),
            selected: None,
            autosave_task: None,
            writer: None,
            flush_task: None,
            flush_queued: false,
            callbacks: DndBoardStateCallbacks::default(),
            render_item: Rc::new(|_, _, _, _, _| ListItem::new("dnd-board-empty")),
        }
    }

    pub fn board(mut self, board: Board<T, QueuedScheduler>) -> Self {
        self.board = board;
        self.rows = build_rows(self.board.containers(), self.board.collapsed());
        self
    }

    /// Provide the text shown in the floating preview while dragging.
    ///
    /// Defaults to the container name for containers and the item id for items.
    pub fn drag_label(
        mut self,
        drag_label: impl Fn(ActiveTarget<'_, T>) -> SharedString + 'static,
    ) -> Self {
        self.callbacks.drag_label = Some(Rc::new(drag_label));
        self
    }

    /// Provide a callback invoked after a drop changed the structure.
    pub fn on_drop(
        mut self,
        on_drop: impl Fn(&DropOutcome, &[Container<T>]) + 'static,
    ) -> Self {
        self.callbacks.on_drop = Some(Rc::new(on_drop));
        self
    }

    pub fn board_ref(&self) -> &Board<T, QueuedScheduler> {
        &self.board
    }

    pub fn ids(&self) -> &IdScheme {
        self.board.ids()
    }

    pub fn rows(&self) -> &[DndBoardRow] {
        &self.rows
    }

    pub fn selected(&self) -> Option<&DndId> {
        self.selected.as_ref()
    }

    /// Mutate the board (add, remove, rename...) and reschedule autosave.
    pub fn update_board<R>(
        &mut self,
        window: &mut Window,
        cx: &mut Context<Self>,
        update: impl FnOnce(&mut Board<T, QueuedScheduler>) -> R,
    ) -> R {
        let result = update(&mut self.board);
        self.rebuild_rows();
        self.sync_autosave_timer(window, cx);
        cx.notify();
        result
    }

    pub fn set_board(
        &mut self,
        board: Board<T, QueuedScheduler>,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        self.board = board;
        self.selected = None;
        self.rebuild_rows();
        self.sync_autosave_timer(window, cx);
        cx.notify();
    }

    pub fn toggle_collapse(&mut self, container_id: &str, cx: &mut Context<Self>) {
        self.board.toggle_collapse(container_id);
        self.rebuild_rows();
        cx.notify();
    }

    pub fn collapse_all(&mut self, cx: &mut Context<Self>) {
        self.board.collapse_all();
        self.rebuild_rows();
        cx.notify();
    }

    pub fn expand_all(&mut self, cx: &mut Context<Self>) {
        self.board.expand_all();
        self.rebuild_rows();
        cx.notify();
    }

    pub fn set_auto_save_enabled(
        &mut self,
        enabled: bool,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        self.board.set_auto_save_enabled(enabled);
        self.sync_autosave_timer(window, cx);
        cx.notify();
    }

    /// Flush right away. The outcome is reported through the board's save status.
    pub fn save_now(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        self.start_flush(window, cx);
    }

    pub fn is_saving(&self) -> bool {
        self.flush_task.is_some()
    }

    /// Flush unsaved changes before `window` closes.
    pub fn save_before_close(&self, window: &mut Window, cx: &mut Context<Self>) {
        let this = cx.entity().downgrade();
        window.on_window_should_close(cx, move |_, cx| {
            if let Some(this) = this.upgrade() {
                this.update(cx, |this, _| this.flush_before_close());
            }
            true
        });
    }

    fn flush_before_close(&mut self) {
        if !self.board.has_unsaved_changes() {
            return;
        }
        tracing::debug!("saving board before the window closes");
        let _ = flush_blocking(&mut self.board, self.writer.as_ref());
    }

    fn start_flush(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        let Some(writer) = self.writer.as_ref() else {
            let _ = self.board.save_now();
            self.sync_autosave_timer(window, cx);
            cx.notify();
            return;
        };
        if self.flush_task.is_some() {
            self.flush_queued = true;
            return;
        }

        let encoded = writer.encode(self.board.containers());
        let job = writer.job();
        let ticket = self.board.begin_flush();
        self.sync_autosave_timer(window, cx);
        cx.notify();

        let bytes = match encoded {
            Ok(bytes) => bytes,
            Err(err) => {
                let _ = self.board.finish_flush(ticket, Err(err));
                return;
            }
        };
        let revision = ticket.revision();
        self.flush_task = Some(cx.spawn_in(window, async move |this, window| {
            let result = window
                .background_executor()
                .spawn(async move { job.write(revision, &bytes) })
                .await;
            let _ = window.update(|window, cx| {
                this.update(cx, |this, cx| this.on_flush_finished(ticket, result, window, cx))
            });
        }));
    }

    fn on_flush_finished(
        &mut self,
        ticket: FlushTicket,
        result: Result<(), PersistError>,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        if let Some(task) = self.flush_task.take() {
            task.detach();
        }
        let _ = self.board.finish_flush(ticket, result);
        if std::mem::take(&mut self.flush_queued) && self.board.is_dirty() {
            self.start_flush(window, cx);
        }
        cx.notify();
    }

    fn rebuild_rows(&mut self) {
        self.rows = build_rows(self.board.containers(), self.board.collapsed());
    }

    fn row_entry(&self, row: DndBoardRow) -> Option<DndBoardEntry<'_, T>> {
        let containers = self.board.containers();
        match row {
            DndBoardRow::Header { container_ix } => {
                let container = containers.get(container_ix)?;
                Some(DndBoardEntry::Header {
                    container,
                    collapsed: self.board.is_collapsed(&container.id),
                })
            }
            DndBoardRow::Item {
                container_ix,
                item_ix,
            } => {
                let container = containers.get(container_ix)?;
                let item = container.items.get(item_ix)?;
                Some(DndBoardEntry::Item { container, item })
            }
        }
    }

    fn row_label(&self, entry: &DndBoardEntry<'_, T>) -> SharedString {
        let target = match entry {
            DndBoardEntry::Header { container, .. } => ActiveTarget::Container(*container),
            DndBoardEntry::Item { item, .. } => ActiveTarget::Item(*item),
        };
        match (self.callbacks.drag_label.as_ref(), target) {
            (Some(drag_label), target) => drag_label(target),
            (None, ActiveTarget::Container(container)) => container.name.clone().into(),
            (None, ActiveTarget::Item(item)) => item.id.clone().into(),
        }
    }

    fn raw_id_for_row(&self, ix: usize) -> Option<String> {
        let row = *self.rows.get(ix)?;
        let id = row_dnd_id(self.board.containers(), row)?;
        Some(self.board.ids().format(&id))
    }

    fn on_row_click(
        &mut self,
        ix: usize,
        _event: &gpui::ClickEvent,
        _window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        let Some(row) = self.rows.get(ix).copied() else {
            return;
        };
        let Some(id) = row_dnd_id(self.board.containers(), row) else {
            return;
        };

        if id.is_container() {
            self.board.toggle_collapse(&id.entity_id);
            self.rebuild_rows();
        }
        self.selected = Some(id);
        cx.notify();
    }

    fn on_drag_start(&mut self, drag: &DndBoardDrag, _window: &mut Window, cx: &mut Context<Self>) {
        if !self.board.on_drag_start(&drag.raw_id) {
            return;
        }
        self.selected = self.board.active_id().cloned();
        self.rebuild_rows();
        cx.notify();
    }

    fn on_drop_on_row(
        &mut self,
        drag: &DndBoardDrag,
        target_ix: usize,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        if drag.board_id != cx.entity_id() {
            return;
        }

        let over = self.raw_id_for_row(target_ix);
        let outcome = self.board.on_drag_end(&drag.raw_id, over.as_deref());
        self.after_drop(outcome, window, cx);
    }

    fn on_drop_after_last(
        &mut self,
        drag: &DndBoardDrag,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        if drag.board_id != cx.entity_id() {
            return;
        }

        let over = self
            .board
            .containers()
            .last()
            .map(|container| self.board.ids().container_id(&container.id));
        let outcome = self.board.on_drag_end(&drag.raw_id, over.as_deref());
        self.after_drop(outcome, window, cx);
    }

    fn after_drop(&mut self, outcome: DropOutcome, window: &mut Window, cx: &mut Context<Self>) {
        self.rebuild_rows();
        self.sync_autosave_timer(window, cx);
        cx.notify();

        if !outcome.is_change() {
            return;
        }
        if let Some(on_drop) = self.callbacks.on_drop.as_ref() {
            on_drop(&outcome, self.board.containers());
        }
    }

    /// Turn the board's latest timer request into a gpui timer. Replacing the task drops the
    /// previous one, which cancels it.
    fn sync_autosave_timer(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        let Some(request) = self.board.scheduler_mut().take() else {
            return;
        };

        match request {
            TimerRequest::Disarm { .. } => {
                self.autosave_task = None;
            }
            TimerRequest::Arm { timer, delay } => {
                self.autosave_task = Some(cx.spawn_in(window, async move |this, window| {
                    Timer::after(delay).await;
                    let _ = window.update(|window, cx| {
                        this.update(cx, |this, cx| this.on_autosave_timer(timer, window, cx))
                    });
                }));
            }
        }
    }

    fn on_autosave_timer(&mut self, timer: TimerId, window: &mut Window, cx: &mut Context<Self>) {
        if let Some(task) = self.autosave_task.take() {
            task.detach();
        }
        if self.board.take_due(timer) {
            self.start_flush(window, cx);
        }
        cx.notify();
    }
}

impl<T: Serialize + 'static> DndBoardState<T> {
    /// Save the board as JSON at `storage`, writing off the UI thread.
    pub fn save_to(mut self, storage: JsonFilePersistence) -> Self {
        self.writer = Some(BoardWriter::new(storage));
        self
    }
}

impl<T: 'static> Render for DndBoardState<T> {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        if !cx.has_active_drag() && self.board.is_dragging() {
            self.board.cancel_drag();
            self.rebuild_rows();
        }

        let render_item = Rc::clone(&self.render_item);
        let state_entity = cx.entity();
        let board_id = cx.entity_id();

        div()
            .id("dnd-board-state")
            .size_full()
            .relative()
            .child(
                uniform_list("rows", self.rows.len(), {
                    cx.processor(move |state, visible_range: Range<usize>, window, cx| {
                        let drop_target_bg = cx.theme().drop_target;
                        let drag_border = cx.theme().drag_border;
                        let active_id = state.board.active_id().cloned();
                        let mut rows = Vec::with_capacity(visible_range.len());
                        for ix in visible_range {
                            let Some(row) = state.rows.get(ix).copied() else {
                                continue;
                            };
                            let Some(entry) = state.row_entry(row) else {
                                continue;
                            };
                            let Some(dnd_id) = row_dnd_id(state.board.containers(), row) else {
                                continue;
                            };

                            let selected = state.selected.as_ref() == Some(&dnd_id);
                            let dragging =
                                active_id.as_ref() == Some(&dnd_id) && cx.has_active_drag();
                            let row_state = DndBoardRowState { selected, dragging };

                            let drag_value = DndBoardDrag {
                                board_id,
                                raw_id: state.board.ids().format(&dnd_id).into(),
                                label: state.row_label(&entry),
                            };
                            let list_item = (render_item)(ix, entry, row_state, window, cx);

                            let state_entity = state_entity.clone();
                            let row = div()
                                .id(ix)
                                .relative()
                                .child(list_item.selected(selected))
                                .drag_over::<DndBoardDrag>(move |style, drag, _window, _cx| {
                                    if drag.board_id != board_id {
                                        return style;
                                    }
                                    style
                                        .bg(drop_target_bg.alpha(drop_target_bg.a.max(0.2)))
                                        .border_color(drag_border)
                                        .border_t_2()
                                })
                                .on_drop::<DndBoardDrag>(cx.listener(
                                    move |this, drag, window, cx| {
                                        this.on_drop_on_row(drag, ix, window, cx);
                                    },
                                ))
                                .on_click(cx.listener(move |this, click_event, window, cx| {
                                    this.on_row_click(ix, click_event, window, cx);
                                }))
                                .when(dnd_id.is_container(), |this| this.font_semibold())
                                .on_drag(drag_value, move |drag, _offset, window, cx| {
                                    state_entity.update(cx, |state, cx| {
                                        state.on_drag_start(drag, window, cx);
                                    });
                                    let label = drag.label.clone();
                                    cx.new(|_| DragGhost::new(label))
                                });

                            rows.push(row);
                        }
                        rows
                    })
                })
                .on_drop::<DndBoardDrag>(cx.listener(Self::on_drop_after_last))
                .flex_grow()
                .size_full()
                .track_scroll(self.scroll_handle.clone())
                .with_sizing_behavior(ListSizingBehavior::Auto)
                .into_any_element(),
            )
            .child(
                div()
                    .absolute()
                    .top_0()
                    .right_0()
                    .bottom_0()
                    .w(px(12.))
                    .child(Scrollbar::uniform_scroll(
                        &self.scrollbar_state,
                        &self.scroll_handle,
                    )),
            )
    }
}

/// A board element: containers as collapsible, draggable headers with draggable item rows.
#[derive(IntoElement)]
pub struct DndBoard<T: 'static> {
    id: ElementId,
    state: Entity<DndBoardState<T>>,
    style: StyleRefinement,
    render_item: RenderRow<T>,
}

impl<T: 'static> DndBoard<T> {
    pub fn new<R>(state: &Entity<DndBoardState<T>>, render_item: R) -> Self
    where
        R: Fn(usize, DndBoardEntry<'_, T>, DndBoardRowState, &mut Window, &mut App) -> ListItem
            + 'static,
    {
        Self {
            id: ElementId::Name(format!("dnd-board-{}", state.entity_id()).into()),
            state: state.clone(),
            style: StyleRefinement::default(),
            render_item: Rc::new(render_item),
        }
    }
}

impl<T: 'static> Styled for DndBoard<T> {
    fn style(&mut self) -> &mut StyleRefinement {
        &mut self.style
    }
}

impl<T: 'static> RenderOnce for DndBoard<T> {
    fn render(self, _window: &mut Window, cx: &mut App) -> impl IntoElement {
        let focus_handle = self.state.read(cx).focus_handle.clone();
        self.state
            .update(cx, |state, _| state.render_item = self.render_item);

        div()
            .id(self.id)
            .key_context(CONTEXT)
            .track_focus(&focus_handle)
            .size_full()
            .child(self.state)
            .refine_style(&self.style)
    }
}
