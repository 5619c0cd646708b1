use std::collections::HashSet;
use std::time::SystemTime;

use crate::collapse::CollapseSet;
use crate::config::BoardConfig;
use crate::ids::{DndId, DndKind, IdScheme};
use crate::model::{Container, Item, locate_container, locate_item, renumber_containers};
use crate::orchestrator::{DragSession, DropOutcome};
use crate::persist::{PersistError, Persistence};
use crate::scheduler::{ManualClock, Scheduler, TimerId};
use crate::tracker::{ChangeTracker, FlushTicket, SaveStatus};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("duplicate container `{0}`")]
    DuplicateContainer(String),
    #[error("duplicate item `{0}`")]
    DuplicateItem(String),
    #[error("unknown container `{0}`")]
    UnknownContainer(String),
    #[error("unknown item `{0}`")]
    UnknownItem(String),
    #[error("item `{item}` is stored in `{container}` but claims `{claimed}`")]
    MisfiledItem {
        item: String,
        container: String,
        claimed: String,
    },
}

/// What a drag overlay should preview.
#[derive(Debug)]
pub enum ActiveTarget<'a, T> {
    Item(&'a Item<T>),
    Container(&'a Container<T>),
}

/// Everything a host renders from.
#[derive(Debug)]
pub struct BoardSnapshot<'a, T> {
    pub containers: &'a [Container<T>],
    pub active_id: Option<&'a DndId>,
    pub collapsed: &'a CollapseSet,
    pub is_dirty: bool,
    pub is_auto_save_enabled: bool,
    pub last_saved_at: Option<SystemTime>,
}

/// A two-level drag-and-drop board: containers holding ordered items, the collapse state of
/// each container, the in-flight drag, and debounced persistence of every structural change.
pub struct Board<T, S = ManualClock> {
    containers: Vec<Container<T>>,
    ids: IdScheme,
    collapsed: CollapseSet,
    drag: DragSession,
    tracker: ChangeTracker,
    scheduler: S,
    persistence: Option<Box<dyn Persistence<T>>>,
}

impl<T: 'static> Board<T, ManualClock> {
    pub fn new(containers: impl Into<Vec<Container<T>>>) -> Result<Self, BoardError> {
        Self::with_config(containers, BoardConfig::default(), ManualClock::new())
    }
}

impl<T: 'static, S: Scheduler> Board<T, S> {
    /// An empty board.
    pub fn empty(config: BoardConfig, scheduler: S) -> Self {
        Self {
            containers: Vec::new(),
            ids: config.ids,
            collapsed: CollapseSet::new(),
            drag: DragSession::new(),
            tracker: ChangeTracker::new(config.auto_save),
            scheduler,
            persistence: None,
        }
    }

    /// Build a board from stored containers.
    ///
    /// Containers and items are sorted by their stored `order` (stable, so equal orders keep
    /// array order) and then renumbered densely.
    pub fn with_config(
        containers: impl Into<Vec<Container<T>>>,
        config: BoardConfig,
        scheduler: S,
    ) -> Result<Self, BoardError> {
        let mut containers = containers.into();
        validate(&containers)?;

        containers.sort_by_key(|container| container.order);
        renumber_containers(&mut containers);
        for container in &mut containers {
            container.items.sort_by_key(|item| item.order);
            container.renumber();
        }

        let mut board = Self::empty(config, scheduler);
        board.containers = containers;
        Ok(board)
    }

    /// Set the collaborator that receives every flush.
    pub fn on_flush(mut self, persistence: impl Persistence<T> + 'static) -> Self {
        self.persistence = Some(Box::new(persistence));
        self
    }

    pub fn set_persistence(&mut self, persistence: impl Persistence<T> + 'static) {
        self.persistence = Some(Box::new(persistence));
    }

    pub fn collapsed_containers<I, C>(mut self, container_ids: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        self.collapsed.collapse_all(container_ids);
        self
    }

    pub fn containers(&self) -> &[Container<T>] {
        &self.containers
    }

    pub fn container(&self, container_id: &str) -> Option<&Container<T>> {
        self.containers
            .iter()
            .find(|container| container.id == container_id)
    }

    pub fn item(&self, item_id: &str) -> Option<&Item<T>> {
        let (container_ix, item_ix) = locate_item(&self.containers, item_id)?;
        self.containers[container_ix].items.get(item_ix)
    }

    pub fn ids(&self) -> &IdScheme {
        &self.ids
    }

    pub fn collapsed(&self) -> &CollapseSet {
        &self.collapsed
    }

    pub fn is_collapsed(&self, container_id: &str) -> bool {
        self.collapsed.is_collapsed(container_id)
    }

    pub fn active_id(&self) -> Option<&DndId> {
        self.drag.active()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    /// Resolve the active drag id for a drag overlay.
    pub fn active_target(&self) -> Option<ActiveTarget<'_, T>> {
        let active = self.drag.active()?;
        match active.kind {
            DndKind::Item => self.item(&active.entity_id).map(ActiveTarget::Item),
            DndKind::Container => self
                .container(&active.entity_id)
                .map(ActiveTarget::Container),
        }
    }

    pub fn snapshot(&self) -> BoardSnapshot<'_, T> {
        BoardSnapshot {
            containers: &self.containers,
            active_id: self.drag.active(),
            collapsed: &self.collapsed,
            is_dirty: self.tracker.is_dirty(),
            is_auto_save_enabled: self.tracker.is_auto_save_enabled(),
            last_saved_at: self.tracker.last_saved_at(),
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.tracker.is_dirty()
    }

    /// Whether leaving now would lose changes.
    pub fn has_unsaved_changes(&self) -> bool {
        self.tracker.is_dirty()
    }

    pub fn is_auto_save_enabled(&self) -> bool {
        self.tracker.is_auto_save_enabled()
    }

    pub fn last_saved_at(&self) -> Option<SystemTime> {
        self.tracker.last_saved_at()
    }

    pub fn save_status(&self) -> SaveStatus {
        self.tracker.status()
    }

    pub fn tracker(&self) -> &ChangeTracker {
        &self.tracker
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn into_containers(self) -> Vec<Container<T>> {
        self.containers
    }

    pub fn on_drag_start(&mut self, raw_id: &str) -> bool {
        let id = match self.ids.parse(raw_id) {
            Ok(id) => id,
            Err(err) => {
                tracing::debug!(raw_id, %err, "ignoring drag start");
                return false;
            }
        };

        tracing::debug!(%id, "drag start");
        self.drag.start(id, &self.containers, &mut self.collapsed);
        true
    }

    /// Finish a drag. `over` is `None` when the drag ended outside every drop target.
    ///
    /// Marks the board changed exactly when the structure changed.
    pub fn on_drag_end(&mut self, active_raw_id: &str, over_raw_id: Option<&str>) -> DropOutcome {
        let Ok(active) = self.ids.parse(active_raw_id) else {
            tracing::debug!(active_raw_id, "drag end for unparsable id");
            self.cancel_drag();
            return DropOutcome::Cancelled;
        };
        let over = over_raw_id.and_then(|raw| self.ids.parse(raw).ok());

        let containers = std::mem::take(&mut self.containers);
        let (containers, outcome) =
            self.drag
                .finish(&active, over.as_ref(), containers, &mut self.collapsed);
        self.containers = containers;

        tracing::debug!(%active, over = ?over_raw_id, ?outcome, "drag end");
        if outcome.is_change() {
            self.mark_changed();
        }
        outcome
    }

    pub fn cancel_drag(&mut self) {
        self.drag.cancel(&mut self.collapsed);
    }

    pub fn toggle_collapse(&mut self, container_id: &str) -> bool {
        self.collapsed.toggle(container_id)
    }

    pub fn collapse_all(&mut self) {
        self.collapsed
            .collapse_all(self.containers.iter().map(|container| container.id.clone()));
    }

    pub fn expand_all(&mut self) {
        self.collapsed.expand_all();
    }

    pub fn mark_changed(&mut self) {
        self.tracker.mark_changed(&mut self.scheduler);
    }

    pub fn set_auto_save_enabled(&mut self, enabled: bool) {
        self.tracker
            .set_auto_save_enabled(enabled, &mut self.scheduler);
    }

    /// Handle a quiet-period timer firing. Returns `None` for a timer that was replaced or
    /// cancelled, otherwise the flush result.
    pub fn fire_timer(&mut self, timer: TimerId) -> Option<Result<(), PersistError>> {
        if !self.tracker.take_due(timer) {
            tracing::trace!(timer = timer.get(), "stale autosave timer");
            return None;
        }
        if !self.tracker.is_dirty() {
            return Some(Ok(()));
        }
        Some(self.flush())
    }

    /// Consume a timer firing without flushing, for hosts that write elsewhere. Returns
    /// `true` when `timer` is the one currently armed and there are changes to save; follow
    /// with [`Board::begin_flush`] and [`Board::finish_flush`].
    pub fn take_due(&mut self, timer: TimerId) -> bool {
        if !self.tracker.take_due(timer) {
            tracing::trace!(timer = timer.get(), "stale autosave timer");
            return false;
        }
        self.tracker.is_dirty()
    }

    /// Cancel any pending timer and flush immediately.
    pub fn save_now(&mut self) -> Result<(), PersistError> {
        self.flush()
    }

    /// Start a flush that completes elsewhere. Pair with [`Board::finish_flush`].
    pub fn begin_flush(&mut self) -> FlushTicket {
        self.tracker.begin_flush(&mut self.scheduler)
    }

    pub fn finish_flush(
        &mut self,
        ticket: FlushTicket,
        result: Result<(), PersistError>,
    ) -> Result<(), PersistError> {
        match &result {
            Ok(()) => {
                let clean = self.tracker.record_success(ticket, SystemTime::now());
                tracing::info!(revision = ticket.revision(), clean, "board saved");
            }
            Err(err) => {
                tracing::warn!(revision = ticket.revision(), %err, "failed to save board");
                self.tracker.record_failure(err.to_string());
            }
        }
        result
    }

    fn flush(&mut self) -> Result<(), PersistError> {
        let ticket = self.begin_flush();
        let result = match self.persistence.as_mut() {
            Some(persistence) => persistence.flush(&self.containers),
            None => Err(PersistError::NoCollaborator),
        };
        self.finish_flush(ticket, result)
    }

    pub fn add_container(
        &mut self,
        container_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<(), BoardError> {
        let container_id = container_id.into();
        if locate_container(&self.containers, &container_id).is_some() {
            return Err(BoardError::DuplicateContainer(container_id));
        }

        let mut container = Container::new(container_id, name);
        container.order = self.containers.len();
        self.containers.push(container);
        self.mark_changed();
        Ok(())
    }

    /// Append a new item to the end of a container.
    pub fn add_item(
        &mut self,
        container_id: &str,
        item_id: impl Into<String>,
        data: T,
    ) -> Result<(), BoardError> {
        let item_id = item_id.into();
        if locate_item(&self.containers, &item_id).is_some() {
            return Err(BoardError::DuplicateItem(item_id));
        }
        let Some(container_ix) = locate_container(&self.containers, container_id) else {
            return Err(BoardError::UnknownContainer(container_id.to_string()));
        };

        let container = &mut self.containers[container_ix];
        let mut item = Item::new(item_id, container.id.clone(), data);
        item.order = container.items.len();
        container.items.push(item);
        self.mark_changed();
        Ok(())
    }

    pub fn remove_item(&mut self, item_id: &str) -> Option<Item<T>> {
        let (container_ix, item_ix) = locate_item(&self.containers, item_id)?;
        let container = &mut self.containers[container_ix];
        let item = container.items.remove(item_ix);
        container.renumber();
        self.mark_changed();
        Some(item)
    }

    /// Remove a container and its items.
    ///
    /// An in-flight drag that references the container or one of its items resolves as
    /// cancelled when it ends.
    pub fn remove_container(&mut self, container_id: &str) -> Option<Container<T>> {
        let container_ix = locate_container(&self.containers, container_id)?;
        let container = self.containers.remove(container_ix);
        renumber_containers(&mut self.containers);
        self.collapsed.expand(container_id);
        self.drag.forget_container(container_id);
        self.mark_changed();
        Some(container)
    }

    pub fn rename_container(
        &mut self,
        container_id: &str,
        name: impl Into<String>,
    ) -> Result<(), BoardError> {
        let Some(container_ix) = locate_container(&self.containers, container_id) else {
            return Err(BoardError::UnknownContainer(container_id.to_string()));
        };
        self.containers[container_ix].name = name.into();
        self.mark_changed();
        Ok(())
    }

    pub fn update_item(
        &mut self,
        item_id: &str,
        update: impl FnOnce(&mut T),
    ) -> Result<(), BoardError> {
        let Some((container_ix, item_ix)) = locate_item(&self.containers, item_id) else {
            return Err(BoardError::UnknownItem(item_id.to_string()));
        };
        update(&mut self.containers[container_ix].items[item_ix].data);
        self.mark_changed();
        Ok(())
    }
}

fn validate<T>(containers: &[Container<T>]) -> Result<(), BoardError> {
    let mut container_ids = HashSet::new();
    let mut item_ids = HashSet::new();

    for container in containers {
        if !container_ids.insert(container.id.as_str()) {
            return Err(BoardError::DuplicateContainer(container.id.clone()));
        }
        for item in &container.items {
            if !item_ids.insert(item.id.as_str()) {
                return Err(BoardError::DuplicateItem(item.id.clone()));
            }
            if item.container_id != container.id {
                return Err(BoardError::MisfiledItem {
                    item: item.id.clone(),
                    container: container.id.clone(),
                    claimed: item.container_id.clone(),
                });
            }
        }
    }
    Ok(())
}
