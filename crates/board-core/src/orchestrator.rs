//! Drag gesture classification.
//!
//! A [`DragSession`] lives between a drag start and its drag end. Drops are classified from
//! the parsed kinds of the active and target ids alone:
//!
//! | active    | over      | operation                                            |
//! |-----------|-----------|------------------------------------------------------|
//! | item      | item      | reorder within the container, or move across (append) |
//! | item      | container | append to that container                             |
//! | container | container | reorder containers                                   |
//! | container | item      | reorder containers, targeting the item's container   |

use crate::collapse::{CollapseSet, CollapseSnapshot};
use crate::engine::{move_item_across_containers, move_item_within_container, reorder_containers};
use crate::ids::{DndId, DndKind};
use crate::model::{Container, locate_container, locate_item};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DropOutcome {
    /// No target, or an id that no longer resolves.
    Cancelled,
    /// Dropped back onto its own position.
    Unchanged,
    ItemReordered {
        container_id: String,
        from: usize,
        to: usize,
    },
    ItemMoved {
        item_id: String,
        from_container: String,
        to_container: String,
    },
    ContainersReordered {
        from: usize,
        to: usize,
    },
}

impl DropOutcome {
    pub fn is_change(&self) -> bool {
        matches!(
            self,
            DropOutcome::ItemReordered { .. }
                | DropOutcome::ItemMoved { .. }
                | DropOutcome::ContainersReordered { .. }
        )
    }
}

#[derive(Clone, Debug, Default)]
pub struct DragSession {
    active: Option<DndId>,
    pre_drag_collapsed: Option<CollapseSnapshot>,
}

impl DragSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&DndId> {
        self.active.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.active.is_some()
    }

    pub fn is_container_drag(&self) -> bool {
        self.active.as_ref().is_some_and(DndId::is_container)
    }

    /// Begin a drag. A container drag saves the collapse set and collapses every container
    /// until the drag ends.
    pub fn start<T>(&mut self, id: DndId, containers: &[Container<T>], collapsed: &mut CollapseSet) {
        if self.active.is_some() {
            self.cancel(collapsed);
        }

        if id.is_container() {
            self.pre_drag_collapsed = Some(collapsed.snapshot());
            collapsed.collapse_all(containers.iter().map(|container| container.id.clone()));
        }
        self.active = Some(id);
    }

    pub fn cancel(&mut self, collapsed: &mut CollapseSet) {
        self.active = None;
        if let Some(snapshot) = self.pre_drag_collapsed.take() {
            collapsed.restore(snapshot);
        }
    }

    /// End a drag, returning the new structure and what happened to it.
    ///
    /// The collapse set is restored whenever a snapshot was taken, whatever the outcome.
    pub fn finish<T>(
        &mut self,
        active: &DndId,
        over: Option<&DndId>,
        containers: Vec<Container<T>>,
        collapsed: &mut CollapseSet,
    ) -> (Vec<Container<T>>, DropOutcome) {
        let result = match over {
            Some(over) => resolve_drop(containers, active, over),
            None => (containers, DropOutcome::Cancelled),
        };
        self.cancel(collapsed);
        result
    }

    /// Drop a deleted container from the saved collapse state.
    pub(crate) fn forget_container(&mut self, container_id: &str) {
        if let Some(snapshot) = self.pre_drag_collapsed.as_mut() {
            snapshot.forget(container_id);
        }
    }
}

/// Classify a drop and apply it through the reorder engine.
pub fn resolve_drop<T>(
    containers: Vec<Container<T>>,
    active: &DndId,
    over: &DndId,
) -> (Vec<Container<T>>, DropOutcome) {
    match (active.kind, over.kind) {
        (DndKind::Item, DndKind::Item) => {
            let Some((from_container, from)) = locate_item(&containers, &active.entity_id) else {
                return (containers, DropOutcome::Cancelled);
            };
            let Some((to_container, to)) = locate_item(&containers, &over.entity_id) else {
                return (containers, DropOutcome::Cancelled);
            };

            if from_container == to_container {
                reorder_within(containers, from_container, from, to)
            } else {
                move_across(containers, &active.entity_id, from_container, to_container)
            }
        }
        (DndKind::Item, DndKind::Container) => {
            let Some((from_container, from)) = locate_item(&containers, &active.entity_id) else {
                return (containers, DropOutcome::Cancelled);
            };
            let Some(to_container) = locate_container(&containers, &over.entity_id) else {
                return (containers, DropOutcome::Cancelled);
            };

            if from_container == to_container {
                let last = containers[from_container].items.len().saturating_sub(1);
                reorder_within(containers, from_container, from, last)
            } else {
                move_across(containers, &active.entity_id, from_container, to_container)
            }
        }
        (DndKind::Container, DndKind::Container) => {
            let Some(from) = locate_container(&containers, &active.entity_id) else {
                return (containers, DropOutcome::Cancelled);
            };
            let Some(to) = locate_container(&containers, &over.entity_id) else {
                return (containers, DropOutcome::Cancelled);
            };
            reorder_top_level(containers, from, to)
        }
        (DndKind::Container, DndKind::Item) => {
            let Some(from) = locate_container(&containers, &active.entity_id) else {
                return (containers, DropOutcome::Cancelled);
            };
            let Some((to, _)) = locate_item(&containers, &over.entity_id) else {
                return (containers, DropOutcome::Cancelled);
            };
            reorder_top_level(containers, from, to)
        }
    }
}

fn reorder_within<T>(
    mut containers: Vec<Container<T>>,
    container_ix: usize,
    from: usize,
    to: usize,
) -> (Vec<Container<T>>, DropOutcome) {
    if from == to {
        return (containers, DropOutcome::Unchanged);
    }

    let container = containers.remove(container_ix);
    let container_id = container.id.clone();
    containers.insert(container_ix, move_item_within_container(container, from, to));
    (
        containers,
        DropOutcome::ItemReordered {
            container_id,
            from,
            to,
        },
    )
}

fn move_across<T>(
    containers: Vec<Container<T>>,
    item_id: &str,
    from_container: usize,
    to_container: usize,
) -> (Vec<Container<T>>, DropOutcome) {
    let from_container = containers[from_container].id.clone();
    let to_container = containers[to_container].id.clone();
    let containers = move_item_across_containers(containers, item_id, &from_container, &to_container);
    (
        containers,
        DropOutcome::ItemMoved {
            item_id: item_id.to_string(),
            from_container,
            to_container,
        },
    )
}

fn reorder_top_level<T>(
    containers: Vec<Container<T>>,
    from: usize,
    to: usize,
) -> (Vec<Container<T>>, DropOutcome) {
    if from == to {
        return (containers, DropOutcome::Unchanged);
    }
    (
        reorder_containers(containers, from, to),
        DropOutcome::ContainersReordered { from, to },
    )
}
