//! Pure reordering functions.
//!
//! Every function consumes the current structure and returns the new one. Requests that
//! cannot apply (out-of-range indices, unknown ids, same source and destination) return the
//! input unchanged.

use crate::model::{Container, locate_container, renumber_containers};

/// Remove the element at `from` and reinsert it so that it ends up at index `to`.
///
/// Returns `false` without touching the slice when the move is a no-op or out of range.
pub(crate) fn array_move<E>(items: &mut Vec<E>, from: usize, to: usize) -> bool {
    let len = items.len();
    if from == to || from >= len || to >= len {
        return false;
    }
    let item = items.remove(from);
    items.insert(to, item);
    true
}

/// Reorder one item inside its container, recomputing every item's `order`.
pub fn move_item_within_container<T>(
    mut container: Container<T>,
    from: usize,
    to: usize,
) -> Container<T> {
    if array_move(&mut container.items, from, to) {
        container.renumber();
    }
    container
}

/// Move `item_id` from one container to the end of another.
///
/// Cross-container drops always append. When `from_container_id == to_container_id` the
/// input is returned unchanged; same-container moves go through
/// [`move_item_within_container`].
pub fn move_item_across_containers<T>(
    mut containers: Vec<Container<T>>,
    item_id: &str,
    from_container_id: &str,
    to_container_id: &str,
) -> Vec<Container<T>> {
    if from_container_id == to_container_id {
        return containers;
    }

    let Some(from_ix) = locate_container(&containers, from_container_id) else {
        return containers;
    };
    let Some(to_ix) = locate_container(&containers, to_container_id) else {
        return containers;
    };
    let Some(item_ix) = containers[from_ix].position(item_id) else {
        return containers;
    };

    let mut item = containers[from_ix].items.remove(item_ix);
    item.container_id = containers[to_ix].id.clone();
    containers[to_ix].items.push(item);

    containers[from_ix].renumber();
    containers[to_ix].renumber();
    containers
}

/// Reorder the top-level container list, recomputing every container's `order`.
pub fn reorder_containers<T>(
    mut containers: Vec<Container<T>>,
    from: usize,
    to: usize,
) -> Vec<Container<T>> {
    if array_move(&mut containers, from, to) {
        renumber_containers(&mut containers);
    }
    containers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids<T>(container: &Container<T>) -> Vec<&str> {
        container.item_ids().collect()
    }

    fn orders<T>(container: &Container<T>) -> Vec<usize> {
        container.items.iter().map(|item| item.order).collect()
    }

    #[test]
    fn within_container_moves_first_to_last() {
        let container = Container::new("a", "A")
            .item("item1", ())
            .item("item2", ())
            .item("item3", ());

        let container = move_item_within_container(container, 0, 2);

        assert_eq!(ids(&container), vec!["item2", "item3", "item1"]);
        assert_eq!(orders(&container), vec![0, 1, 2]);
    }

    #[test]
    fn within_container_moves_last_up() {
        let container = Container::new("a", "A")
            .item("a", ())
            .item("b", ())
            .item("c", ())
            .item("d", ());

        let container = move_item_within_container(container, 3, 1);

        assert_eq!(ids(&container), vec!["a", "d", "b", "c"]);
        assert_eq!(orders(&container), vec![0, 1, 2, 3]);
    }

    #[test]
    fn within_container_same_index_is_identity() {
        let container = Container::new("a", "A").item("x", ()).item("y", ());
        let before = container.clone();

        for ix in 0..2 {
            assert_eq!(move_item_within_container(container.clone(), ix, ix), before);
        }
    }

    #[test]
    fn within_container_out_of_range_is_ignored() {
        let container = Container::new("a", "A").item("x", ()).item("y", ());
        let before = container.clone();

        assert_eq!(move_item_within_container(container.clone(), 0, 5), before);
        assert_eq!(move_item_within_container(container, 7, 0), before);
    }

    #[test]
    fn across_containers_appends_and_renumbers_both() {
        let containers = vec![
            Container::new("A", "A").item("x", ()).item("y", ()),
            Container::new("B", "B").item("z", ()),
        ];

        let containers = move_item_across_containers(containers, "x", "A", "B");

        assert_eq!(ids(&containers[0]), vec!["y"]);
        assert_eq!(orders(&containers[0]), vec![0]);
        assert_eq!(ids(&containers[1]), vec!["z", "x"]);
        assert_eq!(orders(&containers[1]), vec![0, 1]);
        assert_eq!(containers[1].items[1].container_id, "B");
    }

    #[test]
    fn across_containers_into_empty_container() {
        let containers = vec![
            Container::new("A", "A").item("x", ()),
            Container::new("B", "B"),
        ];

        let containers = move_item_across_containers(containers, "x", "A", "B");

        assert!(containers[0].items.is_empty());
        assert_eq!(ids(&containers[1]), vec!["x"]);
        assert_eq!(orders(&containers[1]), vec![0]);
    }

    #[test]
    fn across_containers_with_same_source_and_destination_is_unchanged() {
        let containers = vec![Container::new("A", "A").item("x", ()).item("y", ())];
        let before = containers.clone();

        assert_eq!(move_item_across_containers(containers, "x", "A", "A"), before);
    }

    #[test]
    fn across_containers_with_unknown_ids_is_unchanged() {
        let containers = vec![
            Container::new("A", "A").item("x", ()),
            Container::new("B", "B"),
        ];
        let before = containers.clone();

        let after = move_item_across_containers(containers, "nope", "A", "B");
        assert_eq!(after, before);
        let after = move_item_across_containers(after, "x", "A", "C");
        assert_eq!(after, before);
        let after = move_item_across_containers(after, "x", "B", "A");
        assert_eq!(after, before);
    }

    #[test]
    fn reorder_containers_moves_first_to_last() {
        let containers: Vec<Container<()>> = vec![
            Container::new("Cat1", "Cat1"),
            Container::new("Cat2", "Cat2"),
            Container::new("Cat3", "Cat3"),
        ];

        let containers = reorder_containers(containers, 0, 2);

        let ids: Vec<_> = containers.iter().map(|c| c.id.as_str()).collect();
        let orders: Vec<_> = containers.iter().map(|c| c.order).collect();
        assert_eq!(ids, vec!["Cat2", "Cat3", "Cat1"]);
        assert_eq!(orders, vec![0, 1, 2]);
    }
}
