use serde::{Deserialize, Serialize};

/// An entity positioned inside exactly one [`Container`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Item<T> {
    pub id: String,
    pub container_id: String,
    /// Dense, zero-based position within the owning container.
    #[serde(default)]
    pub order: usize,
    pub data: T,
}

impl<T> Item<T> {
    pub fn new(id: impl Into<String>, container_id: impl Into<String>, data: T) -> Self {
        Self {
            id: id.into(),
            container_id: container_id.into(),
            order: 0,
            data,
        }
    }
}

/// The outer grouping level (a menu category, a floor area) holding ordered items.
///
/// `items` is the authoritative ordering; `order` fields mirror array positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Container<T> {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub items: Vec<Item<T>>,
    #[serde(default)]
    pub order: usize,
}

impl<T> Container<T> {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            items: Vec::new(),
            order: 0,
        }
    }

    /// Append an item, assigning it to this container.
    pub fn item(mut self, id: impl Into<String>, data: T) -> Self {
        let item = Item::new(id, self.id.clone(), data);
        self.items.push(item);
        self.renumber();
        self
    }

    pub fn position(&self, item_id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id == item_id)
    }

    pub fn item_ids(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|item| item.id.as_str())
    }

    pub(crate) fn renumber(&mut self) {
        for (ix, item) in self.items.iter_mut().enumerate() {
            item.order = ix;
        }
    }
}

pub(crate) fn renumber_containers<T>(containers: &mut [Container<T>]) {
    for (ix, container) in containers.iter_mut().enumerate() {
        container.order = ix;
    }
}

/// Locate an item by id, returning `(container index, item index)`.
pub fn locate_item<T>(containers: &[Container<T>], item_id: &str) -> Option<(usize, usize)> {
    containers.iter().enumerate().find_map(|(container_ix, container)| {
        container
            .position(item_id)
            .map(|item_ix| (container_ix, item_ix))
    })
}

pub fn locate_container<T>(containers: &[Container<T>], container_id: &str) -> Option<usize> {
    containers
        .iter()
        .position(|container| container.id == container_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_assigns_container_and_dense_orders() {
        let container = Container::new("starters", "Starters")
            .item("soup", ())
            .item("salad", ())
            .item("bread", ());

        let orders: Vec<_> = container.items.iter().map(|item| item.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
        assert!(
            container
                .items
                .iter()
                .all(|item| item.container_id == "starters")
        );
    }

    #[test]
    fn locate_item_searches_every_container() {
        let containers = vec![
            Container::new("a", "A").item("x", ()).item("y", ()),
            Container::new("b", "B").item("z", ()),
        ];

        assert_eq!(locate_item(&containers, "y"), Some((0, 1)));
        assert_eq!(locate_item(&containers, "z"), Some((1, 0)));
        assert_eq!(locate_item(&containers, "missing"), None);
        assert_eq!(locate_container(&containers, "b"), Some(1));
    }

    #[test]
    fn container_deserializes_without_items_or_order() {
        let container: Container<()> =
            serde_json::from_str(r#"{"id":"patio","name":"Patio"}"#).unwrap();
        assert!(container.items.is_empty());
        assert_eq!(container.order, 0);
    }
}
