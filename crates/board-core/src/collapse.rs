use std::collections::BTreeSet;

/// The set of container ids currently rendered collapsed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CollapseSet {
    collapsed: BTreeSet<String>,
}

/// A saved copy of a [`CollapseSet`], taken before a container drag.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CollapseSnapshot(BTreeSet<String>);

impl CollapseSnapshot {
    pub(crate) fn forget(&mut self, container_id: &str) {
        self.0.remove(container_id);
    }
}

impl CollapseSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_collapsed(&self, container_id: &str) -> bool {
        self.collapsed.contains(container_id)
    }

    /// Flip one container, returning whether it is collapsed afterwards.
    pub fn toggle(&mut self, container_id: &str) -> bool {
        if self.collapsed.remove(container_id) {
            false
        } else {
            self.collapsed.insert(container_id.to_string());
            true
        }
    }

    pub fn collapse(&mut self, container_id: impl Into<String>) {
        self.collapsed.insert(container_id.into());
    }

    pub fn expand(&mut self, container_id: &str) {
        self.collapsed.remove(container_id);
    }

    pub fn collapse_all<I, S>(&mut self, container_ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.collapsed
            .extend(container_ids.into_iter().map(Into::into));
    }

    pub fn expand_all(&mut self) {
        self.collapsed.clear();
    }

    pub fn snapshot(&self) -> CollapseSnapshot {
        CollapseSnapshot(self.collapsed.clone())
    }

    pub fn restore(&mut self, snapshot: CollapseSnapshot) {
        self.collapsed = snapshot.0;
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.collapsed.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.collapsed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collapsed.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for CollapseSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        set.collapse_all(iter);
        set
    }
}
