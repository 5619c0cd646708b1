use std::fmt;

use serde::{Deserialize, Serialize};

pub const DEFAULT_ITEM_PREFIX: &str = "item-";
pub const DEFAULT_CONTAINER_PREFIX: &str = "container-";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DndKind {
    Item,
    Container,
}

/// A parsed drag/drop target: which nesting level it lives on and the entity it names.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DndId {
    pub kind: DndKind,
    pub entity_id: String,
}

impl DndId {
    pub fn item(entity_id: impl Into<String>) -> Self {
        Self {
            kind: DndKind::Item,
            entity_id: entity_id.into(),
        }
    }

    pub fn container(entity_id: impl Into<String>) -> Self {
        Self {
            kind: DndKind::Container,
            entity_id: entity_id.into(),
        }
    }

    #[inline]
    pub fn is_item(&self) -> bool {
        self.kind == DndKind::Item
    }

    #[inline]
    pub fn is_container(&self) -> bool {
        self.kind == DndKind::Container
    }
}

impl fmt::Display for DndId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DndKind::Item => write!(f, "item:{}", self.entity_id),
            DndKind::Container => write!(f, "container:{}", self.entity_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdSchemeError {
    #[error("drag id prefixes must not be empty")]
    EmptyPrefix,
    #[error("drag id prefixes `{item}` and `{container}` overlap")]
    OverlappingPrefixes { item: String, container: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseIdError {
    #[error("`{0}` carries neither the item nor the container prefix")]
    UnknownRole(String),
    #[error("`{0}` names no entity")]
    EmptyEntity(String),
}

/// Maps entity ids to the raw string ids a UI toolkit carries through a drag, and back.
///
/// The two prefixes are guaranteed not to overlap, so every raw id parses to at most one
/// [`DndId`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawIdScheme")]
pub struct IdScheme {
    item_prefix: String,
    container_prefix: String,
}

#[derive(Deserialize)]
#[serde(default)]
struct RawIdScheme {
    item_prefix: String,
    container_prefix: String,
}

impl Default for RawIdScheme {
    fn default() -> Self {
        Self {
            item_prefix: DEFAULT_ITEM_PREFIX.to_string(),
            container_prefix: DEFAULT_CONTAINER_PREFIX.to_string(),
        }
    }
}

impl TryFrom<RawIdScheme> for IdScheme {
    type Error = IdSchemeError;

    fn try_from(raw: RawIdScheme) -> Result<Self, Self::Error> {
        IdScheme::new(raw.item_prefix, raw.container_prefix)
    }
}

impl Default for IdScheme {
    fn default() -> Self {
        Self {
            item_prefix: DEFAULT_ITEM_PREFIX.to_string(),
            container_prefix: DEFAULT_CONTAINER_PREFIX.to_string(),
        }
    }
}

impl IdScheme {
    pub fn new(
        item_prefix: impl Into<String>,
        container_prefix: impl Into<String>,
    ) -> Result<Self, IdSchemeError> {
        let item_prefix = item_prefix.into();
        let container_prefix = container_prefix.into();

        if item_prefix.is_empty() || container_prefix.is_empty() {
            return Err(IdSchemeError::EmptyPrefix);
        }
        // "item-" and "item-group-" would make "item-group-1" ambiguous.
        if item_prefix.starts_with(&container_prefix) || container_prefix.starts_with(&item_prefix)
        {
            return Err(IdSchemeError::OverlappingPrefixes {
                item: item_prefix,
                container: container_prefix,
            });
        }

        Ok(Self {
            item_prefix,
            container_prefix,
        })
    }

    pub fn item_prefix(&self) -> &str {
        &self.item_prefix
    }

    pub fn container_prefix(&self) -> &str {
        &self.container_prefix
    }

    pub fn item_id(&self, entity_id: &str) -> String {
        format!("{}{entity_id}", self.item_prefix)
    }

    pub fn container_id(&self, entity_id: &str) -> String {
        format!("{}{entity_id}", self.container_prefix)
    }

    pub fn format(&self, id: &DndId) -> String {
        match id.kind {
            DndKind::Item => self.item_id(&id.entity_id),
            DndKind::Container => self.container_id(&id.entity_id),
        }
    }

    pub fn parse(&self, raw: &str) -> Result<DndId, ParseIdError> {
        let (kind, entity_id) = if let Some(rest) = raw.strip_prefix(self.item_prefix.as_str()) {
            (DndKind::Item, rest)
        } else if let Some(rest) = raw.strip_prefix(self.container_prefix.as_str()) {
            (DndKind::Container, rest)
        } else {
            return Err(ParseIdError::UnknownRole(raw.to_string()));
        };

        if entity_id.is_empty() {
            return Err(ParseIdError::EmptyEntity(raw.to_string()));
        }

        Ok(DndId {
            kind,
            entity_id: entity_id.to_string(),
        })
    }
}
