//! Locations inside a page document.

use serde_json::Value;
use std::fmt;

/// One step from a container to one of its children
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathComponent {
    /// Member of a mapping
    Key(String),
    /// Position in a sequence
    Index(usize),
}

impl PathComponent {
    pub fn is_key(&self, key: &str) -> bool {
        matches!(self, PathComponent::Key(k) if k == key)
    }
}

/// Ordered components leading from a document root to one value.
///
/// A path stays valid only while the document it was computed on is not
/// restructured. Displays as a JSON Pointer (RFC 6901).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct JsonPath(Vec<PathComponent>);

impl JsonPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn components(&self) -> &[PathComponent] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&PathComponent> {
        self.0.last()
    }

    /// Path of the enclosing container, or `None` for the root
    pub fn parent(&self) -> Option<JsonPath> {
        let (_, rest) = self.0.split_last()?;
        Some(JsonPath(rest.to_vec()))
    }

    /// Path extended by one component
    pub fn child(&self, component: PathComponent) -> JsonPath {
        let mut components = self.0.clone();
        components.push(component);
        JsonPath(components)
    }

    /// Path extended by a mapping key
    pub fn key(&self, key: &str) -> JsonPath {
        self.child(PathComponent::Key(key.to_string()))
    }

    /// Path extended by a sequence index
    pub fn index(&self, index: usize) -> JsonPath {
        self.child(PathComponent::Index(index))
    }

    /// Follow the path from `root`; `None` if a step is missing or the
    /// container kind does not match the component.
    pub fn resolve<'v>(&self, root: &'v Value) -> Option<&'v Value> {
        self.0.iter().try_fold(root, |node, component| match (node, component) {
            (Value::Object(map), PathComponent::Key(key)) => map.get(key),
            (Value::Array(items), PathComponent::Index(index)) => items.get(*index),
            _ => None,
        })
    }

    /// Mutable counterpart of [`JsonPath::resolve`]
    pub fn resolve_mut<'v>(&self, root: &'v mut Value) -> Option<&'v mut Value> {
        let mut node = root;
        for component in &self.0 {
            node = match (node, component) {
                (Value::Object(map), PathComponent::Key(key)) => map.get_mut(key)?,
                (Value::Array(items), PathComponent::Index(index)) => items.get_mut(*index)?,
                _ => return None,
            };
        }
        Some(node)
    }
}

impl From<Vec<PathComponent>> for JsonPath {
    fn from(components: Vec<PathComponent>) -> Self {
        Self(components)
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for component in &self.0 {
            match component {
                PathComponent::Key(key) => write!(f, "/{}", key.replace('~', "~0").replace('/', "~1"))?,
                PathComponent::Index(index) => write!(f, "/{}", index)?,
            }
        }
        Ok(())
    }
}
