//! Depth-first traversal of nested mapping/sequence structures.
//!
//! [`Walk`] yields one `(path, scalar)` pair for every scalar leaf, lazily
//! and in document order. Strings are leaves; they are never split into
//! characters. Containers currently on the descent stack are tracked by
//! identity, and a container met again while it is still being visited is
//! skipped, so self-referential graphs terminate.

use serde_json::Value;
use std::collections::HashSet;
use std::hash::Hash;

use super::path::{JsonPath, PathComponent};

/// A value the walker can descend into.
///
/// Implementors are cheap handles (references, `Rc`s) to nodes of a graph.
pub trait Node: Sized {
    /// Identity of a container, stable while the graph is walked
    type Id: Copy + Eq + Hash;

    fn identity(&self) -> Self::Id;

    /// Children of a container in traversal order, or `None` for a scalar
    fn children(&self) -> Option<Vec<(PathComponent, Self)>>;
}

impl<'a> Node for &'a Value {
    type Id = *const Value;

    fn identity(&self) -> Self::Id {
        *self as *const Value
    }

    fn children(&self) -> Option<Vec<(PathComponent, Self)>> {
        match *self {
            Value::Object(map) => Some(
                map.iter()
                    .map(|(key, value)| (PathComponent::Key(key.clone()), value))
                    .collect(),
            ),
            Value::Array(items) => Some(
                items
                    .iter()
                    .enumerate()
                    .map(|(index, value)| (PathComponent::Index(index), value))
                    .collect(),
            ),
            _ => None,
        }
    }
}

struct Frame<N: Node> {
    id: N::Id,
    children: std::vec::IntoIter<(PathComponent, N)>,
}

/// Lazy iterator over the scalar leaves below a root
pub struct Walk<N: Node> {
    root: Option<N>,
    base: JsonPath,
    frames: Vec<Frame<N>>,
    path: Vec<PathComponent>,
    visiting: HashSet<N::Id>,
}

/// Walk `root`, reporting paths relative to the document root.
pub fn walk<N: Node>(root: N) -> Walk<N> {
    walk_from(root, JsonPath::root())
}

/// Walk `root`, which sits at `base` inside a larger document.
pub fn walk_from<N: Node>(root: N, base: JsonPath) -> Walk<N> {
    Walk {
        root: Some(root),
        base,
        frames: Vec::new(),
        path: Vec::new(),
        visiting: HashSet::new(),
    }
}

impl<N: Node> Walk<N> {
    /// Enter `node`: scalars are returned, containers become the new top
    /// frame unless they are already being visited.
    fn visit(&mut self, component: Option<PathComponent>, node: N) -> Option<(JsonPath, N)> {
        let Some(children) = node.children() else {
            let mut components = self.base.components().to_vec();
            components.extend(self.path.iter().cloned());
            components.extend(component);
            return Some((JsonPath::from(components), node));
        };

        let id = node.identity();
        if !self.visiting.insert(id) {
            log::trace!("skipping container already on the walk stack");
            return None;
        }

        self.path.extend(component);
        self.frames.push(Frame {
            id,
            children: children.into_iter(),
        });
        None
    }
}

impl<N: Node> Iterator for Walk<N> {
    type Item = (JsonPath, N);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(root) = self.root.take() {
            if let Some(leaf) = self.visit(None, root) {
                return Some(leaf);
            }
        }

        loop {
            let frame = self.frames.last_mut()?;
            match frame.children.next() {
                Some((component, child)) => {
                    if let Some(leaf) = self.visit(Some(component), child) {
                        return Some(leaf);
                    }
                }
                None => {
                    if let Some(done) = self.frames.pop() {
                        self.visiting.remove(&done.id);
                    }
                    // The root frame was entered without a component
                    if !self.frames.is_empty() {
                        self.path.pop();
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn count_scalars(value: &Value) -> usize {
        match value {
            Value::Object(map) => map.values().map(count_scalars).sum(),
            Value::Array(items) => items.iter().map(count_scalars).sum(),
            _ => 1,
        }
    }

    #[test]
    fn visits_every_scalar_once_in_document_order() {
        let doc = json!({
            "name": "%%page",
            "layers": [
                {"name": "%%a", "attributedString": {"string": "A"}},
                [],
                {},
                [1, 2.5, null, true]
            ],
            "frame": {"x": 0, "y": 0}
        });

        let pairs: Vec<_> = walk(&doc).collect();
        assert_eq!(pairs.len(), count_scalars(&doc));

        let paths: Vec<String> = pairs.iter().map(|(p, _)| p.to_string()).collect();
        assert_eq!(
            paths,
            [
                "/name",
                "/layers/0/name",
                "/layers/0/attributedString/string",
                "/layers/3/0",
                "/layers/3/1",
                "/layers/3/2",
                "/layers/3/3",
                "/frame/x",
                "/frame/y",
            ]
        );

        for (path, value) in &pairs {
            assert_eq!(path.resolve(&doc), Some(*value));
        }
    }

    #[test]
    fn strings_are_atomic() {
        let doc = json!(["abc"]);
        let pairs: Vec<_> = walk(&doc).collect();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].1, &json!("abc"));
    }

    #[test]
    fn scalar_root_yields_empty_path() {
        let doc = json!("only");
        let pairs: Vec<_> = walk(&doc).collect();
        assert_eq!(pairs.len(), 1);
        assert!(pairs[0].0.is_root());
    }

    #[test]
    fn empty_containers_yield_nothing() {
        assert_eq!(walk(&json!({})).count(), 0);
        assert_eq!(walk(&json!([])).count(), 0);
        assert_eq!(walk(&json!({"a": [], "b": {"c": {}}})).count(), 0);
    }

    #[test]
    fn walk_from_prefixes_paths() {
        let doc = json!({"layers": [{"name": "x"}]});
        let layer = &doc["layers"][0];
        let base = JsonPath::root().key("layers").index(0);
        let pairs: Vec<_> = walk_from(layer, base).collect();
        assert_eq!(pairs[0].0.to_string(), "/layers/0/name");
    }

    #[test]
    fn repeated_sibling_containers_are_all_visited() {
        // Shared, non-cyclic subtrees are walked once per occurrence
        let shared = Rc::new(Graph::List(RefCell::new(vec![Rc::new(Graph::Leaf(1))])));
        let root = Rc::new(Graph::List(RefCell::new(vec![shared.clone(), shared])));
        assert_eq!(walk(GraphRef(root)).count(), 2);
    }

    /// Reference-counted graph that, unlike `serde_json::Value`, can hold
    /// cycles.
    enum Graph {
        Leaf(i32),
        List(RefCell<Vec<Rc<Graph>>>),
    }

    #[derive(Clone)]
    struct GraphRef(Rc<Graph>);

    impl Node for GraphRef {
        type Id = *const Graph;

        fn identity(&self) -> Self::Id {
            Rc::as_ptr(&self.0)
        }

        fn children(&self) -> Option<Vec<(PathComponent, Self)>> {
            match &*self.0 {
                Graph::Leaf(_) => None,
                Graph::List(items) => Some(
                    items
                        .borrow()
                        .iter()
                        .enumerate()
                        .map(|(i, item)| (PathComponent::Index(i), GraphRef(item.clone())))
                        .collect(),
                ),
            }
        }
    }

    fn leaf_value(node: &GraphRef) -> i32 {
        match &*node.0 {
            Graph::Leaf(v) => *v,
            Graph::List(_) => unreachable!("walker only yields leaves"),
        }
    }

    #[test]
    fn self_referential_container_terminates() {
        let root = Rc::new(Graph::List(RefCell::new(vec![Rc::new(Graph::Leaf(7))])));
        if let Graph::List(items) = &*root {
            items.borrow_mut().push(root.clone());
            items.borrow_mut().push(Rc::new(Graph::Leaf(8)));
        }

        let leaves: Vec<_> = walk(GraphRef(root.clone())).collect();
        let values: Vec<i32> = leaves.iter().map(|(_, n)| leaf_value(n)).collect();
        assert_eq!(values, [7, 8]);
        assert_eq!(leaves[1].0.to_string(), "/2");

        // Break the cycle so the test does not leak
        if let Graph::List(items) = &*root {
            items.borrow_mut().clear();
        }
    }

    #[test]
    fn transitive_cycle_terminates() {
        let inner = Rc::new(Graph::List(RefCell::new(vec![Rc::new(Graph::Leaf(1))])));
        let outer = Rc::new(Graph::List(RefCell::new(vec![inner.clone(), Rc::new(Graph::Leaf(2))])));
        if let Graph::List(items) = &*inner {
            items.borrow_mut().push(outer.clone());
        }

        let values: Vec<i32> = walk(GraphRef(outer.clone()))
            .map(|(_, n)| leaf_value(&n))
            .collect();
        assert_eq!(values, [1, 2]);

        if let Graph::List(items) = &*inner {
            items.borrow_mut().clear();
        }
    }
}
