//! The type hierarchy index.
//!
//! Each type keeps its declared superclass and superinterfaces; the reverse
//! direction is a per-supertype set of direct subtypes. Both sides are
//! updated together so every edge can be walked either way. Transitive
//! closures are computed on demand and memoized until the next edit.

use crate::error::HierarchyError;
use dashmap::DashMap;
use indexmap::{IndexMap, IndexSet};
use jbind_symbols::{DeclarationKind, SymbolTable, TypeFlags, TypeId};
use rustc_hash::{FxBuildHasher, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::trace;

type NameSet = IndexSet<Arc<str>, FxBuildHasher>;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EdgeKind {
    Superclass,
    Superinterface,
}

/// One `subtype -> supertype` edge.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyEdge {
    pub subtype: Arc<str>,
    pub supertype: Arc<str>,
    pub kind: EdgeKind,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HierarchyNode {
    /// `None` for types only seen as somebody's supertype.
    pub kind: Option<DeclarationKind>,
    pub flags: TypeFlags,
    pub superclass: Option<Arc<str>>,
    pub interfaces: Vec<Arc<str>>,
}

impl HierarchyNode {
    pub fn is_interface(&self) -> bool {
        self.kind.is_some_and(DeclarationKind::is_interface)
    }

    pub fn is_class(&self) -> bool {
        self.kind.is_some_and(|k| !k.is_interface())
    }

    pub fn is_local_or_anonymous(&self) -> bool {
        self.flags.intersects(TypeFlags::LOCAL | TypeFlags::ANONYMOUS)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
enum Direction {
    Up,
    Down,
}

#[derive(Clone, Debug, Default)]
pub struct HierarchyIndex {
    focus: Option<Arc<str>>,
    nodes: IndexMap<Arc<str>, HierarchyNode, FxBuildHasher>,
    subtypes: IndexMap<Arc<str>, NameSet, FxBuildHasher>,
    missing: NameSet,
    closures: DashMap<(Arc<str>, Direction), Arc<[Arc<str>]>>,
}

impl HierarchyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_focus(focus: &str) -> Self {
        let mut index = Self::new();
        index.focus = Some(Arc::from(focus));
        index
    }

    pub fn focus(&self) -> Option<&str> {
        self.focus.as_deref()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn node(&self, name: &str) -> Option<&HierarchyNode> {
        self.nodes.get(name)
    }

    pub fn kind_of(&self, name: &str) -> Option<DeclarationKind> {
        self.nodes.get(name).and_then(|n| n.kind)
    }

    /// Every type in the index, in insertion order.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|k| &**k)
    }

    /// Names whose lookup failed or that no provider knew.
    pub fn missing_types(&self) -> Vec<Arc<str>> {
        self.missing.iter().cloned().collect()
    }

    pub fn is_missing(&self, name: &str) -> bool {
        self.missing.contains(name)
    }

    // =========================================================================
    // Edits
    // =========================================================================

    fn intern(&mut self, name: &str) -> Arc<str> {
        match self.nodes.get_key_value(name) {
            Some((key, _)) => Arc::clone(key),
            None => {
                let key: Arc<str> = Arc::from(name);
                self.nodes.insert(Arc::clone(&key), HierarchyNode::default());
                key
            }
        }
    }

    fn invalidate(&self) {
        if !self.closures.is_empty() {
            trace!(cached = self.closures.len(), "hierarchy closures invalidated");
            self.closures.clear();
        }
    }

    /// Record a declared type. Edges already pointing at it are kept.
    pub fn insert_type(&mut self, name: &str, kind: DeclarationKind, flags: TypeFlags) {
        let key = self.intern(name);
        if let Some(node) = self.nodes.get_mut(&key) {
            node.kind = Some(kind);
            node.flags |= flags;
        }
        self.missing.shift_remove(name);
    }

    pub fn mark_missing(&mut self, name: &str) {
        if !self.missing.contains(name) {
            self.missing.insert(Arc::from(name));
        }
    }

    /// Add `subtype -> supertype`. A new superclass edge replaces the old
    /// one. Returns whether the index changed.
    pub fn add_edge(&mut self, subtype: &str, supertype: &str, kind: EdgeKind) -> bool {
        let sub = self.intern(subtype);
        let sup = self.intern(supertype);
        let Some(node) = self.nodes.get_mut(&sub) else {
            return false;
        };
        let replaced = match kind {
            EdgeKind::Superclass => {
                if node.superclass.as_ref() == Some(&sup) {
                    return false;
                }
                node.superclass
                    .replace(Arc::clone(&sup))
                    .filter(|previous| !node.interfaces.contains(previous))
            }
            EdgeKind::Superinterface => {
                if node.interfaces.contains(&sup) {
                    return false;
                }
                node.interfaces.push(Arc::clone(&sup));
                None
            }
        };
        if let Some(previous) = replaced {
            self.unlink(&previous, &sub);
        }
        self.subtypes.entry(sup).or_default().insert(sub);
        self.invalidate();
        true
    }

    /// Remove `subtype -> supertype`, of either kind.
    pub fn remove_edge(&mut self, subtype: &str, supertype: &str) -> bool {
        let Some(node) = self.nodes.get_mut(subtype) else {
            return false;
        };
        let mut removed = false;
        if node.superclass.as_deref() == Some(supertype) {
            node.superclass = None;
            removed = true;
        }
        let before = node.interfaces.len();
        node.interfaces.retain(|i| &**i != supertype);
        removed |= node.interfaces.len() != before;
        if removed {
            self.unlink(supertype, subtype);
            self.invalidate();
        }
        removed
    }

    /// Remove a type with every edge that touches it.
    pub fn remove_type(&mut self, name: &str) -> bool {
        let Some(node) = self.nodes.shift_remove(name) else {
            return false;
        };
        for supertype in node.superclass.iter().chain(node.interfaces.iter()) {
            self.unlink(supertype, name);
        }
        if let Some(subtypes) = self.subtypes.shift_remove(name) {
            for subtype in subtypes {
                if let Some(sub) = self.nodes.get_mut(&subtype) {
                    if sub.superclass.as_deref() == Some(name) {
                        sub.superclass = None;
                    }
                    sub.interfaces.retain(|i| &**i != name);
                }
            }
        }
        self.missing.shift_remove(name);
        self.invalidate();
        true
    }

    fn unlink(&mut self, supertype: &str, subtype: &str) {
        if let Some(set) = self.subtypes.get_mut(supertype) {
            set.shift_remove(subtype);
            if set.is_empty() {
                self.subtypes.shift_remove(supertype);
            }
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Direct or transitive subtypes, nearest first. Never includes `name`.
    pub fn subtypes_of(&self, name: &str, transitive: bool) -> Vec<Arc<str>> {
        if !transitive {
            return self
                .subtypes
                .get(name)
                .map(|set| set.iter().cloned().collect())
                .unwrap_or_default();
        }
        self.closure(name, Direction::Down).to_vec()
    }

    /// Superclass first, then superinterfaces; transitively in
    /// breadth-first order. Never includes `name`.
    pub fn supertypes_of(&self, name: &str, transitive: bool) -> Vec<Arc<str>> {
        if !transitive {
            return self
                .nodes
                .get(name)
                .map(|n| n.superclass.iter().chain(n.interfaces.iter()).cloned().collect())
                .unwrap_or_default();
        }
        self.closure(name, Direction::Up).to_vec()
    }

    fn closure(&self, name: &str, direction: Direction) -> Arc<[Arc<str>]> {
        let key = (Arc::from(name), direction);
        if let Some(cached) = self.closures.get(&key) {
            return Arc::clone(cached.value());
        }
        let mut seen: FxHashSet<Arc<str>> = FxHashSet::default();
        seen.insert(Arc::clone(&key.0));
        let mut order = Vec::new();
        let mut queue: VecDeque<Arc<str>> = VecDeque::new();
        queue.push_back(Arc::clone(&key.0));
        while let Some(current) = queue.pop_front() {
            let next = match direction {
                Direction::Down => self.subtypes_of(&current, false),
                Direction::Up => self.supertypes_of(&current, false),
            };
            for n in next {
                if seen.insert(Arc::clone(&n)) {
                    order.push(Arc::clone(&n));
                    queue.push_back(n);
                }
            }
        }
        let closure: Arc<[Arc<str>]> = order.into();
        self.closures.insert(key, Arc::clone(&closure));
        closure
    }

    pub fn superclass_of(&self, name: &str) -> Option<Arc<str>> {
        self.nodes.get(name).and_then(|n| n.superclass.clone())
    }

    pub fn superinterfaces_of(&self, name: &str) -> &[Arc<str>] {
        self.nodes
            .get(name)
            .map(|n| n.interfaces.as_slice())
            .unwrap_or_default()
    }

    /// Direct subtypes that extend `name` as their superclass.
    pub fn subclasses_of(&self, name: &str) -> Vec<Arc<str>> {
        self.direct_subtypes_where(name, |node| node.superclass.as_deref() == Some(name))
    }

    /// Classes that list `interface` among their superinterfaces.
    pub fn implementing_classes(&self, interface: &str) -> Vec<Arc<str>> {
        self.direct_subtypes_where(interface, |node| {
            !node.is_interface() && node.interfaces.iter().any(|i| &**i == interface)
        })
    }

    pub fn extending_interfaces(&self, interface: &str) -> Vec<Arc<str>> {
        self.direct_subtypes_where(interface, HierarchyNode::is_interface)
    }

    fn direct_subtypes_where(&self, name: &str, keep: impl Fn(&HierarchyNode) -> bool) -> Vec<Arc<str>> {
        let Some(set) = self.subtypes.get(name) else {
            return Vec::new();
        };
        set.iter()
            .filter(|s| self.nodes.get(&**s).is_some_and(&keep))
            .cloned()
            .collect()
    }

    pub fn all_classes(&self) -> Vec<Arc<str>> {
        self.names_where(HierarchyNode::is_class)
    }

    pub fn all_interfaces(&self) -> Vec<Arc<str>> {
        self.names_where(HierarchyNode::is_interface)
    }

    /// Classes with no superclass in the index.
    pub fn root_classes(&self) -> Vec<Arc<str>> {
        self.names_where(|n| n.is_class() && n.superclass.is_none())
    }

    pub fn root_interfaces(&self) -> Vec<Arc<str>> {
        self.names_where(|n| n.is_interface() && n.interfaces.is_empty())
    }

    fn names_where(&self, keep: impl Fn(&HierarchyNode) -> bool) -> Vec<Arc<str>> {
        self.nodes
            .iter()
            .filter(|(_, node)| keep(node))
            .map(|(name, _)| Arc::clone(name))
            .collect()
    }

    /// Every edge, grouped by subtype in insertion order.
    pub fn edges(&self) -> Vec<HierarchyEdge> {
        let mut edges = Vec::new();
        for (name, node) in &self.nodes {
            if let Some(superclass) = &node.superclass {
                edges.push(HierarchyEdge {
                    subtype: Arc::clone(name),
                    supertype: Arc::clone(superclass),
                    kind: EdgeKind::Superclass,
                });
            }
            for interface in &node.interfaces {
                edges.push(HierarchyEdge {
                    subtype: Arc::clone(name),
                    supertype: Arc::clone(interface),
                    kind: EdgeKind::Superinterface,
                });
            }
        }
        edges
    }

    /// Every forward edge has its reverse entry and the other way round.
    pub fn check_consistency(&self) -> Result<(), HierarchyError> {
        for edge in self.edges() {
            let linked = self
                .subtypes
                .get(&edge.supertype)
                .is_some_and(|set| set.contains(&edge.subtype));
            if !linked || !self.nodes.contains_key(&edge.supertype) {
                return Err(HierarchyError::OrphanedEdge {
                    subtype: edge.subtype.to_string(),
                    supertype: edge.supertype.to_string(),
                });
            }
        }
        for (supertype, set) in &self.subtypes {
            for subtype in set {
                let declared = self.nodes.get(subtype).is_some_and(|n| {
                    n.superclass.as_ref() == Some(supertype) || n.interfaces.contains(supertype)
                });
                if !declared {
                    return Err(HierarchyError::OrphanedEdge {
                        subtype: subtype.to_string(),
                        supertype: supertype.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    // =========================================================================
    // Symbol table adapters
    // =========================================================================

    fn name_in(&self, table: &SymbolTable, id: TypeId) -> Result<Arc<str>, HierarchyError> {
        let name = table
            .qualified_name(table.declaration_of(id))
            .ok_or_else(|| HierarchyError::UnknownType {
                name: id.to_string(),
            })?;
        if !self.contains(&name) {
            return Err(HierarchyError::UnknownType {
                name: name.to_string(),
            });
        }
        Ok(name)
    }

    /// `subtypes_of` over symbol-table handles. Parameterized types are
    /// looked up by their generic declaration.
    pub fn subtypes_of_type(
        &self,
        table: &SymbolTable,
        id: TypeId,
        transitive: bool,
    ) -> Result<Vec<TypeId>, HierarchyError> {
        let name = self.name_in(table, id)?;
        Ok(self
            .subtypes_of(&name, transitive)
            .iter()
            .map(|n| table.intern_declared(n))
            .collect())
    }

    pub fn supertypes_of_type(
        &self,
        table: &SymbolTable,
        id: TypeId,
        transitive: bool,
    ) -> Result<Vec<TypeId>, HierarchyError> {
        let name = self.name_in(table, id)?;
        Ok(self
            .supertypes_of(&name, transitive)
            .iter()
            .map(|n| table.intern_declared(n))
            .collect())
    }
}
