//! Documented structures and the per-run registry that deduplicates them
//!
//! A `DocumentedStructure` collects every comment that belongs to one
//! class-like entity (a message, or a nested message reached through a field
//! path). Comments for the same entity arrive from many source locations, so
//! structures are handed out through a `StructureRegistry` which guarantees
//! one shared instance per fully-qualified name.

use serde::{Deserialize, Serialize};
use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// Documentation gathered for one message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentedStructure {
    /// Fully qualified name (e.g., "google.protobuf.SourceCodeInfo")
    qualified_name: String,

    /// Class-level comment
    #[serde(default)]
    summary: String,

    /// Member comments in discovery order
    #[serde(default)]
    members: Vec<(String, String)>,
}

impl DocumentedStructure {
    /// Create an empty structure
    pub fn new(qualified_name: impl Into<String>) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            summary: String::new(),
            members: Vec::new(),
        }
    }

    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Replace the class-level comment
    pub fn set_summary(&mut self, summary: impl Into<String>) {
        self.summary = summary.into();
    }

    /// Record a member comment
    ///
    /// A member seen again keeps its original position and takes the new text.
    pub fn add_member(&mut self, name: impl Into<String>, comment: impl Into<String>) {
        let name = name.into();
        let comment = comment.into();
        match self.members.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = comment,
            None => self.members.push((name, comment)),
        }
    }

    pub fn member(&self, name: &str) -> Option<&str> {
        self.members
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, comment)| comment.as_str())
    }

    pub fn members(&self) -> impl Iterator<Item = (&str, &str)> {
        self.members
            .iter()
            .map(|(name, comment)| (name.as_str(), comment.as_str()))
    }

    pub fn members_mut(&mut self) -> impl Iterator<Item = (&str, &mut String)> {
        self.members
            .iter_mut()
            .map(|(name, comment)| (name.as_str(), comment))
    }

    pub fn has_members(&self) -> bool {
        !self.members.is_empty()
    }

    /// True when neither a summary nor any member text is present
    pub fn is_undocumented(&self) -> bool {
        self.summary.trim().is_empty()
            && self.members.iter().all(|(_, comment)| comment.trim().is_empty())
    }
}

impl PartialEq for DocumentedStructure {
    fn eq(&self, other: &Self) -> bool {
        self.qualified_name == other.qualified_name
    }
}

impl Eq for DocumentedStructure {}

impl Hash for DocumentedStructure {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.qualified_name.hash(state);
    }
}

/// Shared handle to a structure owned by a `StructureRegistry`
///
/// Cloning the handle never copies the structure. Equality and hashing only
/// look at the qualified name, so handles can go straight into a `HashSet`
/// while the structure behind them is still being filled in.
#[derive(Clone)]
pub struct StructureHandle {
    name: Rc<str>,
    inner: Rc<RefCell<DocumentedStructure>>,
}

impl StructureHandle {
    fn new(name: &str) -> Self {
        Self {
            name: Rc::from(name),
            inner: Rc::new(RefCell::new(DocumentedStructure::new(name))),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn borrow(&self) -> Ref<'_, DocumentedStructure> {
        self.inner.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, DocumentedStructure> {
        self.inner.borrow_mut()
    }

    /// Whether both handles point at the same structure instance
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Copy of the current state, for serialization
    pub fn snapshot(&self) -> DocumentedStructure {
        self.inner.borrow().clone()
    }
}

impl PartialEq for StructureHandle {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for StructureHandle {}

impl Hash for StructureHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Debug for StructureHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StructureHandle").field(&self.name).finish()
    }
}

/// Identity-by-name cache of documented structures
///
/// Scoped to one processing run; nothing is shared between registries.
#[derive(Debug, Default)]
pub struct StructureRegistry {
    by_name: HashMap<String, StructureHandle>,
    order: Vec<StructureHandle>,
}

impl StructureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the structure registered under `name`, creating it on first use
    pub fn get_or_create(&mut self, name: &str) -> StructureHandle {
        if let Some(handle) = self.by_name.get(name) {
            return handle.clone();
        }

        let handle = StructureHandle::new(name);
        self.by_name.insert(name.to_string(), handle.clone());
        self.order.push(handle.clone());
        handle
    }

    pub fn get(&self, name: &str) -> Option<StructureHandle> {
        self.by_name.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Structures in creation order
    pub fn iter(&self) -> impl Iterator<Item = &StructureHandle> {
        self.order.iter()
    }

    /// Forget every structure
    pub fn clear(&mut self) {
        self.by_name.clear();
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::collections::HashSet;

    fn hash_of<T: Hash + ?Sized>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_get_or_create_same_name() {
        let mut registry = StructureRegistry::new();
        let a = registry.get_or_create("foo");
        let b = registry.get_or_create("foo");
        assert!(a.ptr_eq(&b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_get_or_create_different_names() {
        let mut registry = StructureRegistry::new();
        let a = registry.get_or_create("foo");
        let c = registry.get_or_create("bar");
        assert!(!a.ptr_eq(&c));
        assert_ne!(a, c);
    }

    #[test]
    fn test_mutation_visible_through_every_handle() {
        let mut registry = StructureRegistry::new();
        let a = registry.get_or_create("pkg.Foo");
        a.borrow_mut().set_summary("Make a foo.");
        let b = registry.get_or_create("pkg.Foo");
        assert_eq!(b.borrow().summary(), "Make a foo.");
    }

    #[test]
    fn test_hash_is_name_only() {
        let mut registry = StructureRegistry::new();
        let foo = registry.get_or_create("foo");
        let before = hash_of(&foo);
        foo.borrow_mut().set_summary("changed");
        foo.borrow_mut().add_member("bar", "baz");
        assert_eq!(before, hash_of(&foo));
        assert_eq!(before, hash_of("foo"));
        assert_eq!(hash_of(&*foo.borrow()), hash_of("foo"));
    }

    #[test]
    fn test_set_deduplicates_by_name() {
        let mut registry = StructureRegistry::new();
        let mut set = HashSet::new();
        set.insert(registry.get_or_create("foo"));
        registry.get_or_create("foo").borrow_mut().set_summary("later");
        set.insert(registry.get_or_create("foo"));
        set.insert(registry.get_or_create("bar"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_clear_forgets_structures() {
        let mut registry = StructureRegistry::new();
        let before = registry.get_or_create("foo");
        registry.clear();
        assert!(registry.is_empty());
        let after = registry.get_or_create("foo");
        assert!(!before.ptr_eq(&after));
    }

    #[test]
    fn test_iter_preserves_creation_order() {
        let mut registry = StructureRegistry::new();
        registry.get_or_create("b");
        registry.get_or_create("a");
        registry.get_or_create("b");
        let names: Vec<_> = registry.iter().map(|h| h.name().to_string()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn test_members_keep_discovery_order() {
        let mut structure = DocumentedStructure::new("pkg.Foo");
        structure.add_member("zeta", "z");
        structure.add_member("alpha", "a");
        structure.add_member("zeta", "z2");
        let members: Vec<_> = structure.members().collect();
        assert_eq!(members, vec![("zeta", "z2"), ("alpha", "a")]);
        assert_eq!(structure.member("alpha"), Some("a"));
    }

    #[test]
    fn test_is_undocumented() {
        let mut structure = DocumentedStructure::new("Foo");
        assert!(structure.is_undocumented());
        structure.add_member("bar", "  ");
        assert!(structure.is_undocumented());
        structure.add_member("bar", "text");
        assert!(!structure.is_undocumented());
    }
}
