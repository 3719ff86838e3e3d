//! Roster store and the repository that mutates it.
//!
//! The store is a plain in-memory container with no I/O. All mutation goes
//! through [`Repository`], which serializes access behind one lock.

mod repository;

pub use repository::*;

use std::collections::BTreeMap;

use crate::models::ClassRecord;

/// In-memory mapping from class name to class record, plus a mutation counter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterStore {
    classes: BTreeMap<String, ClassRecord>,
    revision: i64,
}

impl RosterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a loaded snapshot, repairing each record.
    pub fn from_classes(mut classes: BTreeMap<String, ClassRecord>) -> Self {
        for (name, class) in classes.iter_mut() {
            class.normalize(name);
        }
        Self {
            classes,
            revision: 0,
        }
    }

    pub fn get(&self, class_name: &str) -> Option<&ClassRecord> {
        self.classes.get(class_name)
    }

    pub fn get_mut(&mut self, class_name: &str) -> Option<&mut ClassRecord> {
        self.classes.get_mut(class_name)
    }

    pub fn contains(&self, class_name: &str) -> bool {
        self.classes.contains_key(class_name)
    }

    pub fn put(&mut self, class_name: &str, record: ClassRecord) {
        self.classes.insert(class_name.to_string(), record);
    }

    /// Remove a class, returning the previous record.
    pub fn delete(&mut self, class_name: &str) -> Option<ClassRecord> {
        self.classes.remove(class_name)
    }

    /// Class names in sorted order.
    pub fn list(&self) -> Vec<String> {
        self.classes.keys().cloned().collect()
    }

    pub fn classes(&self) -> &BTreeMap<String, ClassRecord> {
        &self.classes
    }

    pub fn classes_mut(&mut self) -> impl Iterator<Item = (&String, &mut ClassRecord)> {
        self.classes.iter_mut()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn student_count(&self) -> usize {
        self.classes.values().map(|c| c.students.len()).sum()
    }

    pub fn revision(&self) -> i64 {
        self.revision
    }

    /// Advance the revision counter and return the new value.
    pub fn bump_revision(&mut self) -> i64 {
        self.revision += 1;
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_delete_list() {
        let mut store = RosterStore::new();
        store.put("Chem", ClassRecord::new("Chem", None, "t0"));
        store.put("Bio", ClassRecord::new("Bio", None, "t0"));

        assert_eq!(store.list(), vec!["Bio".to_string(), "Chem".to_string()]);
        assert!(store.get("Bio").is_some());

        let removed = store.delete("Bio").unwrap();
        assert_eq!(removed.name, "Bio");
        assert!(store.delete("Bio").is_none());
        assert!(store.get("Bio").is_none());
    }

    #[test]
    fn test_empty_class_is_distinct_from_missing() {
        let mut store = RosterStore::new();
        store.put("Empty", ClassRecord::new("Empty", None, "t0"));

        assert!(store.contains("Empty"));
        assert!(store.get("Empty").unwrap().students.is_empty());
        assert!(!store.contains("Missing"));
    }

    #[test]
    fn test_bump_revision_is_monotonic() {
        let mut store = RosterStore::new();
        assert_eq!(store.bump_revision(), 1);
        assert_eq!(store.bump_revision(), 2);
        assert_eq!(store.revision(), 2);
    }
}
