use crate::classes::ClassId;
use crate::error::StoreError;
use crate::text::{collate, fold, is_allowed_text, normalize};
use std::collections::BTreeMap;
use tracing::warn;

/// Per-class student names, each list kept in collation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterStore {
    classes: BTreeMap<ClassId, Vec<String>>,
}

impl RosterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the persisted `{ classId: [name] }` blob. Unknown class ids are dropped.
    pub fn from_blob(raw: &str) -> Result<Self, StoreError> {
        let parsed: BTreeMap<String, Vec<String>> = serde_json::from_str(raw)?;
        let mut classes = BTreeMap::new();
        for (id, names) in parsed {
            let Ok(class_id) = id.parse::<ClassId>() else {
                warn!(class_id = %id, "dropping roster entries for unknown class");
                continue;
            };
            let mut names: Vec<String> = names.iter().map(|n| normalize(n)).collect();
            names.retain(|n| !n.is_empty());
            names.sort_by(|a, b| collate(a, b));
            names.dedup_by(|a, b| fold(a) == fold(b));
            classes.insert(class_id, names);
        }
        Ok(Self { classes })
    }

    pub fn to_blob(&self) -> Result<String, StoreError> {
        let out: BTreeMap<&str, &Vec<String>> = self
            .classes
            .iter()
            .map(|(id, names)| (id.as_str(), names))
            .collect();
        Ok(serde_json::to_string(&out)?)
    }

    pub fn students(&self, class_id: ClassId) -> &[String] {
        self.classes
            .get(&class_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn total(&self, class_id: ClassId) -> usize {
        self.students(class_id).len()
    }

    /// Stored spelling of `name` in the class, matched case-insensitively after normalization.
    pub fn find(&self, class_id: ClassId, name: &str) -> Option<&str> {
        let key = fold(name);
        self.students(class_id)
            .iter()
            .find(|n| fold(n) == key)
            .map(String::as_str)
    }

    pub fn contains(&self, class_id: ClassId, name: &str) -> bool {
        self.find(class_id, name).is_some()
    }

    /// Every class in enumeration order, including empty ones.
    pub fn iter(&self) -> impl Iterator<Item = (ClassId, &[String])> + '_ {
        ClassId::ALL.into_iter().map(|c| (c, self.students(c)))
    }

    /// Validates and inserts a name, returning its normalized form.
    pub fn insert(&mut self, class_id: ClassId, raw_name: &str) -> Result<String, StoreError> {
        let name = normalize(raw_name);
        if name.is_empty() {
            return Err(StoreError::Empty { field: "name" });
        }
        if !is_allowed_text(&name) {
            return Err(StoreError::InvalidText { field: "name" });
        }
        if self.contains(class_id, &name) {
            return Err(StoreError::Duplicate {
                name,
                class: class_id.display_name().to_string(),
            });
        }
        let list = self.classes.entry(class_id).or_default();
        list.push(name.clone());
        list.sort_by(|a, b| collate(a, b));
        Ok(name)
    }

    /// Removes the name and returns the spelling that was stored, if any.
    pub fn remove(&mut self, class_id: ClassId, name: &str) -> Option<String> {
        let stored = self.find(class_id, name)?.to_string();
        if let Some(list) = self.classes.get_mut(&class_id) {
            list.retain(|n| *n != stored);
        }
        Some(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_normalizes_and_sorts() {
        let mut r = RosterStore::new();
        r.insert(ClassId::Green, "  하  늘 ").unwrap();
        r.insert(ClassId::Green, "가람").unwrap();
        r.insert(ClassId::Green, "나래").unwrap();
        assert_eq!(r.students(ClassId::Green), ["가람", "나래", "하 늘"]);
        assert_eq!(r.total(ClassId::Green), 3);
        assert_eq!(r.total(ClassId::Koala), 0);
    }

    #[test]
    fn duplicate_in_same_class_is_rejected() {
        let mut r = RosterStore::new();
        r.insert(ClassId::Green, "Min Jun").unwrap();
        let err = r.insert(ClassId::Green, "  min   JUN ").unwrap_err();
        match err {
            StoreError::Duplicate { class, .. } => assert_eq!(class, "초록반"),
            other => panic!("expected duplicate, got {other:?}"),
        }
        assert_eq!(r.total(ClassId::Green), 1);
    }

    #[test]
    fn same_name_in_other_class_is_fine() {
        let mut r = RosterStore::new();
        r.insert(ClassId::Green, "민준").unwrap();
        r.insert(ClassId::Yellow, "민준").unwrap();
        assert!(r.contains(ClassId::Yellow, "민준"));
    }

    #[test]
    fn empty_and_invalid_names_leave_roster_untouched() {
        let mut r = RosterStore::new();
        assert!(matches!(
            r.insert(ClassId::Green, "   "),
            Err(StoreError::Empty { field: "name" })
        ));
        assert!(matches!(
            r.insert(ClassId::Green, "민준!"),
            Err(StoreError::InvalidText { field: "name" })
        ));
        assert_eq!(r, RosterStore::new());
    }

    #[test]
    fn remove_returns_stored_spelling() {
        let mut r = RosterStore::new();
        r.insert(ClassId::Deer, "Ha Neul").unwrap();
        assert_eq!(r.remove(ClassId::Deer, "ha  neul"), Some("Ha Neul".to_string()));
        assert_eq!(r.remove(ClassId::Deer, "Ha Neul"), None);
        assert!(r.students(ClassId::Deer).is_empty());
    }

    #[test]
    fn blob_drops_unknown_classes_and_resorts() {
        let r = RosterStore::from_blob(r#"{"green":["하늘","가람"],"panda":["x"]}"#).unwrap();
        assert_eq!(r.students(ClassId::Green), ["가람", "하늘"]);
        let again = RosterStore::from_blob(&r.to_blob().unwrap()).unwrap();
        assert_eq!(again, r);
    }
}
