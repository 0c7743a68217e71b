//! Read-only views over the roster and the stop list. Recomputed on every call.

use crate::classes::ClassId;
use crate::registry::BusStop;
use crate::roster::RosterStore;
use crate::text::{collate, contains_folded, fold};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRow {
    pub class_id: ClassId,
    pub class_name: &'static str,
    pub name: String,
}

impl StudentRow {
    fn new(class_id: ClassId, name: &str) -> Self {
        Self {
            class_id,
            class_name: class_id.display_name(),
            name: name.to_string(),
        }
    }

    /// `(초록반) 민준`, as shown in the global view.
    pub fn label(&self) -> String {
        format!("({}) {}", self.class_name, self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Scoped,
    Global,
}

/// Scoped view of `selected` when the query is blank, otherwise the global view.
pub fn student_view(
    roster: &RosterStore,
    query: &str,
    selected: ClassId,
) -> (ViewMode, Vec<StudentRow>) {
    let needle = fold(query);
    if needle.is_empty() {
        return (ViewMode::Scoped, scoped(roster, selected));
    }
    (ViewMode::Global, global(roster, &needle))
}

fn scoped(roster: &RosterStore, class_id: ClassId) -> Vec<StudentRow> {
    let mut rows: Vec<StudentRow> = roster
        .students(class_id)
        .iter()
        .map(|n| StudentRow::new(class_id, n))
        .collect();
    rows.sort_by(|a, b| collate(&a.name, &b.name));
    rows
}

fn global(roster: &RosterStore, folded_needle: &str) -> Vec<StudentRow> {
    let mut rows: Vec<StudentRow> = roster
        .iter()
        .flat_map(|(class_id, names)| {
            names
                .iter()
                .filter(|n| contains_folded(n, folded_needle))
                .map(move |n| StudentRow::new(class_id, n))
        })
        .collect();
    rows.sort_by(|a, b| collate(a.class_name, b.class_name).then_with(|| collate(&a.name, &b.name)));
    rows
}

/// Stops whose apartment or stop text contains `term`. A blank term searches for
/// `default_term` instead of matching everything.
pub fn search_stops<'a>(stops: &'a [BusStop], term: &str, default_term: &str) -> Vec<&'a BusStop> {
    let mut needle = fold(term);
    if needle.is_empty() {
        needle = fold(default_term);
    }
    let mut hits: Vec<&BusStop> = stops
        .iter()
        .filter(|s| contains_folded(&s.apt, &needle) || contains_folded(&s.stop, &needle))
        .collect();
    hits.sort_by(|a, b| collate(&a.apt, &b.apt));
    hits
}
