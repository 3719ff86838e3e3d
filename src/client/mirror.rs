//! Local roster mirror and the event reducer.

use std::collections::BTreeMap;

use crate::broadcast::Event;
use crate::models::{clamp_points, ClassRecord, Student};
use crate::rollover;

/// Local copy of the roster store as seen through the event channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mirror {
    classes: BTreeMap<String, ClassRecord>,
    /// `None` until the first full-state frame arrives
    revision: Option<i64>,
    /// Spotlighted student index per class
    selections: BTreeMap<String, usize>,
}

impl Mirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_synced(&self) -> bool {
        self.revision.is_some()
    }

    pub fn revision(&self) -> Option<i64> {
        self.revision
    }

    pub fn classes(&self) -> &BTreeMap<String, ClassRecord> {
        &self.classes
    }

    pub fn class(&self, class_name: &str) -> Option<&ClassRecord> {
        self.classes.get(class_name)
    }

    pub(crate) fn class_mut(&mut self, class_name: &str) -> Option<&mut ClassRecord> {
        self.classes.get_mut(class_name)
    }

    pub fn selected(&self, class_name: &str) -> Option<usize> {
        self.selections.get(class_name).copied()
    }

    /// Apply one event. Returns false when the event was ignored.
    ///
    /// Persistent events older than or equal to the mirror's revision are
    /// dropped, so redelivery is harmless. Nothing but a full-state frame is
    /// applied before the mirror has synced.
    pub fn apply(&mut self, event: &Event) -> bool {
        match event {
            Event::FullState { revision, classes } => {
                self.classes = classes.clone();
                self.revision = Some(*revision);
                self.selections.clear();
                true
            }
            Event::StudentSelected {
                class_name,
                student_index,
                ..
            } => {
                let in_range = self
                    .classes
                    .get(class_name)
                    .is_some_and(|c| *student_index < c.students.len());
                if in_range {
                    self.selections.insert(class_name.clone(), *student_index);
                }
                in_range
            }
            Event::SelectionCleared { class_name } => {
                self.selections.remove(class_name);
                true
            }
            persistent => {
                let Some(current) = self.revision else {
                    return false;
                };
                let Some(revision) = persistent.revision() else {
                    return false;
                };
                if revision <= current {
                    return false;
                }
                self.reduce(persistent);
                self.revision = Some(revision);
                true
            }
        }
    }

    /// The transformation the server applied, replayed locally.
    fn reduce(&mut self, event: &Event) {
        match event {
            Event::ClassCreated {
                class_name, class, ..
            } => {
                self.classes.insert(class_name.clone(), class.clone());
            }
            Event::ClassDeleted { class_name, .. } => {
                self.classes.remove(class_name);
                self.selections.remove(class_name);
            }
            Event::StudentAdded {
                class_name,
                student,
                ..
            } => {
                if let Some(class) = self.classes.get_mut(class_name) {
                    upsert(&mut class.students, student);
                    class.last_updated = student.last_updated.clone();
                }
            }
            Event::StudentDeleted {
                class_name,
                student_id,
                student_index,
                timestamp,
                ..
            } => {
                self.remove_student(class_name, student_id, *student_index);
                if let Some(class) = self.classes.get_mut(class_name) {
                    class.last_updated = timestamp.clone();
                }
            }
            Event::StudentPointsUpdated {
                class_name,
                student_id,
                points,
                timestamp,
                ..
            } => {
                if let Some(student) = self.student_mut(class_name, student_id) {
                    student.points = clamp_points(*points);
                    student.last_updated = timestamp.clone();
                }
            }
            Event::StudentUpdated {
                class_name,
                student_id,
                updates,
                timestamp,
                ..
            } => {
                if let Some(class) = self.classes.get_mut(class_name) {
                    if let Some(student) = class.student_mut(student_id) {
                        student.apply_updates(updates);
                        student.last_updated = timestamp.clone();
                        class.last_updated = timestamp.clone();
                    }
                }
            }
            Event::WeekReset {
                class_name,
                timestamp,
                ..
            } => {
                if let Some(class) = self.classes.get_mut(class_name) {
                    class.reset_points(timestamp);
                }
            }
            Event::AllPointsUpdated {
                class_name,
                change,
                timestamp,
                ..
            } => {
                if let Some(class) = self.classes.get_mut(class_name) {
                    class.adjust_all(*change, timestamp);
                }
            }
            Event::RolloverOccurred {
                class_name,
                week_key,
                timestamp,
                ..
            } => {
                if let Some(class) = self.classes.get_mut(class_name) {
                    rollover::roll_class(class, week_key, timestamp);
                }
            }
            Event::FullState { .. }
            | Event::StudentSelected { .. }
            | Event::SelectionCleared { .. } => {}
        }
    }

    /// Drop a student by id and shift the class's selection past the removed slot.
    pub(crate) fn remove_student(&mut self, class_name: &str, student_id: &str, index: usize) {
        let Some(class) = self.classes.get_mut(class_name) else {
            return;
        };
        let before = class.students.len();
        class.students.retain(|s| s.id != student_id);
        if class.students.len() == before {
            return;
        }

        match self.selections.get(class_name).copied() {
            Some(selected) if selected == index => {
                self.selections.remove(class_name);
            }
            Some(selected) if selected > index => {
                self.selections.insert(class_name.to_string(), selected - 1);
            }
            _ => {}
        }
    }

    pub(crate) fn student_mut(&mut self, class_name: &str, student_id: &str) -> Option<&mut Student> {
        self.classes.get_mut(class_name)?.student_mut(student_id)
    }
}

fn upsert(students: &mut Vec<Student>, student: &Student) {
    match students.iter_mut().find(|s| s.id == student.id) {
        Some(existing) => *existing = student.clone(),
        None => students.push(student.clone()),
    }
}
