//! Class record model and class-level request bodies.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{clamp_points, Student, StudentSummary};

/// A named roster of students with its weekly archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRecord {
    /// Filled from the map key when absent in a snapshot
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub students: Vec<Student>,
    /// Unset until the first rollover evaluation observes the class
    #[serde(default, alias = "currentWeek", skip_serializing_if = "Option::is_none")]
    pub current_week_key: Option<String>,
    /// Append-only: week key to the roster totals at the end of that week
    #[serde(default)]
    pub weekly_history: BTreeMap<String, Vec<StudentSummary>>,
    pub last_updated: String,
}

impl ClassRecord {
    pub fn new(name: &str, week_key: Option<String>, now: &str) -> Self {
        Self {
            name: name.to_string(),
            students: Vec::new(),
            current_week_key: week_key,
            weekly_history: BTreeMap::new(),
            last_updated: now.to_string(),
        }
    }

    pub fn student_mut(&mut self, student_id: &str) -> Option<&mut Student> {
        self.students.iter_mut().find(|s| s.id == student_id)
    }

    pub fn position(&self, student_id: &str) -> Option<usize> {
        self.students.iter().position(|s| s.id == student_id)
    }

    /// Roster as name/points pairs in roster order.
    pub fn summaries(&self) -> Vec<StudentSummary> {
        self.students.iter().map(StudentSummary::from).collect()
    }

    /// Zero every student's points.
    pub fn reset_points(&mut self, now: &str) {
        for student in &mut self.students {
            student.points = 0;
            student.last_updated = now.to_string();
        }
        self.last_updated = now.to_string();
    }

    /// Add `change` to every student, clamped.
    pub fn adjust_all(&mut self, change: i64, now: &str) {
        for student in &mut self.students {
            student.points = clamp_points(student.points.saturating_add(change));
            student.last_updated = now.to_string();
        }
        self.last_updated = now.to_string();
    }

    /// Repair a record read from disk: fill the name and clamp every score.
    pub fn normalize(&mut self, key: &str) {
        if self.name.is_empty() {
            self.name = key.to_string();
        }
        for student in &mut self.students {
            student.points = clamp_points(student.points);
        }
    }
}

/// Request body for creating a class.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClassRequest {
    #[serde(default)]
    pub class_name: String,
}

/// Request body for the bulk adjust operation.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkAdjustRequest {
    pub change: i64,
}

/// Response body for the bulk adjust operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkAdjustResponse {
    pub change: i64,
}

/// Roster read for one class.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassStudentsResponse {
    pub students: Vec<StudentSummary>,
    pub current_week_key: Option<String>,
}

/// Weekly archive read for one class.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassHistoryResponse {
    pub current_week_key: Option<String>,
    pub weekly_history: BTreeMap<String, Vec<StudentSummary>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(name: &str, points: i64) -> Student {
        let mut s = Student::new(name, None, false, "t0");
        s.points = points;
        s
    }

    #[test]
    fn test_adjust_all_clamps_floor() {
        let mut class = ClassRecord::new("Bio", None, "t0");
        class.students = vec![student("Ann", 0), student("Ben", 5)];

        class.adjust_all(-1, "t1");

        assert_eq!(class.students[0].points, 0);
        assert_eq!(class.students[1].points, 4);
    }

    #[test]
    fn test_normalize_fills_name_and_clamps() {
        let raw = serde_json::json!({
            "students": [{
                "id": "a1",
                "name": "Ann",
                "points": 42,
                "avatar": "x",
                "lastUpdated": "t0"
            }],
            "currentWeek": "Week 1",
            "lastUpdated": "t0"
        });
        let mut class: ClassRecord = serde_json::from_value(raw).unwrap();
        class.normalize("Legacy Class");

        assert_eq!(class.name, "Legacy Class");
        assert_eq!(class.students[0].points, 20);
        assert_eq!(class.current_week_key.as_deref(), Some("Week 1"));
        assert!(!class.students[0].has_custom_avatar);
    }
}
