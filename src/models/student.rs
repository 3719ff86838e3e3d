//! Student model and the request bodies that target a single student.

use serde::{Deserialize, Serialize};

/// Lowest participation score a student can hold.
pub const MIN_POINTS: i64 = 0;
/// Highest participation score a student can hold.
pub const MAX_POINTS: i64 = 20;

/// Clamp a score into the allowed range.
pub fn clamp_points(points: i64) -> i64 {
    points.clamp(MIN_POINTS, MAX_POINTS)
}

/// Avatar URL used when the client does not supply one.
pub fn default_avatar(name: &str) -> String {
    format!("https://api.dicebear.com/7.x/avataaars/svg?seed={}", name)
}

/// A student on a class roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    pub points: i64,
    /// URL or inline data URI
    pub avatar: String,
    #[serde(default)]
    pub has_custom_avatar: bool,
    pub last_updated: String,
}

impl Student {
    /// Build a fresh student with zero points and a newly generated id.
    pub fn new(name: &str, avatar: Option<String>, has_custom_avatar: bool, now: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            points: 0,
            avatar: avatar
                .filter(|a| !a.trim().is_empty())
                .unwrap_or_else(|| default_avatar(name)),
            has_custom_avatar,
            last_updated: now.to_string(),
        }
    }

    /// Apply profile updates. Only name, avatar and hasCustomAvatar are mutable this way.
    pub fn apply_updates(&mut self, updates: &StudentUpdates) {
        if let Some(name) = &updates.name {
            self.name = name.clone();
        }
        if let Some(avatar) = &updates.avatar {
            self.avatar = avatar.clone();
        }
        if let Some(has_custom_avatar) = updates.has_custom_avatar {
            self.has_custom_avatar = has_custom_avatar;
        }
    }
}

/// Name and points pair, used both for roster reads and the weekly archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentSummary {
    pub name: String,
    pub points: i64,
}

impl From<&Student> for StudentSummary {
    fn from(student: &Student) -> Self {
        Self {
            name: student.name.clone(),
            points: student.points,
        }
    }
}

/// Student fields supplied when adding to a class.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStudent {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub has_custom_avatar: Option<bool>,
}

/// Request body for adding a student.
#[derive(Debug, Clone, Deserialize)]
pub struct AddStudentRequest {
    pub student: NewStudent,
}

/// Request body for setting or adjusting points. `points` wins when both are present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePointsRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change: Option<i64>,
}

/// Profile fields that may be merged into a student. Also the broadcast payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentUpdates {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_custom_avatar: Option<bool>,
}

impl StudentUpdates {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.avatar.is_none() && self.has_custom_avatar.is_none()
    }
}

/// Response body after a points mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsResponse {
    pub student_id: String,
    pub points: i64,
    pub timestamp: String,
}

/// Response body after deleting a student.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteStudentResponse {
    pub deleted_student: Student,
    pub student_index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_points_bounds() {
        assert_eq!(clamp_points(25), MAX_POINTS);
        assert_eq!(clamp_points(-5), MIN_POINTS);
        assert_eq!(clamp_points(13), 13);
    }

    #[test]
    fn test_new_student_defaults_avatar_from_name() {
        let student = Student::new("Ann", None, false, "2026-01-05T00:00:00Z");
        assert_eq!(student.points, 0);
        assert_eq!(student.avatar, default_avatar("Ann"));
        assert!(!student.id.is_empty());
    }

    #[test]
    fn test_apply_updates_only_touches_given_fields() {
        let mut student = Student::new("Ann", None, false, "t0");
        student.points = 4;
        student.apply_updates(&StudentUpdates {
            avatar: Some("data:image/png;base64,AAAA".to_string()),
            has_custom_avatar: Some(true),
            ..Default::default()
        });

        assert_eq!(student.name, "Ann");
        assert_eq!(student.points, 4);
        assert!(student.has_custom_avatar);
        assert_eq!(student.avatar, "data:image/png;base64,AAAA");
    }

    #[test]
    fn test_updates_serialize_only_present_fields() {
        let updates = StudentUpdates {
            name: Some("Annie".to_string()),
            ..Default::default()
        };
        let value = serde_json::to_value(&updates).unwrap();
        assert_eq!(value, serde_json::json!({ "name": "Annie" }));
    }
}
