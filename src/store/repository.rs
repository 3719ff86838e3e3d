//! Repository for roster mutations.
//!
//! Every mutation validates, applies, bumps the revision, marks the store dirty
//! and emits its broadcast event while holding the store lock, so events leave
//! in the same order the mutations were applied.

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::Rng;
use tokio::sync::Mutex;

use super::RosterStore;
use crate::broadcast::{ClientMessage, Event, Hub, Subscription};
use crate::errors::AppError;
use crate::models::{
    clamp_points, AddStudentRequest, BulkAdjustResponse, ClassHistoryResponse, ClassRecord,
    ClassStudentsResponse, CreateClassRequest, DeleteStudentResponse, PointsResponse, Student,
    StudentUpdates, UpdatePointsRequest,
};
use crate::persistence::SaveTrigger;
use crate::rollover::{self, Clock};

/// Result of a successful mutation together with the revision it produced.
#[derive(Debug, Clone)]
pub struct Applied<T> {
    pub data: T,
    pub revision: i64,
}

/// Owner of the roster store; the only place it is mutated.
pub struct Repository {
    store: Mutex<RosterStore>,
    hub: Arc<Hub>,
    saver: Arc<SaveTrigger>,
    clock: Arc<dyn Clock>,
}

impl Repository {
    pub fn new(
        store: RosterStore,
        hub: Arc<Hub>,
        saver: Arc<SaveTrigger>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store: Mutex::new(store),
            hub,
            saver,
            clock,
        }
    }

    /// Current store revision.
    pub async fn revision(&self) -> i64 {
        self.store.lock().await.revision()
    }

    /// Clone of every class record.
    pub async fn list_classes(&self) -> BTreeMap<String, ClassRecord> {
        self.store.lock().await.classes().clone()
    }

    /// Clone of the store, used by the persistence sidecar.
    pub async fn snapshot(&self) -> RosterStore {
        self.store.lock().await.clone()
    }

    /// Class names and total student count.
    pub async fn stats(&self) -> (usize, usize) {
        let store = self.store.lock().await;
        (store.list().len(), store.student_count())
    }

    /// Name/points roster for one class.
    pub async fn class_students(&self, class_name: &str) -> Result<ClassStudentsResponse, AppError> {
        let store = self.store.lock().await;
        let class = store
            .get(class_name)
            .ok_or_else(|| AppError::ClassNotFound(class_name.to_string()))?;

        Ok(ClassStudentsResponse {
            students: class.summaries(),
            current_week_key: class.current_week_key.clone(),
        })
    }

    /// Weekly archive for one class.
    pub async fn class_history(&self, class_name: &str) -> Result<ClassHistoryResponse, AppError> {
        let store = self.store.lock().await;
        let class = store
            .get(class_name)
            .ok_or_else(|| AppError::ClassNotFound(class_name.to_string()))?;

        Ok(ClassHistoryResponse {
            current_week_key: class.current_week_key.clone(),
            weekly_history: class.weekly_history.clone(),
        })
    }

    /// Register an event-channel connection. The full-state frame is queued
    /// under the store lock so no mutation can slip in ahead of it.
    pub async fn subscribe(&self, user_agent: &str) -> Subscription {
        let store = self.store.lock().await;
        let first = Event::FullState {
            revision: store.revision(),
            classes: store.classes().clone(),
        };
        self.hub.subscribe(&first, user_agent)
    }

    /// Bump the revision, schedule a save and broadcast. Called with the lock held.
    fn commit(&self, store: &mut RosterStore, event: impl FnOnce(i64) -> Event) -> i64 {
        let revision = store.bump_revision();
        self.saver.mark_dirty();
        self.hub.emit(&event(revision));
        revision
    }

    // ==================== CLASS OPERATIONS ====================

    /// Create an empty class on the current week.
    pub async fn create_class(
        &self,
        request: &CreateClassRequest,
    ) -> Result<Applied<ClassRecord>, AppError> {
        let class_name = request.class_name.trim();
        if class_name.is_empty() {
            return Err(AppError::InvalidInput("Class name is required".to_string()));
        }

        let mut store = self.store.lock().await;
        if store.contains(class_name) {
            return Err(AppError::ClassAlreadyExists(class_name.to_string()));
        }

        let record = ClassRecord::new(
            class_name,
            Some(self.clock.week_key()),
            &self.clock.timestamp(),
        );
        store.put(class_name, record.clone());

        let revision = self.commit(&mut store, |revision| Event::ClassCreated {
            revision,
            class_name: class_name.to_string(),
            class: record.clone(),
        });

        tracing::info!("Created class {}", class_name);
        Ok(Applied {
            data: record,
            revision,
        })
    }

    /// Delete a class and all of its students.
    pub async fn delete_class(&self, class_name: &str) -> Result<Applied<()>, AppError> {
        let mut store = self.store.lock().await;
        let removed = store
            .delete(class_name)
            .ok_or_else(|| AppError::ClassNotFound(class_name.to_string()))?;

        let revision = self.commit(&mut store, |revision| Event::ClassDeleted {
            revision,
            class_name: class_name.to_string(),
        });

        tracing::info!(
            "Deleted class {} with {} students",
            class_name,
            removed.students.len()
        );
        Ok(Applied { data: (), revision })
    }

    /// Manually zero every student's points. Does not archive.
    pub async fn reset_week(&self, class_name: &str) -> Result<Applied<()>, AppError> {
        let now = self.clock.timestamp();
        let mut store = self.store.lock().await;
        store
            .get_mut(class_name)
            .ok_or_else(|| AppError::ClassNotFound(class_name.to_string()))?
            .reset_points(&now);

        let revision = self.commit(&mut store, |revision| Event::WeekReset {
            revision,
            class_name: class_name.to_string(),
            timestamp: now,
        });

        Ok(Applied { data: (), revision })
    }

    /// Add +1 or -1 to every student in the class.
    pub async fn adjust_all(
        &self,
        class_name: &str,
        change: i64,
    ) -> Result<Applied<BulkAdjustResponse>, AppError> {
        let now = self.clock.timestamp();
        let mut store = self.store.lock().await;
        let class = store
            .get_mut(class_name)
            .ok_or_else(|| AppError::ClassNotFound(class_name.to_string()))?;

        if change != 1 && change != -1 {
            return Err(AppError::InvalidInput(
                "Change must be +1 or -1".to_string(),
            ));
        }

        class.adjust_all(change, &now);

        let revision = self.commit(&mut store, |revision| Event::AllPointsUpdated {
            revision,
            class_name: class_name.to_string(),
            change,
            timestamp: now,
        });

        Ok(Applied {
            data: BulkAdjustResponse { change },
            revision,
        })
    }

    // ==================== STUDENT OPERATIONS ====================

    /// Append a student with zero points.
    pub async fn add_student(
        &self,
        class_name: &str,
        request: &AddStudentRequest,
    ) -> Result<Applied<Student>, AppError> {
        let now = self.clock.timestamp();
        let mut store = self.store.lock().await;
        let class = store
            .get_mut(class_name)
            .ok_or_else(|| AppError::ClassNotFound(class_name.to_string()))?;

        let name = request.student.name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidInput(
                "Student name is required".to_string(),
            ));
        }

        let student = Student::new(
            name,
            request.student.avatar.clone(),
            request.student.has_custom_avatar.unwrap_or(false),
            &now,
        );
        class.students.push(student.clone());
        class.last_updated = now;

        let revision = self.commit(&mut store, |revision| Event::StudentAdded {
            revision,
            class_name: class_name.to_string(),
            student: student.clone(),
        });

        Ok(Applied {
            data: student,
            revision,
        })
    }

    /// Remove a student by id, reporting the index it held.
    pub async fn delete_student(
        &self,
        class_name: &str,
        student_id: &str,
    ) -> Result<Applied<DeleteStudentResponse>, AppError> {
        let now = self.clock.timestamp();
        let mut store = self.store.lock().await;
        let class = store
            .get_mut(class_name)
            .ok_or_else(|| AppError::ClassNotFound(class_name.to_string()))?;

        let student_index = class
            .position(student_id)
            .ok_or_else(|| student_not_found(class_name, student_id))?;
        let deleted_student = class.students.remove(student_index);
        class.last_updated = now.clone();

        let revision = self.commit(&mut store, |revision| Event::StudentDeleted {
            revision,
            class_name: class_name.to_string(),
            student_id: student_id.to_string(),
            student_index,
            timestamp: now,
        });

        Ok(Applied {
            data: DeleteStudentResponse {
                deleted_student,
                student_index,
            },
            revision,
        })
    }

    /// Set absolute points or apply a delta against the current server value.
    pub async fn update_points(
        &self,
        class_name: &str,
        student_id: &str,
        request: &UpdatePointsRequest,
    ) -> Result<Applied<PointsResponse>, AppError> {
        let now = self.clock.timestamp();
        let mut store = self.store.lock().await;
        let student = store
            .get_mut(class_name)
            .ok_or_else(|| AppError::ClassNotFound(class_name.to_string()))?
            .student_mut(student_id)
            .ok_or_else(|| student_not_found(class_name, student_id))?;

        let points = match (request.points, request.change) {
            (Some(points), _) => clamp_points(points),
            (None, Some(change)) => clamp_points(student.points.saturating_add(change)),
            (None, None) => {
                return Err(AppError::InvalidInput(
                    "Either points or change is required".to_string(),
                ))
            }
        };
        student.points = points;
        student.last_updated = now.clone();

        let revision = self.commit(&mut store, |revision| Event::StudentPointsUpdated {
            revision,
            class_name: class_name.to_string(),
            student_id: student_id.to_string(),
            points,
            timestamp: now.clone(),
        });

        Ok(Applied {
            data: PointsResponse {
                student_id: student_id.to_string(),
                points,
                timestamp: now,
            },
            revision,
        })
    }

    /// Merge name/avatar/hasCustomAvatar into a student.
    pub async fn update_student(
        &self,
        class_name: &str,
        student_id: &str,
        updates: &StudentUpdates,
    ) -> Result<Applied<Student>, AppError> {
        let now = self.clock.timestamp();
        let mut store = self.store.lock().await;
        let class = store
            .get_mut(class_name)
            .ok_or_else(|| AppError::ClassNotFound(class_name.to_string()))?;
        let student = class
            .student_mut(student_id)
            .ok_or_else(|| student_not_found(class_name, student_id))?;

        if updates.is_empty() {
            return Err(AppError::InvalidInput(
                "One of name, avatar or hasCustomAvatar is required".to_string(),
            ));
        }
        let mut updates = updates.clone();
        if let Some(name) = updates.name.as_mut() {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                return Err(AppError::InvalidInput(
                    "Student name cannot be empty".to_string(),
                ));
            }
            *name = trimmed.to_string();
        }

        student.apply_updates(&updates);
        student.last_updated = now.clone();
        let student = student.clone();
        class.last_updated = now.clone();

        let revision = self.commit(&mut store, |revision| Event::StudentUpdated {
            revision,
            class_name: class_name.to_string(),
            student_id: student_id.to_string(),
            updates,
            timestamp: now,
        });

        Ok(Applied {
            data: student,
            revision,
        })
    }

    // ==================== ROLLOVER ====================

    /// Roll every class whose week key differs from today's. Returns the rolled class names.
    pub async fn run_rollover(&self) -> Vec<String> {
        let week_key = self.clock.week_key();
        let now = self.clock.timestamp();
        let mut store = self.store.lock().await;

        let transitions: Vec<(String, Option<String>)> = store
            .classes_mut()
            .filter_map(|(name, class)| {
                rollover::roll_class(class, &week_key, &now).map(|prev| (name.clone(), prev))
            })
            .collect();

        for (class_name, previous_week_key) in &transitions {
            tracing::info!(
                "Rolled class {} from {:?} to {}",
                class_name,
                previous_week_key,
                week_key
            );
            self.commit(&mut store, |revision| Event::RolloverOccurred {
                revision,
                class_name: class_name.clone(),
                previous_week_key: previous_week_key.clone(),
                week_key: week_key.clone(),
                timestamp: now.clone(),
            });
        }

        transitions.into_iter().map(|(name, _)| name).collect()
    }

    // ==================== EPHEMERAL ====================

    /// Validate a spotlight intent and relay it to every connection.
    pub async fn relay(&self, message: ClientMessage) -> Result<Event, AppError> {
        let store = self.store.lock().await;

        let event = match message {
            ClientMessage::SelectRandomStudent {
                class_name,
                student_index,
                student_id,
            } => {
                let class = store
                    .get(&class_name)
                    .ok_or_else(|| AppError::ClassNotFound(class_name.clone()))?;
                if class.students.is_empty() {
                    return Err(AppError::InvalidInput(
                        "No students available to select".to_string(),
                    ));
                }

                let index = match (student_index, student_id.as_deref()) {
                    (Some(index), _) => index,
                    (None, Some(id)) => class
                        .position(id)
                        .ok_or_else(|| student_not_found(&class_name, id))?,
                    (None, None) => rand::thread_rng().gen_range(0..class.students.len()),
                };
                let student = class.students.get(index).ok_or_else(|| {
                    AppError::InvalidInput(format!("Student index {} is out of range", index))
                })?;
                if let Some(id) = student_id.as_deref() {
                    if id != student.id {
                        return Err(AppError::InvalidInput(format!(
                            "Student {} is not at index {}",
                            id, index
                        )));
                    }
                }

                Event::StudentSelected {
                    student_index: index,
                    student_id: student.id.clone(),
                    class_name,
                }
            }
            ClientMessage::ClearSelection { class_name } => {
                if !store.contains(&class_name) {
                    return Err(AppError::ClassNotFound(class_name));
                }
                Event::SelectionCleared { class_name }
            }
        };

        self.hub.emit(&event);
        Ok(event)
    }
}

fn student_not_found(class_name: &str, student_id: &str) -> AppError {
    AppError::StudentNotFound {
        class_name: class_name.to_string(),
        student_id: student_id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewStudent;
    use crate::rollover::FixedClock;
    use chrono::NaiveDate;

    struct Harness {
        repo: Repository,
        hub: Arc<Hub>,
        saver: Arc<SaveTrigger>,
    }

    fn harness_on(date: NaiveDate) -> Harness {
        let hub = Arc::new(Hub::new());
        let saver = Arc::new(SaveTrigger::new());
        let repo = Repository::new(
            RosterStore::new(),
            Arc::clone(&hub),
            Arc::clone(&saver),
            Arc::new(FixedClock::on(date)),
        );
        Harness { repo, hub, saver }
    }

    fn harness() -> Harness {
        harness_on(NaiveDate::from_ymd_opt(2026, 10, 12).unwrap())
    }

    fn add_request(name: &str) -> AddStudentRequest {
        AddStudentRequest {
            student: NewStudent {
                name: name.to_string(),
                avatar: None,
                has_custom_avatar: None,
            },
        }
    }

    async fn class_with(h: &Harness, names: &[&str]) -> Vec<Student> {
        h.repo
            .create_class(&CreateClassRequest {
                class_name: "Bio 101".to_string(),
            })
            .await
            .unwrap();
        let mut students = Vec::new();
        for name in names {
            students.push(
                h.repo
                    .add_student("Bio 101", &add_request(name))
                    .await
                    .unwrap()
                    .data,
            );
        }
        students
    }

    fn delta(change: i64) -> UpdatePointsRequest {
        UpdatePointsRequest {
            points: None,
            change: Some(change),
        }
    }

    fn absolute(points: i64) -> UpdatePointsRequest {
        UpdatePointsRequest {
            points: Some(points),
            change: None,
        }
    }

    #[tokio::test]
    async fn test_three_increments_for_ann_only() {
        let h = harness();
        let students = class_with(&h, &["Ann", "Ben"]).await;

        for _ in 0..3 {
            h.repo
                .update_points("Bio 101", &students[0].id, &delta(1))
                .await
                .unwrap();
        }

        let roster = h.repo.class_students("Bio 101").await.unwrap();
        assert_eq!(roster.students[0].points, 3);
        assert_eq!(roster.students[1].points, 0);
    }

    #[tokio::test]
    async fn test_absolute_points_clamped_and_idempotent() {
        let h = harness();
        let students = class_with(&h, &["Ann"]).await;
        let ann = &students[0].id;

        let applied = h.repo.update_points("Bio 101", ann, &absolute(25)).await.unwrap();
        assert_eq!(applied.data.points, 20);

        let applied = h.repo.update_points("Bio 101", ann, &absolute(-5)).await.unwrap();
        assert_eq!(applied.data.points, 0);

        h.repo.update_points("Bio 101", ann, &absolute(7)).await.unwrap();
        let once = h.repo.class_students("Bio 101").await.unwrap().students;
        h.repo.update_points("Bio 101", ann, &absolute(7)).await.unwrap();
        let twice = h.repo.class_students("Bio 101").await.unwrap().students;
        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn test_large_deltas_stay_in_range() {
        let h = harness();
        let students = class_with(&h, &["Ann"]).await;
        let ann = &students[0].id;

        for change in [i64::MAX, -3, i64::MIN, 19, 4, -1] {
            let points = h
                .repo
                .update_points("Bio 101", ann, &delta(change))
                .await
                .unwrap()
                .data
                .points;
            assert!((0..=20).contains(&points));
        }
    }

    #[tokio::test]
    async fn test_bulk_decrement_floors_at_zero() {
        let h = harness();
        let students = class_with(&h, &["Ann", "Ben"]).await;
        h.repo
            .update_points("Bio 101", &students[1].id, &absolute(4))
            .await
            .unwrap();

        h.repo.adjust_all("Bio 101", -1).await.unwrap();

        let roster = h.repo.class_students("Bio 101").await.unwrap();
        assert_eq!(roster.students[0].points, 0);
        assert_eq!(roster.students[1].points, 3);
    }

    #[tokio::test]
    async fn test_bulk_rejects_other_deltas_without_broadcast() {
        let h = harness();
        class_with(&h, &["Ann"]).await;
        let mut sub = h.repo.subscribe("test").await;
        sub.try_recv().unwrap();
        let revision = h.repo.revision().await;

        let err = h.repo.adjust_all("Bio 101", 2).await.unwrap_err();

        assert!(matches!(err, AppError::InvalidInput(_)));
        assert_eq!(h.repo.revision().await, revision);
        assert!(sub.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_class_conflicts() {
        let h = harness();
        class_with(&h, &[]).await;

        let err = h
            .repo
            .create_class(&CreateClassRequest {
                class_name: "Bio 101".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err, AppError::ClassAlreadyExists("Bio 101".to_string()));
    }

    #[tokio::test]
    async fn test_created_class_starts_on_current_week() {
        let h = harness();
        class_with(&h, &[]).await;
        let roster = h.repo.class_students("Bio 101").await.unwrap();
        assert_eq!(roster.current_week_key.as_deref(), Some("2026-W42"));
    }

    #[tokio::test]
    async fn test_delete_keeps_remaining_ids_stable() {
        let h = harness();
        let students = class_with(&h, &["Ann", "Ben", "Cat"]).await;

        let applied = h
            .repo
            .delete_student("Bio 101", &students[1].id)
            .await
            .unwrap();
        assert_eq!(applied.data.student_index, 1);
        assert_eq!(applied.data.deleted_student.name, "Ben");

        let extra = h
            .repo
            .add_student("Bio 101", &add_request("Dan"))
            .await
            .unwrap()
            .data;

        let classes = h.repo.list_classes().await;
        let ids: Vec<&str> = classes["Bio 101"]
            .students
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(ids, vec![students[0].id.as_str(), students[2].id.as_str(), extra.id.as_str()]);
    }

    #[tokio::test]
    async fn test_missing_student_is_not_found() {
        let h = harness();
        class_with(&h, &["Ann"]).await;

        let err = h
            .repo
            .update_points("Bio 101", "nope", &delta(1))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::StudentNotFound { .. }));

        let err = h.repo.reset_week("Chem").await.unwrap_err();
        assert!(matches!(err, AppError::ClassNotFound(_)));
    }

    #[tokio::test]
    async fn test_points_request_needs_a_field() {
        let h = harness();
        let students = class_with(&h, &["Ann"]).await;

        let err = h
            .repo
            .update_points("Bio 101", &students[0].id, &UpdatePointsRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_profile_update_broadcasts_applied_fields() {
        let h = harness();
        let students = class_with(&h, &["Ann"]).await;
        let mut sub = h.repo.subscribe("test").await;
        sub.try_recv().unwrap();

        let updates = StudentUpdates {
            name: Some("  Annie ".to_string()),
            ..Default::default()
        };
        let applied = h
            .repo
            .update_student("Bio 101", &students[0].id, &updates)
            .await
            .unwrap();
        assert_eq!(applied.data.name, "Annie");

        let event: Event = serde_json::from_str(&sub.try_recv().unwrap()).unwrap();
        match event {
            Event::StudentUpdated { updates, .. } => {
                assert_eq!(updates.name.as_deref(), Some("Annie"));
                assert!(updates.avatar.is_none());
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_profile_update_checks_existence_before_payload() {
        let h = harness();
        let students = class_with(&h, &["Ann"]).await;
        let empty = StudentUpdates::default();

        let err = h
            .repo
            .update_student("Chem", &students[0].id, &empty)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ClassNotFound(_)));

        let err = h
            .repo
            .update_student("Bio 101", "nope", &empty)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::StudentNotFound { .. }));

        let err = h
            .repo
            .update_student("Bio 101", &students[0].id, &empty)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_mutation_marks_store_dirty() {
        let h = harness();
        assert!(!h.saver.take_dirty());
        class_with(&h, &[]).await;
        assert!(h.saver.take_dirty());
    }

    #[tokio::test]
    async fn test_rollover_runs_once_per_week_key() {
        let h = harness();
        let students = class_with(&h, &["Ann"]).await;
        h.repo
            .update_points("Bio 101", &students[0].id, &absolute(9))
            .await
            .unwrap();

        // Same week as creation: nothing to do
        assert!(h.repo.run_rollover().await.is_empty());

        let later = Repository::new(
            h.repo.snapshot().await,
            Arc::clone(&h.hub),
            Arc::clone(&h.saver),
            Arc::new(FixedClock::on(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap())),
        );
        let mut sub = later.subscribe("test").await;
        sub.try_recv().unwrap();

        assert_eq!(later.run_rollover().await, vec!["Bio 101".to_string()]);
        assert!(later.run_rollover().await.is_empty());

        let history = later.class_history("Bio 101").await.unwrap();
        assert_eq!(history.current_week_key.as_deref(), Some("2026-W43"));
        assert_eq!(history.weekly_history["2026-W42"][0].points, 9);
        assert_eq!(later.class_students("Bio 101").await.unwrap().students[0].points, 0);

        let event: Event = serde_json::from_str(&sub.try_recv().unwrap()).unwrap();
        assert!(matches!(event, Event::RolloverOccurred { .. }));
        assert!(sub.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_relay_validates_and_picks() {
        let h = harness();
        let students = class_with(&h, &["Ann", "Ben"]).await;

        let event = h
            .repo
            .relay(ClientMessage::SelectRandomStudent {
                class_name: "Bio 101".to_string(),
                student_index: None,
                student_id: None,
            })
            .await
            .unwrap();
        match event {
            Event::StudentSelected {
                student_index,
                student_id,
                ..
            } => assert_eq!(students[student_index].id, student_id),
            other => panic!("unexpected event {:?}", other),
        }

        let err = h
            .repo
            .relay(ClientMessage::SelectRandomStudent {
                class_name: "Bio 101".to_string(),
                student_index: Some(5),
                student_id: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        let revision = h.repo.revision().await;
        h.repo
            .relay(ClientMessage::ClearSelection {
                class_name: "Bio 101".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(h.repo.revision().await, revision);
    }
}
