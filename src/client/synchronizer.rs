//! Optimistic intents and connection lifecycle on top of a [`Mirror`].

use std::time::Duration;

use super::Mirror;
use crate::broadcast::Event;
use crate::models::{clamp_points, StudentUpdates};

/// A user action applied locally before the server confirms it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    AdjustPoints {
        class_name: String,
        student_id: String,
        change: i64,
    },
    SetPoints {
        class_name: String,
        student_id: String,
        points: i64,
    },
    UpdateStudent {
        class_name: String,
        student_id: String,
        updates: StudentUpdates,
    },
    DeleteStudent {
        class_name: String,
        student_id: String,
    },
    ResetWeek {
        class_name: String,
    },
    AdjustAll {
        class_name: String,
        change: i64,
    },
}

impl Intent {
    fn apply_to(&self, mirror: &mut Mirror) {
        match self {
            Intent::AdjustPoints {
                class_name,
                student_id,
                change,
            } => {
                if let Some(student) = mirror.student_mut(class_name, student_id) {
                    student.points = clamp_points(student.points.saturating_add(*change));
                }
            }
            Intent::SetPoints {
                class_name,
                student_id,
                points,
            } => {
                if let Some(student) = mirror.student_mut(class_name, student_id) {
                    student.points = clamp_points(*points);
                }
            }
            Intent::UpdateStudent {
                class_name,
                student_id,
                updates,
            } => {
                if let Some(student) = mirror.student_mut(class_name, student_id) {
                    student.apply_updates(updates);
                }
            }
            Intent::DeleteStudent {
                class_name,
                student_id,
            } => {
                let index = mirror
                    .class(class_name)
                    .and_then(|c| c.position(student_id));
                if let Some(index) = index {
                    mirror.remove_student(class_name, student_id, index);
                }
            }
            Intent::ResetWeek { class_name } => {
                if let Some(class) = mirror.class_mut(class_name) {
                    for student in &mut class.students {
                        student.points = 0;
                    }
                }
            }
            Intent::AdjustAll { class_name, change } => {
                if let Some(class) = mirror.class_mut(class_name) {
                    for student in &mut class.students {
                        student.points = clamp_points(student.points.saturating_add(*change));
                    }
                }
            }
        }
    }
}

/// Handle for a pending intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntentId(u64);

/// Bounded reconnection schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// 1 for a fixed delay, 2 to double after every attempt
    pub multiplier: u32,
    pub max_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            multiplier: 1,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl ReconnectPolicy {
    /// Delay before the given 1-based attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self
            .multiplier
            .max(1)
            .saturating_pow(attempt.saturating_sub(1));
        self.base_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

/// Where the event channel stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Never connected yet
    Idle,
    Connected,
    /// Lost the channel; `attempt` retries have been scheduled so far
    Reconnecting { attempt: u32 },
    /// Retries exhausted; the user must retry manually
    GaveUp,
}

/// What the UI should show about connectivity, separate from operation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// Connected and holding a full snapshot
    Live,
    /// Connected, waiting for the full-state frame
    Syncing,
    /// Not connected
    Disconnected,
}

/// Client-side synchronizer: confirmed mirror, optimistic overlay and connection state.
#[derive(Debug, Clone)]
pub struct Synchronizer {
    confirmed: Mirror,
    pending: Vec<(IntentId, Intent)>,
    next_intent: u64,
    state: ConnectionState,
    policy: ReconnectPolicy,
}

impl Default for Synchronizer {
    fn default() -> Self {
        Self::new(ReconnectPolicy::default())
    }
}

impl Synchronizer {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            confirmed: Mirror::new(),
            pending: Vec::new(),
            next_intent: 0,
            state: ConnectionState::Idle,
            policy,
        }
    }

    /// State confirmed by the server.
    pub fn confirmed(&self) -> &Mirror {
        &self.confirmed
    }

    /// What to render: confirmed state with every pending intent applied on top.
    pub fn view(&self) -> Mirror {
        let mut view = self.confirmed.clone();
        for (_, intent) in &self.pending {
            intent.apply_to(&mut view);
        }
        view
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Record an intent for optimistic rendering until [`Synchronizer::settle`].
    pub fn begin(&mut self, intent: Intent) -> IntentId {
        self.next_intent += 1;
        let id = IntentId(self.next_intent);
        self.pending.push((id, intent));
        id
    }

    /// The request behind an intent finished, successfully or not. The
    /// authoritative event (if any) carries the real outcome.
    pub fn settle(&mut self, id: IntentId) {
        self.pending.retain(|(pending, _)| *pending != id);
    }

    /// Apply a pushed event to the confirmed mirror.
    pub fn handle_event(&mut self, event: &Event) -> bool {
        self.confirmed.apply(event)
    }

    /// Parse and apply one text frame from the event channel.
    pub fn handle_frame(&mut self, frame: &str) -> Result<bool, serde_json::Error> {
        let event: Event = serde_json::from_str(frame)?;
        Ok(self.handle_event(&event))
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn status(&self) -> SyncStatus {
        match self.state {
            ConnectionState::Connected if self.confirmed.is_synced() => SyncStatus::Live,
            ConnectionState::Connected => SyncStatus::Syncing,
            _ => SyncStatus::Disconnected,
        }
    }

    /// Mutation controls are usable only while live.
    pub fn controls_enabled(&self) -> bool {
        self.status() == SyncStatus::Live
    }

    /// The channel (re)opened. Missed events are not replayed, so the mirror is
    /// discarded and rebuilt from the next full-state frame.
    pub fn on_connected(&mut self) {
        self.state = ConnectionState::Connected;
        self.confirmed = Mirror::new();
    }

    /// The channel dropped.
    pub fn on_disconnected(&mut self) {
        if !matches!(self.state, ConnectionState::Reconnecting { .. } | ConnectionState::GaveUp) {
            self.state = ConnectionState::Reconnecting { attempt: 0 };
        }
    }

    /// Delay before the next reconnection attempt, or `None` once the policy is exhausted.
    pub fn next_retry(&mut self) -> Option<Duration> {
        match self.state {
            ConnectionState::Reconnecting { attempt } if attempt < self.policy.max_attempts => {
                let attempt = attempt + 1;
                self.state = ConnectionState::Reconnecting { attempt };
                Some(self.policy.delay_for(attempt))
            }
            ConnectionState::Reconnecting { .. } => {
                self.state = ConnectionState::GaveUp;
                None
            }
            _ => None,
        }
    }

    /// User asked to try again after giving up.
    pub fn retry_manually(&mut self) {
        if self.state == ConnectionState::GaveUp {
            self.state = ConnectionState::Reconnecting { attempt: 0 };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClassRecord, Student};
    use std::collections::BTreeMap;

    fn full_state(revision: i64, points: &[i64]) -> Event {
        let mut class = ClassRecord::new("Bio", None, "t0");
        for (i, p) in points.iter().enumerate() {
            class.students.push(Student {
                id: format!("s{}", i),
                name: format!("S{}", i),
                points: *p,
                avatar: String::new(),
                has_custom_avatar: false,
                last_updated: "t0".to_string(),
            });
        }
        Event::FullState {
            revision,
            classes: BTreeMap::from([("Bio".to_string(), class)]),
        }
    }

    fn live(points: &[i64]) -> Synchronizer {
        let mut sync = Synchronizer::default();
        sync.on_connected();
        sync.handle_event(&full_state(1, points));
        sync
    }

    fn view_points(sync: &Synchronizer) -> Vec<i64> {
        sync.view()
            .class("Bio")
            .unwrap()
            .students
            .iter()
            .map(|s| s.points)
            .collect()
    }

    #[test]
    fn test_optimistic_bulk_does_not_double_apply() {
        let mut sync = live(&[0, 5]);
        let id = sync.begin(Intent::AdjustAll {
            class_name: "Bio".to_string(),
            change: 1,
        });
        assert_eq!(view_points(&sync), vec![1, 6]);

        sync.handle_event(&Event::AllPointsUpdated {
            revision: 2,
            class_name: "Bio".to_string(),
            change: 1,
            timestamp: "t1".to_string(),
        });
        sync.settle(id);

        assert_eq!(view_points(&sync), vec![1, 6]);
        assert_eq!(sync.pending(), 0);
    }

    #[test]
    fn test_failed_intent_rolls_back_on_settle() {
        let mut sync = live(&[3]);
        let id = sync.begin(Intent::SetPoints {
            class_name: "Bio".to_string(),
            student_id: "s0".to_string(),
            points: 30,
        });
        assert_eq!(view_points(&sync), vec![20]);

        sync.settle(id);
        assert_eq!(view_points(&sync), vec![3]);
    }

    #[test]
    fn test_frames_parse_and_apply() {
        let mut sync = live(&[2]);
        let applied = sync
            .handle_frame(r#"{"type":"week-reset","revision":2,"className":"Bio"}"#)
            .unwrap();
        assert!(applied);
        assert_eq!(view_points(&sync), vec![0]);
        assert!(sync.handle_frame("not json").is_err());
    }

    #[test]
    fn test_controls_follow_connection() {
        let mut sync = Synchronizer::default();
        assert!(!sync.controls_enabled());

        sync.on_connected();
        assert_eq!(sync.status(), SyncStatus::Syncing);
        assert!(!sync.controls_enabled());

        sync.handle_event(&full_state(4, &[1]));
        assert!(sync.controls_enabled());

        sync.on_disconnected();
        assert_eq!(sync.status(), SyncStatus::Disconnected);
        assert!(!sync.controls_enabled());
    }

    #[test]
    fn test_reconnect_discards_mirror() {
        let mut sync = live(&[7]);
        sync.on_disconnected();
        sync.on_connected();

        assert!(!sync.confirmed().is_synced());
        assert!(sync.view().class("Bio").is_none());
    }

    #[test]
    fn test_retries_are_bounded() {
        let mut sync = Synchronizer::new(ReconnectPolicy {
            max_attempts: 2,
            ..Default::default()
        });
        sync.on_connected();
        sync.on_disconnected();

        assert_eq!(sync.next_retry(), Some(Duration::from_secs(1)));
        assert_eq!(sync.next_retry(), Some(Duration::from_secs(1)));
        assert_eq!(sync.next_retry(), None);
        assert_eq!(sync.state(), ConnectionState::GaveUp);

        sync.retry_manually();
        assert_eq!(sync.state(), ConnectionState::Reconnecting { attempt: 0 });
    }

    #[test]
    fn test_backoff_policy_caps_delay() {
        let policy = ReconnectPolicy {
            max_attempts: 10,
            base_delay: Duration::from_secs(1),
            multiplier: 2,
            max_delay: Duration::from_secs(5),
        };
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(3), Duration::from_secs(4));
        assert_eq!(policy.delay_for(8), Duration::from_secs(5));
    }
}
