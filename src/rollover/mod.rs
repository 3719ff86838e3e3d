//! Weekly rollover: archive each class's totals and zero its points when the week changes.
//!
//! The only persistent state is `currentWeekKey` on each class. A pass compares
//! it with the key for today and applies the transition in one step.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Datelike, Local, NaiveDate, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::models::ClassRecord;
use crate::store::Repository;

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Instant used for `lastUpdated` stamps.
    fn now(&self) -> DateTime<Utc>;
    /// Calendar date used for the week key.
    fn today(&self) -> NaiveDate;

    fn timestamp(&self) -> String {
        self.now().to_rfc3339()
    }

    fn week_key(&self) -> String {
        week_key(self.today())
    }
}

/// Wall clock in the server's local time zone.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock pinned to one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    pub fn on(date: NaiveDate) -> Self {
        Self(date.and_time(chrono::NaiveTime::MIN).and_utc())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }

    fn today(&self) -> NaiveDate {
        self.0.date_naive()
    }
}

/// Week key as `YYYY-W<n>`.
///
/// `n = ceil((days since Jan 1 + weekday of Jan 1 + 1) / 7)` with weekdays counted
/// from Sunday = 0. Weeks therefore start on Sunday and week 1 may be a partial
/// week. This is not ISO-8601 and disagrees with it around year boundaries.
pub fn week_key(date: NaiveDate) -> String {
    let days_since_jan1 = i64::from(date.ordinal0());
    let jan1_weekday = NaiveDate::from_ymd_opt(date.year(), 1, 1)
        .map(|d| i64::from(d.weekday().num_days_from_sunday()))
        .unwrap_or(0);
    let week = (days_since_jan1 + jan1_weekday + 1 + 6) / 7;
    format!("{}-W{}", date.year(), week)
}

/// Roll one class into `now_key`.
///
/// Returns `None` when the class is already on that week, otherwise the key it
/// left (itself `None` for a class never observed before).
pub fn roll_class(class: &mut ClassRecord, now_key: &str, now: &str) -> Option<Option<String>> {
    if class.current_week_key.as_deref() == Some(now_key) {
        return None;
    }

    let previous = class.current_week_key.take();
    if let Some(previous_key) = &previous {
        // Archived weeks are never rewritten.
        class
            .weekly_history
            .entry(previous_key.clone())
            .or_insert_with(|| class.students.iter().map(Into::into).collect());
    }

    class.reset_points(now);
    class.current_week_key = Some(now_key.to_string());
    Some(previous)
}

/// Evaluate the rollover on a fixed interval until shutdown is signalled.
pub fn spawn_rollover(
    repo: Arc<Repository>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let rolled = repo.run_rollover().await;
                    if !rolled.is_empty() {
                        tracing::info!("Weekly rollover applied to {} classes", rolled.len());
                    }
                }
                _ = shutdown.changed() => {
                    tracing::debug!("Rollover task stopping");
                    break;
                }
            }
        }
    })
}
