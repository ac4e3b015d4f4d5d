//! Counsellor statistics aggregation
//!
//! Three record sets (appointments, ratings, settings) are read independently,
//! reduced locally and combined into a [`CounsellorStats`] snapshot. A failed
//! read never aborts the snapshot: the affected field is marked
//! `Unavailable` and carries its display default.

use std::{collections::HashSet, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Days, FixedOffset, Months, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::{
    error::{AppError, AppResult},
    models::{
        appointment::Appointment,
        enums::AppointmentStatus,
        rating::Rating,
        settings::{self, CounsellorSettings},
        stats::{CounsellorStats, Measured, SnapshotStatus},
    },
    repository::Repository,
};

use super::stats_board::StatsBoard;

/// Read access to the record sets the statistics are computed from
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatsSource: Send + Sync {
    /// Appointments of a counsellor; an empty `statuses` slice means any status
    async fn appointments_for(
        &self,
        counsellor_id: &str,
        statuses: &[AppointmentStatus],
    ) -> AppResult<Vec<Appointment>>;

    async fn ratings_for(&self, counsellor_id: &str) -> AppResult<Vec<Rating>>;

    async fn settings_for(&self, counsellor_id: &str) -> AppResult<Option<CounsellorSettings>>;
}

#[async_trait]
impl StatsSource for Repository {
    async fn appointments_for(
        &self,
        counsellor_id: &str,
        statuses: &[AppointmentStatus],
    ) -> AppResult<Vec<Appointment>> {
        self.appointments.list_for_counsellor(counsellor_id, statuses).await
    }

    async fn ratings_for(&self, counsellor_id: &str) -> AppResult<Vec<Rating>> {
        self.ratings.list_for_counsellor(counsellor_id).await
    }

    async fn settings_for(&self, counsellor_id: &str) -> AppResult<Option<CounsellorSettings>> {
        self.settings.find(counsellor_id).await
    }
}

// ---------------------------------------------------------------------------
// Reducers
// ---------------------------------------------------------------------------

/// Distinct clients among completed or confirmed appointments
pub fn count_distinct_clients(appointments: &[Appointment]) -> u64 {
    appointments
        .iter()
        .filter(|a| AppointmentStatus::ENGAGED.contains(&a.status))
        .filter(|a| !a.user_id.is_empty())
        .map(|a| a.user_id.as_str())
        .collect::<HashSet<_>>()
        .len() as u64
}

/// `[first instant of the month, first instant of the next month)` for the
/// calendar month containing `now`, in `now`'s offset
pub fn month_bounds(now: DateTime<FixedOffset>) -> (DateTime<Utc>, DateTime<Utc>) {
    let local_date = now.date_naive();
    let first = local_date - Days::new(u64::from(local_date.day0()));
    let next = first + Months::new(1);
    let offset = *now.offset();
    (local_midnight_utc(first, offset), local_midnight_utc(next, offset))
}

fn local_midnight_utc(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    let local = date.and_time(NaiveTime::MIN);
    Utc.from_utc_datetime(&(local - chrono::Duration::seconds(i64::from(offset.local_minus_utc()))))
}

/// Completed appointments dated within the month containing `now`
pub fn count_completed_in_month(appointments: &[Appointment], now: DateTime<FixedOffset>) -> u64 {
    let (start, end) = month_bounds(now);
    appointments
        .iter()
        .filter(|a| a.status == AppointmentStatus::Completed)
        .filter(|a| a.appointment_date >= start && a.appointment_date < end)
        .count() as u64
}

/// Mean of well-formed scores; 0 when there are none
pub fn mean_rating(ratings: &[Rating]) -> f64 {
    let (sum, count) = ratings
        .iter()
        .filter_map(Rating::score)
        .fold((0.0, 0u32), |(sum, count), score| (sum + score, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / f64::from(count)
    }
}

/// Weekly whole hours from a settings record; 0 without one
pub fn hours_from_settings(record: Option<&CounsellorSettings>) -> f64 {
    record.map_or(0.0, |s| settings::weekly_hours(&s.working_hours))
}

fn measured<T: Default>(what: &str, counsellor_id: &str, result: AppResult<T>) -> Measured<T> {
    match result {
        Ok(value) => Measured::ok(value),
        Err(e) => {
            tracing::warn!(counsellor_id, "Failed to compute {}: {}", what, e);
            Measured::unavailable()
        }
    }
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct StatsService {
    source: Arc<dyn StatsSource>,
}

impl StatsService {
    pub fn new(source: Arc<dyn StatsSource>) -> Self {
        Self { source }
    }

    pub async fn compute_total_clients(&self, counsellor_id: &str) -> Measured<u64> {
        let result = self
            .source
            .appointments_for(counsellor_id, &AppointmentStatus::ENGAGED)
            .await
            .map(|rows| count_distinct_clients(&rows));
        measured("total clients", counsellor_id, result)
    }

    /// Reads every appointment of the counsellor and filters the month in memory
    pub async fn compute_sessions_this_month(
        &self,
        counsellor_id: &str,
        now: DateTime<FixedOffset>,
    ) -> Measured<u64> {
        let result = self
            .source
            .appointments_for(counsellor_id, &[])
            .await
            .map(|rows| count_completed_in_month(&rows, now));
        measured("sessions this month", counsellor_id, result)
    }

    pub async fn compute_average_rating(&self, counsellor_id: &str) -> Measured<f64> {
        let result = self
            .source
            .ratings_for(counsellor_id)
            .await
            .map(|rows| mean_rating(&rows));
        measured("average rating", counsellor_id, result)
    }

    pub async fn compute_hours_available(&self, counsellor_id: &str) -> Measured<f64> {
        let result = self
            .source
            .settings_for(counsellor_id)
            .await
            .map(|record| hours_from_settings(record.as_ref()));
        measured("hours available", counsellor_id, result)
    }

    /// Run the four computations concurrently and combine them
    pub async fn compute(&self, counsellor_id: &str, now: DateTime<FixedOffset>) -> CounsellorStats {
        let (total_clients, sessions_this_month, average_rating, hours_available) = tokio::join!(
            self.compute_total_clients(counsellor_id),
            self.compute_sessions_this_month(counsellor_id, now),
            self.compute_average_rating(counsellor_id),
            self.compute_hours_available(counsellor_id),
        );

        CounsellorStats {
            total_clients,
            sessions_this_month,
            average_rating,
            hours_available,
        }
    }

    /// Refresh `board` with a fresh snapshot for `counsellor_id`.
    ///
    /// A blank id is a no-op. When every source fails the board keeps its
    /// previous snapshot and raises its error flag. Returns whether the board
    /// accepted the outcome; a refresh overtaken by a newer one is dropped.
    pub async fn fetch_counsellor_stats(
        &self,
        board: &StatsBoard,
        counsellor_id: &str,
        now: DateTime<FixedOffset>,
    ) -> bool {
        let counsellor_id = counsellor_id.trim();
        if counsellor_id.is_empty() {
            tracing::warn!("No counsellor id provided for stats calculation");
            return false;
        }

        let token = board.begin(counsellor_id);
        tracing::debug!(counsellor_id, revision = token.revision(), "Fetching counsellor stats");

        let stats = self.compute(counsellor_id, now).await;

        match stats.status() {
            SnapshotStatus::Unavailable => {
                let err = AppError::Internal(format!(
                    "No statistics source could be read for counsellor {}",
                    counsellor_id
                ));
                board.fail(token, err.to_string())
            }
            status => {
                tracing::info!(
                    counsellor_id,
                    ?status,
                    total_clients = stats.total_clients.value,
                    sessions_this_month = stats.sessions_this_month.value,
                    average_rating = stats.average_rating.value,
                    hours_available = stats.hours_available.value,
                    "Counsellor stats calculated"
                );
                board.publish(token, stats)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        enums::SessionType,
        settings::{DaySchedule, WorkingHours},
        stats::{BoardState, FieldStatus},
    };
    use chrono::Duration;
    use sqlx::types::Json;
    use uuid::Uuid;

    fn now() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2026-10-19T12:00:00+00:00").unwrap()
    }

    fn appointment(client: &str, status: AppointmentStatus, date: &str) -> Appointment {
        let at = DateTime::parse_from_rfc3339(date).unwrap().with_timezone(&Utc);
        Appointment {
            id: Uuid::new_v4(),
            counsellor_id: "counsellor-x".to_string(),
            user_id: client.to_string(),
            appointment_date: at,
            duration: 50,
            session_type: SessionType::Video,
            status,
            user_notes: None,
            created_at: at - Duration::days(7),
            updated_at: at,
        }
    }

    fn rating(score: Option<i16>) -> Rating {
        Rating {
            id: Uuid::new_v4(),
            counsellor_id: "counsellor-x".to_string(),
            user_id: "client".to_string(),
            appointment_id: Uuid::new_v4(),
            rating: score,
            review: None,
            created_at: Utc::now(),
        }
    }

    fn monday_only_settings() -> CounsellorSettings {
        let mut hours = WorkingHours::new();
        hours.insert(
            "monday".into(),
            DaySchedule { enabled: true, start: Some("09:00".into()), end: Some("17:00".into()) },
        );
        hours.insert(
            "tuesday".into(),
            DaySchedule { enabled: false, start: Some("09:00".into()), end: Some("17:00".into()) },
        );
        CounsellorSettings {
            counsellor_id: "counsellor-x".to_string(),
            working_hours: Json(hours),
            updated_at: Utc::now(),
        }
    }

    fn sample_appointments() -> Vec<Appointment> {
        vec![
            appointment("A", AppointmentStatus::Completed, "2026-10-01T09:00:00Z"),
            appointment("A", AppointmentStatus::Completed, "2026-10-08T09:00:00Z"),
            appointment("B", AppointmentStatus::Confirmed, "2026-10-22T09:00:00Z"),
            appointment("C", AppointmentStatus::Cancelled, "2026-10-02T09:00:00Z"),
            appointment("D", AppointmentStatus::Completed, "2026-09-01T09:00:00Z"),
        ]
    }

    /// A source where every read succeeds with the sample data
    fn healthy_source() -> MockStatsSource {
        let mut source = MockStatsSource::new();
        source
            .expect_appointments_for()
            .returning(|_, _| Ok(sample_appointments()));
        source
            .expect_ratings_for()
            .returning(|_| Ok(vec![rating(Some(5)), rating(Some(4)), rating(Some(5))]));
        source
            .expect_settings_for()
            .returning(|_| Ok(Some(monday_only_settings())));
        source
    }

    fn service(source: MockStatsSource) -> StatsService {
        StatsService::new(Arc::new(source))
    }

    #[test]
    fn test_distinct_clients_respects_status() {
        let rows = vec![
            appointment("A", AppointmentStatus::Completed, "2026-10-01T09:00:00Z"),
            appointment("A", AppointmentStatus::Completed, "2026-10-02T09:00:00Z"),
            appointment("B", AppointmentStatus::Confirmed, "2026-10-03T09:00:00Z"),
            appointment("C", AppointmentStatus::Cancelled, "2026-10-04T09:00:00Z"),
        ];
        assert_eq!(count_distinct_clients(&rows), 2);
        assert_eq!(count_distinct_clients(&[]), 0);
    }

    #[test]
    fn test_blank_client_ids_are_ignored() {
        let rows = vec![
            appointment("", AppointmentStatus::Completed, "2026-10-01T09:00:00Z"),
            appointment("A", AppointmentStatus::Completed, "2026-10-01T09:00:00Z"),
        ];
        assert_eq!(count_distinct_clients(&rows), 1);
    }

    #[test]
    fn test_month_window_excludes_prior_month() {
        let rows = vec![
            appointment("A", AppointmentStatus::Completed, "2026-10-01T00:00:00Z"),
            appointment("B", AppointmentStatus::Completed, "2026-09-01T00:00:00Z"),
            appointment("C", AppointmentStatus::Confirmed, "2026-10-05T00:00:00Z"),
            appointment("D", AppointmentStatus::Completed, "2026-11-01T00:00:00Z"),
        ];
        assert_eq!(count_completed_in_month(&rows, now()), 1);
    }

    #[test]
    fn test_month_window_uses_caller_offset() {
        // 23:30 UTC on 30 September is already 1 October at +02:00
        let late = appointment("A", AppointmentStatus::Completed, "2026-09-30T23:30:00Z");
        let paris = DateTime::parse_from_rfc3339("2026-10-19T12:00:00+02:00").unwrap();
        assert_eq!(count_completed_in_month(std::slice::from_ref(&late), paris), 1);
        assert_eq!(count_completed_in_month(std::slice::from_ref(&late), now()), 0);
    }

    #[test]
    fn test_month_bounds_roll_over_year() {
        let december = DateTime::parse_from_rfc3339("2026-12-31T23:59:59+00:00").unwrap();
        let (start, end) = month_bounds(december);
        assert_eq!(start.to_rfc3339(), "2026-12-01T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2027-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_mean_rating() {
        let ratings = vec![rating(Some(5)), rating(Some(4)), rating(Some(5))];
        assert!((mean_rating(&ratings) - 14.0 / 3.0).abs() < 1e-9);
        assert_eq!(mean_rating(&[]), 0.0);
    }

    #[test]
    fn test_mean_rating_skips_malformed() {
        let ratings = vec![rating(Some(4)), rating(None), rating(Some(0)), rating(Some(2))];
        assert_eq!(mean_rating(&ratings), 3.0);

        let only_bad = vec![rating(None), rating(Some(11))];
        let mean = mean_rating(&only_bad);
        assert_eq!(mean, 0.0);
        assert!(!mean.is_nan());
    }

    #[test]
    fn test_hours_from_settings() {
        assert_eq!(hours_from_settings(Some(&monday_only_settings())), 8.0);
        assert_eq!(hours_from_settings(None), 0.0);
    }

    #[tokio::test]
    async fn test_compute_full_snapshot() {
        let stats = service(healthy_source()).compute("counsellor-x", now()).await;

        assert_eq!(stats.total_clients, Measured::ok(3));
        assert_eq!(stats.sessions_this_month, Measured::ok(2));
        assert!((stats.average_rating.value - 14.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.hours_available, Measured::ok(8.0));
        assert_eq!(stats.status(), SnapshotStatus::Ok);
    }

    #[tokio::test]
    async fn test_empty_counsellor_is_all_zero_and_ok() {
        let mut source = MockStatsSource::new();
        source.expect_appointments_for().returning(|_, _| Ok(vec![]));
        source.expect_ratings_for().returning(|_| Ok(vec![]));
        source.expect_settings_for().returning(|_| Ok(None));

        let stats = service(source).compute("counsellor-x", now()).await;
        assert_eq!(stats.total_clients, Measured::ok(0));
        assert_eq!(stats.sessions_this_month, Measured::ok(0));
        assert_eq!(stats.average_rating, Measured::ok(0.0));
        assert_eq!(stats.hours_available, Measured::ok(0.0));
    }

    #[tokio::test]
    async fn test_ratings_failure_is_isolated() {
        let mut source = MockStatsSource::new();
        source
            .expect_appointments_for()
            .returning(|_, _| Ok(sample_appointments()));
        source
            .expect_ratings_for()
            .returning(|_| Err(AppError::Internal("ratings read timed out".into())));
        source
            .expect_settings_for()
            .returning(|_| Ok(Some(monday_only_settings())));

        let stats = service(source).compute("counsellor-x", now()).await;
        assert_eq!(stats.average_rating.value, 0.0);
        assert_eq!(stats.average_rating.status, FieldStatus::Unavailable);
        assert_eq!(stats.total_clients, Measured::ok(3));
        assert_eq!(stats.sessions_this_month, Measured::ok(2));
        assert_eq!(stats.hours_available, Measured::ok(8.0));
        assert_eq!(stats.status(), SnapshotStatus::PartiallyUnavailable);
    }

    #[tokio::test]
    async fn test_refetch_on_same_board_is_idempotent() {
        let stats = service(healthy_source());
        let board = StatsBoard::new();

        assert!(stats.fetch_counsellor_stats(&board, "counsellor-x", now()).await);
        let first = board.view();
        assert!(stats.fetch_counsellor_stats(&board, "counsellor-x", now()).await);
        let second = board.view();

        assert_eq!(first.state, BoardState::Ready);
        assert_eq!(second.state, BoardState::Ready);
        assert!(second.revision > first.revision);
        assert!(second.error.is_none());
        assert_eq!(
            serde_json::to_string(&first.stats).unwrap(),
            serde_json::to_string(&second.stats).unwrap()
        );
    }

    #[tokio::test]
    async fn test_blank_id_is_noop() {
        let board = StatsBoard::new();
        let published = service(MockStatsSource::new())
            .fetch_counsellor_stats(&board, "   ", now())
            .await;

        assert!(!published);
        let view = board.view();
        assert_eq!(view.state, BoardState::Idle);
        assert!(view.stats.is_none());
        assert!(view.error.is_none());
    }

    #[tokio::test]
    async fn test_total_outage_flags_error_and_keeps_previous() {
        let board = StatsBoard::new();
        service(healthy_source())
            .fetch_counsellor_stats(&board, "counsellor-x", now())
            .await;
        let previous = board.view().stats;

        let mut broken = MockStatsSource::new();
        broken
            .expect_appointments_for()
            .returning(|_, _| Err(AppError::Internal("offline".into())));
        broken
            .expect_ratings_for()
            .returning(|_| Err(AppError::Internal("offline".into())));
        broken
            .expect_settings_for()
            .returning(|_| Err(AppError::Internal("offline".into())));

        let published = service(broken)
            .fetch_counsellor_stats(&board, "counsellor-x", now())
            .await;
        assert!(published);

        let view = board.view();
        assert_eq!(view.state, BoardState::Stale);
        assert!(view.error.is_some());
        assert_eq!(view.stats, previous);
    }
}
