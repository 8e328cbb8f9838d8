//! Week session state machine
//!
//! Owns the single "week currently being viewed": its identifier, publication
//! status, shift rows, loading flag, error message and pending-delete target.
//!
//! ```text
//! Idle ──select_week──▶ Loading(id) ──ok──▶ Ready(week, rows)
//!                           │                  │
//!                           └──err──▶ Failed(id)
//! navigate/reload from Ready|Failed re-enters Loading
//! ```
//!
//! Every network request is issued against a [`RequestTag`]. Selecting a week
//! bumps the session generation, so any response carrying an older tag is
//! discarded without side effects. Rows live inside the `Ready` phase next to
//! the week they belong to, so the displayed id and rows always change
//! together.
//!
//! Deleting rows of a published week is not rejected here; callers gate their
//! controls with [`SessionSnapshot::can_modify_row`].

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{error_message, ApiError, TransitionError};
use crate::types::{PublishWeekPayload, PublishedWeek, Shift, ShiftId, Week, WeekLite};
use crate::week::{self, WeekId, WeekWindow};

/// Identifies the session a request was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTag {
    pub week_id: WeekId,
    generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    pub tag: RequestTag,
    pub payload: PublishWeekPayload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    pub tag: RequestTag,
    pub shift_id: ShiftId,
}

/// What happened to a resolved response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// The response belonged to a superseded session and was dropped.
    Discarded,
}

/// Publication fields of a loaded week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedWeek {
    pub id: WeekId,
    pub is_published: bool,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum WeekPhase {
    #[default]
    Idle,
    Loading { week_id: WeekId },
    Ready { week: LoadedWeek, rows: Vec<Shift> },
    Failed { week_id: WeekId },
}

impl WeekPhase {
    fn week_id(&self) -> Option<WeekId> {
        match self {
            WeekPhase::Idle => None,
            WeekPhase::Loading { week_id } | WeekPhase::Failed { week_id } => Some(*week_id),
            WeekPhase::Ready { week, .. } => Some(week.id),
        }
    }

    fn kind(&self) -> PhaseKind {
        match self {
            WeekPhase::Idle => PhaseKind::Idle,
            WeekPhase::Loading { .. } => PhaseKind::Loading,
            WeekPhase::Ready { .. } => PhaseKind::Ready,
            WeekPhase::Failed { .. } => PhaseKind::Failed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseKind {
    Idle,
    Loading,
    Ready,
    Failed,
}

#[derive(Debug, Clone, Default)]
pub struct WeekState {
    phase: WeekPhase,
    generation: u64,
    error_message: String,
    pending_delete: Option<ShiftId>,
    publishing: bool,
    deleting: bool,
}

impl WeekState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &WeekPhase {
        &self.phase
    }

    pub fn week_id(&self) -> Option<WeekId> {
        self.phase.week_id()
    }

    pub fn rows(&self) -> &[Shift] {
        match &self.phase {
            WeekPhase::Ready { rows, .. } => rows,
            _ => &[],
        }
    }

    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    pub fn pending_delete(&self) -> Option<&ShiftId> {
        self.pending_delete.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, WeekPhase::Loading { .. })
    }

    fn current_tag(&self) -> Option<RequestTag> {
        self.week_id().map(|week_id| RequestTag {
            week_id,
            generation: self.generation,
        })
    }

    fn is_current(&self, tag: &RequestTag) -> bool {
        self.current_tag().as_ref() == Some(tag)
    }

    // ------------------------------------------------------------------------
    // Fetch
    // ------------------------------------------------------------------------

    /// Start viewing `week_id`. Legal from any phase; supersedes every
    /// outstanding request.
    pub fn select_week(&mut self, week_id: WeekId) -> RequestTag {
        self.generation = self.generation.wrapping_add(1);
        self.phase = WeekPhase::Loading { week_id };
        self.error_message.clear();
        self.pending_delete = None;
        self.publishing = false;
        self.deleting = false;
        log::debug!("week {} loading (generation {})", week_id, self.generation);

        RequestTag {
            week_id,
            generation: self.generation,
        }
    }

    /// Move `delta` weeks from the current one.
    pub fn navigate(&mut self, delta: i64) -> Result<RequestTag, TransitionError> {
        let current = self.settled_week_id()?;
        Ok(self.select_week(week::shift(current, delta)))
    }

    /// Fetch the current week again.
    pub fn reload(&mut self) -> Result<RequestTag, TransitionError> {
        let current = self.settled_week_id()?;
        Ok(self.select_week(current))
    }

    fn settled_week_id(&self) -> Result<WeekId, TransitionError> {
        match &self.phase {
            WeekPhase::Idle => Err(TransitionError::NoWeekSelected),
            WeekPhase::Loading { .. } => Err(TransitionError::FetchInFlight),
            WeekPhase::Ready { week, .. } => Ok(week.id),
            WeekPhase::Failed { week_id } => Ok(*week_id),
        }
    }

    pub fn resolve_fetch(&mut self, tag: RequestTag, result: Result<Week, ApiError>) -> Outcome {
        if !self.is_current(&tag) || !self.is_loading() {
            log::debug!("discarding stale fetch for week {}", tag.week_id);
            return Outcome::Discarded;
        }

        match result {
            Ok(week) => {
                log::info!(
                    "week {} loaded: {} shifts, published={}",
                    tag.week_id,
                    week.shifts.len(),
                    week.is_published
                );
                self.phase = WeekPhase::Ready {
                    week: LoadedWeek {
                        id: tag.week_id,
                        is_published: week.is_published,
                        published_at: week.published_at,
                    },
                    rows: week.shifts,
                };
                self.error_message.clear();
            }
            Err(err) => {
                log::warn!("week {} fetch failed: {}", tag.week_id, err);
                self.phase = WeekPhase::Failed {
                    week_id: tag.week_id,
                };
                self.error_message = error_message(&err);
            }
        }
        Outcome::Applied
    }

    // ------------------------------------------------------------------------
    // Publish
    // ------------------------------------------------------------------------

    pub fn begin_publish(&mut self, now: DateTime<Utc>) -> Result<PublishRequest, TransitionError> {
        let WeekPhase::Ready { week, rows } = &self.phase else {
            return Err(self.not_ready());
        };
        if week.is_published {
            return Err(TransitionError::AlreadyPublished);
        }
        if rows.is_empty() {
            return Err(TransitionError::NothingToPublish);
        }
        if self.publishing {
            return Err(TransitionError::PublishInFlight);
        }
        let tag = RequestTag {
            week_id: week.id,
            generation: self.generation,
        };

        self.publishing = true;
        Ok(PublishRequest {
            tag,
            payload: PublishWeekPayload::new(tag.week_id, now),
        })
    }

    pub fn resolve_publish(
        &mut self,
        tag: RequestTag,
        result: Result<PublishedWeek, ApiError>,
    ) -> Outcome {
        if !self.is_current(&tag) || !self.publishing {
            log::debug!("discarding stale publish for week {}", tag.week_id);
            return Outcome::Discarded;
        }
        self.publishing = false;

        let WeekPhase::Ready { week, rows } = &mut self.phase else {
            return Outcome::Discarded;
        };
        match result {
            Ok(published) => {
                log::info!("week {} published", week.id);
                week.is_published = published.is_published;
                week.published_at = published.published_at;
                *rows = published.shifts;
            }
            Err(err) => {
                log::warn!("week {} publish failed: {}", week.id, err);
                self.error_message = error_message(&err);
            }
        }
        Outcome::Applied
    }

    // ------------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------------

    /// Open the delete confirmation for `shift_id`.
    pub fn request_delete(&mut self, shift_id: ShiftId) -> Result<(), TransitionError> {
        if !matches!(self.phase, WeekPhase::Ready { .. }) {
            return Err(self.not_ready());
        }
        if self.deleting {
            return Err(TransitionError::DeleteInFlight);
        }
        self.pending_delete = Some(shift_id);
        Ok(())
    }

    /// Dismiss the delete confirmation.
    pub fn cancel_delete(&mut self) -> Result<(), TransitionError> {
        if self.deleting {
            return Err(TransitionError::DeleteInFlight);
        }
        self.pending_delete = None;
        Ok(())
    }

    /// Issue the delete for the pending target.
    pub fn begin_delete(&mut self) -> Result<DeleteRequest, TransitionError> {
        if !matches!(self.phase, WeekPhase::Ready { .. }) {
            return Err(self.not_ready());
        }
        if self.deleting {
            return Err(TransitionError::DeleteInFlight);
        }
        let (Some(tag), Some(shift_id)) = (self.current_tag(), self.pending_delete.clone()) else {
            return Err(TransitionError::NoPendingDelete);
        };

        self.deleting = true;
        self.error_message.clear();
        Ok(DeleteRequest { tag, shift_id })
    }

    /// Select and delete `shift_id` in one step.
    pub fn delete_row(&mut self, shift_id: ShiftId) -> Result<DeleteRequest, TransitionError> {
        self.request_delete(shift_id)?;
        self.begin_delete()
    }

    pub fn resolve_delete(&mut self, request: &DeleteRequest, result: Result<(), ApiError>) -> Outcome {
        if !self.is_current(&request.tag) || !self.deleting {
            log::debug!("discarding stale delete of shift {}", request.shift_id);
            return Outcome::Discarded;
        }
        self.deleting = false;
        self.pending_delete = None;

        match result {
            Ok(()) => {
                if let WeekPhase::Ready { rows, .. } = &mut self.phase {
                    if let Some(idx) = rows.iter().position(|r| r.id == request.shift_id) {
                        rows.remove(idx);
                    }
                }
                log::info!("shift {} deleted", request.shift_id);
            }
            Err(err) => {
                log::warn!("shift {} delete failed: {}", request.shift_id, err);
                self.error_message = error_message(&err);
            }
        }
        Outcome::Applied
    }

    fn not_ready(&self) -> TransitionError {
        match self.phase {
            WeekPhase::Idle => TransitionError::NoWeekSelected,
            WeekPhase::Loading { .. } => TransitionError::FetchInFlight,
            _ => TransitionError::NotReady,
        }
    }

    // ------------------------------------------------------------------------
    // Observation
    // ------------------------------------------------------------------------

    pub fn snapshot(&self) -> SessionSnapshot {
        let current_week = match &self.phase {
            WeekPhase::Idle => None,
            WeekPhase::Loading { week_id } | WeekPhase::Failed { week_id } => {
                Some(WeekLite::pending(*week_id))
            }
            WeekPhase::Ready { week, .. } => Some(WeekLite {
                id: week.id,
                is_published: Some(week.is_published),
                published_at: week.published_at,
            }),
        };

        SessionSnapshot {
            phase: self.phase.kind(),
            current_week,
            rows: self.rows().to_vec(),
            is_loading: self.is_loading(),
            error_message: self.error_message.clone(),
            pending_delete: self.pending_delete.clone(),
            is_publishing: self.publishing,
            is_deleting: self.deleting,
        }
    }
}

/// Read-only view of a session for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub phase: PhaseKind,
    pub current_week: Option<WeekLite>,
    pub rows: Vec<Shift>,
    pub is_loading: bool,
    pub error_message: String,
    pub pending_delete: Option<ShiftId>,
    pub is_publishing: bool,
    pub is_deleting: bool,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        WeekState::new().snapshot()
    }
}

impl SessionSnapshot {
    pub fn week_id(&self) -> Option<WeekId> {
        self.current_week.as_ref().map(|w| w.id)
    }

    pub fn is_published(&self) -> bool {
        self.current_week
            .as_ref()
            .and_then(|w| w.is_published)
            .unwrap_or(false)
    }

    pub fn window(&self) -> Option<WeekWindow> {
        self.week_id().and_then(week::window_of)
    }

    pub fn range_label(&self) -> Option<String> {
        self.window().map(|w| w.range_label())
    }

    pub fn can_publish(&self) -> bool {
        self.phase == PhaseKind::Ready
            && !self.is_published()
            && !self.rows.is_empty()
            && !self.is_publishing
    }

    pub fn can_add_shift(&self) -> bool {
        self.phase == PhaseKind::Ready && !self.is_published()
    }

    /// Edit/delete controls for `row` are enabled.
    pub fn can_modify_row(&self, row: &Shift) -> bool {
        self.phase == PhaseKind::Ready && !self.is_published() && !row.is_published
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CLASH_SHIFT_MESSAGE;
    use chrono::{NaiveDate, NaiveTime, TimeZone};

    fn shift(id: &str) -> Shift {
        Shift {
            id: ShiftId::new(id),
            name: format!("Shift {id}"),
            date: NaiveDate::from_ymd_opt(2023, 12, 4).unwrap(),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            is_published: false,
        }
    }

    fn week(id: i64, is_published: bool, shifts: Vec<Shift>) -> Week {
        Week {
            id: WeekId::new(id),
            is_published,
            published_at: None,
            shifts,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 12, 8, 9, 15, 0).unwrap()
    }

    fn ready(id: i64, shifts: Vec<Shift>) -> WeekState {
        let mut state = WeekState::new();
        let tag = state.select_week(WeekId::new(id));
        assert_eq!(state.resolve_fetch(tag, Ok(week(id, false, shifts))), Outcome::Applied);
        state
    }

    fn server(message: &str) -> ApiError {
        ApiError::Server {
            status: 500,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_select_then_fetch_success() {
        let mut state = WeekState::new();
        assert_eq!(state.snapshot().phase, PhaseKind::Idle);

        let tag = state.select_week(WeekId::new(10));
        assert!(state.is_loading());
        assert_eq!(tag.week_id, WeekId::new(10));

        state.resolve_fetch(tag, Ok(week(10, false, vec![shift("a"), shift("b")])));
        let snap = state.snapshot();
        assert_eq!(snap.phase, PhaseKind::Ready);
        assert_eq!(snap.week_id(), Some(WeekId::new(10)));
        assert_eq!(snap.rows.len(), 2);
        assert!(!snap.is_loading);
        assert_eq!(snap.error_message, "");
    }

    #[test]
    fn test_fetch_failure_keeps_week_id() {
        let mut state = WeekState::new();
        let tag = state.select_week(WeekId::new(10));
        state.resolve_fetch(tag, Err(ApiError::Network("connection refused".to_string())));

        assert_eq!(state.phase(), &WeekPhase::Failed { week_id: WeekId::new(10) });
        let snap = state.snapshot();
        assert_eq!(snap.week_id(), Some(WeekId::new(10)));
        assert_eq!(snap.error_message, "connection refused");
        assert!(snap.range_label().is_some());
    }

    #[test]
    fn test_new_fetch_clears_previous_error() {
        let mut state = WeekState::new();
        let tag = state.select_week(WeekId::new(10));
        state.resolve_fetch(tag, Err(server("boom")));
        assert_eq!(state.error_message(), "boom");

        state.reload().unwrap();
        assert_eq!(state.error_message(), "");
        assert!(state.is_loading());
    }

    #[test]
    fn test_superseded_fetch_is_discarded() {
        let mut state = WeekState::new();
        let tag_a = state.select_week(WeekId::new(1));
        let tag_b = state.select_week(WeekId::new(2));

        assert_eq!(
            state.resolve_fetch(tag_b, Ok(week(2, true, vec![shift("b")]))),
            Outcome::Applied
        );
        assert_eq!(
            state.resolve_fetch(tag_a, Ok(week(1, false, vec![shift("a1"), shift("a2")]))),
            Outcome::Discarded
        );

        let snap = state.snapshot();
        assert_eq!(snap.week_id(), Some(WeekId::new(2)));
        assert_eq!(snap.rows, vec![shift("b")]);
        assert!(snap.is_published());
    }

    #[test]
    fn test_superseded_failure_is_discarded() {
        let mut state = WeekState::new();
        let tag_a = state.select_week(WeekId::new(1));
        let _tag_b = state.select_week(WeekId::new(2));

        assert_eq!(state.resolve_fetch(tag_a, Err(server("late"))), Outcome::Discarded);
        assert!(state.is_loading());
        assert_eq!(state.error_message(), "");
    }

    #[test]
    fn test_reselecting_same_week_discards_older_request() {
        let mut state = WeekState::new();
        let first = state.select_week(WeekId::new(5));
        let second = state.select_week(WeekId::new(5));
        assert_ne!(first, second);

        assert_eq!(state.resolve_fetch(first, Ok(week(5, false, vec![]))), Outcome::Discarded);
        assert_eq!(
            state.resolve_fetch(second, Ok(week(5, false, vec![shift("x")]))),
            Outcome::Applied
        );
        assert_eq!(state.rows().len(), 1);
    }

    #[test]
    fn test_duplicate_resolution_is_ignored() {
        let mut state = WeekState::new();
        let tag = state.select_week(WeekId::new(5));
        state.resolve_fetch(tag, Ok(week(5, false, vec![shift("x")])));
        assert_eq!(state.resolve_fetch(tag, Ok(week(5, false, vec![]))), Outcome::Discarded);
        assert_eq!(state.rows().len(), 1);
    }

    #[test]
    fn test_navigate_round_trip() {
        let mut state = ready(100, vec![shift("a")]);

        let next = state.navigate(1).unwrap();
        assert_eq!(next.week_id, WeekId::new(101));
        state.resolve_fetch(next, Ok(week(101, false, vec![])));

        let back = state.navigate(-1).unwrap();
        assert_eq!(back.week_id, WeekId::new(100));
        state.resolve_fetch(back, Ok(week(100, false, vec![shift("a")])));

        assert_eq!(state.week_id(), Some(WeekId::new(100)));
        assert_eq!(state.rows(), &[shift("a")]);
    }

    #[test]
    fn test_navigate_drops_publication_fields_eagerly() {
        let mut state = WeekState::new();
        let tag = state.select_week(WeekId::new(7));
        let mut published = week(7, true, vec![shift("a")]);
        published.published_at = Some(now());
        state.resolve_fetch(tag, Ok(published));
        assert!(state.snapshot().is_published());

        state.navigate(1).unwrap();
        let snap = state.snapshot();
        assert_eq!(snap.current_week, Some(WeekLite::pending(WeekId::new(8))));
        assert!(snap.rows.is_empty());
        assert!(!snap.is_published());
    }

    #[test]
    fn test_navigate_requires_settled_session() {
        let mut state = WeekState::new();
        assert_eq!(state.navigate(1), Err(TransitionError::NoWeekSelected));

        state.select_week(WeekId::new(3));
        assert_eq!(state.navigate(1), Err(TransitionError::FetchInFlight));
        assert_eq!(state.reload(), Err(TransitionError::FetchInFlight));
    }

    #[test]
    fn test_navigate_from_failed() {
        let mut state = WeekState::new();
        let tag = state.select_week(WeekId::new(3));
        state.resolve_fetch(tag, Err(server("down")));

        let next = state.navigate(-2).unwrap();
        assert_eq!(next.week_id, WeekId::new(1));
    }

    #[test]
    fn test_publish_success_replaces_fields_in_place() {
        let mut state = ready(42, vec![shift("a"), shift("b")]);

        let request = state.begin_publish(now()).unwrap();
        assert_eq!(request.payload.id, "42");
        assert!(request.payload.is_published);
        assert_eq!(request.payload.published_at, now());
        assert!(state.snapshot().is_publishing);

        let mut published_rows = vec![shift("a"), shift("b")];
        for row in &mut published_rows {
            row.is_published = true;
        }
        let outcome = state.resolve_publish(
            request.tag,
            Ok(PublishedWeek {
                is_published: true,
                published_at: Some(now()),
                shifts: published_rows.clone(),
            }),
        );
        assert_eq!(outcome, Outcome::Applied);

        let snap = state.snapshot();
        assert_eq!(snap.phase, PhaseKind::Ready);
        assert!(snap.is_published());
        assert_eq!(snap.current_week.unwrap().published_at, Some(now()));
        assert_eq!(snap.rows, published_rows);
        assert!(!snap.is_publishing);
    }

    #[test]
    fn test_publish_with_no_rows_is_rejected() {
        let mut state = ready(42, vec![]);
        assert!(!state.snapshot().can_publish());
        assert_eq!(state.begin_publish(now()), Err(TransitionError::NothingToPublish));
        assert!(!state.snapshot().is_publishing);
    }

    #[test]
    fn test_publish_already_published_is_rejected() {
        let mut state = WeekState::new();
        let tag = state.select_week(WeekId::new(42));
        state.resolve_fetch(tag, Ok(week(42, true, vec![shift("a")])));
        assert_eq!(state.begin_publish(now()), Err(TransitionError::AlreadyPublished));
    }

    #[test]
    fn test_publish_requires_ready() {
        let mut state = WeekState::new();
        assert_eq!(state.begin_publish(now()), Err(TransitionError::NoWeekSelected));
        state.select_week(WeekId::new(1));
        assert_eq!(state.begin_publish(now()), Err(TransitionError::FetchInFlight));
    }

    #[test]
    fn test_second_publish_while_in_flight_is_rejected() {
        let mut state = ready(42, vec![shift("a")]);
        state.begin_publish(now()).unwrap();
        assert_eq!(state.begin_publish(now()), Err(TransitionError::PublishInFlight));
    }

    #[test]
    fn test_publish_constraint_failure_keeps_rows() {
        let mut state = ready(42, vec![shift("a"), shift("b")]);
        let request = state.begin_publish(now()).unwrap();

        state.resolve_publish(
            request.tag,
            Err(server("exclusion constraint \"clash_shift_constraint\" violated")),
        );

        let snap = state.snapshot();
        assert_eq!(snap.phase, PhaseKind::Ready);
        assert!(!snap.is_published());
        assert_eq!(snap.rows, vec![shift("a"), shift("b")]);
        assert_eq!(snap.error_message, CLASH_SHIFT_MESSAGE);
        assert!(snap.can_publish());
    }

    #[test]
    fn test_publish_retry_keeps_previous_error_until_resolved() {
        let mut state = ready(42, vec![shift("a")]);
        let first = state.begin_publish(now()).unwrap();
        state.resolve_publish(
            first.tag,
            Err(server("exclusion constraint \"clash_shift_constraint\" violated")),
        );

        let retry = state.begin_publish(now()).unwrap();
        assert!(state.snapshot().is_publishing);
        assert_eq!(state.error_message(), CLASH_SHIFT_MESSAGE);

        state.resolve_publish(retry.tag, Err(server("Week is locked")));
        assert_eq!(state.error_message(), "Week is locked");
    }

    #[test]
    fn test_publish_response_after_navigation_is_discarded() {
        let mut state = ready(42, vec![shift("a")]);
        let request = state.begin_publish(now()).unwrap();
        let next = state.navigate(1).unwrap();
        state.resolve_fetch(next, Ok(week(43, false, vec![shift("z")])));

        let outcome = state.resolve_publish(
            request.tag,
            Ok(PublishedWeek {
                is_published: true,
                published_at: Some(now()),
                shifts: vec![],
            }),
        );
        assert_eq!(outcome, Outcome::Discarded);
        assert!(!state.snapshot().is_published());
        assert_eq!(state.rows(), &[shift("z")]);
    }

    #[test]
    fn test_delete_success_removes_first_match() {
        let mut state = ready(1, vec![shift("a"), shift("b"), shift("c")]);

        state.request_delete(ShiftId::new("b")).unwrap();
        assert_eq!(state.pending_delete(), Some(&ShiftId::new("b")));

        let request = state.begin_delete().unwrap();
        assert!(state.snapshot().is_deleting);
        assert_eq!(state.resolve_delete(&request, Ok(())), Outcome::Applied);

        assert_eq!(state.rows(), &[shift("a"), shift("c")]);
        assert_eq!(state.pending_delete(), None);
        assert!(!state.snapshot().is_deleting);
    }

    #[test]
    fn test_delete_of_absent_row_removes_nothing() {
        let mut state = ready(1, vec![shift("a"), shift("b")]);
        let request = state.delete_row(ShiftId::new("zz")).unwrap();
        state.resolve_delete(&request, Ok(()));
        assert_eq!(state.rows(), &[shift("a"), shift("b")]);
    }

    #[test]
    fn test_delete_failure_keeps_rows_and_clears_target() {
        let mut state = ready(1, vec![shift("a"), shift("b")]);
        let request = state.delete_row(ShiftId::new("a")).unwrap();

        state.resolve_delete(&request, Err(server("Shift not found")));

        let snap = state.snapshot();
        assert_eq!(snap.rows, vec![shift("a"), shift("b")]);
        assert_eq!(snap.pending_delete, None);
        assert_eq!(snap.error_message, "Shift not found");
        assert_eq!(snap.phase, PhaseKind::Ready);
    }

    #[test]
    fn test_delete_without_target_is_rejected() {
        let mut state = ready(1, vec![shift("a")]);
        assert_eq!(state.begin_delete(), Err(TransitionError::NoPendingDelete));

        state.request_delete(ShiftId::new("a")).unwrap();
        state.cancel_delete().unwrap();
        assert_eq!(state.begin_delete(), Err(TransitionError::NoPendingDelete));
    }

    #[test]
    fn test_delete_requires_ready() {
        let mut state = WeekState::new();
        state.select_week(WeekId::new(1));
        assert_eq!(
            state.request_delete(ShiftId::new("a")),
            Err(TransitionError::FetchInFlight)
        );
    }

    #[test]
    fn test_cancel_during_delete_is_rejected() {
        let mut state = ready(1, vec![shift("a")]);
        state.delete_row(ShiftId::new("a")).unwrap();
        assert_eq!(state.cancel_delete(), Err(TransitionError::DeleteInFlight));
        assert_eq!(
            state.request_delete(ShiftId::new("a")),
            Err(TransitionError::DeleteInFlight)
        );
    }

    #[test]
    fn test_week_change_resets_pending_delete() {
        let mut state = ready(1, vec![shift("a")]);
        let request = state.delete_row(ShiftId::new("a")).unwrap();
        state.navigate(1).unwrap();

        assert_eq!(state.pending_delete(), None);
        assert_eq!(state.resolve_delete(&request, Ok(())), Outcome::Discarded);
    }

    #[test]
    fn test_row_gating_follows_publication() {
        let state = ready(1, vec![shift("a")]);
        let snap = state.snapshot();
        assert!(snap.can_add_shift());
        assert!(snap.can_modify_row(&snap.rows[0]));

        let mut locked = shift("b");
        locked.is_published = true;
        assert!(!snap.can_modify_row(&locked));

        let mut state = WeekState::new();
        let tag = state.select_week(WeekId::new(1));
        state.resolve_fetch(tag, Ok(week(1, true, vec![shift("a")])));
        let snap = state.snapshot();
        assert!(!snap.can_add_shift());
        assert!(!snap.can_modify_row(&snap.rows[0]));
        assert!(!snap.can_publish());
    }

    #[test]
    fn test_snapshot_serializes_for_rendering() {
        let state = ready(1, vec![shift("a")]);
        let json = serde_json::to_value(state.snapshot()).unwrap();
        assert_eq!(json["phase"], "ready");
        assert_eq!(json["currentWeek"]["id"], 1);
        assert_eq!(json["currentWeek"]["isPublished"], false);
        assert_eq!(json["rows"][0]["id"], "a");
        assert_eq!(json["errorMessage"], "");
        assert!(json["pendingDelete"].is_null());
    }
}
