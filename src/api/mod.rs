//! Remote week/shift API
//!
//! Modules:
//! - client: reqwest-backed implementation of [`WeekApi`]

pub mod client;

use async_trait::async_trait;

use crate::error::ApiError;
use crate::types::{PublishWeekPayload, PublishedWeek, ShiftId, Week};
use crate::week::WeekId;

pub use client::HttpWeekApi;

/// Collaborator the week session fetches from and writes to.
#[async_trait]
pub trait WeekApi: Send + Sync {
    /// `GET /weeks/{id}`
    async fn get_week_by_id(&self, id: WeekId) -> Result<Week, ApiError>;

    /// `POST /weeks/upsert`
    async fn publish_week(&self, payload: &PublishWeekPayload) -> Result<PublishedWeek, ApiError>;

    /// `DELETE /shifts/{id}`
    async fn delete_shift_by_id(&self, id: &ShiftId) -> Result<(), ApiError>;
}
