//! Remote data service abstraction and the HTTP implementation.
//!
//! This module provides:
//! - `RecordService` trait for the list/create/update/delete boundary
//! - `HttpRecordService` implementation using reqwest
//! - `ServiceError` for transport, status and decode failures

pub mod http;

use thiserror::Error;

use crate::model::{NewRecord, Record, RecordId};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{method} {url} returned HTTP {status}")]
    Status {
        method: &'static str,
        url: String,
        status: u16,
    },
    #[error("unexpected response body from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// Failure reported by the in-memory test service.
    #[cfg(test)]
    #[error("{0}")]
    Other(String),
}

/// Trait for remote record service implementations
#[allow(async_fn_in_trait)]
pub trait RecordService {
    /// Fetch the full record set
    async fn list(&self) -> Result<Vec<Record>, ServiceError>;

    /// Create a record; the service assigns its id
    async fn create(&self, payload: &NewRecord) -> Result<Record, ServiceError>;

    /// Replace a record by id
    async fn update(&self, record: &Record) -> Result<(), ServiceError>;

    /// Delete a record by id
    async fn delete(&self, id: RecordId) -> Result<(), ServiceError>;
}
