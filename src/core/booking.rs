//! Booking orchestration: verify identity against the passport registry,
//! then write to the passenger registry.
//!
//! This is the only place where internal errors become caller-facing
//! outcomes (see [`OperationFailure`]). Nothing below it formats messages
//! for callers.
//!
//! Create and update are not idempotent. A create retried after a timeout
//! may produce a second customer record, so callers that retry must
//! deduplicate on their side. Delete is safe to retry.

use crate::core::matcher::match_identity;
use crate::core::registry::PassengerRegistry;
use crate::core::snapshot::{SnapshotStore, SnapshotWriter};
use crate::core::timezone::flight_view;
use crate::core::{
    FlightSchedule, FlightView, MatchResult, Passenger, PassengerDetails, PassportRegistry,
};
use crate::utils::error::{BookingError, ErrorCategory, Result, NAME_MISMATCH_DETAIL};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    ClientError,
    NotFound,
    ServerError,
}

/// 對外的失敗結果：種類 + 給呼叫端看的訊息
#[derive(Error, Debug)]
#[error("{detail}")]
pub struct OperationFailure {
    pub kind: FailureKind,
    pub detail: String,
    #[source]
    pub cause: BookingError,
}

impl From<BookingError> for OperationFailure {
    fn from(cause: BookingError) -> Self {
        let (kind, detail) = match (&cause, cause.category()) {
            // 查無護照與名字不符對外一律視為同一種驗證失敗
            (BookingError::NameMismatch | BookingError::PassportNotFound { .. }, _) => {
                (FailureKind::ClientError, NAME_MISMATCH_DETAIL.to_string())
            }
            (_, ErrorCategory::Validation) => (FailureKind::ClientError, cause.to_string()),
            (_, ErrorCategory::NotFound) => (FailureKind::NotFound, cause.to_string()),
            (_, ErrorCategory::Upstream) => (
                FailureKind::ServerError,
                "Passport registry is unavailable, please retry later.".to_string(),
            ),
            (_, ErrorCategory::Config | ErrorCategory::Internal) => {
                (FailureKind::ServerError, "Internal server error.".to_string())
            }
        };

        Self {
            kind,
            detail,
            cause,
        }
    }
}

pub type Outcome<T> = std::result::Result<T, OperationFailure>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Removed(Passenger),
    AlreadyAbsent,
}

impl DeleteOutcome {
    pub fn removed(&self) -> bool {
        matches!(self, DeleteOutcome::Removed(_))
    }
}

pub struct BookingService {
    schedule: Arc<FlightSchedule>,
    registry: Arc<PassengerRegistry>,
    passports: Arc<dyn PassportRegistry>,
    snapshots: Option<SnapshotWriter>,
}

impl BookingService {
    pub fn new(
        schedule: Arc<FlightSchedule>,
        registry: Arc<PassengerRegistry>,
        passports: Arc<dyn PassportRegistry>,
    ) -> Self {
        Self {
            schedule,
            registry,
            passports,
            snapshots: None,
        }
    }

    /// Persist the registry in the background after every successful write.
    /// Starts the writer task, so it must be called inside a tokio runtime.
    pub fn with_snapshots(mut self, snapshots: SnapshotStore) -> Self {
        self.snapshots = Some(SnapshotWriter::spawn(
            snapshots,
            Arc::clone(&self.registry),
        ));
        self
    }

    pub fn registry(&self) -> &PassengerRegistry {
        &self.registry
    }

    pub async fn add_passenger(
        &self,
        flight_id: &str,
        details: PassengerDetails,
    ) -> Outcome<Passenger> {
        let result = self.try_add(flight_id, details).await;
        self.finish("add_passenger", flight_id, result)
    }

    pub async fn update_passenger(
        &self,
        flight_id: &str,
        customer_id: u64,
        details: PassengerDetails,
    ) -> Outcome<Passenger> {
        let result = self.try_update(flight_id, customer_id, details).await;
        self.finish("update_passenger", flight_id, result)
    }

    /// 刪除是冪等的：不存在的乘客也算成功
    pub async fn delete_passenger(&self, flight_id: &str, customer_id: u64) -> Outcome<DeleteOutcome> {
        let outcome = match self.registry.delete(flight_id, customer_id) {
            Ok(passenger) => DeleteOutcome::Removed(passenger),
            Err(BookingError::PassengerNotFound { .. } | BookingError::FlightNotFound { .. }) => {
                DeleteOutcome::AlreadyAbsent
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(
            operation = "delete_passenger",
            flight_id,
            customer_id,
            removed = outcome.removed(),
            "✅ Delete completed"
        );
        if outcome.removed() {
            self.persist();
        }
        Ok(outcome)
    }

    pub fn list_passengers(&self, flight_id: &str) -> Outcome<Vec<Passenger>> {
        let passengers = self.registry.list(flight_id)?;
        tracing::debug!(flight_id, count = passengers.len(), "Listed passengers");
        Ok(passengers)
    }

    pub fn list_flights(&self) -> Vec<FlightView> {
        self.schedule.iter().map(flight_view).collect()
    }

    async fn try_add(&self, flight_id: &str, details: PassengerDetails) -> Result<Passenger> {
        self.ensure_flight(flight_id)?;
        self.verify(&details).await?;
        self.registry.create(flight_id, details)
    }

    async fn try_update(
        &self,
        flight_id: &str,
        customer_id: u64,
        details: PassengerDetails,
    ) -> Result<Passenger> {
        self.ensure_flight(flight_id)?;
        // 一律用新的資料重新驗證，不沿用舊紀錄
        self.verify(&details).await?;
        self.registry.update(flight_id, customer_id, details)
    }

    fn ensure_flight(&self, flight_id: &str) -> Result<()> {
        if self.schedule.contains(flight_id) {
            Ok(())
        } else {
            Err(BookingError::FlightNotFound {
                flight_id: flight_id.to_string(),
            })
        }
    }

    /// The external lookup runs with no registry lock held.
    async fn verify(&self, details: &PassengerDetails) -> Result<()> {
        if details.passport_id.is_empty() {
            return Err(BookingError::InvalidRequest {
                field: "passport_id".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        let record = self.passports.lookup(&details.passport_id).await?;

        match match_identity(&details.first_name, &details.last_name, record.as_ref()) {
            MatchResult::Match => Ok(()),
            MatchResult::Mismatch(reason) => {
                tracing::debug!(passport_id = %details.passport_id, ?reason, "Identity mismatch");
                Err(BookingError::NameMismatch)
            }
            MatchResult::NotFound => Err(BookingError::PassportNotFound {
                passport_id: details.passport_id.clone(),
            }),
        }
    }

    fn finish(
        &self,
        operation: &'static str,
        flight_id: &str,
        result: Result<Passenger>,
    ) -> Outcome<Passenger> {
        match result {
            Ok(passenger) => {
                tracing::info!(
                    operation,
                    flight_id,
                    customer_id = passenger.customer_id,
                    "✅ Passenger verified and stored"
                );
                self.persist();
                Ok(passenger)
            }
            Err(e) => {
                let failure = OperationFailure::from(e);
                match failure.kind {
                    FailureKind::ServerError => tracing::error!(
                        operation,
                        flight_id,
                        error = %failure.cause,
                        "❌ Operation failed: {}",
                        failure.cause.recovery_suggestion()
                    ),
                    _ => tracing::info!(
                        operation,
                        flight_id,
                        error = %failure.cause,
                        "Operation rejected"
                    ),
                }
                Err(failure)
            }
        }
    }

    /// 只喚醒背景寫入器；快照失敗由寫入器記錄，不影響已完成的寫入
    fn persist(&self) {
        if let Some(snapshots) = &self.snapshots {
            snapshots.request_save();
        }
    }

    /// Writes a final snapshot; used on shutdown.
    pub async fn flush(&self) -> Result<()> {
        match &self.snapshots {
            Some(snapshots) => snapshots.flush().await,
            None => Ok(()),
        }
    }
}
