use crate::core::timezone::CivilTimestamp;
use crate::utils::error::{BookingError, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// 航班：時間以絕對時刻保存，時區只在輸出時套用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flight {
    pub id: String,
    pub departure: DateTime<Utc>,
    pub departure_zone: Tz,
    pub arrival: DateTime<Utc>,
    pub arrival_zone: Tz,
}

impl Flight {
    pub fn new(
        id: impl Into<String>,
        departure: DateTime<Utc>,
        departure_zone: Tz,
        arrival: DateTime<Utc>,
        arrival_zone: Tz,
    ) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(BookingError::InvalidFlight {
                flight_id: id,
                reason: "flight id cannot be empty".to_string(),
            });
        }
        if arrival < departure {
            return Err(BookingError::InvalidFlight {
                flight_id: id,
                reason: format!("arrival {} is before departure {}", arrival, departure),
            });
        }

        Ok(Self {
            id,
            departure,
            departure_zone,
            arrival,
            arrival_zone,
        })
    }
}

/// 外部護照登記處的紀錄，本服務只讀不寫
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassportRecord {
    pub passport_id: String,
    pub first_name: String,
    pub last_name: String,
}

/// Caller-supplied identity for create and update. All three fields are
/// replaced together; there is no partial update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassengerDetails {
    pub passport_id: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passenger {
    pub flight_id: String,
    pub customer_id: u64,
    pub passport_id: String,
    pub first_name: String,
    pub last_name: String,
}

impl Passenger {
    pub fn from_details(flight_id: &str, customer_id: u64, details: PassengerDetails) -> Self {
        Self {
            flight_id: flight_id.to_string(),
            customer_id,
            passport_id: details.passport_id,
            first_name: details.first_name,
            last_name: details.last_name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MismatchReason {
    FirstName,
    LastName,
    Both,
}

/// 比對結果只在單次操作中存在，不會被保存
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    Match,
    Mismatch(MismatchReason),
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlightView {
    pub id: String,
    pub departure_time: CivilTimestamp,
    pub departure_timezone: String,
    pub arrival_time: CivilTimestamp,
    pub arrival_timezone: String,
}
