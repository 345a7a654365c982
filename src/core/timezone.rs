//! Conversion between absolute instants and per-leg civil time.
//!
//! Flights keep their departure and arrival as UTC instants. Each leg is
//! rendered in its own IANA zone, with the offset that zone observes at that
//! instant, so seasonal rules are honoured. A zero offset renders as `Z`.

use crate::core::{Flight, FlightView};
use crate::utils::error::{BookingError, Result};
use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// 帶時差的當地時間
///
/// Two values are equal when they denote the same instant, so
/// `2024-12-01T10:00:00Z` equals `2024-12-01T17:00:00+07:00`.
#[derive(Debug, Clone, Copy)]
pub struct CivilTimestamp(DateTime<FixedOffset>);

impl CivilTimestamp {
    pub fn parse(value: &str) -> Result<Self> {
        DateTime::parse_from_rfc3339(value)
            .map(Self)
            .map_err(|e| BookingError::InvalidTimestamp {
                value: value.to_string(),
                reason: e.to_string(),
            })
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.0.with_timezone(&Utc)
    }

    pub fn offset_seconds(&self) -> i32 {
        self.0.offset().local_minus_utc()
    }
}

impl PartialEq for CivilTimestamp {
    fn eq(&self, other: &Self) -> bool {
        self.instant() == other.instant()
    }
}

impl Eq for CivilTimestamp {}

impl fmt::Display for CivilTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // AutoSi 只在有非零小數秒時才輸出小數
        f.write_str(&self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }
}

impl FromStr for CivilTimestamp {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for CivilTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CivilTimestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

pub fn parse_zone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| BookingError::UnknownTimezone {
            zone: name.to_string(),
        })
}

pub fn to_local(instant: DateTime<Utc>, zone: Tz) -> CivilTimestamp {
    let offset = zone.offset_from_utc_datetime(&instant.naive_utc()).fix();
    CivilTimestamp(instant.with_timezone(&offset))
}

pub fn to_absolute(civil: &str) -> Result<DateTime<Utc>> {
    Ok(CivilTimestamp::parse(civil)?.instant())
}

/// 將沒有時差的牆上時間放進指定時區
///
/// Ambiguous wall times (clocks falling back) resolve to the earlier
/// instant. Wall times skipped by a DST jump do not exist and are rejected.
pub fn from_wall_clock(naive: NaiveDateTime, zone: Tz) -> Result<DateTime<Utc>> {
    zone.from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| BookingError::InvalidTimestamp {
            value: naive.to_string(),
            reason: format!("local time does not exist in {}", zone.name()),
        })
}

/// Reads a schedule timestamp. Values carrying an offset are absolute;
/// bare wall-clock values are interpreted in `zone`.
pub fn ingest(value: &str, zone: Tz) -> Result<DateTime<Utc>> {
    if let Ok(instant) = to_absolute(value) {
        return Ok(instant);
    }

    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").map_err(|e| {
        BookingError::InvalidTimestamp {
            value: value.to_string(),
            reason: format!("expected RFC 3339 or local YYYY-MM-DDTHH:MM:SS ({})", e),
        }
    })?;
    from_wall_clock(naive, zone)
}

pub fn flight_view(flight: &Flight) -> FlightView {
    FlightView {
        id: flight.id.clone(),
        departure_time: to_local(flight.departure, flight.departure_zone),
        departure_timezone: flight.departure_zone.name().to_string(),
        arrival_time: to_local(flight.arrival, flight.arrival_zone),
        arrival_timezone: flight.arrival_zone.name().to_string(),
    }
}
