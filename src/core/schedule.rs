use crate::config::toml_config::FlightEntry;
use crate::core::timezone::{ingest, parse_zone};
use crate::core::Flight;
use crate::utils::error::{BookingError, Result};
use std::collections::HashMap;

/// 唯讀的航班清單，保持載入順序
#[derive(Debug, Clone, Default)]
pub struct FlightSchedule {
    flights: Vec<Flight>,
    index: HashMap<String, usize>,
}

impl FlightSchedule {
    pub fn new(flights: Vec<Flight>) -> Result<Self> {
        let mut index = HashMap::with_capacity(flights.len());
        for (position, flight) in flights.iter().enumerate() {
            if index.insert(flight.id.clone(), position).is_some() {
                return Err(BookingError::InvalidFlight {
                    flight_id: flight.id.clone(),
                    reason: "duplicate flight id in schedule".to_string(),
                });
            }
        }
        Ok(Self { flights, index })
    }

    /// 從設定檔的 `[[flights]]` 建立航班表
    pub fn from_entries(entries: &[FlightEntry]) -> Result<Self> {
        let flights = entries
            .iter()
            .map(|entry| {
                let departure_zone = parse_zone(&entry.departure_timezone)?;
                let arrival_zone = parse_zone(&entry.arrival_timezone)?;
                let departure = ingest(&entry.departure_time, departure_zone)?;
                let arrival = ingest(&entry.arrival_time, arrival_zone)?;
                Flight::new(
                    entry.id.clone(),
                    departure,
                    departure_zone,
                    arrival,
                    arrival_zone,
                )
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!("Loaded {} flights into schedule", flights.len());
        Self::new(flights)
    }

    pub fn get(&self, flight_id: &str) -> Option<&Flight> {
        self.index.get(flight_id).map(|&i| &self.flights[i])
    }

    pub fn contains(&self, flight_id: &str) -> bool {
        self.index.contains_key(flight_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Flight> {
        self.flights.iter()
    }

    pub fn len(&self) -> usize {
        self.flights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flights.is_empty()
    }
}
