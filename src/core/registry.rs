//! In-memory passenger store keyed by (flight id, customer id).
//!
//! Records live in a sharded `DashMap`, so a write locks only the shard that
//! owns its key and writes to other keys proceed concurrently. Customer ids
//! come from a per-flight atomic counter and are never handed out twice,
//! even after the record is deleted.

use crate::core::{FlightSchedule, Passenger, PassengerDetails};
use crate::utils::error::{BookingError, Result};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

type PassengerKey = (String, u64);

const FIRST_CUSTOMER_ID: u64 = 1;

pub struct PassengerRegistry {
    passengers: DashMap<PassengerKey, Passenger>,
    // 航班在建構後不會變動，所以外層 HashMap 不需要鎖
    next_ids: HashMap<String, AtomicU64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightLedger {
    pub flight_id: String,
    pub next_customer_id: u64,
    pub passengers: Vec<Passenger>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub flights: Vec<FlightLedger>,
}

impl PassengerRegistry {
    pub fn new(schedule: &FlightSchedule) -> Self {
        Self::with_flights(schedule.iter().map(|f| f.id.clone()))
    }

    pub fn with_flights<I, S>(flight_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let next_ids = flight_ids
            .into_iter()
            .map(|id| (id.into(), AtomicU64::new(FIRST_CUSTOMER_ID)))
            .collect();

        Self {
            passengers: DashMap::new(),
            next_ids,
        }
    }

    fn counter(&self, flight_id: &str) -> Result<&AtomicU64> {
        self.next_ids
            .get(flight_id)
            .ok_or_else(|| BookingError::FlightNotFound {
                flight_id: flight_id.to_string(),
            })
    }

    /// Not idempotent: every call allocates a fresh customer id.
    pub fn create(&self, flight_id: &str, details: PassengerDetails) -> Result<Passenger> {
        let customer_id = self
            .counter(flight_id)?
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |id| id.checked_add(1))
            .map_err(|_| BookingError::InvalidFlight {
                flight_id: flight_id.to_string(),
                reason: "customer ids exhausted".to_string(),
            })?;
        let passenger = Passenger::from_details(flight_id, customer_id, details);

        self.passengers
            .insert((flight_id.to_string(), customer_id), passenger.clone());

        tracing::debug!(flight_id, customer_id, "Passenger record created");
        Ok(passenger)
    }

    /// Replaces passport id and both names in one step under the key's lock.
    pub fn update(
        &self,
        flight_id: &str,
        customer_id: u64,
        details: PassengerDetails,
    ) -> Result<Passenger> {
        self.counter(flight_id)?;

        match self
            .passengers
            .get_mut(&(flight_id.to_string(), customer_id))
        {
            Some(mut entry) => {
                *entry = Passenger::from_details(flight_id, customer_id, details);
                tracing::debug!(flight_id, customer_id, "Passenger record replaced");
                Ok(entry.clone())
            }
            None => Err(BookingError::PassengerNotFound {
                flight_id: flight_id.to_string(),
                customer_id,
            }),
        }
    }

    /// 回傳被刪除的紀錄；紀錄本來就不存在時回傳 `PassengerNotFound`
    pub fn delete(&self, flight_id: &str, customer_id: u64) -> Result<Passenger> {
        self.counter(flight_id)?;

        self.passengers
            .remove(&(flight_id.to_string(), customer_id))
            .map(|(_, passenger)| passenger)
            .ok_or_else(|| BookingError::PassengerNotFound {
                flight_id: flight_id.to_string(),
                customer_id,
            })
    }

    pub fn get(&self, flight_id: &str, customer_id: u64) -> Option<Passenger> {
        self.passengers
            .get(&(flight_id.to_string(), customer_id))
            .map(|entry| entry.value().clone())
    }

    /// Passengers of one flight in creation order.
    pub fn list(&self, flight_id: &str) -> Result<Vec<Passenger>> {
        self.counter(flight_id)?;

        let mut passengers: Vec<Passenger> = self
            .passengers
            .iter()
            .filter(|entry| entry.key().0 == flight_id)
            .map(|entry| entry.value().clone())
            .collect();
        passengers.sort_by_key(|p| p.customer_id);
        Ok(passengers)
    }

    /// One pass over the records, grouped by flight.
    pub fn snapshot(&self) -> RegistrySnapshot {
        let mut by_flight: HashMap<&str, Vec<Passenger>> = self
            .next_ids
            .keys()
            .map(|flight_id| (flight_id.as_str(), Vec::new()))
            .collect();
        for entry in self.passengers.iter() {
            if let Some(passengers) = by_flight.get_mut(entry.key().0.as_str()) {
                passengers.push(entry.value().clone());
            }
        }

        // 先讀乘客再讀計數器，計數器一定大於所有已讀到的 id
        let mut flights: Vec<FlightLedger> = by_flight
            .into_iter()
            .map(|(flight_id, mut passengers)| {
                passengers.sort_by_key(|p| p.customer_id);
                FlightLedger {
                    flight_id: flight_id.to_string(),
                    next_customer_id: self.next_ids[flight_id].load(Ordering::SeqCst),
                    passengers,
                }
            })
            .collect();
        flights.sort_by(|a, b| a.flight_id.cmp(&b.flight_id));

        RegistrySnapshot { flights }
    }

    /// Loads a snapshot on top of the current contents and returns the
    /// number of passengers restored. Ledgers for flights that are no longer
    /// scheduled are skipped.
    pub fn restore(&self, snapshot: RegistrySnapshot) -> usize {
        let mut restored = 0;

        for ledger in snapshot.flights {
            let Some(counter) = self.next_ids.get(&ledger.flight_id) else {
                tracing::warn!(
                    flight_id = %ledger.flight_id,
                    passengers = ledger.passengers.len(),
                    "Skipping snapshot ledger for unscheduled flight"
                );
                continue;
            };

            let highest = ledger
                .passengers
                .iter()
                .map(|p| p.customer_id)
                .max()
                .unwrap_or(0);
            let Some(after_highest) = highest.checked_add(1) else {
                tracing::warn!(
                    flight_id = %ledger.flight_id,
                    customer_id = highest,
                    "Skipping snapshot ledger with an out-of-range customer id"
                );
                continue;
            };
            counter.fetch_max(
                ledger.next_customer_id.max(after_highest),
                Ordering::SeqCst,
            );

            for mut passenger in ledger.passengers {
                passenger.flight_id = ledger.flight_id.clone();
                self.passengers
                    .insert((ledger.flight_id.clone(), passenger.customer_id), passenger);
                restored += 1;
            }
        }

        restored
    }
}
