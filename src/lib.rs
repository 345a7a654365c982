pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use adapters::{http::router, passport_client::HttpPassportClient, storage::LocalStorage};
pub use core::{
    booking::BookingService, registry::PassengerRegistry, snapshot::SnapshotStore, FlightSchedule,
};
pub use utils::error::{BookingError, Result};
