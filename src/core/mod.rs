pub mod booking;
pub mod matcher;
pub mod registry;
pub mod schedule;
pub mod snapshot;
pub mod timezone;

pub use crate::domain::model::{
    Flight, FlightView, MatchResult, MismatchReason, Passenger, PassengerDetails, PassportRecord,
};
pub use crate::domain::ports::{ConfigProvider, PassportRegistry, Storage};
pub use crate::utils::error::Result;
pub use schedule::FlightSchedule;
