use thiserror::Error;

/// 名字不符時回傳給呼叫端的固定訊息（相容性契約，不可更改）
pub const NAME_MISMATCH_DETAIL: &str = "Firstname or Lastname is mismatch.";

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("{}", NAME_MISMATCH_DETAIL)]
    NameMismatch,

    #[error("Passport {passport_id} not found in registry")]
    PassportNotFound { passport_id: String },

    #[error("Flight {flight_id} not found")]
    FlightNotFound { flight_id: String },

    #[error("Passenger {customer_id} not found on flight {flight_id}")]
    PassengerNotFound { flight_id: String, customer_id: u64 },

    #[error("Passport registry unavailable: {reason}")]
    RegistryUnavailable { reason: String },

    #[error("Invalid timestamp '{value}': {reason}")]
    InvalidTimestamp { value: String, reason: String },

    #[error("Unknown timezone: {zone}")]
    UnknownTimezone { zone: String },

    #[error("Invalid flight {flight_id}: {reason}")]
    InvalidFlight { flight_id: String, reason: String },

    #[error("Invalid request field '{field}': {reason}")]
    InvalidRequest { field: String, reason: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    NotFound,
    Upstream,
    Config,
    Internal,
}

impl BookingError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            BookingError::NameMismatch
            | BookingError::PassportNotFound { .. }
            | BookingError::InvalidRequest { .. } => ErrorCategory::Validation,
            BookingError::FlightNotFound { .. } | BookingError::PassengerNotFound { .. } => {
                ErrorCategory::NotFound
            }
            BookingError::RegistryUnavailable { .. } => ErrorCategory::Upstream,
            BookingError::InvalidTimestamp { .. }
            | BookingError::UnknownTimezone { .. }
            | BookingError::InvalidFlight { .. }
            | BookingError::ConfigError { .. }
            | BookingError::InvalidConfigValueError { .. } => ErrorCategory::Config,
            BookingError::IoError(_) | BookingError::SerializationError(_) => {
                ErrorCategory::Internal
            }
        }
    }

    /// 只有外部依賴的基礎設施錯誤可由呼叫端重試
    pub fn is_retryable(&self) -> bool {
        matches!(self, BookingError::RegistryUnavailable { .. })
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Validation => {
                "Check that the names match the passport record exactly (case-sensitive)"
            }
            ErrorCategory::NotFound => "Verify the flight id and customer id",
            ErrorCategory::Upstream => {
                "The passport registry did not answer; retry later or check passport_api.base_url"
            }
            ErrorCategory::Config => "Fix the configuration file and restart the service",
            ErrorCategory::Internal => "Check file permissions and the storage directory",
        }
    }
}

pub type Result<T> = std::result::Result<T, BookingError>;
