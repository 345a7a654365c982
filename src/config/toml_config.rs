use crate::core::{ConfigProvider, FlightSchedule};
use crate::utils::error::{BookingError, Result};
use crate::utils::validation::{
    validate_lookup_path, validate_non_empty_string, validate_path, validate_positive_number,
    validate_range, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_LOOKUP_PATH: &str = "/passports/{passport_id}";
pub const DEFAULT_SNAPSHOT_FILE: &str = "passengers.json";
const DEFAULT_TIMEOUT_SECONDS: u64 = 5;
const DEFAULT_RETRY_ATTEMPTS: u32 = 2;
const DEFAULT_RETRY_DELAY_MS: u64 = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub service: ServiceConfig,
    pub passport_api: PassportApiConfig,
    pub storage: Option<StorageConfig>,
    pub logging: Option<LoggingConfig>,
    #[serde(default)]
    pub flights: Vec<FlightEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub bind_addr: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassportApiConfig {
    pub base_url: String,
    pub lookup_path: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub retry_attempts: Option<u32>,
    pub retry_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub snapshot_dir: String,
    pub snapshot_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub json: Option<bool>,
    pub verbose: Option<bool>,
}

/// 航班表的一筆設定
///
/// Times either carry an offset (`2024-12-01T21:00:00+07:00`) or are local
/// wall-clock values (`2024-12-01T21:00:00`) read in the leg's own zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightEntry {
    pub id: String,
    pub departure_time: String,
    pub departure_timezone: String,
    pub arrival_time: String,
    pub arrival_timezone: String,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| BookingError::ConfigError {
            message: format!("Cannot read {}: {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| BookingError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${PASSPORT_API_URL})，未設定的變數保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| BookingError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 命令列參數覆蓋檔案設定
    pub fn with_overrides(mut self, bind_addr: Option<String>, passport_api: Option<String>) -> Self {
        if let Some(bind_addr) = bind_addr {
            self.service.bind_addr = Some(bind_addr);
        }
        if let Some(base_url) = passport_api {
            self.passport_api.base_url = base_url;
        }
        self
    }

    pub fn service_name(&self) -> &str {
        &self.service.name
    }

    pub fn json_logs(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }

    pub fn verbose_logs(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.verbose).unwrap_or(false)
    }

    pub fn schedule(&self) -> Result<FlightSchedule> {
        FlightSchedule::from_entries(&self.flights)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("service.name", &self.service.name)?;

        self.bind_addr()
            .parse::<SocketAddr>()
            .map_err(|e| BookingError::InvalidConfigValueError {
                field: "service.bind_addr".to_string(),
                value: self.bind_addr().to_string(),
                reason: e.to_string(),
            })?;

        validate_url("passport_api.base_url", &self.passport_api.base_url)?;
        validate_lookup_path("passport_api.lookup_path", self.lookup_path())?;

        if let Some(timeout) = self.passport_api.timeout_seconds {
            validate_positive_number("passport_api.timeout_seconds", timeout, 1)?;
        }
        validate_range("passport_api.retry_attempts", self.retry_attempts(), 0, 10)?;

        if let Some(storage) = &self.storage {
            validate_path("storage.snapshot_dir", &storage.snapshot_dir)?;
            if let Some(file) = &storage.snapshot_file {
                validate_path("storage.snapshot_file", file)?;
            }
        }

        if self.flights.is_empty() {
            tracing::warn!("⚠️ No [[flights]] configured; every booking will be rejected");
        }
        // 航班表能否建立也是設定驗證的一部分
        self.schedule()?;

        tracing::info!("✅ Configuration validation passed");
        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn bind_addr(&self) -> &str {
        self.service.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR)
    }

    fn passport_api_endpoint(&self) -> &str {
        &self.passport_api.base_url
    }

    fn lookup_path(&self) -> &str {
        self.passport_api
            .lookup_path
            .as_deref()
            .unwrap_or(DEFAULT_LOOKUP_PATH)
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.passport_api
                .timeout_seconds
                .unwrap_or(DEFAULT_TIMEOUT_SECONDS),
        )
    }

    fn retry_attempts(&self) -> u32 {
        self.passport_api
            .retry_attempts
            .unwrap_or(DEFAULT_RETRY_ATTEMPTS)
    }

    fn retry_delay(&self) -> Duration {
        Duration::from_millis(
            self.passport_api
                .retry_delay_ms
                .unwrap_or(DEFAULT_RETRY_DELAY_MS),
        )
    }

    fn snapshot_location(&self) -> Option<(&str, &str)> {
        self.storage.as_ref().map(|storage| {
            (
                storage.snapshot_dir.as_str(),
                storage
                    .snapshot_file
                    .as_deref()
                    .unwrap_or(DEFAULT_SNAPSHOT_FILE),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[service]
name = "flight-booking"

[passport_api]
base_url = "http://passport_api:8080"

[[flights]]
id = "AAA02"
departure_time = "2024-12-01T10:00:00Z"
departure_timezone = "Europe/London"
arrival_time = "2024-12-01T21:00:00+07:00"
arrival_timezone = "Asia/Bangkok"
"#;

    #[test]
    fn test_defaults_apply() {
        let config = TomlConfig::from_toml_str(MINIMAL).unwrap();

        assert_eq!(config.bind_addr(), DEFAULT_BIND_ADDR);
        assert_eq!(config.lookup_path(), DEFAULT_LOOKUP_PATH);
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.retry_attempts(), 2);
        assert_eq!(config.retry_delay(), Duration::from_millis(100));
        assert!(config.snapshot_location().is_none());
        assert!(!config.json_logs());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("FLIGHT_BOOKING_TEST_PASSPORT_URL", "http://localhost:8081");
        let content = MINIMAL.replace(
            "http://passport_api:8080",
            "${FLIGHT_BOOKING_TEST_PASSPORT_URL}",
        );

        let config = TomlConfig::from_toml_str(&content).unwrap();
        assert_eq!(config.passport_api_endpoint(), "http://localhost:8081");
    }

    #[test]
    fn test_unset_env_var_is_left_in_place() {
        let content = MINIMAL.replace(
            "http://passport_api:8080",
            "${FLIGHT_BOOKING_TEST_SURELY_UNSET}",
        );

        let config = TomlConfig::from_toml_str(&content).unwrap();
        assert_eq!(
            config.passport_api_endpoint(),
            "${FLIGHT_BOOKING_TEST_SURELY_UNSET}"
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides_win() {
        let config = TomlConfig::from_toml_str(MINIMAL)
            .unwrap()
            .with_overrides(
                Some("127.0.0.1:9000".to_string()),
                Some("http://localhost:8081".to_string()),
            );

        assert_eq!(config.bind_addr(), "127.0.0.1:9000");
        assert_eq!(config.passport_api_endpoint(), "http://localhost:8081");
    }

    #[test]
    fn test_invalid_bind_addr() {
        let config = TomlConfig::from_toml_str(MINIMAL)
            .unwrap()
            .with_overrides(Some("not-an-addr".to_string()), None);

        assert!(matches!(
            config.validate(),
            Err(BookingError::InvalidConfigValueError { ref field, .. }) if field == "service.bind_addr"
        ));
    }

    #[test]
    fn test_invalid_flight_fails_validation() {
        let content = MINIMAL.replace("Asia/Bangkok", "Asia/Atlantis");
        let config = TomlConfig::from_toml_str(&content).unwrap();

        assert!(matches!(
            config.validate(),
            Err(BookingError::UnknownTimezone { .. })
        ));
    }

    #[test]
    fn test_storage_section() {
        let content = format!(
            "{}\n[storage]\nsnapshot_dir = \"./data\"\n",
            MINIMAL.replace("[[flights]]", "[logging]\njson = true\n\n[[flights]]")
        );
        let config = TomlConfig::from_toml_str(&content).unwrap();

        assert_eq!(
            config.snapshot_location(),
            Some(("./data", DEFAULT_SNAPSHOT_FILE))
        );
        assert!(config.json_logs());
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            TomlConfig::from_toml_str("[service"),
            Err(BookingError::ConfigError { .. })
        ));
    }
}
