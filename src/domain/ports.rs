use crate::domain::model::PassportRecord;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// External identity registry keyed by passport id.
///
/// `Ok(None)` means the registry answered and has no such passport.
/// Transport failures and timeouts are `BookingError::RegistryUnavailable`;
/// implementations must not fold them into `Ok(None)`.
/// Implementations must not cache: every call reflects current registry state.
#[async_trait]
pub trait PassportRegistry: Send + Sync {
    async fn lookup(&self, passport_id: &str) -> Result<Option<PassportRecord>>;
}

#[async_trait]
pub trait Storage: Send + Sync {
    /// 檔案不存在時回傳 `Ok(None)`
    async fn read_file(&self, path: &str) -> Result<Option<Vec<u8>>>;
    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()>;
}

pub trait ConfigProvider: Send + Sync {
    fn bind_addr(&self) -> &str;
    fn passport_api_endpoint(&self) -> &str;
    fn lookup_path(&self) -> &str;
    fn request_timeout(&self) -> Duration;
    fn retry_attempts(&self) -> u32;
    fn retry_delay(&self) -> Duration;
    /// (directory, file name) of the passenger snapshot, if persistence is on.
    fn snapshot_location(&self) -> Option<(&str, &str)>;
}
