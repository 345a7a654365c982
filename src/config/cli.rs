use crate::config::toml_config::TomlConfig;
use crate::utils::error::Result;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "flight-booking")]
#[command(about = "Flight passenger booking service with passport verification")]
pub struct CliConfig {
    #[arg(long, default_value = "booking.toml", help = "Path to the TOML configuration")]
    pub config: String,

    #[arg(long, help = "Override service.bind_addr")]
    pub bind: Option<String>,

    #[arg(long, help = "Override passport_api.base_url")]
    pub passport_api: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

impl CliConfig {
    /// 載入設定檔並套用命令列覆蓋
    pub fn load(&self) -> Result<TomlConfig> {
        Ok(TomlConfig::from_file(&self.config)?
            .with_overrides(self.bind.clone(), self.passport_api.clone()))
    }
}
