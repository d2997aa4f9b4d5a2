use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{
    dispatch::DispatchSettings, embedded::EmbeddedConfig, logging::LogConfig,
    transport::TransportConfig,
};
use crate::validation::ConfigValidator;
use crate::{ConfigError, ConfigResult};

pub const DEFAULT_CONFIG_PATHS: [&str; 3] = [
    "config/dispatch.toml",
    "dispatch.toml",
    "/etc/fleet-dispatch/config.toml",
];

pub const ENV_PREFIX: &str = "FLEET_DISPATCH";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub transport: TransportConfig,
    pub dispatch: DispatchSettings,
    pub logging: LogConfig,
    pub embedded: EmbeddedConfig,
}

impl AppConfig {
    /// 按 默认值 -> 配置文件 -> 环境变量 的顺序叠加加载
    pub fn load(config_path: Option<&str>) -> ConfigResult<Self> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_path {
            if Path::new(path).exists() {
                builder = builder.add_source(File::new(path, FileFormat::Toml));
            } else {
                return Err(ConfigError::File(format!("配置文件不存在: {path}")));
            }
        } else if let Some(path) = DEFAULT_CONFIG_PATHS
            .iter()
            .find(|path| Path::new(path).exists())
        {
            builder = builder.add_source(File::new(path, FileFormat::Toml));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder.build()?.try_deserialize()?;

        config.validate()?;

        Ok(config)
    }

    pub fn from_toml(toml_str: &str) -> ConfigResult<Self> {
        let config: AppConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

impl ConfigValidator for AppConfig {
    fn validate(&self) -> ConfigResult<()> {
        self.transport.validate()?;
        self.dispatch.validate()?;
        self.logging.validate()?;
        self.embedded.validate()?;
        Ok(())
    }
}
