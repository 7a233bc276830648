use crate::error::{FarmReportError, Result};
use crate::export::DEFAULT_FILE_PREFIX;
use crate::filter::DateWindow;
use crate::format::NumberLocale;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EndpointConfig {
    #[schemars(description = "Base URL of the farm API, e.g. 'https://api.example.com/'")]
    pub base_url: String,

    #[serde(default = "default_properties_path")]
    pub properties_path: String,

    #[serde(default = "default_productions_path")]
    pub productions_path: String,

    #[serde(default = "default_transactions_path")]
    pub transactions_path: String,

    #[serde(default)]
    #[schemars(description = "Bearer token of the signed-in user, if the API requires one")]
    pub bearer_token: Option<String>,
}

impl EndpointConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            properties_path: default_properties_path(),
            productions_path: default_productions_path(),
            transactions_path: default_transactions_path(),
            bearer_token: None,
        }
    }

    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn default_properties_path() -> String {
    "propriedades".to_string()
}

fn default_productions_path() -> String {
    "producao".to_string()
}

fn default_transactions_path() -> String {
    "financeiro".to_string()
}

fn default_window_days() -> Option<u32> {
    Some(30)
}

fn default_file_prefix() -> String {
    DEFAULT_FILE_PREFIX.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DashboardConfig {
    #[serde(default)]
    pub locale: NumberLocale,

    #[serde(default = "default_file_prefix")]
    pub export_file_prefix: String,

    #[serde(default = "default_window_days")]
    #[schemars(
        description = "Initial 'last N days' window for financial entries. null means all time."
    )]
    pub default_window_days: Option<u32>,

    #[serde(default)]
    pub endpoints: Option<EndpointConfig>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            locale: NumberLocale::default(),
            export_file_prefix: default_file_prefix(),
            default_window_days: default_window_days(),
            endpoints: None,
        }
    }
}

impl DashboardConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.locale.thousands_separator == self.locale.decimal_separator {
            return Err(FarmReportError::Config(format!(
                "thousands and decimal separators must differ, both are '{}'",
                self.locale.decimal_separator
            )));
        }

        if let Some(endpoints) = &self.endpoints {
            if endpoints.base_url.trim().is_empty() {
                return Err(FarmReportError::Config(
                    "endpoints.base_url must not be empty".to_string(),
                ));
            }
        }

        Ok(())
    }

    pub fn default_window(&self) -> DateWindow {
        match self.default_window_days {
            Some(days) => DateWindow::LastDays { days },
            None => DateWindow::AllTime,
        }
    }
}
