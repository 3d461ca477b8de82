//! INI file configuration adapter.

use configparser::ini::Ini;
use std::path::Path;

use crate::domain::error::AnalyticsError;
use crate::ports::config_port::ConfigPort;

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AnalyticsError> {
        let mut config = Ini::new();
        config
            .load(path.as_ref())
            .map_err(|reason| AnalyticsError::ConfigParse {
                file: path.as_ref().display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, AnalyticsError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| AnalyticsError::ConfigParse {
                file: "<string>".into(),
                reason,
            })?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }
}
