use crate::error::{Result, StreamError};
use serde::Deserialize;
use std::env;
use std::fs;

const DEFAULT_INITIAL_CAPACITY: usize = 8 * 1024;
const DEFAULT_MAX_LINE_BYTES: usize = 4 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StreamConfig {
    /// Initial size of the line buffer
    pub initial_capacity: usize,
    /// Upper bound on a single buffered line, delimiter excluded
    pub max_line_bytes: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
        }
    }
}

impl StreamConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = StreamConfig::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| StreamError::Config(format!("Failed to read config file: {}", e)))?;

        let mut config: StreamConfig = toml::from_str(&contents)?;

        // Allow environment variables to override file config
        config.apply_env()?;

        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(capacity) = read_usize("DIFY_STREAM_BUFFER_CAPACITY")? {
            self.initial_capacity = capacity;
        }
        if let Some(limit) = read_usize("DIFY_STREAM_MAX_LINE_BYTES")? {
            self.max_line_bytes = limit;
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.initial_capacity == 0 {
            return Err(StreamError::Config(
                "initial_capacity must be greater than 0".to_string(),
            ));
        }

        if self.max_line_bytes == 0 {
            return Err(StreamError::Config(
                "max_line_bytes must be greater than 0".to_string(),
            ));
        }

        if self.max_line_bytes < self.initial_capacity {
            return Err(StreamError::Config(format!(
                "max_line_bytes ({}) is smaller than initial_capacity ({})",
                self.max_line_bytes, self.initial_capacity
            )));
        }

        Ok(())
    }
}

fn read_usize(key: &str) -> Result<Option<usize>> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|e| StreamError::Config(format!("Invalid {} value: {}", key, e))),
        Err(_) => Ok(None),
    }
}
