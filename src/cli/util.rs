//! CLI utility helpers

use fireclass::{Context, EngineConfig, Error, ModelLoader, ModelSnapshot, Result};
use serde::Serialize;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

/// Options shared by every command
pub struct Options {
    pub model: PathBuf,
    pub config: Option<PathBuf>,
    pub input: Option<PathBuf>,
}

impl Options {
    /// Configuration from --config, or the built-in defaults
    pub fn engine_config(&self) -> Result<EngineConfig> {
        match &self.config {
            Some(path) => EngineConfig::load(path),
            None => Ok(EngineConfig::default()),
        }
    }

    pub fn snapshot(&self, config: &EngineConfig) -> Result<Arc<ModelSnapshot>> {
        ModelLoader::new(&self.model, Arc::new(config.aliases.clone())).snapshot()
    }

    /// Context from --input, or stdin
    pub fn context(&self) -> Result<Context> {
        let text = match &self.input {
            Some(path) => std::fs::read_to_string(path).map_err(Error::Io)?,
            None => {
                let mut text = String::new();
                std::io::stdin()
                    .read_to_string(&mut text)
                    .map_err(Error::Io)?;
                text
            }
        };
        if text.trim().is_empty() {
            return Ok(Context::new());
        }
        Context::from_json_str(&text)
    }
}

/// Write a value to stdout as pretty JSON
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
