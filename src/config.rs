use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{KernelError, KernelResult};

/// Simulator configuration. Every field has a default, so a partial JSON file
/// only needs to name the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Number of process table slots. Main memory holds one chunk per slot.
    pub process_table_size: usize,

    /// Size in words of the memory chunk owned by each process.
    pub chunk_size: usize,

    /// Instructions executed between two clock interrupts.
    pub clock_interval: u64,

    /// Program that is admitted as the idle daemon at descriptor index 0.
    pub idle_program_name: String,

    /// Stop the run after this many instructions.
    pub max_instructions: Option<u64>,

    /// Program file holding the job images.
    pub program_file: PathBuf,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            process_table_size: 4,
            chunk_size: 60,
            clock_interval: 5,
            idle_program_name: "SystemIdleProcess".into(),
            max_instructions: Some(10_000),
            program_file: PathBuf::from("data/program_file.txt"),
        }
    }
}

impl SimulatorConfig {
    pub fn load(path: &Path) -> KernelResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| KernelError::InvalidConfiguration(e.to_string()))?;

        serde_json::from_str(&content).map_err(|e| KernelError::InvalidConfiguration(e.to_string()))
    }

    pub fn save(&self, path: &Path) -> KernelResult<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| KernelError::InvalidConfiguration(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| KernelError::InvalidConfiguration(e.to_string()))
    }

    pub fn validate(&self) -> KernelResult<()> {
        if self.process_table_size == 0 {
            return Err(KernelError::InvalidConfiguration(
                "process_table_size must be at least 1".into(),
            ));
        }
        if self.chunk_size == 0 {
            return Err(KernelError::InvalidConfiguration("chunk_size must be at least 1".into()));
        }
        if self.clock_interval == 0 {
            return Err(KernelError::InvalidConfiguration(
                "clock_interval must be at least 1".into(),
            ));
        }
        if self.idle_program_name.trim().is_empty() {
            return Err(KernelError::InvalidConfiguration(
                "idle_program_name must not be empty".into(),
            ));
        }
        Ok(())
    }

    pub fn main_memory_size(&self) -> usize {
        self.process_table_size * self.chunk_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default_is_valid() {
        let config = SimulatorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.main_memory_size(), 240);
    }

    #[test]
    fn test_config_rejects_empty_table() {
        let config = SimulatorConfig { process_table_size: 0, ..SimulatorConfig::default() };
        assert!(matches!(config.validate(), Err(KernelError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_config_rejects_zero_clock_interval() {
        let config = SimulatorConfig { clock_interval: 0, ..SimulatorConfig::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_partial_json_uses_defaults() {
        let config: SimulatorConfig =
            serde_json::from_str(r#"{ "chunk_size": 100 }"#).unwrap();
        assert_eq!(config.chunk_size, 100);
        assert_eq!(config.process_table_size, 4);
        assert_eq!(config.idle_program_name, "SystemIdleProcess");
    }

    #[test]
    fn test_config_save_then_load() {
        let path = std::env::temp_dir().join(format!("os-kernel-sim-{}.json", std::process::id()));
        let config = SimulatorConfig { clock_interval: 7, ..SimulatorConfig::default() };
        config.save(&path).unwrap();
        let loaded = SimulatorConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
    }
}
