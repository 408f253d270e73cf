//! Configuration for the analyst workspace (`.analyst/config.toml`).

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::retry::DEFAULT_MAX_ITERATIONS;

/// Workspace configuration.
///
/// Keep this intentionally small: every field has a sensible default and a
/// missing file behaves exactly like the defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AnalystConfig {
    /// Interpreter used to execute generated artifacts.
    pub interpreter: String,

    /// Generation-attempt ceiling per task text before escalation or abort.
    pub max_iterations: u32,

    /// Wall-clock budget for one sandboxed execution, in seconds.
    pub task_timeout_secs: u64,

    /// Command line of the text-generation backend (prompt on stdin,
    /// completion on stdout).
    pub generator_command: Vec<String>,

    /// Wall-clock budget for one generation call, in seconds.
    pub generator_timeout_secs: u64,

    /// Truncate captured stdout/stderr beyond this many bytes.
    pub output_limit_bytes: usize,

    /// Directory holding `<tool>.txt` reference documents.
    pub docs_dir: String,

    /// Catalog of available tools: name -> short description.
    pub tools: BTreeMap<String, String>,
}

impl Default for AnalystConfig {
    fn default() -> Self {
        Self {
            interpreter: "python3".to_string(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            task_timeout_secs: 600,
            generator_command: vec!["llm-complete".to_string()],
            generator_timeout_secs: 120,
            output_limit_bytes: 100_000,
            docs_dir: ".analyst/docs".to_string(),
            tools: BTreeMap::new(),
        }
    }
}

impl AnalystConfig {
    pub fn validate(&self) -> Result<()> {
        if self.interpreter.trim().is_empty() {
            return Err(anyhow!("interpreter must be set"));
        }
        if self.max_iterations == 0 {
            return Err(anyhow!("max_iterations must be > 0"));
        }
        if self.task_timeout_secs == 0 {
            return Err(anyhow!("task_timeout_secs must be > 0"));
        }
        if self.generator_timeout_secs == 0 {
            return Err(anyhow!("generator_timeout_secs must be > 0"));
        }
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("output_limit_bytes must be > 0"));
        }
        if self.generator_command.is_empty() || self.generator_command[0].trim().is_empty() {
            return Err(anyhow!("generator_command must be a non-empty array"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `AnalystConfig::default()`.
pub fn load_config(path: &Path) -> Result<AnalystConfig> {
    if !path.exists() {
        let cfg = AnalystConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: AnalystConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &AnalystConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, &buf)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, AnalystConfig::default());
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        let mut cfg = AnalystConfig::default();
        cfg.tools
            .insert("plotter".to_string(), "draw figures".to_string());
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn zero_iterations_is_rejected() {
        let cfg = AnalystConfig {
            max_iterations: 0,
            ..AnalystConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn empty_generator_command_is_rejected() {
        let cfg = AnalystConfig {
            generator_command: Vec::new(),
            ..AnalystConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
