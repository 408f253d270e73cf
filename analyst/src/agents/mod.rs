//! Text-generation collaborators.
//!
//! The [`Generator`] trait decouples the workflow from the actual generation
//! backend (a configured CLI command in production). Tests use scripted
//! generators that return predetermined completions without spawning
//! anything. Structured collaborators validate the completion against an
//! embedded JSON Schema before deserializing it.

use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use jsonschema::Draft;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::io::process::run_command_with_timeout;

pub mod coding;
pub mod conductor;
pub mod frontdesk;
pub mod planning;
pub mod reporter;

/// A generation call failed at the transport level (spawn, timeout, non-zero
/// exit, or malformed output). The core never retries these on its own.
#[derive(Error, Debug)]
#[error("text generation failed: {0}")]
pub struct GenerationError(pub String);

/// One request to the generation backend.
#[derive(Debug, Clone)]
pub struct GenRequest {
    /// Full prompt text.
    pub prompt: String,
    /// JSON Schema the completion must satisfy, when the caller expects
    /// structured output.
    pub schema: Option<&'static str>,
}

/// Abstraction over text-generation backends.
pub trait Generator {
    /// Produce a completion for the request.
    fn generate(&self, request: &GenRequest) -> Result<String>;
}

/// Generator that spawns a configured command, feeding the prompt on stdin
/// and reading the completion from stdout.
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    command: Vec<String>,
    timeout: Duration,
    output_limit_bytes: usize,
}

impl CommandGenerator {
    pub fn new(command: Vec<String>, timeout: Duration, output_limit_bytes: usize) -> Self {
        Self {
            command,
            timeout,
            output_limit_bytes,
        }
    }
}

impl Generator for CommandGenerator {
    #[instrument(skip_all, fields(timeout_secs = self.timeout.as_secs()))]
    fn generate(&self, request: &GenRequest) -> Result<String> {
        let program = self
            .command
            .first()
            .ok_or_else(|| GenerationError("generator command is empty".to_string()))?;
        let mut cmd = Command::new(program);
        cmd.args(&self.command[1..]);

        // The schema file must outlive the child process.
        let mut schema_file = None;
        if let Some(schema) = request.schema {
            let file = tempfile::NamedTempFile::new()
                .map_err(|err| GenerationError(format!("write schema file: {err}")))?;
            std::fs::write(file.path(), schema)
                .map_err(|err| GenerationError(format!("write schema file: {err}")))?;
            cmd.arg("--output-schema").arg(file.path());
            schema_file = Some(file);
        }

        debug!(program = %program, structured = schema_file.is_some(), "invoking generation backend");
        let output = run_command_with_timeout(
            cmd,
            Some(request.prompt.as_bytes()),
            self.timeout,
            self.output_limit_bytes,
        )
        .map_err(|err| GenerationError(format!("{err:#}")))?;

        if output.timed_out {
            warn!(timeout_secs = self.timeout.as_secs(), "generation timed out");
            return Err(GenerationError(format!(
                "generation timed out after {:?}",
                self.timeout
            ))
            .into());
        }
        if !output.status.success() {
            warn!(exit_code = ?output.status.code(), "generation backend failed");
            return Err(GenerationError(format!(
                "generation backend exited with status {:?}: {}",
                output.status.code(),
                output.stderr_text().trim()
            ))
            .into());
        }

        Ok(output.stdout_text())
    }
}

/// Run a structured generation: validate the completion against the schema,
/// then deserialize it.
pub fn generate_json<G: Generator, T: DeserializeOwned>(
    generator: &G,
    prompt: String,
    schema: &'static str,
) -> Result<T> {
    let request = GenRequest {
        prompt,
        schema: Some(schema),
    };
    let completion = generator.generate(&request)?;
    let trimmed = completion.trim();

    let instance: Value = serde_json::from_str(trimmed)
        .map_err(|err| GenerationError(format!("completion is not valid JSON: {err}")))?;
    let schema_json: Value = serde_json::from_str(schema).context("parse embedded schema")?;
    validate_schema(&instance, &schema_json)?;

    let value = serde_json::from_value(instance)
        .map_err(|err| GenerationError(format!("completion does not match schema: {err}")))?;
    Ok(value)
}

/// Validate a JSON instance against a JSON Schema (Draft 2020-12).
fn validate_schema(instance: &Value, schema: &Value) -> Result<()> {
    let compiled = jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(schema)
        .context("compile json schema")?;
    let messages: Vec<String> = compiled
        .iter_errors(instance)
        .map(|err| err.to_string())
        .collect();
    if !messages.is_empty() {
        return Err(anyhow!(GenerationError(format!(
            "completion violates schema:\n- {}",
            messages.join("\n- ")
        ))));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    struct EchoGenerator(String);

    impl Generator for EchoGenerator {
        fn generate(&self, _request: &GenRequest) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        name: String,
    }

    const SAMPLE_SCHEMA: &str = r#"{
        "type": "object",
        "properties": { "name": { "type": "string" } },
        "required": ["name"],
        "additionalProperties": false
    }"#;

    #[test]
    fn generate_json_accepts_valid_output() {
        let generator = EchoGenerator(r#" {"name": "ok"} "#.to_string());
        let value: Sample =
            generate_json(&generator, "prompt".to_string(), SAMPLE_SCHEMA).expect("parse");
        assert_eq!(value.name, "ok");
    }

    #[test]
    fn generate_json_rejects_non_json() {
        let generator = EchoGenerator("not json".to_string());
        let err = generate_json::<_, Sample>(&generator, "prompt".to_string(), SAMPLE_SCHEMA)
            .expect_err("should fail");
        assert!(err.downcast_ref::<GenerationError>().is_some());
    }

    #[test]
    fn generate_json_rejects_schema_violations() {
        let generator = EchoGenerator(r#"{"name": 7}"#.to_string());
        let err = generate_json::<_, Sample>(&generator, "prompt".to_string(), SAMPLE_SCHEMA)
            .expect_err("should fail");
        assert!(err.downcast_ref::<GenerationError>().is_some());
        assert!(err.to_string().contains("schema"));
    }

    #[test]
    fn command_generator_returns_stdout() {
        let generator = CommandGenerator::new(
            vec!["cat".to_string(), "-".to_string()],
            Duration::from_secs(5),
            64 * 1024,
        );
        let completion = generator
            .generate(&GenRequest {
                prompt: "hello".to_string(),
                schema: None,
            })
            .expect("generate");
        assert_eq!(completion, "hello");
    }

    #[test]
    fn command_generator_failure_is_a_generation_error() {
        let generator = CommandGenerator::new(
            vec!["sh".to_string(), "-c".to_string(), "exit 2".to_string()],
            Duration::from_secs(5),
            1024,
        );
        let err = generator
            .generate(&GenRequest {
                prompt: String::new(),
                schema: None,
            })
            .expect_err("should fail");
        assert!(err.downcast_ref::<GenerationError>().is_some());
    }
}
