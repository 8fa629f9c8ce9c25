// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::errors::ConfigError;

/// Complete declarative configuration for a pipeline.
///
/// Typically loaded from a YAML file with three sections:
///
/// ```yaml
/// graphs:
///   summarize:
///     fetch:   { next: [classify, extract] }
///     classify: { next: [store] }
///     extract: { next: [store] }
///     store:   { next: [] }
/// jobs:
///   fetch:    { type: mock }
///   classify: { type: mock }
///   extract:  { type: mock }
///   store:    { type: mock, properties: { table: results } }
/// parameters:
///   summarize:
///     fast: { fetch: { depth: 1 } }
///     deep: { fetch: { depth: 5 } }
/// ```
///
/// A `parameters` section fans one graph definition into one concrete graph
/// per parameter group; each group's entries override job properties.
#[derive(Debug, Default, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub graphs: HashMap<String, GraphDefinition>,
    #[serde(default)]
    pub jobs: HashMap<String, JobConfig>,
    #[serde(default)]
    pub parameters: HashMap<String, ParameterSets>,
}

/// Adjacency of one graph: job name -> its node definition.
pub type GraphDefinition = HashMap<String, NodeDefinition>;

/// Parameter groups for one graph: group -> job -> property overrides.
pub type ParameterSets = HashMap<String, HashMap<String, HashMap<String, Value>>>;

#[derive(Debug, Deserialize)]
pub struct NodeDefinition {
    #[serde(default)]
    pub next: Vec<String>,
}

/// How to instantiate one job: a registered type plus its properties.
#[derive(Debug, Deserialize)]
pub struct JobConfig {
    #[serde(rename = "type")]
    pub job_type: String,
    #[serde(default)]
    pub properties: HashMap<String, Value>,
    /// Property names that must be supplied, either directly in `properties`
    /// or by every parameter group of every graph using this job.
    #[serde(default)]
    pub parameters: Vec<String>,
}

/// Load a configuration from a YAML file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<PipelineConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Parse a configuration from YAML text.
pub fn load_config_from_str(yaml: &str) -> Result<PipelineConfig, ConfigError> {
    let cfg: PipelineConfig = serde_yaml::from_str(yaml)?;
    Ok(cfg)
}

/// Load a configuration and validate it (references, parameters, graph
/// structure) before returning it.
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<PipelineConfig, ConfigError> {
    let cfg = load_config(path)?;
    crate::config::validate_config(&cfg)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_basic_config() {
        let yaml = r#"
graphs:
  main:
    read: { next: [write] }
    write: { next: [] }
jobs:
  read:
    type: mock_reader
    parameters: [filepath]
  write:
    type: mock_writer
    properties:
      table: results
parameters:
  main:
    params1:
      read: { filepath: /tmp/a.txt }
"#;
        let cfg = load_config_from_str(yaml).unwrap();
        assert_eq!(cfg.graphs["main"]["read"].next, vec!["write"]);
        assert!(cfg.graphs["main"]["write"].next.is_empty());
        assert_eq!(cfg.jobs["read"].job_type, "mock_reader");
        assert_eq!(cfg.jobs["read"].parameters, vec!["filepath"]);
        assert_eq!(cfg.jobs["write"].properties["table"], json!("results"));
        assert_eq!(
            cfg.parameters["main"]["params1"]["read"]["filepath"],
            json!("/tmp/a.txt")
        );
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let cfg = load_config_from_str("graphs: {}").unwrap();
        assert!(cfg.graphs.is_empty());
        assert!(cfg.jobs.is_empty());
        assert!(cfg.parameters.is_empty());
    }

    #[test]
    fn malformed_yaml_is_reported() {
        assert!(matches!(
            load_config_from_str("graphs: ["),
            Err(ConfigError::BadYaml(_))
        ));
    }

    #[test]
    fn load_from_file_round_trips() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "graphs:\n  g:\n    only: {{ next: [] }}\njobs:\n  only: {{ type: mock }}\n"
        )
        .unwrap();

        let cfg = load_and_validate_config(file.path()).unwrap();
        assert_eq!(cfg.graphs.len(), 1);
        assert_eq!(cfg.jobs["only"].job_type, "mock");
    }
}
