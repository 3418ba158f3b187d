//! Pipeline configuration from YAML

use crate::core::{
    environment::{Environment, OS_ATTRIBUTE},
    error::ConfigurationError,
    Pipeline,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// File looked up in the working directory when no path is given
pub const DEFAULT_FILE: &str = "qgate.yml";

/// Definition used when no pipeline file exists
const BUILTIN_PIPELINE: &str = include_str!("../../qgate.yml");

/// Top-level pipeline configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Pipeline name
    pub name: String,

    /// Strict mode for every step of every job
    #[serde(default)]
    pub strict: bool,

    /// Global environment variables
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// The environment matrix
    #[serde(default)]
    pub environments: Vec<EnvironmentConfig>,

    /// Pipeline steps in execution order
    #[serde(default)]
    pub steps: Vec<StepConfig>,
}

/// An environment declaration: a bare name, or a detailed mapping
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnvironmentConfig {
    /// `- linux` declares an environment whose OS tag equals its name
    Name(String),
    Detailed(EnvironmentDetails),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentDetails {
    pub name: String,

    /// Attributes predicates match against; `os` defaults to the name
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,

    /// Job-scoped environment variables
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    #[serde(default)]
    pub strict: bool,
}

impl EnvironmentConfig {
    pub fn name(&self) -> &str {
        match self {
            EnvironmentConfig::Name(name) => name,
            EnvironmentConfig::Detailed(details) => &details.name,
        }
    }

    pub fn strict(&self) -> bool {
        matches!(self, EnvironmentConfig::Detailed(details) if details.strict)
    }

    pub fn env(&self) -> BTreeMap<String, String> {
        match self {
            EnvironmentConfig::Name(_) => BTreeMap::new(),
            EnvironmentConfig::Detailed(details) => details.env.clone(),
        }
    }

    pub fn to_environment(&self) -> Environment {
        match self {
            EnvironmentConfig::Name(name) => Environment::os(name.clone()),
            EnvironmentConfig::Detailed(details) => {
                let mut environment = Environment::new(details.name.clone());
                environment.attributes = details.attributes.clone();
                environment
                    .attributes
                    .entry(OS_ATTRIBUTE.to_string())
                    .or_insert_with(|| details.name.clone());
                environment
            }
        }
    }
}

/// Step configuration as defined in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepConfig {
    /// Unique step name
    pub name: String,

    /// Optional step description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Program followed by its arguments
    pub command: Vec<String>,

    /// Step-scoped environment variables
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Strict mode for this step only
    #[serde(default)]
    pub strict: bool,

    /// Inclusion predicate (absent = every environment)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<PredicateConfig>,

    /// Whether the step is part of the pre-push local gate
    #[serde(default)]
    pub local: bool,

    /// Timeout for this step (in seconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Predicate configuration: exactly one form per node
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PredicateConfig {
    /// Attribute compared by `equals`, `one_of` and `matches`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equals: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<String>>,

    /// Regular expression
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matches: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_of: Option<Vec<PredicateConfig>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub any_of: Option<Vec<PredicateConfig>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<PredicateConfig>>,
}

impl PipelineConfig {
    /// Load pipeline configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigurationError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Parse pipeline configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigurationError> {
        let config: PipelineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// The definition shipped with the binary
    pub fn builtin() -> Result<Self, ConfigurationError> {
        Self::from_yaml(BUILTIN_PIPELINE)
    }

    /// Load `path` if given, else `qgate.yml` in `dir`, else the built-in definition
    pub fn discover(path: Option<&Path>, dir: &Path) -> Result<Self, ConfigurationError> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        let default = dir.join(DEFAULT_FILE);
        if default.is_file() {
            Self::from_file(default)
        } else {
            Self::builtin()
        }
    }

    /// Validate by building the domain model
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.to_pipeline().map(|_| ())
    }

    /// Convert config to a Pipeline domain model
    pub fn to_pipeline(&self) -> Result<Pipeline, ConfigurationError> {
        Pipeline::from_config(self)
    }
}
