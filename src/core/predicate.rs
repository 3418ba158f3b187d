//! Environment predicates - decide whether a step applies to an environment

use crate::core::{config::PredicateConfig, environment::Environment, error::ConfigurationError};
use regex::Regex;
use std::fmt;

/// A pure boolean expression over an environment's attributes
///
/// An attribute the environment does not declare never satisfies a
/// comparison, so `Not` over such a comparison is true.
#[derive(Debug, Clone)]
pub enum Predicate {
    /// Included everywhere (the default when a step has no `when`)
    Always,
    Equals { attribute: String, value: String },
    OneOf { attribute: String, values: Vec<String> },
    Matches { attribute: String, pattern: Regex },
    All(Vec<Predicate>),
    Any(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Default for Predicate {
    fn default() -> Self {
        Predicate::Always
    }
}

impl Predicate {
    pub fn equals(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Predicate::Equals {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    pub fn one_of<I, S>(attribute: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Predicate::OneOf {
            attribute: attribute.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn negate(self) -> Self {
        Predicate::Not(Box::new(self))
    }

    pub fn is_always(&self) -> bool {
        matches!(self, Predicate::Always)
    }

    /// Evaluate against an environment
    pub fn evaluate(&self, environment: &Environment) -> bool {
        match self {
            Predicate::Always => true,
            Predicate::Equals { attribute, value } => {
                environment.attribute(attribute) == Some(value.as_str())
            }
            Predicate::OneOf { attribute, values } => environment
                .attribute(attribute)
                .is_some_and(|actual| values.iter().any(|v| v == actual)),
            Predicate::Matches { attribute, pattern } => environment
                .attribute(attribute)
                .is_some_and(|actual| pattern.is_match(actual)),
            Predicate::All(parts) => parts.iter().all(|p| p.evaluate(environment)),
            Predicate::Any(parts) => parts.iter().any(|p| p.evaluate(environment)),
            Predicate::Not(inner) => !inner.evaluate(environment),
        }
    }

    /// Compile a `when` block of the step named `step`
    pub fn from_config(step: &str, config: &PredicateConfig) -> Result<Self, ConfigurationError> {
        let malformed = |reason: String| ConfigurationError::MalformedPredicate {
            step: step.to_string(),
            reason,
        };

        let forms = [
            config.equals.is_some(),
            config.one_of.is_some(),
            config.matches.is_some(),
            config.all_of.is_some(),
            config.any_of.is_some(),
            config.not.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count();

        if forms == 0 {
            return Err(malformed(
                "expected one of equals, one_of, matches, all_of, any_of, not".to_string(),
            ));
        }
        if forms > 1 {
            return Err(malformed(format!(
                "{} forms given where exactly one is allowed",
                forms
            )));
        }

        let attribute = || {
            config
                .attribute
                .clone()
                .ok_or_else(|| malformed("comparison is missing 'attribute'".to_string()))
        };
        let no_attribute = || match &config.attribute {
            Some(attr) => Err(malformed(format!(
                "'attribute: {}' is not allowed on a combinator",
                attr
            ))),
            None => Ok(()),
        };
        let compile_all = |parts: &[PredicateConfig], name: &str| {
            if parts.is_empty() {
                return Err(malformed(format!("'{}' must not be empty", name)));
            }
            parts
                .iter()
                .map(|p| Predicate::from_config(step, p))
                .collect::<Result<Vec<_>, _>>()
        };

        if let Some(value) = &config.equals {
            return Ok(Predicate::Equals {
                attribute: attribute()?,
                value: value.clone(),
            });
        }
        if let Some(values) = &config.one_of {
            if values.is_empty() {
                return Err(malformed("'one_of' must not be empty".to_string()));
            }
            return Ok(Predicate::OneOf {
                attribute: attribute()?,
                values: values.clone(),
            });
        }
        if let Some(pattern) = &config.matches {
            let pattern = Regex::new(pattern)
                .map_err(|e| malformed(format!("invalid pattern '{}': {}", pattern, e)))?;
            return Ok(Predicate::Matches {
                attribute: attribute()?,
                pattern,
            });
        }
        if let Some(parts) = &config.all_of {
            no_attribute()?;
            return Ok(Predicate::All(compile_all(parts, "all_of")?));
        }
        if let Some(parts) = &config.any_of {
            no_attribute()?;
            return Ok(Predicate::Any(compile_all(parts, "any_of")?));
        }

        no_attribute()?;
        // forms == 1, so `not` is the remaining form
        match &config.not {
            Some(inner) => Ok(Predicate::from_config(step, inner)?.negate()),
            None => Err(malformed("empty predicate".to_string())),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |f: &mut fmt::Formatter<'_>, parts: &[Predicate], sep: &str| {
            write!(f, "(")?;
            for (i, part) in parts.iter().enumerate() {
                if i > 0 {
                    write!(f, " {} ", sep)?;
                }
                write!(f, "{}", part)?;
            }
            write!(f, ")")
        };

        match self {
            Predicate::Always => write!(f, "always"),
            Predicate::Equals { attribute, value } => write!(f, "{} == {}", attribute, value),
            Predicate::OneOf { attribute, values } => {
                write!(f, "{} in [{}]", attribute, values.join(", "))
            }
            Predicate::Matches { attribute, pattern } => {
                write!(f, "{} =~ /{}/", attribute, pattern.as_str())
            }
            Predicate::All(parts) => join(f, parts, "and"),
            Predicate::Any(parts) => join(f, parts, "or"),
            Predicate::Not(inner) => write!(f, "not {}", inner),
        }
    }
}
