use crate::rules::{
    balance, completeness, control_flow, immutability, spelling, termination, undefined, Rule,
    RuleBuildError,
};
use std::fmt;

/// The ordered, immutable catalogue of rules.
///
/// Registration order is the order findings are reported in, and the
/// priority the fixer uses when two fixes overlap.
#[derive(Debug, Clone)]
pub struct RuleRegistry {
    rules: Vec<Rule>,
}

#[derive(Debug)]
pub enum RegistryError {
    UnknownRule {
        id: String,
        available: Vec<&'static str>,
    },
    Build(RuleBuildError),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::UnknownRule { id, available } => write!(
                f,
                "unknown rule '{}'. available rules: {}",
                id,
                available.join(", ")
            ),
            RegistryError::Build(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for RegistryError {}

impl From<RuleBuildError> for RegistryError {
    fn from(e: RuleBuildError) -> Self {
        RegistryError::Build(e)
    }
}

impl RuleRegistry {
    /// Every built-in rule, in reporting order.
    pub fn builtin() -> Result<Self, RuleBuildError> {
        let mut rules = Vec::new();
        rules.extend(termination::rules()?);
        rules.extend(control_flow::rules()?);
        rules.extend(immutability::rules()?);
        rules.extend(spelling::rules()?);
        rules.extend(balance::rules()?);
        rules.extend(completeness::rules()?);
        rules.extend(undefined::rules()?);
        Ok(Self { rules })
    }

    pub fn from_rules(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Drop the rules named in `ids`. Naming a rule that does not exist is an
    /// error, so typos in config do not silently keep a rule enabled.
    pub fn without(mut self, ids: &[String]) -> Result<Self, RegistryError> {
        for id in ids {
            if !self.rules.iter().any(|r| r.id() == id) {
                return Err(RegistryError::UnknownRule {
                    id: id.clone(),
                    available: self.ids(),
                });
            }
        }
        self.rules.retain(|r| !ids.iter().any(|id| id == r.id()));
        Ok(self)
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.id()).collect()
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id() == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<'a> IntoIterator for &'a RuleRegistry {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
