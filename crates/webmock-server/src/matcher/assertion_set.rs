//! Ordered collection of assertions installed as one unit.

use super::assertion::Assertion;
use super::types::{AssertionsConfig, ConfigError};

/// The active configuration. Position is identity: two identical entries are
/// still two distinct assertions.
#[derive(Debug, Clone, Default)]
pub struct AssertionSet {
    assertions: Vec<Assertion>,
}

impl AssertionSet {
    /// Build every assertion or none of them
    pub fn from_config(config: AssertionsConfig) -> Result<Self, ConfigError> {
        let assertions = config
            .assertions
            .into_iter()
            .enumerate()
            .map(|(index, assertion)| Assertion::from_config(index, assertion))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { assertions })
    }

    pub fn to_config(&self) -> AssertionsConfig {
        AssertionsConfig {
            assertions: self.assertions.iter().map(Assertion::to_config).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.assertions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assertions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Assertion> {
        self.assertions.iter()
    }

    pub(crate) fn into_inner(self) -> Vec<Assertion> {
        self.assertions
    }
}

impl TryFrom<AssertionsConfig> for AssertionSet {
    type Error = ConfigError;

    fn try_from(config: AssertionsConfig) -> Result<Self, Self::Error> {
        Self::from_config(config)
    }
}
