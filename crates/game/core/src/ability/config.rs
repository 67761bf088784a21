//! Declared configuration parameters of an ability.

use std::collections::BTreeMap;

use crate::dice::Dice;
use crate::error::{ConfigError, HookError, HookResult};
use crate::state::AbilityId;

/// Kind of a configuration value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ParamKind {
    Int,
    Text,
}

/// A single configuration value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParamValue {
    Int(i64),
    Text(String),
}

impl ParamValue {
    pub fn kind(&self) -> ParamKind {
        match self {
            Self::Int(_) => ParamKind::Int,
            Self::Text(_) => ParamKind::Text,
        }
    }
}

/// Schema entry an ability script declares for one parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    /// Inclusive lower bound for integer parameters.
    pub min: Option<i64>,
}

impl ParamSpec {
    /// Integer parameter that must be at least 1 (dice quantity, dice sides).
    pub const fn positive_int(name: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::Int,
            min: Some(1),
        }
    }
}

/// Named parameter values attached to an ability definition.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AbilityConfig {
    values: BTreeMap<String, ParamValue>,
}

impl AbilityConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_int(mut self, name: impl Into<String>, value: i64) -> Self {
        self.values.insert(name.into(), ParamValue::Int(value));
        self
    }

    #[must_use]
    pub fn with_text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values
            .insert(name.into(), ParamValue::Text(value.into()));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> + '_ {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Reads an integer parameter from inside a hook.
    pub fn int(&self, name: &str) -> HookResult<i64> {
        match self.values.get(name) {
            Some(ParamValue::Int(value)) => Ok(*value),
            _ => Err(HookError::Param {
                param: name.to_string(),
                expected: ParamKind::Int,
            }),
        }
    }

    /// Reads a text parameter from inside a hook.
    pub fn text(&self, name: &str) -> HookResult<&str> {
        match self.values.get(name) {
            Some(ParamValue::Text(value)) => Ok(value),
            _ => Err(HookError::Param {
                param: name.to_string(),
                expected: ParamKind::Text,
            }),
        }
    }

    /// Builds a dice expression from two integer parameters.
    pub fn dice(&self, quantity: &str, sides: &str) -> HookResult<Dice> {
        let quantity = to_u32(self.int(quantity)?, quantity)?;
        let sides = to_u32(self.int(sides)?, sides)?;
        Ok(Dice::new(quantity, sides)?)
    }

    /// Checks the values against the script's declared schema.
    pub(crate) fn validate(&self, ability: &AbilityId, specs: &[ParamSpec]) -> Result<(), ConfigError> {
        for spec in specs {
            let value = self
                .values
                .get(spec.name)
                .ok_or_else(|| ConfigError::MissingParam {
                    ability: ability.clone(),
                    param: spec.name.to_string(),
                })?;

            if value.kind() != spec.kind {
                return Err(ConfigError::ParamKind {
                    ability: ability.clone(),
                    param: spec.name.to_string(),
                    expected: spec.kind,
                });
            }

            if let (ParamValue::Int(value), Some(min)) = (value, spec.min)
                && *value < min
            {
                return Err(ConfigError::ParamBelowMinimum {
                    ability: ability.clone(),
                    param: spec.name.to_string(),
                    value: *value,
                    min,
                });
            }
        }
        Ok(())
    }
}

fn to_u32(value: i64, name: &str) -> HookResult<u32> {
    u32::try_from(value).map_err(|_| HookError::Param {
        param: name.to_string(),
        expected: ParamKind::Int,
    })
}
