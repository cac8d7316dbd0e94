//! Column selectors: predicates over exogenous column names, evaluated once
//! when an effect is bound to its training frame.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::effects::errors::{EffectError, EffectResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "select", content = "value", rename_all = "snake_case")]
pub enum ColumnSelector {
    /// Matches nothing.
    #[default]
    NoInput,
    All,
    /// Exactly these columns, in this order. Every name must exist.
    Names(Vec<String>),
    Prefix(String),
    AllExcept(Vec<String>),
}

impl ColumnSelector {
    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ColumnSelector::Names(names.into_iter().map(Into::into).collect())
    }

    /// Reject contradictory declarations: an empty `Names` list, or a name
    /// listed twice in `Names` / `AllExcept`.
    pub fn validate(&self, effect: &str) -> EffectResult<()> {
        let list = match self {
            ColumnSelector::Names(list) if list.is_empty() => {
                return Err(EffectError::EmptyNameSelector { effect: effect.to_string() });
            }
            ColumnSelector::Names(list) | ColumnSelector::AllExcept(list) => list,
            _ => return Ok(()),
        };
        let mut seen = HashSet::new();
        match list.iter().find(|c| !seen.insert(c.as_str())) {
            Some(dup) => Err(EffectError::DuplicateSelectorEntry {
                effect: effect.to_string(),
                column: dup.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Explicitly named columns, used for the exclusive-columns check.
    pub fn explicit_names(&self) -> &[String] {
        match self {
            ColumnSelector::Names(list) => list,
            _ => &[],
        }
    }

    /// Columns of `available` this selector matches. Pattern selectors keep
    /// frame order; `Names` keeps its own order.
    ///
    /// # Errors
    /// [`EffectError::MissingColumn`] when a `Names` entry is absent.
    pub fn resolve(&self, effect: &str, available: &[String]) -> EffectResult<Vec<String>> {
        match self {
            ColumnSelector::NoInput => Ok(Vec::new()),
            ColumnSelector::All => Ok(available.to_vec()),
            ColumnSelector::Names(list) => list
                .iter()
                .map(|c| {
                    if available.contains(c) {
                        Ok(c.clone())
                    } else {
                        Err(EffectError::MissingColumn {
                            effect: effect.to_string(),
                            column: c.clone(),
                        })
                    }
                })
                .collect(),
            ColumnSelector::Prefix(p) => {
                Ok(available.iter().filter(|c| c.starts_with(p.as_str())).cloned().collect())
            }
            ColumnSelector::AllExcept(list) => {
                Ok(available.iter().filter(|c| !list.contains(c)).cloned().collect())
            }
        }
    }
}
