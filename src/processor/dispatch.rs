use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Debug;
use thiserror::Error;

use crate::rules::RuleCollection;
use crate::types::{EntityType, UpdateActionType, UpdateOptionType};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("{entity}: combination {option} and {action} is registered twice")]
    Duplicate {
        entity: EntityType,
        option: UpdateOptionType,
        action: UpdateActionType,
    },

    #[error("{entity}: option {option} is declared but has no actions")]
    MissingOption {
        entity: EntityType,
        option: UpdateOptionType,
    },

    #[error("{entity}: option {option} has actions but is not declared")]
    UndeclaredOption {
        entity: EntityType,
        option: UpdateOptionType,
    },
}

/// Supported (option, action) pair, as listed to operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SupportedCombination {
    pub option: UpdateOptionType,
    pub action: UpdateActionType,
}

/// Explicit (option, action) -> mutation kind table for one record type.
///
/// Built once per handler; construction fails when an entry is registered twice
/// or when a declared option has no entry.
#[derive(Debug, Clone)]
pub struct DispatchTable<K> {
    entity: EntityType,
    options: Vec<UpdateOptionType>,
    entries: HashMap<(UpdateOptionType, UpdateActionType), K>,
}

impl<K: Copy + Debug> DispatchTable<K> {
    pub fn builder(entity: EntityType) -> DispatchTableBuilder<K> {
        DispatchTableBuilder {
            entity,
            options: Vec::new(),
            entries: Vec::new(),
        }
    }

    pub fn entity(&self) -> EntityType {
        self.entity
    }

    pub fn get(&self, option: UpdateOptionType, action: UpdateActionType) -> Option<K> {
        self.entries.get(&(option, action)).copied()
    }

    pub fn supports(&self, option: UpdateOptionType, action: UpdateActionType) -> bool {
        self.entries.contains_key(&(option, action))
    }

    pub fn options(&self) -> &[UpdateOptionType] {
        &self.options
    }

    /// Actions registered for `option`, in canonical action order
    pub fn actions_for(&self, option: UpdateOptionType) -> Vec<UpdateActionType> {
        UpdateActionType::ALL
            .iter()
            .copied()
            .filter(|action| self.supports(option, *action))
            .collect()
    }

    pub fn combinations(&self) -> Vec<SupportedCombination> {
        self.options
            .iter()
            .flat_map(|option| {
                self.actions_for(*option)
                    .into_iter()
                    .map(move |action| SupportedCombination { option: *option, action })
            })
            .collect()
    }

    /// Every (option, action) pair in `rules` this table cannot handle
    pub fn unsupported_in(&self, rules: &RuleCollection) -> Vec<SupportedCombination> {
        rules
            .iter()
            .flat_map(|rule| {
                rule.actions().iter().filter_map(move |action| {
                    if self.supports(rule.option(), action.action_type) {
                        None
                    } else {
                        Some(SupportedCombination {
                            option: rule.option(),
                            action: action.action_type,
                        })
                    }
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub struct DispatchTableBuilder<K> {
    entity: EntityType,
    options: Vec<UpdateOptionType>,
    entries: Vec<(UpdateOptionType, UpdateActionType, K)>,
}

impl<K: Copy + Debug> DispatchTableBuilder<K> {
    /// Register `kind` for `option` combined with each of `actions`
    pub fn option(mut self, option: UpdateOptionType, actions: &[UpdateActionType], kind: K) -> Self {
        if !self.options.contains(&option) {
            self.options.push(option);
        }
        self.entries
            .extend(actions.iter().map(|action| (option, *action, kind)));
        self
    }

    /// Declare an option without entries; `build` rejects it unless entries follow
    pub fn declare(mut self, option: UpdateOptionType) -> Self {
        if !self.options.contains(&option) {
            self.options.push(option);
        }
        self
    }

    /// Register a single combination without declaring its option
    pub fn entry(mut self, option: UpdateOptionType, action: UpdateActionType, kind: K) -> Self {
        self.entries.push((option, action, kind));
        self
    }

    pub fn build(self) -> Result<DispatchTable<K>, DispatchError> {
        let mut entries = HashMap::with_capacity(self.entries.len());
        for (option, action, kind) in self.entries {
            if !self.options.contains(&option) {
                return Err(DispatchError::UndeclaredOption {
                    entity: self.entity,
                    option,
                });
            }
            if entries.insert((option, action), kind).is_some() {
                return Err(DispatchError::Duplicate {
                    entity: self.entity,
                    option,
                    action,
                });
            }
        }
        if let Some(option) = self
            .options
            .iter()
            .find(|option| !entries.keys().any(|(o, _)| o == *option))
        {
            return Err(DispatchError::MissingOption {
                entity: self.entity,
                option: *option,
            });
        }

        tracing::debug!(
            "Built {} dispatch table: {} options, {} combinations",
            self.entity,
            self.options.len(),
            entries.len()
        );

        Ok(DispatchTable {
            entity: self.entity,
            options: self.options,
            entries,
        })
    }
}
