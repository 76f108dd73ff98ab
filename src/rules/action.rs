use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{TenantId, UpdateActionType, UpdateOptionType};

/// Parameter keys understood by the engine
pub mod keys {
    pub const ITEM_NOTE_TYPE_ID: &str = "ITEM_NOTE_TYPE_ID_KEY";
    pub const HOLDINGS_NOTE_TYPE_ID: &str = "HOLDINGS_NOTE_TYPE_ID_KEY";
    pub const INSTANCE_NOTE_TYPE_ID: &str = "INSTANCE_NOTE_TYPE_ID_KEY";
    pub const STAFF_ONLY: &str = "STAFF_ONLY";
    pub const APPLY_TO_HOLDINGS: &str = "APPLY_TO_HOLDINGS";
    pub const APPLY_TO_ITEMS: &str = "APPLY_TO_ITEMS";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub key: String,
    pub value: String,
}

impl Parameter {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// One edit instruction within a rule detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    #[serde(rename = "type")]
    pub action_type: UpdateActionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    /// Tenants whose records this action applies to; empty means all
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tenants: Vec<TenantId>,
}

impl Action {
    pub fn new(action_type: UpdateActionType) -> Self {
        Self {
            action_type,
            initial: None,
            updated: None,
            parameters: Vec::new(),
            tenants: Vec::new(),
        }
    }

    pub fn with_initial(mut self, initial: impl Into<String>) -> Self {
        self.initial = Some(initial.into());
        self
    }

    pub fn with_updated(mut self, updated: impl Into<String>) -> Self {
        self.updated = Some(updated.into());
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push(Parameter::new(key, value));
        self
    }

    pub fn with_tenants(mut self, tenants: Vec<TenantId>) -> Self {
        self.tenants = tenants;
        self
    }

    /// First parameter value for `key`
    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|p| p.key == key)
            .map(|p| p.value.as_str())
    }

    /// Boolean parameter; absent or unparsable values read as false
    pub fn flag(&self, key: &str) -> bool {
        self.parameter(key)
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    /// Non-blank `updated` value
    pub fn updated_value(&self) -> Option<&str> {
        self.updated.as_deref().filter(|v| !v.trim().is_empty())
    }

    /// Non-blank `initial` value
    pub fn initial_value(&self) -> Option<&str> {
        self.initial.as_deref().filter(|v| !v.is_empty())
    }

    pub fn applies_to_tenant(&self, tenant: &TenantId) -> bool {
        self.tenants.is_empty() || self.tenants.contains(tenant)
    }
}

/// Option plus the actions applied, in order, to the same evolving record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleDetail {
    pub option: UpdateOptionType,
    #[serde(default)]
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    #[serde(alias = "bulkOperationId")]
    pub operation_id: Uuid,
    pub rule_details: RuleDetail,
}

impl Rule {
    pub fn new(operation_id: Uuid, option: UpdateOptionType, actions: Vec<Action>) -> Self {
        Self {
            operation_id,
            rule_details: RuleDetail { option, actions },
        }
    }

    pub fn option(&self) -> UpdateOptionType {
        self.rule_details.option
    }

    pub fn actions(&self) -> &[Action] {
        &self.rule_details.actions
    }
}

/// Ordered rules evaluated top to bottom; later rules see earlier mutations
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleCollection {
    #[serde(alias = "bulkOperationRules")]
    pub rules: Vec<Rule>,
}

impl RuleCollection {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn single(rule: Rule) -> Self {
        Self { rules: vec![rule] }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// Operation id of the first rule, used when a failure is not tied to one rule
    pub fn operation_id(&self) -> Option<Uuid> {
        self.rules.first().map(|r| r.operation_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_wire_rule_collection() {
        let json = serde_json::json!({
            "bulkOperationRules": [{
                "bulkOperationId": "6f1b0a6e-5ed4-4d0f-a0d4-7d7c3f6f0c11",
                "ruleDetails": {
                    "option": "ITEM_NOTE",
                    "actions": [{
                        "type": "MARK_AS_STAFF_ONLY",
                        "parameters": [{ "key": "ITEM_NOTE_TYPE_ID_KEY", "value": "nt-1" }]
                    }]
                }
            }]
        });

        let rules: RuleCollection = serde_json::from_value(json).unwrap();
        assert_eq!(rules.len(), 1);
        let rule = &rules.rules[0];
        assert_eq!(rule.option(), UpdateOptionType::ItemNote);
        assert_eq!(rule.actions()[0].action_type, UpdateActionType::MarkAsStaffOnly);
        assert_eq!(rule.actions()[0].parameter(keys::ITEM_NOTE_TYPE_ID), Some("nt-1"));
    }

    #[test]
    fn flag_reads_only_true() {
        let action = Action::new(UpdateActionType::SetToTrue)
            .with_parameter(keys::APPLY_TO_HOLDINGS, "TRUE")
            .with_parameter(keys::APPLY_TO_ITEMS, "yes");
        assert!(action.flag(keys::APPLY_TO_HOLDINGS));
        assert!(!action.flag(keys::APPLY_TO_ITEMS));
        assert!(!action.flag(keys::STAFF_ONLY));
    }

    #[test]
    fn empty_tenant_scope_applies_everywhere() {
        let tenant = TenantId::new("college");
        assert!(Action::new(UpdateActionType::ClearField).applies_to_tenant(&tenant));

        let scoped = Action::new(UpdateActionType::ClearField).with_tenants(vec![TenantId::new("university")]);
        assert!(!scoped.applies_to_tenant(&tenant));
    }
}
