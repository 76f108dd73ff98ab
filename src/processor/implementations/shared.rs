// Validators and mutation builders shared by more than one record type

use crate::model::{ElectronicAccess, HasElectronicAccess, HasStatisticalCodes, NoteBearing};
use crate::notes::{self, NoteCategory};
use crate::processor::context::ProcessingContext;
use crate::processor::error::RuleError;
use crate::processor::traits::{mutation, Mutation};
use crate::rules::{keys, Action};
use crate::services::{resolve_for, ReferenceKind};
use crate::types::{UpdateActionType, UpdateOptionType};

/// Actions every note option accepts
pub const NOTE_ACTIONS: &[UpdateActionType] = &[
    UpdateActionType::AddToExisting,
    UpdateActionType::RemoveAll,
    UpdateActionType::FindAndRemoveThese,
    UpdateActionType::FindAndReplace,
    UpdateActionType::ChangeType,
];

/// Actions of typed note options, which also carry a staff-only flag
pub const TYPED_NOTE_ACTIONS: &[UpdateActionType] = &[
    UpdateActionType::MarkAsStaffOnly,
    UpdateActionType::RemoveMarkAsStaffOnly,
    UpdateActionType::AddToExisting,
    UpdateActionType::RemoveAll,
    UpdateActionType::FindAndRemoveThese,
    UpdateActionType::FindAndReplace,
    UpdateActionType::ChangeType,
];

pub const CIRCULATION_NOTE_ACTIONS: &[UpdateActionType] = &[
    UpdateActionType::MarkAsStaffOnly,
    UpdateActionType::RemoveMarkAsStaffOnly,
    UpdateActionType::AddToExisting,
    UpdateActionType::RemoveAll,
    UpdateActionType::FindAndRemoveThese,
    UpdateActionType::FindAndReplace,
    UpdateActionType::ChangeType,
    UpdateActionType::Duplicate,
];

pub const FLAG_ACTIONS: &[UpdateActionType] = &[
    UpdateActionType::SetToTrue,
    UpdateActionType::SetToFalse,
    UpdateActionType::ClearField,
];

pub const REPLACE_OR_CLEAR: &[UpdateActionType] = &[UpdateActionType::ReplaceWith, UpdateActionType::ClearField];

pub const STATISTICAL_CODE_ACTIONS: &[UpdateActionType] = &[
    UpdateActionType::AddToExisting,
    UpdateActionType::RemoveSome,
    UpdateActionType::RemoveAll,
];

pub const ELECTRONIC_ACCESS_URI_ACTIONS: &[UpdateActionType] = &[
    UpdateActionType::ReplaceWith,
    UpdateActionType::ClearField,
    UpdateActionType::FindAndReplace,
];

pub const ELECTRONIC_ACCESS_ACTIONS: &[UpdateActionType] = &[
    UpdateActionType::ReplaceWith,
    UpdateActionType::ClearField,
    UpdateActionType::FindAndReplace,
    UpdateActionType::FindAndRemoveThese,
];

pub const ELECTRONIC_ACCESS_OPTIONS: &[UpdateOptionType] = &[
    UpdateOptionType::ElectronicAccessLinkText,
    UpdateOptionType::ElectronicAccessMaterialsSpecified,
    UpdateOptionType::ElectronicAccessUrlPublicNote,
    UpdateOptionType::ElectronicAccessUrlRelationship,
];

pub fn required_updated(action: &Action) -> Result<&str, RuleError> {
    action
        .updated_value()
        .ok_or_else(|| RuleError::validation(format!("A new value is required for {}", action.action_type)))
}

pub fn required_initial(action: &Action) -> Result<&str, RuleError> {
    action
        .initial_value()
        .ok_or_else(|| RuleError::validation(format!("A value to find is required for {}", action.action_type)))
}

/// Suppression and delete flags are set or unset, never cleared
pub fn validate_flag(option: UpdateOptionType, action: &Action) -> Result<(), RuleError> {
    if action.action_type == UpdateActionType::ClearField {
        return Err(RuleError::validation(format!("{} flag cannot be cleared", flag_label(option))));
    }
    Ok(())
}

fn flag_label(option: UpdateOptionType) -> &'static str {
    match option {
        UpdateOptionType::SuppressFromDiscovery => "Suppress from discovery",
        UpdateOptionType::StaffSuppress => "Staff suppress",
        UpdateOptionType::SetRecordsForDelete => "Set for deletion",
        _ => "Boolean",
    }
}

/// Value a SET_TO_TRUE / SET_TO_FALSE action assigns
pub fn flag_value(option: UpdateOptionType, action: &Action) -> Result<bool, RuleError> {
    match action.action_type {
        UpdateActionType::SetToTrue => Ok(true),
        UpdateActionType::SetToFalse => Ok(false),
        other => Err(RuleError::unsupported(option, other)),
    }
}

/// Checks a note action can be built: category parameters, required values, destination
pub fn validate_note(
    option: UpdateOptionType,
    action: &Action,
    supports_circulation: bool,
) -> Result<(), RuleError> {
    let category = NoteCategory::from_option(option, action)?;
    match action.action_type {
        UpdateActionType::AddToExisting => {
            required_updated(action)?;
        }
        UpdateActionType::FindAndRemoveThese => {
            required_initial(action)?;
        }
        UpdateActionType::FindAndReplace => {
            required_initial(action)?;
            if action.updated.is_none() {
                return Err(RuleError::validation("A replacement value is required for FIND_AND_REPLACE"));
            }
        }
        UpdateActionType::ChangeType => {
            let destination = NoteCategory::destination(action)?;
            let needs_circulation = matches!(category, NoteCategory::Circulation(_))
                || matches!(destination, NoteCategory::Circulation(_));
            if needs_circulation && !supports_circulation {
                return Err(RuleError::validation(format!(
                    "Notes cannot be moved to or from circulation notes for {}",
                    option
                )));
            }
        }
        UpdateActionType::Duplicate => {
            if !matches!(category, NoteCategory::Circulation(_)) {
                return Err(RuleError::validation("Only circulation notes can be duplicated"));
            }
        }
        UpdateActionType::MarkAsStaffOnly | UpdateActionType::RemoveMarkAsStaffOnly => {
            if category.is_administrative() {
                return Err(RuleError::validation(
                    "Administrative notes cannot be marked as staff only",
                ));
            }
        }
        _ => {}
    }
    Ok(())
}

/// Build a note mutation; a typed CHANGE_TYPE destination is resolved against `note_kind`
pub async fn note_mutation<T>(
    option: UpdateOptionType,
    action: &Action,
    note_kind: ReferenceKind,
    for_preview: bool,
    ctx: &ProcessingContext,
) -> Result<Mutation<T>, RuleError>
where
    T: NoteBearing + Send + 'static,
{
    let category = NoteCategory::from_option(option, action)?;

    let built: Mutation<T> = match action.action_type {
        UpdateActionType::MarkAsStaffOnly => mutation(move |record: &mut T| notes::mark_staff_only(record, &category, true)),
        UpdateActionType::RemoveMarkAsStaffOnly => {
            mutation(move |record: &mut T| notes::mark_staff_only(record, &category, false))
        }
        UpdateActionType::RemoveAll => mutation(move |record: &mut T| notes::remove_all(record, &category)),
        UpdateActionType::AddToExisting => {
            let text = required_updated(action)?.to_string();
            let staff_only = action.flag(keys::STAFF_ONLY);
            mutation(move |record: &mut T| notes::add(record, &category, &text, staff_only))
        }
        UpdateActionType::FindAndRemoveThese => {
            let find = required_initial(action)?.to_string();
            mutation(move |record: &mut T| notes::find_and_remove(record, &category, &find))
        }
        UpdateActionType::FindAndReplace => {
            let find = required_initial(action)?.to_string();
            let replacement = action.updated.clone().unwrap_or_default();
            mutation(move |record: &mut T| notes::find_and_replace(record, &category, &find, &replacement))
        }
        UpdateActionType::ChangeType => {
            let destination = match NoteCategory::destination(action)? {
                NoteCategory::Typed(type_id) => {
                    let resolved =
                        resolve_for(ctx.resolver(), for_preview, note_kind, &type_id, ctx.current_tenant()).await?;
                    NoteCategory::Typed(resolved.id)
                }
                other => other,
            };
            mutation(move |record: &mut T| notes::change_type(record, &category, &destination))
        }
        UpdateActionType::Duplicate => match category {
            NoteCategory::Circulation(from) => mutation(move |record: &mut T| notes::duplicate(record, from)),
            _ => return Err(RuleError::validation("Only circulation notes can be duplicated")),
        },
        other => return Err(RuleError::unsupported(option, other)),
    };
    Ok(built)
}

fn split_ids(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn validate_statistical_codes(action: &Action) -> Result<(), RuleError> {
    match action.action_type {
        UpdateActionType::AddToExisting | UpdateActionType::RemoveSome => {
            if split_ids(required_updated(action)?).is_empty() {
                return Err(RuleError::validation("At least one statistical code is required"));
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Add, remove some or remove all statistical codes; added codes must resolve
pub async fn statistical_code_mutation<T>(
    action: &Action,
    for_preview: bool,
    ctx: &ProcessingContext,
) -> Result<Mutation<T>, RuleError>
where
    T: HasStatisticalCodes + Send + 'static,
{
    match action.action_type {
        UpdateActionType::AddToExisting => {
            let mut resolved = Vec::new();
            for code in split_ids(required_updated(action)?) {
                let reference = resolve_for(
                    ctx.resolver(),
                    for_preview,
                    ReferenceKind::StatisticalCode,
                    &code,
                    ctx.current_tenant(),
                )
                .await?;
                resolved.push(reference.id);
            }
            Ok(mutation(move |record: &mut T| {
                let mut ids = record.statistical_code_ids().to_vec();
                for id in resolved {
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                }
                record.set_statistical_code_ids(ids);
                Ok(())
            }))
        }
        UpdateActionType::RemoveSome => {
            let remove = split_ids(required_updated(action)?);
            Ok(mutation(move |record: &mut T| {
                let ids = record
                    .statistical_code_ids()
                    .iter()
                    .filter(|id| !remove.contains(id))
                    .cloned()
                    .collect();
                record.set_statistical_code_ids(ids);
                Ok(())
            }))
        }
        UpdateActionType::RemoveAll => Ok(mutation(|record: &mut T| {
            record.set_statistical_code_ids(Vec::new());
            Ok(())
        })),
        other => Err(RuleError::unsupported(UpdateOptionType::StatisticalCode, other)),
    }
}

fn access_field(option: UpdateOptionType, entry: &ElectronicAccess) -> Option<&str> {
    match option {
        UpdateOptionType::ElectronicAccessUri => Some(entry.uri.as_str()).filter(|uri| !uri.is_empty()),
        UpdateOptionType::ElectronicAccessLinkText => entry.link_text.as_deref(),
        UpdateOptionType::ElectronicAccessMaterialsSpecified => entry.materials_specification.as_deref(),
        UpdateOptionType::ElectronicAccessUrlPublicNote => entry.public_note.as_deref(),
        UpdateOptionType::ElectronicAccessUrlRelationship => entry.relationship_id.as_deref(),
        _ => None,
    }
}

fn set_access_field(option: UpdateOptionType, entry: &mut ElectronicAccess, value: Option<String>) {
    match option {
        UpdateOptionType::ElectronicAccessUri => entry.uri = value.unwrap_or_default(),
        UpdateOptionType::ElectronicAccessLinkText => entry.link_text = value,
        UpdateOptionType::ElectronicAccessMaterialsSpecified => entry.materials_specification = value,
        UpdateOptionType::ElectronicAccessUrlPublicNote => entry.public_note = value,
        UpdateOptionType::ElectronicAccessUrlRelationship => entry.relationship_id = value,
        _ => {}
    }
}

pub fn validate_electronic_access(option: UpdateOptionType, action: &Action) -> Result<(), RuleError> {
    match action.action_type {
        UpdateActionType::ClearField if option == UpdateOptionType::ElectronicAccessUri => {
            Err(RuleError::validation("URI cannot be cleared"))
        }
        UpdateActionType::ReplaceWith if option == UpdateOptionType::ElectronicAccessUri => {
            required_updated(action).map(|_| ())
        }
        UpdateActionType::FindAndReplace => {
            required_initial(action)?;
            if option == UpdateOptionType::ElectronicAccessUri {
                required_updated(action)?;
            }
            Ok(())
        }
        UpdateActionType::FindAndRemoveThese => required_initial(action).map(|_| ()),
        _ => Ok(()),
    }
}

/// Edit one electronic access sub-field on every entry.
///
/// Relationship values are matched and replaced as whole resolved ids; the text
/// fields are edited by substring. A text field emptied by removal is cleared.
pub async fn electronic_access_mutation<T>(
    option: UpdateOptionType,
    action: &Action,
    for_preview: bool,
    ctx: &ProcessingContext,
) -> Result<Mutation<T>, RuleError>
where
    T: HasElectronicAccess + Send + 'static,
{
    let relationship = option == UpdateOptionType::ElectronicAccessUrlRelationship;
    let resolve = |value: String| async move {
        if relationship {
            resolve_for(
                ctx.resolver(),
                for_preview,
                ReferenceKind::UrlRelationship,
                &value,
                ctx.current_tenant(),
            )
            .await
            .map(|reference| reference.id)
        } else {
            Ok(value)
        }
    };

    let edit: Box<dyn Fn(Option<&str>) -> Option<String> + Send> = match action.action_type {
        UpdateActionType::ReplaceWith => {
            let value = match action.updated_value() {
                Some(value) => Some(resolve(value.to_string()).await?),
                None => None,
            };
            Box::new(move |_: Option<&str>| value.clone())
        }
        UpdateActionType::ClearField => Box::new(|_: Option<&str>| None),
        UpdateActionType::FindAndReplace => {
            let find = resolve(required_initial(action)?.to_string()).await?;
            let replacement = match action.updated_value() {
                Some(value) => Some(resolve(value.to_string()).await?),
                None => None,
            };
            if relationship {
                Box::new(move |current: Option<&str>| match current {
                    Some(value) if value == find => replacement.clone(),
                    other => other.map(str::to_string),
                })
            } else {
                let replacement = replacement.unwrap_or_default();
                Box::new(move |current: Option<&str>| {
                    current
                        .map(|value| value.replace(&find, &replacement))
                        .filter(|value| !value.trim().is_empty())
                })
            }
        }
        UpdateActionType::FindAndRemoveThese => {
            let find = resolve(required_initial(action)?.to_string()).await?;
            if relationship {
                Box::new(move |current: Option<&str>| current.filter(|value| *value != find).map(str::to_string))
            } else {
                Box::new(move |current: Option<&str>| {
                    current
                        .map(|value| value.replace(&find, ""))
                        .filter(|value| !value.trim().is_empty())
                })
            }
        }
        other => return Err(RuleError::unsupported(option, other)),
    };

    Ok(mutation(move |record: &mut T| {
        let entries = record
            .electronic_access()
            .iter()
            .map(|entry| {
                let mut next = entry.clone();
                set_access_field(option, &mut next, edit(access_field(option, entry)));
                next
            })
            .collect();
        record.set_electronic_access(entries);
        Ok(())
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn flags_cannot_be_cleared() {
        let err = validate_flag(UpdateOptionType::SuppressFromDiscovery, &Action::new(UpdateActionType::ClearField))
            .unwrap_err();
        assert_eq!(err.to_string(), "Suppress from discovery flag cannot be cleared");
        assert!(validate_flag(UpdateOptionType::StaffSuppress, &Action::new(UpdateActionType::SetToTrue)).is_ok());
    }

    #[test]
    fn holdings_notes_cannot_move_into_circulation() {
        let action = Action::new(UpdateActionType::ChangeType).with_updated("CHECK_IN_NOTE");
        let err = validate_note(UpdateOptionType::AdministrativeNote, &action, false).unwrap_err();
        assert!(matches!(err, RuleError::Validation(_)));
    }

    #[test]
    fn typed_note_requires_type_parameter() {
        let action = Action::new(UpdateActionType::RemoveAll);
        let err = validate_note(UpdateOptionType::HoldingsNote, &action, false).unwrap_err();
        assert_eq!(err.to_string(), "Parameter HOLDINGS_NOTE_TYPE_ID_KEY is required for HOLDINGS_NOTE");
    }

    #[test]
    fn uri_cannot_be_cleared() {
        let err = validate_electronic_access(
            UpdateOptionType::ElectronicAccessUri,
            &Action::new(UpdateActionType::ClearField),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "URI cannot be cleared");
    }

    #[test]
    fn split_ids_ignores_blanks() {
        assert_eq!(split_ids("a, b,,c "), vec!["a", "b", "c"]);
    }
}
