use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use super::shared::{required_initial, required_updated};
use crate::model::User;
use crate::processor::context::ProcessingContext;
use crate::processor::dispatch::{DispatchError, DispatchTable};
use crate::processor::error::RuleError;
use crate::processor::traits::{mutation, Mutation, RecordHandler};
use crate::rules::{Action, Rule};
use crate::services::{resolve_for, ReferenceKind};
use crate::types::{EntityType, UpdateActionType, UpdateOptionType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserKind {
    PatronGroup,
    ExpirationDate,
    Email,
}

/// Parse an RFC 3339 timestamp or a plain `YYYY-MM-DD` date (end of that day, UTC)
pub fn parse_expiration_date(value: &str) -> Result<DateTime<Utc>, RuleError> {
    let value = value.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(23, 59, 59))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| RuleError::validation(format!("Invalid expiration date: {}", value)))
}

pub struct UserHandler {
    dispatch: DispatchTable<UserKind>,
}

impl UserHandler {
    pub fn new() -> Result<Self, DispatchError> {
        let dispatch = DispatchTable::builder(EntityType::User)
            .option(UpdateOptionType::PatronGroup, &[UpdateActionType::ReplaceWith], UserKind::PatronGroup)
            .option(UpdateOptionType::ExpirationDate, &[UpdateActionType::ReplaceWith], UserKind::ExpirationDate)
            .option(UpdateOptionType::EmailAddress, &[UpdateActionType::FindAndReplace], UserKind::Email)
            .build()?;
        Ok(Self { dispatch })
    }
}

#[async_trait]
impl RecordHandler for UserHandler {
    type Record = User;
    type Kind = UserKind;

    fn entity_type(&self) -> EntityType {
        EntityType::User
    }

    fn dispatch(&self) -> &DispatchTable<UserKind> {
        &self.dispatch
    }

    /// Users exist in one tenant only
    fn supports_cross_tenant(&self) -> bool {
        false
    }

    fn identifier(&self, record: &User) -> String {
        record
            .barcode
            .clone()
            .or_else(|| record.username.clone())
            .unwrap_or_else(|| record.id.clone())
    }

    async fn validate_kind(
        &self,
        kind: UserKind,
        _option: UpdateOptionType,
        action: &Action,
        _rule: &Rule,
        _record: &User,
        ctx: &ProcessingContext,
    ) -> Result<(), RuleError> {
        match kind {
            UserKind::PatronGroup => {
                let group = required_updated(action)?;
                ctx.resolver()
                    .lookup(ReferenceKind::PatronGroup, group, ctx.current_tenant())
                    .await
                    .map(|_| ())
            }
            UserKind::ExpirationDate => parse_expiration_date(required_updated(action)?).map(|_| ()),
            UserKind::Email => {
                required_initial(action)?;
                required_updated(action).map(|_| ())
            }
        }
    }

    async fn build_mutation(
        &self,
        kind: UserKind,
        _option: UpdateOptionType,
        action: &Action,
        _record: &User,
        for_preview: bool,
        ctx: &ProcessingContext,
    ) -> Result<Mutation<User>, RuleError> {
        match kind {
            UserKind::PatronGroup => {
                let group = resolve_for(
                    ctx.resolver(),
                    for_preview,
                    ReferenceKind::PatronGroup,
                    required_updated(action)?,
                    ctx.current_tenant(),
                )
                .await?;
                Ok(mutation(move |user: &mut User| {
                    user.patron_group = Some(group.id);
                    Ok(())
                }))
            }
            UserKind::ExpirationDate => {
                let expires = parse_expiration_date(required_updated(action)?)?;
                Ok(mutation(move |user: &mut User| {
                    user.expiration_date = Some(expires);
                    user.active = expires > Utc::now();
                    Ok(())
                }))
            }
            UserKind::Email => {
                let find = required_initial(action)?.to_string();
                let replacement = required_updated(action)?.to_string();
                Ok(mutation(move |user: &mut User| {
                    user.personal.email = user
                        .personal
                        .email
                        .as_ref()
                        .map(|email| email.replace(&find, &replacement));
                    Ok(())
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn parses_plain_dates_as_end_of_day() {
        let parsed = parse_expiration_date("2030-01-31").unwrap();
        assert_eq!(parsed.year(), 2030);
        assert_eq!(parsed.to_rfc3339(), "2030-01-31T23:59:59+00:00");
    }

    #[test]
    fn parses_rfc3339() {
        let parsed = parse_expiration_date("2030-06-01T10:00:00+02:00").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2030-06-01T08:00:00+00:00");
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(parse_expiration_date("next week"), Err(RuleError::Validation(_))));
    }
}
