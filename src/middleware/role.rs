//! Role accept/reject stages.
//!
//! Both stages report the offending role id as the `details` of a
//! `NotAuthorized` error so clients can tell which permission was missing.

use async_trait::async_trait;

use fren_core::AppError;

use crate::modules::roles::model::{RoleId, RoleSet};
use crate::routing::{Flow, HandlerResult, RequestContext, Stage};

/// First role of `required` the user does not hold.
pub fn first_missing(granted: &[RoleId], required: &RoleSet) -> Option<RoleId> {
    required.iter().find(|role| !granted.contains(role))
}

/// First role of `forbidden` the user holds.
pub fn first_forbidden(granted: &[RoleId], forbidden: &RoleSet) -> Option<RoleId> {
    forbidden.iter().find(|role| granted.contains(role))
}

/// Requires every role in the set.
pub struct RoleAccept(pub RoleSet);

#[async_trait]
impl Stage for RoleAccept {
    async fn run(&self, ctx: &mut RequestContext) -> HandlerResult {
        let user_id = ctx.user_id()?;
        let granted = ctx.state().roles.granted(user_id).await?;

        if let Some(role) = first_missing(&granted, &self.0) {
            tracing::debug!(user_id, role = %role, "Missing required role");
            return Err(AppError::not_authorized(role.as_str()));
        }
        Ok(Flow::Next)
    }
}

/// Refuses users holding any role in the set.
pub struct RoleReject(pub RoleSet);

#[async_trait]
impl Stage for RoleReject {
    async fn run(&self, ctx: &mut RequestContext) -> HandlerResult {
        let user_id = ctx.user_id()?;
        let granted = ctx.state().roles.granted(user_id).await?;

        if let Some(role) = first_forbidden(&granted, &self.0) {
            tracing::debug!(user_id, role = %role, "Holds rejected role");
            return Err(AppError::not_authorized(role.as_str()));
        }
        Ok(Flow::Next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_missing_all_granted() {
        let granted = [RoleId::UserView, RoleId::UserEdit];
        let required: RoleSet = [RoleId::UserView, RoleId::UserEdit].into();
        assert_eq!(first_missing(&granted, &required), None);
    }

    #[test]
    fn test_first_missing_reports_role() {
        let granted = [RoleId::UserView];
        let required: RoleSet = [RoleId::UserView, RoleId::UserEdit].into();
        assert_eq!(first_missing(&granted, &required), Some(RoleId::UserEdit));
    }

    #[test]
    fn test_first_missing_no_grants() {
        let required: RoleSet = RoleId::SettingView.into();
        assert_eq!(first_missing(&[], &required), Some(RoleId::SettingView));
    }

    #[test]
    fn test_first_forbidden() {
        let granted = [RoleId::UserView, RoleId::DatasetLock];
        let forbidden: RoleSet = [RoleId::PlanEdit, RoleId::DatasetLock].into();
        assert_eq!(first_forbidden(&granted, &forbidden), Some(RoleId::DatasetLock));
        assert_eq!(first_forbidden(&[], &forbidden), None);
    }
}
