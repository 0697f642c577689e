//! Identity resolution and the delegated-permission gate.
//!
//! The fronting session layer authenticates the user and forwards the
//! caller id in the `x-user-id` header; this service trusts that claim and
//! resolves the account it maps to. Delegated User Seller accounts act
//! transparently against their parent Super Seller's data: every seller
//! scope elsewhere in the service uses [`SellerContext::actual_seller_id`],
//! never the raw caller id. There is no fallback account of any kind — an
//! unauthenticated or wrong-role request is a hard failure.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::domain::permissions::{Permission, PermissionSet};
use crate::error::{ApiError, ApiResult};
use crate::models::{Account, Role};
use crate::state::AppState;
use crate::store::{self, Db};

pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller, resolved to its owning seller account.
#[derive(Clone, Debug)]
pub struct SellerContext {
    pub account: Account,
    /// The account id that owns the catalog and orders the caller works
    /// against: the caller itself, or its parent Super Seller.
    pub actual_seller_id: Uuid,
    pub is_user_seller: bool,
    permissions: PermissionSet,
}

impl SellerContext {
    /// Permission gate for mutating (and explicitly gated read) operations.
    /// Super Sellers and admins bypass it; a User Seller needs the named
    /// flag explicitly granted.
    pub fn ensure(&self, permission: Permission) -> ApiResult<()> {
        if !self.is_user_seller || self.permissions.allows(permission) {
            return Ok(());
        }
        Err(ApiError::Forbidden(format!(
            "Missing the {permission} permission"
        )))
    }

    /// Whether product purchase prices may appear in responses.
    pub fn can_view_purchase_price(&self) -> bool {
        !self.is_user_seller || self.permissions.allows(Permission::ViewPurchasePrice)
    }
}

/// Map an authenticated caller id to the seller account that owns the data.
pub async fn seller_context(db: &Db, caller_id: Uuid) -> ApiResult<SellerContext> {
    let account = store::accounts::by_id(db, caller_id)
        .await?
        .ok_or_else(ApiError::unauthorized)?;
    if !account.is_active {
        return Err(ApiError::unauthorized());
    }
    let (actual_seller_id, is_user_seller) = match account.role {
        Role::UserSeller => {
            let parent = account.super_seller_id.ok_or_else(|| {
                ApiError::Forbidden("Seller account is not linked to a merchant".into())
            })?;
            (parent, true)
        }
        Role::SuperSeller | Role::Admin => (account.id, false),
        Role::Courier | Role::Customer => {
            return Err(ApiError::Forbidden(
                "Seller access is required for this resource".into(),
            ));
        }
    };
    let permissions = PermissionSet::decode(account.permissions.as_ref());
    Ok(SellerContext {
        account,
        actual_seller_id,
        is_user_seller,
        permissions,
    })
}

#[axum::async_trait]
impl FromRequestParts<AppState> for SellerContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let caller_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v).ok())
            .ok_or_else(ApiError::unauthorized)?;
        seller_context(&state.db, caller_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(role: Role, parent: Option<Uuid>, perms: Option<serde_json::Value>) -> Account {
        Account {
            id: Uuid::new_v4(),
            email: "seller@example.com".into(),
            display_name: "Seller".into(),
            role,
            is_active: true,
            super_seller_id: parent,
            permissions: perms,
            phone: None,
        }
    }

    fn context_for(account: Account) -> SellerContext {
        // mirrors seller_context's role mapping on an already-loaded row
        let (actual, delegated) = match account.role {
            Role::UserSeller => (account.super_seller_id.unwrap(), true),
            _ => (account.id, false),
        };
        let permissions = PermissionSet::decode(account.permissions.as_ref());
        SellerContext {
            account,
            actual_seller_id: actual,
            is_user_seller: delegated,
            permissions,
        }
    }

    #[test]
    fn user_seller_resolves_to_its_parent() {
        let parent = Uuid::new_v4();
        let ctx = context_for(account(Role::UserSeller, Some(parent), None));
        assert!(ctx.is_user_seller);
        assert_eq!(ctx.actual_seller_id, parent);
        assert_ne!(ctx.actual_seller_id, ctx.account.id);
    }

    #[test]
    fn super_seller_resolves_to_itself() {
        let ctx = context_for(account(Role::SuperSeller, None, None));
        assert!(!ctx.is_user_seller);
        assert_eq!(ctx.actual_seller_id, ctx.account.id);
    }

    #[test]
    fn super_seller_bypasses_the_gate() {
        let ctx = context_for(account(
            Role::SuperSeller,
            None,
            Some(serde_json::json!({"manage_orders": false})),
        ));
        assert!(ctx.ensure(Permission::ManageOrders).is_ok());
        assert!(ctx.ensure(Permission::ManageWarehouse).is_ok());
    }

    #[test]
    fn delegated_caller_needs_the_named_flag() {
        let parent = Uuid::new_v4();
        let denied = context_for(account(Role::UserSeller, Some(parent), None));
        assert!(denied.ensure(Permission::ManageOrders).is_err());

        let granted = context_for(account(
            Role::UserSeller,
            Some(parent),
            Some(serde_json::json!({"manage_orders": true})),
        ));
        assert!(granted.ensure(Permission::ManageOrders).is_ok());
        assert!(granted.ensure(Permission::ManageProducts).is_err());
    }

    #[test]
    fn malformed_permission_blob_denies_everything() {
        let ctx = context_for(account(
            Role::UserSeller,
            Some(Uuid::new_v4()),
            Some(serde_json::json!([1, 2, 3])),
        ));
        assert!(ctx.ensure(Permission::ManageOrders).is_err());
        assert!(!ctx.can_view_purchase_price());
    }
}
