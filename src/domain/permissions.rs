//! Delegated-staff permission sets.
//!
//! A User Seller account carries a JSONB map of named booleans granted by
//! its Super Seller. Decoding is schema-validated through serde; a blob
//! that fails to decode grants nothing (fail closed).

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Permission {
    ManageOrders,
    ManageProducts,
    ManageWarehouse,
    ViewPurchasePrice,
    PublishProducts,
    UnpublishProducts,
    UseBarcode,
    UsePos,
    ViewAnalytics,
    ManageMarketing,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ManageOrders => "manage_orders",
            Self::ManageProducts => "manage_products",
            Self::ManageWarehouse => "manage_warehouse",
            Self::ViewPurchasePrice => "view_purchase_price",
            Self::PublishProducts => "publish_products",
            Self::UnpublishProducts => "unpublish_products",
            Self::UseBarcode => "use_barcode",
            Self::UsePos => "use_pos",
            Self::ViewAnalytics => "view_analytics",
            Self::ManageMarketing => "manage_marketing",
        };
        write!(f, "{s}")
    }
}

/// Typed permission record. Every flag defaults to false, so a partial map
/// only grants what it explicitly names.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionSet {
    pub manage_orders: bool,
    pub manage_products: bool,
    pub manage_warehouse: bool,
    pub view_purchase_price: bool,
    pub publish_products: bool,
    pub unpublish_products: bool,
    pub use_barcode: bool,
    pub use_pos: bool,
    pub view_analytics: bool,
    pub manage_marketing: bool,
}

impl PermissionSet {
    /// Decode a stored permission blob. `None` and malformed blobs both
    /// yield the empty set rather than an error.
    pub fn decode(raw: Option<&serde_json::Value>) -> Self {
        raw.and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default()
    }

    pub fn allows(&self, permission: Permission) -> bool {
        match permission {
            Permission::ManageOrders => self.manage_orders,
            Permission::ManageProducts => self.manage_products,
            Permission::ManageWarehouse => self.manage_warehouse,
            Permission::ViewPurchasePrice => self.view_purchase_price,
            Permission::PublishProducts => self.publish_products,
            Permission::UnpublishProducts => self.unpublish_products,
            Permission::UseBarcode => self.use_barcode,
            Permission::UsePos => self.use_pos,
            Permission::ViewAnalytics => self.view_analytics,
            Permission::ManageMarketing => self.manage_marketing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_blob_grants_nothing() {
        let set = PermissionSet::decode(None);
        assert!(!set.allows(Permission::ManageOrders));
        assert!(!set.allows(Permission::ManageWarehouse));
    }

    #[test]
    fn malformed_blob_fails_closed() {
        let raw = serde_json::json!("not an object");
        let set = PermissionSet::decode(Some(&raw));
        assert_eq!(set, PermissionSet::default());
    }

    #[test]
    fn partial_map_only_grants_named_flags() {
        let raw = serde_json::json!({"manage_orders": true});
        let set = PermissionSet::decode(Some(&raw));
        assert!(set.allows(Permission::ManageOrders));
        assert!(!set.allows(Permission::ManageProducts));
        assert!(!set.allows(Permission::ViewAnalytics));
    }

    #[test]
    fn explicit_false_denies() {
        let raw = serde_json::json!({"manage_orders": false, "use_barcode": true});
        let set = PermissionSet::decode(Some(&raw));
        assert!(!set.allows(Permission::ManageOrders));
        assert!(set.allows(Permission::UseBarcode));
    }
}
