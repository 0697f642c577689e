//! Pure seller-domain logic: the order status state machine, delegated
//! permission sets, reporting periods, and customer classification.
//! Nothing in here touches the database.

pub mod customer;
pub mod notes;
pub mod permissions;
pub mod reporting;
pub mod status;
