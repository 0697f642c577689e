//! Account lookups backing the identity resolver.

use uuid::Uuid;

use super::{with_retry, Db};
use crate::models::Account;

const ACCOUNT_COLUMNS: &str =
    "id, email, display_name, role, is_active, super_seller_id, permissions, phone";

pub async fn by_id(db: &Db, id: Uuid) -> Result<Option<Account>, sqlx::Error> {
    with_retry(|| {
        let pool = db.pool().clone();
        async move {
            sqlx::query_as::<_, Account>(&format!(
                "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"
            ))
            .bind(id)
            .fetch_optional(&pool)
            .await
        }
    })
    .await
}
