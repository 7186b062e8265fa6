//! User repository (用户数据访问)

use async_trait::async_trait;
use uuid::Uuid;

use super::{visibility_clause, PgStore, UserRepository};
use crate::{
    error::{AppError, Result},
    models::{User, UserRow, Visibility},
};

#[async_trait]
impl UserRepository for PgStore {
    async fn insert_user(&self, user: &User) -> Result<()> {
        let (at, by_id, by_name, reason, note) = user.state.to_columns();

        sqlx::query(
            r#"
            INSERT INTO users (
                id, name, email, phone, role, created_at,
                deleted_at, deleted_by_id, deleted_by_name, deleted_reason, deleted_note
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .bind(at)
        .bind(by_id)
        .bind(by_name)
        .bind(reason)
        .bind(note)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        row.map(|r| User::try_from(r).map_err(AppError::Internal))
            .transpose()
    }

    async fn list_users(&self, visibility: Visibility) -> Result<Vec<User>> {
        let query = format!(
            "SELECT * FROM users WHERE {} ORDER BY created_at DESC, id DESC",
            visibility_clause(visibility)
        );

        let rows = sqlx::query_as::<_, UserRow>(&query)
            .fetch_all(&self.db)
            .await?;

        rows.into_iter()
            .map(|r| User::try_from(r).map_err(AppError::Internal))
            .collect()
    }

    async fn set_phone(&self, id: Uuid, phone: &str) -> Result<Option<Option<String>>> {
        let previous = sqlx::query_scalar::<_, Option<String>>(
            r#"
            UPDATE users AS u
            SET phone = $2
            FROM (SELECT id, phone FROM users WHERE id = $1) AS old
            WHERE u.id = old.id
            RETURNING old.phone
            "#,
        )
        .bind(id)
        .bind(phone)
        .fetch_optional(&self.db)
        .await?;

        Ok(previous)
    }
}
