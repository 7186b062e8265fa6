//! Subject state repository (软删除字段读写)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{PgStore, SubjectRepository};
use crate::{
    error::Result,
    models::{SubjectKind, SubjectState},
};

type StateColumns = (
    Option<DateTime<Utc>>,
    Option<Uuid>,
    Option<String>,
    Option<String>,
    Option<String>,
);

#[async_trait]
impl SubjectRepository for PgStore {
    async fn load_state(&self, kind: SubjectKind, id: Uuid) -> Result<Option<SubjectState>> {
        let query = format!(
            "SELECT deleted_at, deleted_by_id, deleted_by_name, deleted_reason, deleted_note \
             FROM {} WHERE id = $1",
            kind.table()
        );

        let row = sqlx::query_as::<_, StateColumns>(&query)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(row.map(|(at, by_id, by_name, reason, note)| {
            SubjectState::from_columns(at, by_id, by_name, reason, note)
        }))
    }

    async fn save_state(&self, kind: SubjectKind, id: Uuid, state: &SubjectState) -> Result<bool> {
        let (at, by_id, by_name, reason, note) = state.to_columns();
        let query = format!(
            r#"
            UPDATE {}
            SET deleted_at = $2,
                deleted_by_id = $3,
                deleted_by_name = $4,
                deleted_reason = $5,
                deleted_note = $6
            WHERE id = $1
            "#,
            kind.table()
        );

        let result = sqlx::query(&query)
            .bind(id)
            .bind(at)
            .bind(by_id)
            .bind(by_name)
            .bind(reason)
            .bind(note)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
