//! Review repository (评论数据访问)

use async_trait::async_trait;
use uuid::Uuid;

use super::{visibility_clause, PgStore, ReviewRepository};
use crate::{
    error::Result,
    models::{Review, ReviewRow, Visibility},
};

#[async_trait]
impl ReviewRepository for PgStore {
    async fn insert_review(&self, review: &Review) -> Result<()> {
        let (at, by_id, by_name, reason, note) = review.state.to_columns();

        sqlx::query(
            r#"
            INSERT INTO reviews (
                id, user_id, user_name, rating, comment, created_at,
                deleted_at, deleted_by_id, deleted_by_name, deleted_reason, deleted_note
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(review.id)
        .bind(review.user_id)
        .bind(&review.user_name)
        .bind(review.rating)
        .bind(&review.comment)
        .bind(review.created_at)
        .bind(at)
        .bind(by_id)
        .bind(by_name)
        .bind(reason)
        .bind(note)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn find_review(&self, id: Uuid) -> Result<Option<Review>> {
        let row = sqlx::query_as::<_, ReviewRow>("SELECT * FROM reviews WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(row.map(Review::from))
    }

    async fn list_reviews(&self, visibility: Visibility) -> Result<Vec<Review>> {
        let query = format!(
            "SELECT * FROM reviews WHERE {} ORDER BY created_at DESC, id DESC",
            visibility_clause(visibility)
        );

        let rows = sqlx::query_as::<_, ReviewRow>(&query)
            .fetch_all(&self.db)
            .await?;

        Ok(rows.into_iter().map(Review::from).collect())
    }
}
