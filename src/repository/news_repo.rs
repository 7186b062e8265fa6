//! News repository (新闻数据访问)

use async_trait::async_trait;
use uuid::Uuid;

use super::{visibility_clause, NewsRepository, PgStore};
use crate::{
    error::Result,
    models::{News, NewsRow, Visibility},
};

#[async_trait]
impl NewsRepository for PgStore {
    async fn insert_news(&self, news: &News) -> Result<()> {
        let (at, by_id, by_name, reason, note) = news.state.to_columns();

        sqlx::query(
            r#"
            INSERT INTO news (
                id, title, content, views, author_id, author_name, created_at,
                deleted_at, deleted_by_id, deleted_by_name, deleted_reason, deleted_note
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(news.id)
        .bind(&news.title)
        .bind(&news.content)
        .bind(news.views)
        .bind(news.author_id)
        .bind(&news.author_name)
        .bind(news.created_at)
        .bind(at)
        .bind(by_id)
        .bind(by_name)
        .bind(reason)
        .bind(note)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn find_news(&self, id: Uuid) -> Result<Option<News>> {
        let row = sqlx::query_as::<_, NewsRow>("SELECT * FROM news WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(row.map(News::from))
    }

    async fn list_news(&self, visibility: Visibility) -> Result<Vec<News>> {
        let query = format!(
            "SELECT * FROM news WHERE {} ORDER BY created_at DESC, id DESC",
            visibility_clause(visibility)
        );

        let rows = sqlx::query_as::<_, NewsRow>(&query)
            .fetch_all(&self.db)
            .await?;

        Ok(rows.into_iter().map(News::from).collect())
    }

    async fn increment_views(&self, id: Uuid) -> Result<Option<i64>> {
        let views = sqlx::query_scalar::<_, i64>(
            "UPDATE news SET views = views + 1 WHERE id = $1 AND deleted_at IS NULL RETURNING views",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(views)
    }

    async fn set_views(&self, id: Uuid, views: i64) -> Result<Option<i64>> {
        // 旧值通过自连接取回
        let previous = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE news AS n
            SET views = $2
            FROM (SELECT id, views FROM news WHERE id = $1) AS old
            WHERE n.id = old.id
            RETURNING old.views
            "#,
        )
        .bind(id)
        .bind(views)
        .fetch_optional(&self.db)
        .await?;

        Ok(previous)
    }
}
