use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::instrument;
use uuid::Uuid;

use carkeeper_core::{NewsId, UserId};
use carkeeper_news::{NewsArticle, NewsWithAuthor};

use super::{PostgresStore, map_sqlx_error};
use crate::StoreResult;
use crate::store::NewsStore;

#[derive(Debug, sqlx::FromRow)]
struct NewsRow {
    news_id: Uuid,
    title: String,
    content: String,
    author_id: Option<Uuid>,
    published_at: Option<DateTime<Utc>>,
    is_published: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    author_name: Option<String>,
}

impl From<NewsRow> for NewsWithAuthor {
    fn from(row: NewsRow) -> Self {
        NewsWithAuthor {
            article: NewsArticle {
                news_id: NewsId::from_uuid(row.news_id),
                title: row.title,
                content: row.content,
                author_id: row.author_id.map(UserId::from_uuid),
                published_at: row.published_at,
                is_published: row.is_published,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            author_name: row.author_name,
        }
    }
}

const NEWS_SELECT: &str = r#"
    SELECT
        n.news_id, n.title, n.content, n.author_id, n.published_at, n.is_published,
        n.created_at, n.updated_at,
        u.first_name || ' ' || u.last_name AS author_name
    FROM news n
    LEFT JOIN users u ON n.author_id = u.user_id
"#;

#[async_trait]
impl NewsStore for PostgresStore {
    #[instrument(skip(self), err)]
    async fn news(&self, is_published: Option<bool>) -> StoreResult<Vec<NewsWithAuthor>> {
        let rows: Vec<NewsRow> = sqlx::query_as(&format!(
            r#"
            {NEWS_SELECT}
            WHERE ($1::boolean IS NULL OR n.is_published = $1)
            ORDER BY n.published_at DESC NULLS LAST, n.created_at DESC
            "#
        ))
        .bind(is_published)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("news", e))?;
        Ok(rows.into_iter().map(NewsWithAuthor::from).collect())
    }

    #[instrument(skip(self), fields(news_id = %id), err)]
    async fn news_item(&self, id: NewsId) -> StoreResult<Option<NewsWithAuthor>> {
        let row: Option<NewsRow> = sqlx::query_as(&format!("{NEWS_SELECT} WHERE n.news_id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("news_item", e))?;
        Ok(row.map(NewsWithAuthor::from))
    }

    #[instrument(skip(self, article), fields(news_id = %article.news_id), err)]
    async fn insert_news(&self, article: &NewsArticle) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO news
                (news_id, title, content, author_id, published_at, is_published, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(article.news_id.as_uuid())
        .bind(&article.title)
        .bind(&article.content)
        .bind(article.author_id.map(Uuid::from))
        .bind(article.published_at)
        .bind(article.is_published)
        .bind(article.created_at)
        .bind(article.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_news", e))?;
        Ok(())
    }

    #[instrument(skip(self, article), fields(news_id = %article.news_id), err)]
    async fn update_news(&self, article: &NewsArticle) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE news
            SET title = $1, content = $2, is_published = $3, published_at = $4, updated_at = $5
            WHERE news_id = $6
            "#,
        )
        .bind(&article.title)
        .bind(&article.content)
        .bind(article.is_published)
        .bind(article.published_at)
        .bind(article.updated_at)
        .bind(article.news_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_news", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(news_id = %id), err)]
    async fn delete_news(&self, id: NewsId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM news WHERE news_id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_news", e))?;
        Ok(result.rows_affected() > 0)
    }
}
