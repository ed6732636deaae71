// Postgres access to the legacy blog tables.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::traits::RecordSource;

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct AuthorRecord {
    pub id: i64,
    pub login: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub contentful_id: Option<String>,
}

/// A post joined with its author's Contentful id.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct PostRecord {
    pub id: i64,
    pub author_contentful_id: Option<String>,
    pub title: String,
    pub link: String,
    pub pub_date: Option<DateTime<Utc>>,
    pub creator: String,
    pub rich_text: String,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct CategoryTag {
    pub post_id: i64,
    pub domain: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct MediaRecord {
    pub post_id: i64,
    pub post_parent: i64,
    pub link: Option<String>,
    pub title: Option<String>,
    pub post_type: Option<String>,
    pub attachment_url: String,
}

pub struct PgRecordSource {
    pool: PgPool,
}

impl PgRecordSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .context("Failed to connect to the legacy blog database")?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl RecordSource for PgRecordSource {
    async fn fetch_authors_without_destination_id(&self) -> Result<Vec<AuthorRecord>> {
        let rows = sqlx::query_as::<_, AuthorRecord>(
            r#"
            SELECT a.id, a.login, a.email, a.name, a.contentful_id
            FROM authors AS a
            WHERE EXISTS (SELECT 1 FROM posts WHERE creator = a.login)
              AND a.contentful_id IS NULL
            ORDER BY a.login
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn fetch_authors_with_destination_id(&self) -> Result<Vec<AuthorRecord>> {
        let rows = sqlx::query_as::<_, AuthorRecord>(
            r#"
            SELECT id, login, email, name, contentful_id
            FROM authors
            WHERE contentful_id IS NOT NULL
            ORDER BY login
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn record_author_destination_id(&self, login: &str, entry_id: &str) -> Result<()> {
        sqlx::query("UPDATE authors SET contentful_id = $1 WHERE login = $2")
            .bind(entry_id)
            .bind(login)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn fetch_posts_with_richtext(&self) -> Result<Vec<PostRecord>> {
        let rows = sqlx::query_as::<_, PostRecord>(
            r#"
            SELECT p.id, a.contentful_id AS author_contentful_id, p.title, p.link,
                   p.pub_date, p.creator, p.rich_text
            FROM posts AS p
            INNER JOIN authors AS a ON a.login = p.creator
            WHERE p.rich_text IS NOT NULL
            ORDER BY p.pub_date
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn fetch_categories_for_post(&self, post_id: i64) -> Result<Vec<CategoryTag>> {
        let rows = sqlx::query_as::<_, CategoryTag>(
            r#"
            SELECT post_id, domain, value
            FROM categories
            WHERE domain = 'category' AND post_id = $1
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn fetch_categories_for_link(&self, link: &str) -> Result<Vec<CategoryTag>> {
        let rows = sqlx::query_as::<_, CategoryTag>(
            r#"
            SELECT c.post_id, c.domain, c.value
            FROM categories AS c
            INNER JOIN posts AS p ON p.id = c.post_id
            WHERE c.domain = 'category' AND p.link = $1
            "#,
        )
        .bind(link)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn fetch_hero_media(&self, post_id: i64) -> Result<Option<MediaRecord>> {
        let row = sqlx::query_as::<_, MediaRecord>(
            r#"
            SELECT post_id, post_parent, link, title, post_type, attachment_url
            FROM featured_medias
            WHERE post_parent = $1
            ORDER BY post_id
            LIMIT 1
            "#,
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}
