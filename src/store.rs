use anyhow::Result;
use libsql::Connection;

use crate::model::{Bookmark, BookmarkPatch, NewBookmark};

/// Data access for the bookmarks table. Borrows a connection per call so
/// handlers can hold the database behind shared state.
pub struct BookmarkStore<'a> {
    conn: &'a Connection,
}

impl<'a> BookmarkStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, input: NewBookmark) -> Result<Bookmark> {
        let query = r#"
            INSERT INTO bookmarks (title, url, description, rating)
            VALUES (?, ?, ?, ?)
            RETURNING id, title, url, description, rating
        "#;

        let mut rows = self
            .conn
            .query(
                query,
                libsql::params![input.title, input.url, input.description, input.rating],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(self.row_to_bookmark(&row)?)
        } else {
            anyhow::bail!("Failed to create bookmark")
        }
    }

    pub async fn get(&self, id: i32) -> Result<Option<Bookmark>> {
        let query = r#"
            SELECT id, title, url, description, rating
            FROM bookmarks WHERE id = ?
        "#;

        let mut rows = self.conn.query(query, libsql::params![id]).await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(self.row_to_bookmark(&row)?))
        } else {
            Ok(None)
        }
    }

    pub async fn list(&self) -> Result<Vec<Bookmark>> {
        let query = r#"
            SELECT id, title, url, description, rating
            FROM bookmarks
            ORDER BY id ASC
        "#;

        let mut rows = self.conn.query(query, ()).await?;
        let mut bookmarks = Vec::new();

        while let Some(row) = rows.next().await? {
            bookmarks.push(self.row_to_bookmark(&row)?);
        }

        Ok(bookmarks)
    }

    pub async fn update(&self, id: i32, patch: BookmarkPatch) -> Result<Option<Bookmark>> {
        let mut updates = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        if let Some(title) = &patch.title {
            updates.push("title = ?");
            params.push(title.clone().into());
        }
        if let Some(url) = &patch.url {
            updates.push("url = ?");
            params.push(url.clone().into());
        }
        if let Some(description) = &patch.description {
            updates.push("description = ?");
            params.push(description.clone().into());
        }
        if let Some(rating) = patch.rating {
            updates.push("rating = ?");
            params.push(rating.into());
        }

        if updates.is_empty() {
            return self.get(id).await;
        }

        updates.push("updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')");
        params.push(id.into());

        let query = format!("UPDATE bookmarks SET {} WHERE id = ?", updates.join(", "));

        // The affected-row count settles existence; no lookup up front.
        let affected = self.conn.execute(&query, params).await?;
        if affected == 0 {
            return Ok(None);
        }
        self.get(id).await
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = self
            .conn
            .execute("DELETE FROM bookmarks WHERE id = ?", libsql::params![id])
            .await?;
        Ok(result > 0)
    }

    fn row_to_bookmark(&self, row: &libsql::Row) -> Result<Bookmark> {
        Ok(Bookmark {
            id: row.get(0)?,
            title: row.get(1)?,
            url: row.get(2)?,
            description: row.get(3)?,
            rating: row.get(4)?,
        })
    }
}
