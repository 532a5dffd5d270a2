//! Chat store: CRUD over the `chat_history` and `sessions` tables.
//!
//! The message log is append-only. Messages are inserted one at a time,
//! listed per session in timestamp order, and deleted in bulk by session.
//! Sessions are a thin grouping layer on top; deleting a session removes
//! its messages as well.

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::models::{ChatMessage, MessageType, Session};

/// Append a message to the log. Returns the assigned row id.
pub async fn save_message(
    pool: &SqlitePool,
    session_id: &str,
    message_type: MessageType,
    content: &str,
    metadata: Option<&serde_json::Value>,
) -> Result<i64> {
    let metadata_json = metadata.map(|m| m.to_string());
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO chat_history (session_id, message_type, content, timestamp, metadata)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(session_id)
    .bind(message_type.as_str())
    .bind(content)
    .bind(now)
    .bind(metadata_json)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// List messages. With a session filter, oldest first (conversation order);
/// without one, newest first (recent activity view).
pub async fn get_history(
    pool: &SqlitePool,
    session_id: Option<&str>,
    limit: Option<i64>,
) -> Result<Vec<ChatMessage>> {
    let limit = limit.unwrap_or(i64::MAX);

    let rows = if let Some(session_id) = session_id {
        sqlx::query(
            r#"
            SELECT id, session_id, message_type, content, timestamp, metadata
            FROM chat_history
            WHERE session_id = ?
            ORDER BY timestamp ASC, id ASC
            LIMIT ?
            "#,
        )
        .bind(session_id)
        .bind(limit)
        .fetch_all(pool)
        .await?
    } else {
        sqlx::query(
            r#"
            SELECT id, session_id, message_type, content, timestamp, metadata
            FROM chat_history
            ORDER BY timestamp DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await?
    };

    rows.iter().map(row_to_message).collect()
}

/// Delete all messages for one session. Returns the deleted count.
/// Other sessions are untouched.
pub async fn delete_session_messages(pool: &SqlitePool, session_id: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM chat_history WHERE session_id = ?")
        .bind(session_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

fn row_to_message(row: &sqlx::sqlite::SqliteRow) -> Result<ChatMessage> {
    let message_type = match row.get::<String, _>("message_type").as_str() {
        "user" => MessageType::User,
        "assistant" => MessageType::Assistant,
        other => bail!("Unknown message_type in chat_history: '{}'", other),
    };

    let metadata = row
        .get::<Option<String>, _>("metadata")
        .map(|raw| serde_json::from_str(&raw))
        .transpose()?;

    Ok(ChatMessage {
        id: row.get("id"),
        session_id: row.get("session_id"),
        message_type,
        content: row.get("content"),
        timestamp: row.get::<DateTime<Utc>, _>("timestamp"),
        metadata,
    })
}

// ============ Sessions ============

pub async fn create_session(
    pool: &SqlitePool,
    name: &str,
    mode: &str,
    pdf_id: Option<&str>,
) -> Result<Session> {
    let session = Session {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        mode: mode.to_string(),
        pdf_id: pdf_id.map(|s| s.to_string()),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO sessions (id, name, mode, pdf_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&session.id)
    .bind(&session.name)
    .bind(&session.mode)
    .bind(&session.pdf_id)
    .bind(session.created_at)
    .bind(session.updated_at)
    .execute(pool)
    .await?;

    Ok(session)
}

/// All sessions, most recently updated first.
pub async fn list_sessions(pool: &SqlitePool) -> Result<Vec<Session>> {
    let rows = sqlx::query(
        r#"
        SELECT id, name, mode, pdf_id, created_at, updated_at
        FROM sessions
        ORDER BY updated_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(row_to_session).collect())
}

pub async fn get_session(pool: &SqlitePool, session_id: &str) -> Result<Option<Session>> {
    let row = sqlx::query(
        r#"
        SELECT id, name, mode, pdf_id, created_at, updated_at
        FROM sessions
        WHERE id = ?
        "#,
    )
    .bind(session_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(row_to_session))
}

/// Delete a session and all of its messages.
pub async fn delete_session(pool: &SqlitePool, session_id: &str) -> Result<()> {
    sqlx::query("DELETE FROM chat_history WHERE session_id = ?")
        .bind(session_id)
        .execute(pool)
        .await?;
    sqlx::query("DELETE FROM sessions WHERE id = ?")
        .bind(session_id)
        .execute(pool)
        .await?;
    Ok(())
}

fn row_to_session(row: &sqlx::sqlite::SqliteRow) -> Session {
    Session {
        id: row.get("id"),
        name: row.get("name"),
        mode: row.get("mode"),
        pdf_id: row.get("pdf_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate::run_migrations;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn messages_returned_in_ascending_order() {
        let pool = test_pool().await;

        save_message(&pool, "s1", MessageType::User, "first question", None)
            .await
            .unwrap();
        save_message(&pool, "s1", MessageType::Assistant, "first answer", None)
            .await
            .unwrap();
        save_message(&pool, "s1", MessageType::User, "second question", None)
            .await
            .unwrap();

        let messages = get_history(&pool, Some("s1"), None).await.unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].content, "first question");
        assert_eq!(messages[1].content, "first answer");
        assert_eq!(messages[2].content, "second question");
        for pair in messages.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }

    #[tokio::test]
    async fn delete_only_removes_target_session() {
        let pool = test_pool().await;

        save_message(&pool, "keep", MessageType::User, "hello", None)
            .await
            .unwrap();
        save_message(&pool, "drop", MessageType::User, "bye", None)
            .await
            .unwrap();
        save_message(&pool, "drop", MessageType::Assistant, "farewell", None)
            .await
            .unwrap();

        let deleted = delete_session_messages(&pool, "drop").await.unwrap();
        assert_eq!(deleted, 2);

        assert!(get_history(&pool, Some("drop"), None).await.unwrap().is_empty());
        assert_eq!(get_history(&pool, Some("keep"), None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn metadata_round_trips_as_json() {
        let pool = test_pool().await;

        let metadata = serde_json::json!({
            "retrieved_chunks": [{"text": "alpha", "score": 0.9}],
        });
        save_message(
            &pool,
            "s1",
            MessageType::Assistant,
            "answer",
            Some(&metadata),
        )
        .await
        .unwrap();

        let messages = get_history(&pool, Some("s1"), None).await.unwrap();
        assert_eq!(messages[0].metadata.as_ref().unwrap(), &metadata);
        assert_eq!(messages[0].message_type, MessageType::Assistant);
    }

    #[tokio::test]
    async fn history_without_session_is_newest_first() {
        let pool = test_pool().await;

        save_message(&pool, "a", MessageType::User, "older", None)
            .await
            .unwrap();
        save_message(&pool, "b", MessageType::User, "newer", None)
            .await
            .unwrap();

        let messages = get_history(&pool, None, None).await.unwrap();
        assert_eq!(messages[0].content, "newer");
        assert_eq!(messages[1].content, "older");

        let limited = get_history(&pool, None, Some(1)).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn session_lifecycle() {
        let pool = test_pool().await;

        let session = create_session(&pool, "My chat", "pdf", Some("doc.pdf"))
            .await
            .unwrap();
        save_message(&pool, &session.id, MessageType::User, "question", None)
            .await
            .unwrap();

        let found = get_session(&pool, &session.id).await.unwrap().unwrap();
        assert_eq!(found.name, "My chat");
        assert_eq!(found.pdf_id.as_deref(), Some("doc.pdf"));
        assert_eq!(list_sessions(&pool).await.unwrap().len(), 1);

        delete_session(&pool, &session.id).await.unwrap();
        assert!(get_session(&pool, &session.id).await.unwrap().is_none());
        assert!(get_history(&pool, Some(&session.id), None)
            .await
            .unwrap()
            .is_empty());
    }
}
