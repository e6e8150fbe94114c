//! Session credentials.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::credentials::CredentialStore;
use crate::error::{CredentialError, DatabaseError};
use crate::types::{Credential, SessionId};
use crate::{Error, Result};

use super::{Database, SessionRow};

impl Database {
    /// Store or replace the credential of a session owned by `user_id`
    pub async fn save_session(
        &self,
        session: &SessionId,
        user_id: &str,
        credential: &Credential,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (session_id, user_id, access_token, refresh_token, expiry, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(session_id) DO UPDATE SET
                user_id = excluded.user_id,
                access_token = excluded.access_token,
                refresh_token = excluded.refresh_token,
                expiry = excluded.expiry,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(session.as_str())
        .bind(user_id)
        .bind(&credential.access_token)
        .bind(&credential.refresh_token)
        .bind(credential.expiry.map(|e| e.timestamp()))
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to save session: {}",
                e
            )))
        })?;

        Ok(())
    }

    /// Remove a session
    pub async fn delete_session(&self, session: &SessionId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE session_id = ?")
            .bind(session.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to delete session: {}",
                    e
                )))
            })?;
        Ok(result.rows_affected() > 0)
    }

    /// User that owns a session
    pub async fn user_for_session(&self, session: &SessionId) -> Result<String> {
        Ok(self.session_row(session).await?.user_id)
    }

    async fn session_row(&self, session: &SessionId) -> Result<SessionRow> {
        sqlx::query_as::<_, SessionRow>(
            "SELECT user_id, access_token, refresh_token, expiry FROM sessions WHERE session_id = ?",
        )
        .bind(session.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get session: {}",
                e
            )))
        })?
        .ok_or_else(|| {
            Error::Credential(CredentialError::SessionNotFound {
                session: session.to_string(),
            })
        })
    }
}

#[async_trait]
impl CredentialStore for Database {
    async fn credential(&self, session: &SessionId) -> Result<Credential> {
        let row = self.session_row(session).await?;
        Ok(Credential {
            access_token: row.access_token,
            refresh_token: row.refresh_token,
            expiry: row.expiry.and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)),
        })
    }

    async fn persist_refreshed(&self, session: &SessionId, credential: &Credential) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE sessions
            SET access_token = ?, refresh_token = COALESCE(?, refresh_token), expiry = ?, updated_at = ?
            WHERE session_id = ?
            "#,
        )
        .bind(&credential.access_token)
        .bind(&credential.refresh_token)
        .bind(credential.expiry.map(|e| e.timestamp()))
        .bind(Utc::now().timestamp())
        .bind(session.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to persist refreshed credential: {}",
                e
            )))
        })?;

        if result.rows_affected() == 0 {
            return Err(Error::Credential(CredentialError::SessionNotFound {
                session: session.to_string(),
            }));
        }
        Ok(())
    }
}
