use crate::credentials::CredentialStore;
use crate::db::*;
use crate::error::{CredentialError, Error};
use crate::types::{Credential, SessionId};
use chrono::{TimeZone, Utc};
use tempfile::NamedTempFile;

#[tokio::test]
async fn test_save_and_load_session_credential() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();
    let session = SessionId::new("s1");

    let mut credential = Credential::new("access-1").with_refresh_token("refresh-1");
    credential.expiry = Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
    db.save_session(&session, "u1", &credential).await.unwrap();

    assert_eq!(db.credential(&session).await.unwrap(), credential);
    assert_eq!(db.user_for_session(&session).await.unwrap(), "u1");

    db.close().await;
}

#[tokio::test]
async fn test_save_session_replaces_existing() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();
    let session = SessionId::new("s1");

    db.save_session(&session, "u1", &Credential::new("old"))
        .await
        .unwrap();
    db.save_session(&session, "u1", &Credential::new("new"))
        .await
        .unwrap();

    assert_eq!(db.credential(&session).await.unwrap().access_token, "new");

    db.close().await;
}

#[tokio::test]
async fn test_persist_refreshed_keeps_refresh_token_when_absent() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();
    let session = SessionId::new("s1");

    db.save_session(
        &session,
        "u1",
        &Credential::new("access-1").with_refresh_token("refresh-1"),
    )
    .await
    .unwrap();
    db.persist_refreshed(&session, &Credential::new("access-2"))
        .await
        .unwrap();

    let stored = db.credential(&session).await.unwrap();
    assert_eq!(stored.access_token, "access-2");
    assert_eq!(stored.refresh_token.as_deref(), Some("refresh-1"));

    db.close().await;
}

#[tokio::test]
async fn test_unknown_session_is_reported() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();
    let session = SessionId::new("ghost");

    let err = db.credential(&session).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Credential(CredentialError::SessionNotFound { .. })
    ));

    let err = db
        .persist_refreshed(&session, &Credential::new("x"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Credential(CredentialError::SessionNotFound { .. })
    ));

    db.close().await;
}

#[tokio::test]
async fn test_delete_session() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();
    let session = SessionId::new("s1");

    db.save_session(&session, "u1", &Credential::new("a"))
        .await
        .unwrap();
    assert!(db.delete_session(&session).await.unwrap());
    assert!(db.user_for_session(&session).await.is_err());

    db.close().await;
}
