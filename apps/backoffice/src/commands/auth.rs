//! # Auth Commands
//!
//! Login and registration screens. All state changes go through the
//! [`SessionManager`] so observers hear about them.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::state::{DbState, SessionManager};
use filamento_core::UserProfile;
use filamento_db::Session;

/// Registration form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpForm {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

pub async fn sign_in(
    sessions: &SessionManager,
    email: &str,
    password: &str,
) -> Result<Session, ApiError> {
    debug!(email = %email, "sign_in command");

    sessions.sign_in(email, password).await.map_err(|e| {
        warn!(email = %email, code = ?e.code, "Sign-in rejected");
        e
    })
}

pub async fn sign_up(sessions: &SessionManager, form: SignUpForm) -> Result<Session, ApiError> {
    debug!(email = %form.email, "sign_up command");

    sessions
        .sign_up(&form.email, &form.password, &form.full_name)
        .await
}

pub async fn sign_out(sessions: &SessionManager) -> Result<(), ApiError> {
    sessions.sign_out().await
}

/// Profile of the signed-in user, or `None` when nobody is signed in.
pub async fn current_user(
    db: &DbState,
    sessions: &SessionManager,
) -> Result<Option<UserProfile>, ApiError> {
    let Some(session) = sessions.current() else {
        return Ok(None);
    };

    Ok(db.inner().users().get_profile(&session.user_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing;
    use crate::error::ErrorCode;

    #[tokio::test]
    async fn test_sign_up_then_current_user() {
        let h = testing::signed_out().await;
        assert!(current_user(&h.db, &h.sessions).await.unwrap().is_none());

        let session = sign_up(
            &h.sessions,
            SignUpForm {
                email: "ana@taller3d.cl".to_string(),
                password: "secreto123".to_string(),
                full_name: "Ana Rojas".to_string(),
            },
        )
        .await
        .unwrap();

        let profile = current_user(&h.db, &h.sessions).await.unwrap().unwrap();
        assert_eq!(profile.id, session.user_id);
        assert_eq!(profile.full_name, "Ana Rojas");
    }

    #[tokio::test]
    async fn test_sign_in_out() {
        let h = testing::signed_in().await;
        sign_out(&h.sessions).await.unwrap();
        assert!(h.sessions.current().is_none());

        let err = sign_in(&h.sessions, "taller@filamento.cl", "otra-clave")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::AuthFailed);

        let session = sign_in(&h.sessions, "taller@filamento.cl", "secreto123")
            .await
            .unwrap();
        assert_eq!(session.email, "taller@filamento.cl");
        assert!(h.sessions.current().is_some());
    }

    #[tokio::test]
    async fn test_duplicate_sign_up() {
        let h = testing::signed_in().await;

        let err = sign_up(
            &h.sessions,
            SignUpForm {
                email: "taller@filamento.cl".to_string(),
                password: "secreto123".to_string(),
                full_name: "Otro".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::AuthFailed);
    }
}
