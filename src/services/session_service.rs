use axum::http::HeaderValue;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use uuid::Uuid;

use crate::{
    entity::sessions::{ActiveModel as SessionActive, Entity as Sessions, Model as SessionModel},
    error::AppResult,
    middleware::session::SessionToken,
    state::AppState,
};

/// Look up the live session behind a token. Unknown ids and expired rows both
/// read as "no session"; expired rows are removed on the way.
pub async fn resolve(state: &AppState, token: SessionToken) -> AppResult<Option<SessionModel>> {
    let Some(id) = token.id() else {
        return Ok(None);
    };

    let session = Sessions::find_by_id(id).one(&state.orm).await?;
    match session {
        Some(s) if s.expires_at.with_timezone(&Utc) > Utc::now() => Ok(Some(s)),
        Some(s) => {
            tracing::debug!(session_id = %s.id, "session expired");
            Sessions::delete_by_id(s.id).exec(&state.orm).await?;
            Ok(None)
        }
        None => Ok(None),
    }
}

/// Bind `cart_id` to the session, starting a session when there is none.
/// Refreshes the expiry either way.
pub async fn bind_cart(
    state: &AppState,
    session: Option<SessionModel>,
    cart_id: Uuid,
) -> AppResult<SessionModel> {
    match session {
        Some(existing) => {
            let mut active: SessionActive = existing.into();
            active.cart_id = Set(Some(cart_id));
            active.expires_at = Set((Utc::now() + state.sessions.ttl()).into());
            Ok(active.update(&state.orm).await?)
        }
        None => start(state, Some(cart_id), None).await,
    }
}

/// Log a user into the session. The session id is rotated, but the bound
/// cart carries over.
pub async fn attach_user(
    state: &AppState,
    token: SessionToken,
    user_id: Uuid,
) -> AppResult<SessionModel> {
    let previous = resolve(state, token).await?;
    let cart_id = previous.as_ref().and_then(|s| s.cart_id);
    if let Some(old) = previous {
        Sessions::delete_by_id(old.id).exec(&state.orm).await?;
    }
    start(state, cart_id, Some(user_id)).await
}

/// Forget the session and everything bound to it.
pub async fn destroy(state: &AppState, token: SessionToken) -> AppResult<()> {
    if let Some(id) = token.id() {
        let result = Sessions::delete_by_id(id).exec(&state.orm).await?;
        tracing::debug!(session_id = %id, removed = result.rows_affected, "session destroyed");
    }
    Ok(())
}

pub fn cookie_for(state: &AppState, session: &SessionModel) -> AppResult<HeaderValue> {
    state
        .sessions
        .cookie(session.id, session.expires_at.with_timezone(&Utc))
}

async fn start(
    state: &AppState,
    cart_id: Option<Uuid>,
    user_id: Option<Uuid>,
) -> AppResult<SessionModel> {
    let now = Utc::now();
    let session = SessionActive {
        id: Set(Uuid::new_v4()),
        cart_id: Set(cart_id),
        user_id: Set(user_id),
        created_at: Set(now.into()),
        expires_at: Set((now + state.sessions.ttl()).into()),
    }
    .insert(&state.orm)
    .await?;

    tracing::debug!(session_id = %session.id, "session started");
    Ok(session)
}
