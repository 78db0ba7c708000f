mod common;

use axum_storefront::{dto::auth::RegisterForm, error::AppError, services::auth_service};
use common::setup_state;

fn registration(username: &str) -> RegisterForm {
    RegisterForm {
        username: username.into(),
        email: format!("{username}@example.com"),
        password: "correct-horse".into(),
        password_confirm: "correct-horse".into(),
    }
}

#[tokio::test]
async fn simultaneous_registrations_yield_one_user_and_a_field_error() -> anyhow::Result<()> {
    let state = setup_state().await?;

    let (first, second) = tokio::join!(
        auth_service::register_user(&state, registration("ferris")),
        auth_service::register_user(&state, registration("ferris")),
    );

    let (created, rejected) = match (first, second) {
        (Ok(created), Err(rejected)) | (Err(rejected), Ok(created)) => (created, rejected),
        (Ok(_), Ok(_)) => panic!("both registrations succeeded"),
        (Err(a), Err(b)) => panic!("both registrations failed: {a:?} / {b:?}"),
    };
    assert_eq!(created.data.expect("user").username, "ferris");
    match rejected {
        AppError::Validation(errors) => {
            assert_eq!(
                errors.get("username"),
                Some(&["A user with that username already exists.".to_string()][..])
            );
        }
        other => panic!("expected a username field error, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn sequential_duplicate_is_a_field_error() -> anyhow::Result<()> {
    let state = setup_state().await?;
    auth_service::register_user(&state, registration("bob")).await?;

    let again = auth_service::register_user(&state, registration("bob")).await;
    assert!(matches!(again, Err(AppError::Validation(errors)) if errors.get("username").is_some()));
    Ok(())
}
