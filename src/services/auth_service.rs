use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::Utc;
use password_hash::rand_core::OsRng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, Set, SqlErr,
};
use uuid::Uuid;

use crate::{
    dto::auth::{LoginForm, RegisterForm},
    entity::{
        sessions::Model as SessionModel,
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult, FORM_ERRORS, FieldErrors},
    middleware::session::SessionToken,
    models::User,
    response::ApiResponse,
    services::session_service,
    state::AppState,
};

const REQUIRED: &str = "This field is required.";
const USERNAME_TAKEN: &str = "A user with that username already exists.";
const BAD_CREDENTIALS: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";
const USERNAME_MAX: usize = 150;
const PASSWORD_MIN: usize = 8;

pub async fn register_user(
    state: &AppState,
    form: RegisterForm,
) -> AppResult<ApiResponse<User>> {
    let mut errors = validate_registration(&form);

    let username = form.username.trim();
    if errors.get("username").is_none() {
        let taken = Users::find()
            .filter(UserCol::Username.eq(username))
            .count(&state.orm)
            .await?;
        if taken > 0 {
            errors.add("username", USERNAME_TAKEN);
        }
    }
    errors.into_result()?;

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(form.password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();

    let user = UserActive {
        id: Set(Uuid::new_v4()),
        username: Set(username.to_string()),
        email: Set(form.email.trim().to_string()),
        password_hash: Set(password_hash),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await
    .map_err(username_conflict)?;

    tracing::info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(ApiResponse::success("User created", User::from(user), None))
}

/// A registration that raced past the lookup above still lands on the unique
/// index; report it the same way.
fn username_conflict(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            let mut errors = FieldErrors::new();
            errors.add("username", USERNAME_TAKEN);
            AppError::Validation(errors)
        }
        _ => AppError::OrmError(err),
    }
}

/// Check the credentials and bind the user to a fresh session that keeps the
/// visitor's cart.
pub async fn login_user(
    state: &AppState,
    token: SessionToken,
    form: LoginForm,
) -> AppResult<SessionModel> {
    let mut errors = FieldErrors::new();
    if form.username.trim().is_empty() {
        errors.add("username", REQUIRED);
    }
    if form.password.is_empty() {
        errors.add("password", REQUIRED);
    }
    errors.into_result()?;

    let user = Users::find()
        .filter(UserCol::Username.eq(form.username.trim()))
        .one(&state.orm)
        .await?;

    let verified = user.filter(|u| {
        PasswordHash::new(&u.password_hash)
            .map(|parsed| {
                Argon2::default()
                    .verify_password(form.password.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    });

    let Some(user) = verified else {
        tracing::warn!(username = %form.username.trim(), "login rejected");
        let mut errors = FieldErrors::new();
        errors.add(FORM_ERRORS, BAD_CREDENTIALS);
        return Err(AppError::Validation(errors));
    };

    let session = session_service::attach_user(state, token, user.id).await?;
    tracing::info!(user_id = %user.id, session_id = %session.id, "user logged in");
    Ok(session)
}

pub async fn logout_user(state: &AppState, token: SessionToken) -> AppResult<()> {
    session_service::destroy(state, token).await?;
    tracing::info!("user logged out");
    Ok(())
}

/// Field checks that need no database.
pub fn validate_registration(form: &RegisterForm) -> FieldErrors {
    let mut errors = FieldErrors::new();

    let username = form.username.trim();
    if username.is_empty() {
        errors.add("username", REQUIRED);
    } else if username.chars().count() > USERNAME_MAX {
        errors.add(
            "username",
            format!("Ensure this value has at most {USERNAME_MAX} characters."),
        );
    } else if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        errors.add(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    }

    let email = form.email.trim();
    if email.is_empty() {
        errors.add("email", REQUIRED);
    } else if !is_plausible_email(email) {
        errors.add("email", "Enter a valid email address.");
    }

    if form.password.is_empty() {
        errors.add("password", REQUIRED);
    } else {
        if form.password.chars().count() < PASSWORD_MIN {
            errors.add(
                "password",
                format!("This password is too short. It must contain at least {PASSWORD_MIN} characters."),
            );
        }
        if form.password.chars().all(|c| c.is_ascii_digit()) {
            errors.add("password", "This password is entirely numeric.");
        }
    }

    if form.password_confirm.is_empty() {
        errors.add("password_confirm", REQUIRED);
    } else if form.password != form.password_confirm {
        errors.add("password_confirm", "The two password fields didn't match.");
    }

    errors
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(username: &str, email: &str, password: &str, confirm: &str) -> RegisterForm {
        RegisterForm {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            password_confirm: confirm.into(),
        }
    }

    #[test]
    fn valid_registration_has_no_errors() {
        let errors = validate_registration(&form("ferris", "ferris@example.com", "crab-rave-42", "crab-rave-42"));
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn empty_form_flags_every_field() {
        let errors = validate_registration(&RegisterForm::default());
        for field in ["username", "email", "password", "password_confirm"] {
            assert_eq!(errors.get(field), Some(&[REQUIRED.to_string()][..]), "{field}");
        }
    }

    #[test]
    fn weak_and_mismatched_passwords_are_reported() {
        let errors = validate_registration(&form("ferris", "ferris@example.com", "1234", "4321"));
        assert_eq!(errors.get("password").map(<[String]>::len), Some(2));
        assert!(errors.get("password_confirm").is_some());
    }

    #[test]
    fn username_and_email_shapes() {
        let errors = validate_registration(&form("bad name!", "no-at-sign", "crab-rave-42", "crab-rave-42"));
        assert!(errors.get("username").is_some());
        assert!(errors.get("email").is_some());
        assert!(!is_plausible_email("a@b@c"));
        assert!(is_plausible_email("a@b"));
    }
}
