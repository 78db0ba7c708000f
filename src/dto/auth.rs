use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
}

#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// What a client needs to draw an empty form.
#[derive(Debug, Serialize, ToSchema)]
pub struct FormView {
    pub form: String,
    pub action: String,
    pub fields: Vec<String>,
}

impl FormView {
    pub fn register() -> Self {
        Self::new(
            "register",
            "/register",
            &["username", "email", "password", "password_confirm"],
        )
    }

    pub fn login() -> Self {
        Self::new("login", "/login", &["username", "password"])
    }

    fn new(form: &str, action: &str, fields: &[&str]) -> Self {
        Self {
            form: form.to_string(),
            action: action.to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct SessionClaims {
    /// Session id.
    pub sub: String,
    pub exp: usize,
}
