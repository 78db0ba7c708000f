use axum::{
    Form, Json, Router,
    extract::State,
    http::header,
    response::{IntoResponse, Redirect},
    routing::get,
};

use crate::{
    dto::auth::{FormView, LoginForm, RegisterForm},
    error::AppResult,
    middleware::session::{SessionKeys, SessionToken},
    response::ApiResponse,
    services::{auth_service, session_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", get(register_form).post(register))
        .route("/login", get(login_form).post(login))
        .route("/logout", get(logout).post(logout))
}

#[utoipa::path(
    get,
    path = "/register",
    responses(
        (status = 200, description = "Empty registration form", body = ApiResponse<FormView>)
    ),
    tag = "Auth"
)]
pub async fn register_form() -> Json<ApiResponse<FormView>> {
    Json(ApiResponse::success("Register", FormView::register(), None))
}

#[utoipa::path(
    post,
    path = "/register",
    request_body(content = RegisterForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Registered, redirect to login"),
        (status = 422, description = "Form errors by field"),
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> AppResult<Redirect> {
    auth_service::register_user(&state, form).await?;
    Ok(Redirect::to("/login"))
}

#[utoipa::path(
    get,
    path = "/login",
    responses(
        (status = 200, description = "Empty login form", body = ApiResponse<FormView>)
    ),
    tag = "Auth"
)]
pub async fn login_form() -> Json<ApiResponse<FormView>> {
    Json(ApiResponse::success("Login", FormView::login(), None))
}

#[utoipa::path(
    post,
    path = "/login",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Logged in, redirect home"),
        (status = 422, description = "Invalid credentials"),
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    session: SessionToken,
    Form(form): Form<LoginForm>,
) -> AppResult<impl IntoResponse> {
    let session = auth_service::login_user(&state, session, form).await?;
    let cookie = session_service::cookie_for(&state, &session)?;
    Ok(([(header::SET_COOKIE, cookie)], Redirect::to("/")))
}

#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 303, description = "Session cleared, redirect home")
    ),
    tag = "Auth"
)]
pub async fn logout(
    State(state): State<AppState>,
    session: SessionToken,
) -> AppResult<impl IntoResponse> {
    auth_service::logout_user(&state, session).await?;
    Ok((
        [(header::SET_COOKIE, SessionKeys::expired_cookie())],
        Redirect::to("/"),
    ))
}
