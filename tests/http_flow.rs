mod common;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    response::Response,
};
use axum_storefront::routes::create_app;
use common::{create_category, create_product, setup_state};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

async fn send(app: &Router, request: Request<Body>) -> anyhow::Result<Response> {
    Ok(app.clone().oneshot(request).await?)
}

fn get(uri: &str, cookie: Option<&str>) -> anyhow::Result<Request<Body>> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    Ok(builder.body(Body::empty())?)
}

fn post_form(uri: &str, body: &str, cookie: Option<&str>) -> anyhow::Result<Request<Body>> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    Ok(builder.body(Body::from(body.to_string()))?)
}

async fn json(response: Response) -> anyhow::Result<Value> {
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn location(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

/// `name=value` part of the Set-Cookie header, ready to send back.
fn session_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

#[tokio::test]
async fn health_and_unknown_paths() -> anyhow::Result<()> {
    let app = create_app(setup_state().await?);

    let health = send(&app, get("/health", None)?).await?;
    assert_eq!(health.status(), StatusCode::OK);
    assert!(health.headers().contains_key("x-request-id"));

    let missing = send(&app, get("/no/such/page", None)?).await?;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    let body = json(missing).await?;
    assert_eq!(body["data"]["path"], "/no/such/page");
    Ok(())
}

#[tokio::test]
async fn home_lists_and_filters_products() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let kitchen = create_category(&state, "Kitchen").await?;
    create_product(&state, kitchen.id, "Ferris Mug", 1200).await?;
    create_product(&state, kitchen.id, "Teapot", 3000).await?;
    let app = create_app(state);

    let all = json(send(&app, get("/", None)?).await?).await?;
    assert_eq!(all["data"]["products"].as_array().map(Vec::len), Some(2));
    assert_eq!(all["data"]["categories"][0]["name"], "Kitchen");

    let uri = format!("/?q=MUG&category={}", kitchen.id);
    let filtered = json(send(&app, get(&uri, None)?).await?).await?;
    assert_eq!(filtered["data"]["products"].as_array().map(Vec::len), Some(1));
    assert_eq!(filtered["data"]["products"][0]["name"], "Ferris Mug");
    assert_eq!(filtered["data"]["query"], "MUG");
    Ok(())
}

#[tokio::test]
async fn product_detail_and_missing_product() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let kitchen = create_category(&state, "Kitchen").await?;
    let mug = create_product(&state, kitchen.id, "Mug", 1200).await?;
    let app = create_app(state);

    let found = send(&app, get(&format!("/product/{}", mug.id), None)?).await?;
    assert_eq!(found.status(), StatusCode::OK);
    let body = json(found).await?;
    assert_eq!(body["data"]["product"]["price"], 1200);
    assert_eq!(body["data"]["category"]["name"], "Kitchen");

    let missing = send(&app, get(&format!("/product/{}", Uuid::new_v4()), None)?).await?;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let add_missing = send(&app, post_form(&format!("/cart/add/{}", Uuid::new_v4()), "", None)?).await?;
    assert_eq!(add_missing.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn malformed_ids_are_not_found() -> anyhow::Result<()> {
    let app = create_app(setup_state().await?);

    let requests = [
        get("/product/42", None)?,
        get("/cart/add/42", None)?,
        post_form("/cart/add/not-a-uuid", "", None)?,
        get("/cart/remove/42", None)?,
        post_form("/cart/remove/42", "", None)?,
    ];
    for request in requests {
        let uri = request.uri().to_string();
        let response = send(&app, request).await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        assert!(response.headers().get(header::SET_COOKIE).is_none(), "{uri}");
        let body = json(response).await?;
        assert_eq!(body["message"], "Not Found", "{uri}");
    }
    Ok(())
}

#[tokio::test]
async fn cart_lives_in_the_session_cookie() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let misc = create_category(&state, "Misc").await?;
    let ten = create_product(&state, misc.id, "Ten", 1000).await?;
    let five = create_product(&state, misc.id, "Five", 500).await?;
    let app = create_app(state);

    let empty = json(send(&app, get("/cart", None)?).await?).await?;
    assert!(empty["data"]["cart"].is_null());

    let added = send(&app, get(&format!("/cart/add/{}", ten.id), None)?).await?;
    assert_eq!(added.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&added), Some("/cart"));
    let cookie = session_cookie(&added).expect("session cookie");

    let again = send(&app, post_form(&format!("/cart/add/{}", ten.id), "", Some(&cookie))?).await?;
    assert_eq!(again.status(), StatusCode::SEE_OTHER);
    send(&app, post_form(&format!("/cart/add/{}", five.id), "", Some(&cookie))?).await?;

    let cart = json(send(&app, get("/cart", Some(&cookie))?).await?).await?;
    let items = cart["data"]["cart"]["items"].as_array().expect("items").clone();
    assert_eq!(items.len(), 2);
    assert_eq!(cart["data"]["cart"]["total"], 2500);
    let ten_line = items
        .iter()
        .find(|line| line["product"]["name"] == "Ten")
        .expect("ten line");
    assert_eq!(ten_line["quantity"], 2);
    assert_eq!(ten_line["subtotal"], 2000);

    // another visitor sees nothing and cannot remove our items
    let item_id = ten_line["id"].as_str().expect("item id").to_string();
    let stranger = send(&app, post_form(&format!("/cart/remove/{item_id}"), "", None)?).await?;
    assert_eq!(stranger.status(), StatusCode::NOT_FOUND);

    let removed = send(&app, post_form(&format!("/cart/remove/{item_id}"), "", Some(&cookie))?).await?;
    assert_eq!(removed.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&removed), Some("/cart"));

    let cart = json(send(&app, get("/cart", Some(&cookie))?).await?).await?;
    assert_eq!(cart["data"]["cart"]["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(cart["data"]["cart"]["total"], 500);

    let gone = send(&app, post_form(&format!("/cart/remove/{item_id}"), "", Some(&cookie))?).await?;
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn tampered_cookie_reads_as_no_session() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let misc = create_category(&state, "Misc").await?;
    let mug = create_product(&state, misc.id, "Mug", 1200).await?;
    let app = create_app(state);

    let added = send(&app, get(&format!("/cart/add/{}", mug.id), None)?).await?;
    let cookie = session_cookie(&added).expect("session cookie");
    let tampered = format!("{cookie}x");

    let cart = json(send(&app, get("/cart", Some(&tampered))?).await?).await?;
    assert!(cart["data"]["cart"].is_null());

    let garbage = json(send(&app, get("/cart", Some("storefront_session=garbage"))?).await?).await?;
    assert!(garbage["data"]["cart"].is_null());
    Ok(())
}

#[tokio::test]
async fn register_login_logout() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let misc = create_category(&state, "Misc").await?;
    let mug = create_product(&state, misc.id, "Mug", 1200).await?;
    let app = create_app(state);

    let form = json(send(&app, get("/register", None)?).await?).await?;
    assert_eq!(form["data"]["form"], "register");

    let registration =
        "username=ferris&email=ferris%40example.com&password=crab-rave-42&password_confirm=crab-rave-42";
    let registered = send(&app, post_form("/register", registration, None)?).await?;
    assert_eq!(registered.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&registered), Some("/login"));

    let duplicate = send(&app, post_form("/register", registration, None)?).await?;
    assert_eq!(duplicate.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json(duplicate).await?;
    assert!(body["data"]["fields"]["username"].is_array());

    let mismatch = send(
        &app,
        post_form(
            "/register",
            "username=crab&email=crab%40example.com&password=crab-rave-42&password_confirm=other-pass-1",
            None,
        )?,
    )
    .await?;
    assert_eq!(mismatch.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json(mismatch).await?;
    assert!(body["data"]["fields"]["password_confirm"].is_array());

    // anonymous cart first, then log in with it
    let added = send(&app, get(&format!("/cart/add/{}", mug.id), None)?).await?;
    let anonymous_cookie = session_cookie(&added).expect("session cookie");

    let bad_login = send(
        &app,
        post_form("/login", "username=ferris&password=wrong-pass", Some(&anonymous_cookie))?,
    )
    .await?;
    assert_eq!(bad_login.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json(bad_login).await?;
    assert!(body["data"]["fields"]["form"].is_array());

    let logged_in = send(
        &app,
        post_form("/login", "username=ferris&password=crab-rave-42", Some(&anonymous_cookie))?,
    )
    .await?;
    assert_eq!(logged_in.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&logged_in), Some("/"));
    let user_cookie = session_cookie(&logged_in).expect("rotated cookie");
    assert_ne!(user_cookie, anonymous_cookie);

    // the cart follows the login; the old token is retired
    let cart = json(send(&app, get("/cart", Some(&user_cookie))?).await?).await?;
    assert_eq!(cart["data"]["cart"]["items"].as_array().map(Vec::len), Some(1));
    let old = json(send(&app, get("/cart", Some(&anonymous_cookie))?).await?).await?;
    assert!(old["data"]["cart"].is_null());

    let logged_out = send(&app, post_form("/logout", "", Some(&user_cookie))?).await?;
    assert_eq!(logged_out.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&logged_out), Some("/"));
    assert_eq!(session_cookie(&logged_out).as_deref(), Some("storefront_session="));

    let after = json(send(&app, get("/cart", Some(&user_cookie))?).await?).await?;
    assert!(after["data"]["cart"].is_null());
    Ok(())
}
