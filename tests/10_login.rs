mod common;

use anyhow::Result;
use reqwest::StatusCode;

const USERNAME: &str = "it_login_user";
const PASSWORD: &str = "testpassword";

#[tokio::test]
async fn login_returns_bearer_token() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    common::provision_user(USERNAME, PASSWORD).await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/token", server.base_url))
        .form(&[("username", USERNAME), ("password", PASSWORD)])
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert!(body["access_token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["token_type"], "bearer");

    Ok(())
}

#[tokio::test]
async fn bad_credentials_are_indistinguishable() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    common::provision_user(USERNAME, PASSWORD).await?;
    let client = reqwest::Client::new();

    let wrong_password = client
        .post(format!("{}/token", server.base_url))
        .form(&[("username", USERNAME), ("password", "not-the-password")])
        .send()
        .await?;
    let unknown_user = client
        .post(format!("{}/token", server.base_url))
        .form(&[("username", "it_login_no_such_user"), ("password", PASSWORD)])
        .send()
        .await?;

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);

    // Enumeration resistance: status and body must match byte for byte
    let body_a = wrong_password.text().await?;
    let body_b = unknown_user.text().await?;
    assert_eq!(body_a, body_b);

    Ok(())
}

#[tokio::test]
async fn token_grants_access_to_protected_routes() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    common::provision_user(USERNAME, PASSWORD).await?;
    let token = common::login(&server.base_url, USERNAME, PASSWORD).await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/surgeries/", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn missing_token_gets_bearer_challenge() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/surgeries/", server.base_url))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let challenge = res
        .headers()
        .get("www-authenticate")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert_eq!(challenge, "Bearer");

    Ok(())
}

#[tokio::test]
async fn garbage_token_is_rejected() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/surgeries/", server.base_url))
        .bearer_auth("definitely.not.a.token")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .get(format!("{}/surgeries/", server.base_url))
        .header("Authorization", "Basic dXNlcjpwYXNz")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}
