use crate::helpers::{spawn_app, subscriber_body};

#[tokio::test]
async fn api_login_returns_a_token_that_verifies() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let token = app.api_token().await;
    let response = app.get_api("verify", Some(&token)).await;

    // Assert
    assert_eq!(200, response.status().as_u16());
    let json: serde_json::Value = response.json().await.unwrap();
    assert_eq!(json, serde_json::json!({ "success": true }));
}

#[tokio::test]
async fn api_login_rejects_bad_credentials_with_401() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let response = app
        .post_api_login(&serde_json::json!({
            "username": &app.admin.username,
            "password": "wrong-password",
        }))
        .await;

    // Assert
    assert_eq!(401, response.status().as_u16());
    let json: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        json,
        serde_json::json!({ "success": false, "message": "Invalid username or password" })
    );
}

#[tokio::test]
async fn protected_endpoints_reject_missing_or_forged_tokens() {
    // Arrange
    let app = spawn_app().await;

    for token in [None, Some("garbage"), Some("a.b.c")] {
        for endpoint in ["verify", "subscribers"] {
            // Act
            let response = app.get_api(endpoint, token).await;

            // Assert
            assert_eq!(401, response.status().as_u16(), "{} with {:?}", endpoint, token);
            let json: serde_json::Value = response.json().await.unwrap();
            assert_eq!(json, serde_json::json!({ "error": "Unauthorized" }));
        }
    }
}

#[tokio::test]
async fn subscribers_are_listed_for_a_valid_token() {
    // Arrange
    let app = spawn_app().await;
    let body = subscriber_body();
    app.create_unconfirmed_subscriber(&body).await;
    let token = app.api_token().await;

    // Act
    let response = app.get_api("subscribers", Some(&token)).await;

    // Assert
    assert_eq!(200, response.status().as_u16());
    let json: serde_json::Value = response.json().await.unwrap();
    let subscribers = json.as_array().unwrap();
    assert_eq!(subscribers.len(), 1);
    assert_eq!(subscribers[0]["email"], body["email"]);
    assert_eq!(subscribers[0]["status"], "pending");
    assert_eq!(subscribers[0]["intention"], "rider");
}

#[tokio::test]
async fn api_and_form_logins_share_the_rate_limit() {
    // Arrange
    let app = spawn_app().await;
    let wrong = serde_json::json!({
        "username": &app.admin.username,
        "password": "wrong-password",
    });
    for _ in 0..5 {
        app.post_login(&wrong).await;
    }

    // Act
    let response = app
        .post_api_login(&serde_json::json!({
            "username": &app.admin.username,
            "password": &app.admin.password,
        }))
        .await;

    // Assert
    assert_eq!(429, response.status().as_u16());
    let json: serde_json::Value = response.json().await.unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(
        json["message"],
        "Too many login attempts. Please try again later."
    );
}
