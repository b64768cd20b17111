use crate::helpers::{assert_redirects_to, spawn_app};
use uuid::Uuid;

#[tokio::test]
async fn failed_login_redirects_back_with_an_error() {
    // Arrange
    let app = spawn_app().await;
    let login_form = serde_json::json!({
        "username": Uuid::new_v4().to_string(),
        "password": Uuid::new_v4().to_string(),
    });

    // Act 1
    let response = app.post_login(&login_form).await;

    // Assert
    assert_redirects_to(&response, "/login");

    // Act 2
    let html = app.get_login_html().await;
    assert!(html.contains("<p><i>Invalid Username or Password</i></p>"));

    // Act 3 - the flash message is gone after a reload
    let html = app.get_login_html().await;
    assert!(!html.contains("Invalid Username or Password"));
}

#[tokio::test]
async fn successful_login_redirects_to_the_campaigns_page() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let response = app.login_as_admin().await;

    // Assert
    assert_redirects_to(&response, "/admin/campaigns");
    let html = app.get_campaigns_html().await;
    assert!(html.contains(&format!("Logged in as {}", app.admin.username)));
}

#[tokio::test]
async fn anonymous_users_are_sent_to_the_login_page() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let response = app.get_campaigns().await;

    // Assert
    assert_redirects_to(&response, "/login");
}

#[tokio::test]
async fn logout_clears_the_session() {
    // Arrange
    let app = spawn_app().await;
    app.login_as_admin().await;

    // Act 1
    let response = app.post_logout().await;
    assert_redirects_to(&response, "/login");

    // Act 2
    let html = app.get_login_html().await;
    assert!(html.contains("<p><i>You have been logged out</i></p>"));

    // Act 3
    let response = app.get_campaigns().await;
    assert_redirects_to(&response, "/login");
}

#[tokio::test]
async fn five_failures_lock_out_even_the_right_password() {
    // Arrange
    let app = spawn_app().await;
    let wrong = serde_json::json!({
        "username": &app.admin.username,
        "password": "definitely-not-the-password",
    });
    for _ in 0..5 {
        assert_redirects_to(&app.post_login(&wrong).await, "/login");
    }

    // Act
    let response = app.login_as_admin().await;

    // Assert
    assert_eq!(429, response.status().as_u16());
    assert_eq!(
        response.text().await.unwrap(),
        "Too many login attempts. Please try again later."
    );
}

#[tokio::test]
async fn successful_logins_are_not_counted() {
    // Arrange
    let app = spawn_app().await;
    for _ in 0..6 {
        assert_redirects_to(&app.login_as_admin().await, "/admin/campaigns");
    }

    // Act
    let response = app.login_as_admin().await;

    // Assert
    assert_redirects_to(&response, "/admin/campaigns");
}
