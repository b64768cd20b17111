use crate::helpers::{email_body, spawn_app, subscriber_body};
use horizon_signup::domain::SubscriberStatus;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn the_unsubscribe_link_only_shows_a_prompt() {
    // Arrange
    let app = spawn_app().await;
    let body = subscriber_body();
    app.create_confirmed_subscriber(&body).await;
    let email = body["email"].as_str().unwrap();

    // Act
    let response = app
        .api_client
        .get(&format!("{}/unsubscribe", app.addr))
        .query(&[("email", email)])
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(200, response.status().as_u16());
    let html = response.text().await.unwrap();
    assert!(html.contains("Confirm Unsubscribe"));
    assert!(html.contains(email));
    assert_eq!(
        app.store.subscribers().await[0].status,
        SubscriberStatus::Confirmed
    );
}

#[tokio::test]
async fn the_prompt_rejects_an_invalid_email() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let response = app
        .api_client
        .get(&format!("{}/unsubscribe?email=nope", app.addr))
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(400, response.status().as_u16());
    assert!(response.text().await.unwrap().contains("Invalid email address."));
}

#[tokio::test]
async fn submitting_the_prompt_unsubscribes_and_sends_a_goodbye() {
    // Arrange
    let app = spawn_app().await;
    let body = subscriber_body();
    app.create_confirmed_subscriber(&body).await;
    Mock::given(path("/email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.email_server)
        .await;

    // Act
    let response = app.post_unsubscribe(body["email"].as_str().unwrap()).await;

    // Assert
    assert_eq!(200, response.status().as_u16());
    assert!(response
        .text()
        .await
        .unwrap()
        .contains("You have been successfully unsubscribed from our mailing list."));
    assert_eq!(
        app.store.subscribers().await[0].status,
        SubscriberStatus::Unsubscribed
    );

    let requests = app.email_server.received_requests().await.unwrap();
    let goodbye = email_body(requests.last().unwrap());
    assert_eq!(goodbye["Subject"], "Unsubscription Confirmed - Horizon HUD");
}

#[tokio::test]
async fn unsubscribing_an_unknown_email_changes_nothing() {
    // Arrange
    let app = spawn_app().await;
    Mock::given(path("/email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.email_server)
        .await;

    // Act
    let response = app.post_unsubscribe("nobody@example.com").await;

    // Assert
    assert_eq!(404, response.status().as_u16());
    assert!(response
        .text()
        .await
        .unwrap()
        .contains("This email is not currently subscribed to our mailing list."));
}

#[tokio::test]
async fn unsubscribing_twice_reports_not_subscribed() {
    // Arrange
    let app = spawn_app().await;
    let body = subscriber_body();
    app.create_confirmed_subscriber(&body).await;
    Mock::given(path("/email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&app.email_server)
        .await;
    let email = body["email"].as_str().unwrap();
    app.post_unsubscribe(email).await.error_for_status().unwrap();

    // Act
    let response = app.post_unsubscribe(email).await;

    // Assert
    assert_eq!(404, response.status().as_u16());
}
