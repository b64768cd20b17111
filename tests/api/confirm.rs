use crate::helpers::{spawn_app, subscriber_body};
use horizon_signup::domain::SubscriberStatus;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn confirmation_without_token_is_rejected_with_400() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let response = app.get_confirm("").await;

    // Assert
    assert_eq!(400, response.status().as_u16());
    assert!(response.text().await.unwrap().contains("Confirmation Failed"));
}

#[tokio::test]
async fn unknown_token_is_rejected_with_401() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let response = app.get_confirm("?token=not-a-real-token").await;

    // Assert
    assert_eq!(401, response.status().as_u16());
    assert!(response
        .text()
        .await
        .unwrap()
        .contains("This confirmation link has expired or already been used."));
}

#[tokio::test]
async fn the_emailed_link_confirms_the_subscriber() {
    // Arrange
    let app = spawn_app().await;
    let body = subscriber_body();
    let link = app.create_unconfirmed_subscriber(&body).await;
    Mock::given(path("/email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.email_server)
        .await;

    // Act
    let response = app.follow_link(&link).await;

    // Assert
    assert_eq!(200, response.status().as_u16());
    let html = response.text().await.unwrap();
    assert!(html.contains("Subscription Confirmed!"));
    assert!(html.contains("Thank you! Your subscription has been confirmed."));

    let subscribers = app.store.subscribers().await;
    assert_eq!(subscribers[0].status, SubscriberStatus::Confirmed);
    assert!(app.store.tokens().await.iter().all(|t| t.used));
}

#[tokio::test]
async fn a_confirmation_link_works_only_once() {
    // Arrange
    let app = spawn_app().await;
    let body = subscriber_body();
    let link = app.create_unconfirmed_subscriber(&body).await;
    Mock::given(path("/email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .named("Welcome email")
        .expect(1)
        .mount(&app.email_server)
        .await;
    app.follow_link(&link).await.error_for_status().unwrap();

    // Act
    let response = app.follow_link(&link).await;

    // Assert
    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn an_old_link_does_not_resubscribe_after_unsubscribing() {
    // Arrange
    let app = spawn_app().await;
    let body = subscriber_body();
    let link = app.create_unconfirmed_subscriber(&body).await;
    Mock::given(path("/email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .named("Unsubscription email only")
        .expect(1)
        .mount(&app.email_server)
        .await;
    app.post_unsubscribe(body["email"].as_str().unwrap())
        .await
        .error_for_status()
        .unwrap();

    // Act
    let response = app.follow_link(&link).await;

    // Assert
    assert_eq!(401, response.status().as_u16());
    let subscribers = app.store.subscribers().await;
    assert_eq!(subscribers[0].status, SubscriberStatus::Unsubscribed);
    assert!(app.store.tokens().await.iter().all(|t| !t.used));
}
