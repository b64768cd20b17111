use crate::helpers::{email_body, spawn_app, subscriber_body};
use horizon_signup::domain::SubscriberStatus;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn subscribe_returns_200_and_stores_a_pending_subscriber() {
    // Arrange
    let app = spawn_app().await;
    let body = subscriber_body();
    Mock::given(path("/email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&app.email_server)
        .await;

    // Act
    let response = app.post_subscriptions(&body).await;

    // Assert
    assert_eq!(200, response.status().as_u16());
    let json: serde_json::Value = response.json().await.unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(
        json["message"],
        "Thank you for subscribing! Please check your email to confirm your subscription."
    );

    let subscribers = app.store.subscribers().await;
    assert_eq!(subscribers.len(), 1);
    assert_eq!(subscribers[0].email, body["email"].as_str().unwrap());
    assert_eq!(subscribers[0].status, SubscriberStatus::Pending);
    assert_eq!(app.store.tokens().await.len(), 1);
}

#[tokio::test]
async fn subscribe_sends_a_confirmation_and_notifies_the_admin() {
    // Arrange
    let app = spawn_app().await;
    let body = subscriber_body();
    Mock::given(path("/email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&app.email_server)
        .await;

    // Act
    app.post_subscriptions(&body).await;

    // Assert
    let requests = app.email_server.received_requests().await.unwrap();
    let subjects: Vec<_> = requests
        .iter()
        .map(|r| email_body(r)["Subject"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        subjects,
        vec![
            "Confirm Your Subscription to Horizon HUD Updates".to_string(),
            "New Subscriber: Rider".to_string(),
        ]
    );
}

#[tokio::test]
async fn subscribe_returns_400_for_invalid_data() {
    // Arrange
    let app = spawn_app().await;
    let test_cases = vec![
        (
            serde_json::json!({"email": "ada@example.com", "phone": "+44 1", "intention": "rider"}),
            "All fields are required",
        ),
        (
            serde_json::json!({"name": "Ada", "email": "not-an-email", "phone": "+44 1", "intention": "rider"}),
            "Please enter a valid email address",
        ),
        (
            serde_json::json!({"name": "Ada", "email": "ada@example.com", "phone": "+44 1", "intention": "investor", "linkedin": "my linkedin"}),
            "Please provide a valid LinkedIn profile URL",
        ),
        (
            serde_json::json!({"name": "Ada", "email": "ada@example.com", "phone": "+44 1", "intention": "investor"}),
            "Please provide a valid LinkedIn profile URL",
        ),
    ];

    for (body, message) in test_cases {
        // Act
        let response = app.post_subscriptions(&body).await;

        // Assert
        assert_eq!(400, response.status().as_u16(), "Payload: {}", body);
        let json: serde_json::Value = response.json().await.unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], message);
    }
    assert!(app.store.subscribers().await.is_empty());
}

#[tokio::test]
async fn malformed_json_is_reported_as_missing_fields() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let response = app.post_raw_subscriptions("{ this is not json").await;

    // Assert
    assert_eq!(400, response.status().as_u16());
    let json: serde_json::Value = response.json().await.unwrap();
    assert_eq!(json["message"], "All fields are required");
}

#[tokio::test]
async fn investors_are_stored_with_their_linkedin_profile() {
    // Arrange
    let app = spawn_app().await;
    let mut body = subscriber_body();
    body["intention"] = "investor".into();
    body["linkedin"] = "https://www.linkedin.com/in/ada".into();
    Mock::given(path("/email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&app.email_server)
        .await;

    // Act
    let response = app.post_subscriptions(&body).await;

    // Assert
    assert_eq!(200, response.status().as_u16());
    let subscribers = app.store.subscribers().await;
    assert_eq!(
        subscribers[0].linkedin.as_deref(),
        Some("https://www.linkedin.com/in/ada")
    );
}

#[tokio::test]
async fn free_form_fields_are_stored_as_given() {
    // Arrange
    let app = spawn_app().await;
    let mut body = subscriber_body();
    body["name"] = "Jean-Luc (JL)".into();
    body["phone"] = "ext. 12 / office".into();
    body["linkedin"] = "my linkedin".into();
    Mock::given(path("/email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&app.email_server)
        .await;

    // Act
    let response = app.post_subscriptions(&body).await;

    // Assert
    assert_eq!(200, response.status().as_u16());
    let subscribers = app.store.subscribers().await;
    assert_eq!(subscribers[0].name, "Jean-Luc (JL)");
    assert_eq!(subscribers[0].phone, "ext. 12 / office");
    assert_eq!(subscribers[0].linkedin.as_deref(), Some("my linkedin"));
}

#[tokio::test]
async fn subscribing_twice_returns_409() {
    // Arrange
    let app = spawn_app().await;
    let body = subscriber_body();
    app.create_unconfirmed_subscriber(&body).await;

    // Act
    let response = app.post_subscriptions(&body).await;

    // Assert
    assert_eq!(409, response.status().as_u16());
    let json: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        json["message"],
        "This email is already subscribed. Please check your inbox for previous communications."
    );
    assert_eq!(app.store.subscribers().await.len(), 1);
}

#[tokio::test]
async fn a_failing_email_api_does_not_fail_the_subscription() {
    // Arrange
    let app = spawn_app().await;
    Mock::given(path("/email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&app.email_server)
        .await;

    // Act
    let response = app.post_subscriptions(&subscriber_body()).await;

    // Assert
    assert_eq!(200, response.status().as_u16());
    assert_eq!(app.store.subscribers().await.len(), 1);
}

#[tokio::test]
async fn subscribe_returns_500_when_storage_is_down() {
    // Arrange
    let app = spawn_app().await;
    app.store.simulate_outage_on_begin(1);

    // Act
    let response = app.post_subscriptions(&subscriber_body()).await;

    // Assert
    assert_eq!(500, response.status().as_u16());
    let json: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        json["message"],
        "We encountered a technical issue. Please try again later."
    );
}

#[tokio::test]
async fn an_unsubscribed_email_can_subscribe_again() {
    // Arrange
    let app = spawn_app().await;
    let body = subscriber_body();
    app.create_confirmed_subscriber(&body).await;
    Mock::given(path("/email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&app.email_server)
        .await;
    app.post_unsubscribe(body["email"].as_str().unwrap()).await;

    // Act
    let response = app.post_subscriptions(&body).await;

    // Assert
    assert_eq!(200, response.status().as_u16());
    let subscribers = app.store.subscribers().await;
    assert_eq!(subscribers.len(), 1);
    assert_eq!(subscribers[0].status, SubscriberStatus::Pending);
}
