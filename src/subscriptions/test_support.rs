use crate::domain::{
    Intention, NewSubscriber, Subscriber, SubscriberEmail, SubscriberName, SubscriberPhone,
    SubscriberStatus,
};
use crate::email_client::EmailClient;
use crate::email_templates::EmailTemplates;
use crate::mailer::Mailer;
use crate::site_links::SiteLinks;
use chrono::Utc;
use secrecy::Secret;
use std::time::Duration;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const SITE_URL: &str = "https://horizon.test";

pub fn subscriber_row(email: &str, status: SubscriberStatus) -> Subscriber {
    let now = Utc::now();
    Subscriber {
        id: Uuid::new_v4(),
        name: "Ada".into(),
        email: email.into(),
        phone: "+44 20 7946 0000".into(),
        intention: Intention::Rider,
        linkedin: None,
        status,
        created_at: now,
        updated_at: now,
        last_email_sent: None,
    }
}

pub fn new_subscriber(name: &str, email: &str) -> NewSubscriber {
    NewSubscriber {
        name: SubscriberName::parse(name.into()).unwrap(),
        email: SubscriberEmail::parse(email.into()).unwrap(),
        phone: SubscriberPhone::parse("+44 20 7946 0000".into()).unwrap(),
        intention: Intention::Rider,
        linkedin: None,
    }
}

/// Mailer talking to a mock email API.
pub fn mailer(email_server: &MockServer) -> Mailer {
    let email_client = EmailClient::api(
        email_server.uri(),
        SubscriberEmail::parse("noreply@horizon.test".into()).unwrap(),
        "Horizon HUD".into(),
        SubscriberEmail::parse("contact@horizon.test".into()).unwrap(),
        Secret::new("token".into()),
        Duration::from_millis(200),
    )
    .unwrap();
    Mailer::new(
        email_client,
        EmailTemplates::new().unwrap(),
        SiteLinks::parse(SITE_URL).unwrap(),
        SubscriberEmail::parse("admin@horizon.test".into()).unwrap(),
    )
}

pub async fn mock_email_api(email_server: &MockServer, status: u16) {
    Mock::given(path("/email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(status))
        .mount(email_server)
        .await;
}

/// Subjects of the emails received by the mock API, in order.
pub async fn sent_subjects(email_server: &MockServer) -> Vec<String> {
    email_server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|request| {
            let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
            body["Subject"].as_str().unwrap().to_string()
        })
        .collect()
}
