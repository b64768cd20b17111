use crate::helpers::{assert_redirects_to, spawn_app};
use chrono::{TimeZone, Utc};
use horizon_signup::domain::CampaignStatus;

fn campaign_form(name: &str, date: &str, time: &str) -> serde_json::Value {
    serde_json::json!({
        "campaign_name": name,
        "campaign_subject": "Horizon HUD is shipping",
        "campaign_content": "<p>Hi {{name}}</p><a href=\"{{unsubscribe_url}}\">Unsubscribe</a>",
        "scheduled_date": date,
        "scheduled_time": time,
    })
}

#[tokio::test]
async fn creating_a_campaign_requires_login() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let response = app.post_campaign(&campaign_form("Launch", "", "")).await;

    // Assert
    assert_redirects_to(&response, "/login");
    assert!(app.store.campaigns().await.is_empty());
}

#[tokio::test]
async fn a_campaign_without_schedule_is_saved_as_draft() {
    // Arrange
    let app = spawn_app().await;
    app.login_as_admin().await;

    // Act
    let response = app.post_campaign(&campaign_form("Launch", "", "")).await;

    // Assert
    assert_redirects_to(&response, "/admin/campaigns");
    let html = app.get_campaigns_html().await;
    assert!(html.contains("<p><i>Campaign created successfully!</i></p>"));
    assert!(html.contains("<td>Launch</td>"));

    let campaigns = app.store.campaigns().await;
    assert_eq!(campaigns.len(), 1);
    assert_eq!(campaigns[0].status, CampaignStatus::Draft);
    assert_eq!(campaigns[0].scheduled_for, None);
}

#[tokio::test]
async fn a_scheduled_campaign_is_stored_in_utc() {
    // Arrange
    let app = spawn_app().await;
    app.login_as_admin().await;

    // Act
    app.post_campaign(&campaign_form("Launch", "2030-05-01", "09:30"))
        .await;

    // Assert
    let campaigns = app.store.campaigns().await;
    assert_eq!(campaigns[0].status, CampaignStatus::Scheduled);
    assert_eq!(
        campaigns[0].scheduled_for,
        Some(Utc.with_ymd_and_hms(2030, 5, 1, 9, 30, 0).unwrap())
    );
}

#[tokio::test]
async fn invalid_campaigns_are_flashed_back_and_not_saved() {
    // Arrange
    let app = spawn_app().await;
    app.login_as_admin().await;

    // Act
    let response = app.post_campaign(&campaign_form("", "", "")).await;

    // Assert
    assert_redirects_to(&response, "/admin/campaigns");
    let html = app.get_campaigns_html().await;
    assert!(html.contains("<p><i>Campaign name is required</i></p>"));
    assert!(app.store.campaigns().await.is_empty());
}

#[tokio::test]
async fn campaign_names_are_escaped_in_the_listing() {
    // Arrange
    let app = spawn_app().await;
    app.login_as_admin().await;

    // Act
    app.post_campaign(&campaign_form("<b>Launch</b>", "", "")).await;

    // Assert
    let html = app.get_campaigns_html().await;
    assert!(html.contains("&lt;b&gt;Launch&lt;/b&gt;"));
    assert!(!html.contains("<b>Launch</b>"));
}
