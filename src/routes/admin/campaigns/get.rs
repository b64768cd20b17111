use crate::authentication::AdminUser;
use crate::domain::Campaign;
use crate::storage::Store;
use crate::utils::e500;
use actix_web::http::header::ContentType;
use actix_web::{web, HttpResponse};
use actix_web_flash_messages::IncomingFlashMessages;
use std::fmt::Write;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

pub async fn campaigns_page(
    messages: IncomingFlashMessages,
    store: web::Data<dyn Store>,
    admin: web::ReqData<AdminUser>,
) -> Result<HttpResponse, actix_web::Error> {
    let mut uow = store.begin().await.map_err(e500)?;
    let campaigns = uow.list_campaigns().await.map_err(e500)?;

    let mut flash_msg = String::new();
    for msg in messages.iter() {
        let _ = writeln!(
            flash_msg,
            "<p><i>{}</i></p>",
            htmlescape::encode_minimal(msg.content())
        );
    }
    let username = htmlescape::encode_minimal(&admin);
    let rows = campaign_rows(&campaigns);

    Ok(HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta http-equiv="content-type" content="text/html; charset=utf-8">
    <title>Email Campaigns - Horizon HUD</title>
</head>
<body>
<p>Logged in as {username}</p>
<form action="/admin/logout" method="POST">
    <button type="submit">Logout</button>
</form>
{flash_msg}
<h2>New campaign</h2>
<form action="/admin/campaigns" method="POST">
    <label>Name
        <input type="text" name="campaign_name">
    </label>
    <label>Subject
        <input type="text" name="campaign_subject">
    </label>
    <label>Content (HTML, supports {{{{name}}}} and {{{{unsubscribe_url}}}})
        <textarea name="campaign_content" rows="12" cols="80"></textarea>
    </label>
    <label>Send on (UTC)
        <input type="date" name="scheduled_date">
        <input type="time" name="scheduled_time">
    </label>
    <button type="submit">Save campaign</button>
</form>
<h2>Campaigns</h2>
<table>
    <tr><th>Name</th><th>Subject</th><th>Status</th><th>Scheduled for</th><th>Sent</th><th>Created</th></tr>
{rows}</table>
</body>
</html>"#
        )))
}

fn campaign_rows(campaigns: &[Campaign]) -> String {
    let mut rows = String::new();
    for campaign in campaigns {
        let display = |at: Option<chrono::DateTime<chrono::Utc>>| {
            at.map(|at| at.format(DATE_FORMAT).to_string())
                .unwrap_or_else(|| "-".into())
        };
        let _ = writeln!(
            rows,
            "    <tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            htmlescape::encode_minimal(&campaign.name),
            htmlescape::encode_minimal(&campaign.subject),
            campaign.status.as_ref(),
            display(campaign.scheduled_for),
            display(campaign.sent_date),
            campaign.created_at.format(DATE_FORMAT),
        );
    }
    rows
}
