use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::HttpResponse;

/// Standalone branded page shown after following a link from an email.
/// `body_html` is inserted as-is, callers escape anything user-provided.
pub fn branded_page(status: StatusCode, title: &str, heading: &str, body_html: &str, site_url: &str) -> HttpResponse {
    let site_url = htmlescape::encode_minimal(site_url);
    HttpResponse::build(status)
        .content_type(ContentType::html())
        .body(format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - Horizon HUD</title>
    <style>
        body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #f0f0f0; background: linear-gradient(to bottom, #000, #1a1a1a);
               min-height: 100vh; margin: 0; display: flex; flex-direction: column; align-items: center; justify-content: center; }}
        .container {{ max-width: 600px; padding: 40px 20px; text-align: center; }}
        .logo {{ max-width: 200px; margin-bottom: 30px; }}
        .message-box {{ background-color: rgba(30, 30, 30, 0.8); border-radius: 10px; padding: 30px; }}
        .btn {{ display: inline-block; background-color: #0066cc; color: white; padding: 12px 24px; border: none;
               border-radius: 4px; text-decoration: none; font-weight: bold; margin-top: 20px; cursor: pointer; }}
    </style>
</head>
<body>
<div class="container">
    <img src="{site_url}/horizon-logo.png" alt="Horizon Logo" class="logo">
    <div class="message-box">
        <h1>{heading}</h1>
        {body_html}
        <a href="{site_url}" class="btn">Back to Homepage</a>
    </div>
</div>
</body>
</html>"#
        ))
}

pub fn message_page(status: StatusCode, title: &str, heading: &str, message: &str, site_url: &str) -> HttpResponse {
    let body_html = format!("<p>{}</p>", htmlescape::encode_minimal(message));
    branded_page(status, title, heading, &body_html, site_url)
}
