//! Transactional email bodies rendered from typed contexts.
//!
//! Templates are compiled into the binary. `.html` templates are autoescaped by tera, so
//! subscriber-provided values can be passed through the contexts as-is.
use serde::Serialize;
use tera::{Context, Tera};

const TEMPLATES: &[(&str, &str)] = &[
    ("layout.html", include_str!("../templates/emails/layout.html")),
    ("confirmation.html", include_str!("../templates/emails/confirmation.html")),
    ("confirmation.txt", include_str!("../templates/emails/confirmation.txt")),
    ("welcome.html", include_str!("../templates/emails/welcome.html")),
    ("welcome.txt", include_str!("../templates/emails/welcome.txt")),
    ("unsubscribed.html", include_str!("../templates/emails/unsubscribed.html")),
    ("unsubscribed.txt", include_str!("../templates/emails/unsubscribed.txt")),
    (
        "admin_notification.html",
        include_str!("../templates/emails/admin_notification.html"),
    ),
    (
        "admin_notification.txt",
        include_str!("../templates/emails/admin_notification.txt"),
    ),
    ("campaign.txt", include_str!("../templates/emails/campaign.txt")),
];

/// A context that knows which template pair renders it and the subject line to use.
pub trait EmailTemplate: Serialize {
    /// Template name without extension. `<name>.html` and `<name>.txt` must both exist.
    const NAME: &'static str;

    fn subject(&self) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

pub struct EmailTemplates {
    tera: Tera,
}

impl EmailTemplates {
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES.to_vec())?;
        Ok(Self { tera })
    }

    pub fn render<T: EmailTemplate>(&self, email: &T) -> Result<RenderedEmail, tera::Error> {
        let context = Context::from_serialize(email)?;
        Ok(RenderedEmail {
            subject: email.subject(),
            html_body: self.tera.render(&format!("{}.html", T::NAME), &context)?,
            text_body: self.tera.render(&format!("{}.txt", T::NAME), &context)?,
        })
    }

    /// Text alternative for a campaign. `body` is the personalised content without markup.
    pub fn render_campaign_text(
        &self,
        subject: &str,
        body: &str,
        unsubscribe_url: &str,
    ) -> Result<String, tera::Error> {
        let mut context = Context::new();
        context.insert("subject", subject);
        context.insert("body", body);
        context.insert("unsubscribe_url", unsubscribe_url);
        self.tera.render("campaign.txt", &context)
    }
}

#[derive(Debug, Serialize)]
pub struct ConfirmationEmail<'a> {
    pub name: &'a str,
    pub intention_label: &'a str,
    pub confirm_url: &'a str,
    pub site_url: &'a str,
}

impl EmailTemplate for ConfirmationEmail<'_> {
    const NAME: &'static str = "confirmation";

    fn subject(&self) -> String {
        "Confirm Your Subscription to Horizon HUD Updates".into()
    }
}

#[derive(Debug, Serialize)]
pub struct WelcomeEmail<'a> {
    pub name: &'a str,
    pub site_url: &'a str,
    pub unsubscribe_url: &'a str,
}

impl EmailTemplate for WelcomeEmail<'_> {
    const NAME: &'static str = "welcome";

    fn subject(&self) -> String {
        "Welcome to the Horizon HUD Community!".into()
    }
}

#[derive(Debug, Serialize)]
pub struct UnsubscribedEmail<'a> {
    pub name: &'a str,
    pub site_url: &'a str,
}

impl EmailTemplate for UnsubscribedEmail<'_> {
    const NAME: &'static str = "unsubscribed";

    fn subject(&self) -> String {
        "Unsubscription Confirmed - Horizon HUD".into()
    }
}

/// Sent to the site owner for every new subscription.
#[derive(Debug, Serialize)]
pub struct AdminNotification<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub intention_label: &'a str,
    pub linkedin: Option<&'a str>,
    pub time: String,
}

impl EmailTemplate for AdminNotification<'_> {
    const NAME: &'static str = "admin_notification";

    fn subject(&self) -> String {
        format!("New Subscriber: {}", self.intention_label)
    }
}
