use crate::domain::{Campaign, NewSubscriber, Subscriber, SubscriberEmail, SubscriptionToken};
use crate::email_client::EmailClient;
use crate::email_templates::{
    AdminNotification, ConfirmationEmail, EmailTemplates, RenderedEmail, UnsubscribedEmail,
    WelcomeEmail,
};
use crate::site_links::SiteLinks;
use anyhow::Context;
use chrono::{DateTime, Utc};

/// Renders and sends every email the service produces.
pub struct Mailer {
    email_client: EmailClient,
    templates: EmailTemplates,
    links: SiteLinks,
    admin_email: SubscriberEmail,
}

impl Mailer {
    pub fn new(
        email_client: EmailClient,
        templates: EmailTemplates,
        links: SiteLinks,
        admin_email: SubscriberEmail,
    ) -> Self {
        Self {
            email_client,
            templates,
            links,
            admin_email,
        }
    }

    pub fn links(&self) -> &SiteLinks {
        &self.links
    }

    #[tracing::instrument(name = "Send a confirmation email", skip_all)]
    pub async fn send_confirmation(
        &self,
        subscriber: &NewSubscriber,
        token: &SubscriptionToken,
    ) -> Result<(), anyhow::Error> {
        let confirm_url = self.links.confirm_url(token);
        let email = self.templates.render(&ConfirmationEmail {
            name: subscriber.name.as_ref(),
            intention_label: subscriber.intention.label(),
            confirm_url: &confirm_url,
            site_url: self.links.home(),
        })?;
        self.deliver(&subscriber.email, email).await
    }

    #[tracing::instrument(name = "Notify the admin about a new subscriber", skip_all)]
    pub async fn notify_admin(
        &self,
        subscriber: &NewSubscriber,
        now: DateTime<Utc>,
    ) -> Result<(), anyhow::Error> {
        let email = self.templates.render(&AdminNotification {
            name: subscriber.name.as_ref(),
            email: subscriber.email.as_ref(),
            phone: subscriber.phone.as_ref(),
            intention_label: subscriber.intention.label(),
            linkedin: subscriber.linkedin.as_ref().map(|url| url.as_ref()),
            time: now.format("%Y-%m-%d %H:%M:%S").to_string(),
        })?;
        self.deliver(&self.admin_email, email).await
    }

    #[tracing::instrument(name = "Send a welcome email", skip_all)]
    pub async fn send_welcome(&self, subscriber: &Subscriber) -> Result<(), anyhow::Error> {
        let recipient = stored_email(subscriber)?;
        let unsubscribe_url = self.links.unsubscribe_url(recipient.as_ref());
        let email = self.templates.render(&WelcomeEmail {
            name: &subscriber.name,
            site_url: self.links.home(),
            unsubscribe_url: &unsubscribe_url,
        })?;
        self.deliver(&recipient, email).await
    }

    #[tracing::instrument(name = "Send an unsubscription email", skip_all)]
    pub async fn send_unsubscribed(&self, subscriber: &Subscriber) -> Result<(), anyhow::Error> {
        let recipient = stored_email(subscriber)?;
        let email = self.templates.render(&UnsubscribedEmail {
            name: &subscriber.name,
            site_url: self.links.home(),
        })?;
        self.deliver(&recipient, email).await
    }

    /// Personalises the campaign for one subscriber and sends it.
    pub async fn send_campaign(
        &self,
        campaign: &Campaign,
        subscriber: &Subscriber,
    ) -> Result<(), anyhow::Error> {
        let recipient = stored_email(subscriber)?;
        let unsubscribe_url = self.links.unsubscribe_url(recipient.as_ref());
        let email = RenderedEmail {
            subject: campaign.subject.clone(),
            html_body: campaign.personalize(&subscriber.name, &unsubscribe_url),
            text_body: self.templates.render_campaign_text(
                &campaign.subject,
                &campaign.personalize_text(&subscriber.name, &unsubscribe_url),
                &unsubscribe_url,
            )?,
        };
        self.deliver(&recipient, email).await
    }

    async fn deliver(
        &self,
        recipient: &SubscriberEmail,
        email: RenderedEmail,
    ) -> Result<(), anyhow::Error> {
        self.email_client
            .send_email(recipient, &email.subject, &email.text_body, &email.html_body)
            .await
            .with_context(|| format!("Failed to send \"{}\" to {}", email.subject, recipient))
    }
}

// Rows were validated on the way in, a failure here means the stored value was altered.
fn stored_email(subscriber: &Subscriber) -> Result<SubscriberEmail, anyhow::Error> {
    SubscriberEmail::parse(subscriber.email.clone())
        .map_err(|e| anyhow::anyhow!(e))
        .with_context(|| format!("Subscriber {} has an invalid stored email", subscriber.id))
}
