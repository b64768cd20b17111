use crate::configuration::{EmailClientSettings, EmailTransportKind};
use crate::domain::SubscriberEmail;
use crate::utils::error_chain_fmt;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::{ExposeSecret, Secret};
use std::time::Duration;

#[derive(thiserror::Error)]
pub enum EmailError {
    #[error("Email API request failed")]
    Api(#[from] reqwest::Error),
    #[error("Invalid email address")]
    Address(#[from] lettre::address::AddressError),
    #[error("Failed to build the email message")]
    Message(#[from] lettre::error::Error),
    #[error("SMTP delivery failed")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

impl std::fmt::Debug for EmailError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

enum Transport {
    Api {
        http_client: reqwest::Client,
        base_url: reqwest::Url,
        auth_token: Secret<String>,
    },
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
}

/// Sends transactional and campaign emails with a fixed From and Reply-To.
pub struct EmailClient {
    sender: SubscriberEmail,
    sender_name: String,
    reply_to: SubscriberEmail,
    transport: Transport,
}

impl EmailClient {
    pub fn api(
        base_url: String,
        sender: SubscriberEmail,
        sender_name: String,
        reply_to: SubscriberEmail,
        auth_token: Secret<String>,
        timeout: Duration,
    ) -> Result<Self, anyhow::Error> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            sender,
            sender_name,
            reply_to,
            transport: Transport::Api {
                http_client,
                base_url: reqwest::Url::parse(&base_url)?,
                auth_token,
            },
        })
    }

    pub fn smtp(
        host: &str,
        port: u16,
        credentials: Option<(String, Secret<String>)>,
        sender: SubscriberEmail,
        sender_name: String,
        reply_to: SubscriberEmail,
        timeout: Duration,
    ) -> Self {
        // Plain connection, meant for a relay on the same host or private network
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
            .port(port)
            .timeout(Some(timeout));
        if let Some((username, password)) = credentials {
            builder = builder.credentials(Credentials::new(
                username,
                password.expose_secret().to_string(),
            ));
        }
        Self {
            sender,
            sender_name,
            reply_to,
            transport: Transport::Smtp(builder.build()),
        }
    }

    pub fn from_settings(settings: &EmailClientSettings) -> Result<Self, anyhow::Error> {
        let sender = SubscriberEmail::parse(settings.sender_email.clone())
            .map_err(|e| anyhow::anyhow!("Invalid sender email: {}", e))?;
        let reply_to = SubscriberEmail::parse(settings.reply_to.clone())
            .map_err(|e| anyhow::anyhow!("Invalid reply-to email: {}", e))?;
        match settings.transport {
            EmailTransportKind::Api => Self::api(
                settings.api_base_url.clone(),
                sender,
                settings.sender_name.clone(),
                reply_to,
                settings.api_auth_token.clone(),
                settings.timeout(),
            ),
            EmailTransportKind::Smtp => {
                let credentials = settings
                    .smtp_username
                    .clone()
                    .zip(settings.smtp_password.clone());
                Ok(Self::smtp(
                    &settings.smtp_host,
                    settings.smtp_port,
                    credentials,
                    sender,
                    settings.sender_name.clone(),
                    reply_to,
                    settings.timeout(),
                ))
            }
        }
    }

    fn from_header(&self) -> String {
        format!("{} <{}>", self.sender_name, self.sender)
    }

    #[tracing::instrument(
        name = "Send an email",
        skip(self, text_body, html_body),
        fields(recipient = %recipient)
    )]
    pub async fn send_email(
        &self,
        recipient: &SubscriberEmail,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        match &self.transport {
            Transport::Api {
                http_client,
                base_url,
                auth_token,
            } => {
                let url = base_url
                    .join("email")
                    .expect("`email` is a valid relative url");
                let from = self.from_header();
                let request_body = SendEmailRequest {
                    from: &from,
                    to: recipient.as_ref(),
                    reply_to: self.reply_to.as_ref(),
                    subject,
                    text_body,
                    html_body,
                };
                http_client
                    .post(url)
                    .header("X-Postmark-Server-Token", auth_token.expose_secret())
                    .json(&request_body)
                    .send()
                    .await?
                    .error_for_status()?;
            }
            Transport::Smtp(transport) => {
                let from = Mailbox::new(
                    Some(self.sender_name.clone()),
                    self.sender.as_ref().parse()?,
                );
                let message = Message::builder()
                    .from(from)
                    .reply_to(Mailbox::new(None, self.reply_to.as_ref().parse()?))
                    .to(Mailbox::new(None, recipient.as_ref().parse()?))
                    .subject(subject)
                    .multipart(MultiPart::alternative_plain_html(
                        text_body.to_string(),
                        html_body.to_string(),
                    ))?;
                transport.send(message).await?;
            }
        }
        Ok(())
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "PascalCase")]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    reply_to: &'a str,
    subject: &'a str,
    text_body: &'a str,
    html_body: &'a str,
}
