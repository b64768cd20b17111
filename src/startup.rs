use crate::authentication::{reject_anonymous_users, LoginRateLimiter, TokenSigner};
use crate::configuration::{DatabaseSettings, Settings, StorageBackend};
use crate::domain::SubscriberEmail;
use crate::email_client::EmailClient;
use crate::email_templates::EmailTemplates;
use crate::mailer::Mailer;
use crate::routes::{
    api_login, campaigns_page, confirm, create_campaign, health_check, list_subscribers, login,
    login_form, logout, subscribe, subscribe_json_error, unsubscribe, unsubscribe_prompt,
    verify_token,
};
use crate::site_links::SiteLinks;
use crate::storage::{InMemoryStore, PostgresStore, Store};
use actix_session::storage::CookieSessionStore;
use actix_session::SessionMiddleware;
use actix_web::cookie::Key;
use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use actix_web_flash_messages::storage::CookieMessageStore;
use actix_web_flash_messages::FlashMessagesFramework;
use actix_web_lab::middleware::from_fn;
use anyhow::Context;
use secrecy::ExposeSecret;
use std::net::TcpListener;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;

pub struct Application {
    port: u16,
    server: Server,
    mailer: Arc<Mailer>,
}

impl Application {
    pub async fn build(settings: Settings, store: Arc<dyn Store>) -> Result<Self, anyhow::Error> {
        let listener = TcpListener::bind(settings.application.get_url())
            .with_context(|| format!("Failed to bind {}", settings.application.get_url()))?;
        let port = listener.local_addr()?.port();
        let mailer = Arc::new(build_mailer(&settings)?);
        let server = run(listener, store, mailer.clone(), settings)?;

        Ok(Self {
            port,
            server,
            mailer,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Shared with the campaign worker so both send through the same client.
    pub fn mailer(&self) -> Arc<Mailer> {
        self.mailer.clone()
    }

    pub async fn run_until_terminated(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn build_mailer(settings: &Settings) -> Result<Mailer, anyhow::Error> {
    let email_client = EmailClient::from_settings(&settings.email_client)?;
    let templates = EmailTemplates::new().context("Failed to compile the email templates")?;
    let links = SiteLinks::parse(&settings.application.base_url)?;
    let admin_email = SubscriberEmail::parse(settings.email_client.admin_email.clone())
        .map_err(|e| anyhow::anyhow!("Invalid admin email: {}", e))?;
    Ok(Mailer::new(email_client, templates, links, admin_email))
}

/// Opens the configured store. Postgres is migrated before it is handed out.
pub async fn build_store(settings: &DatabaseSettings) -> Result<Arc<dyn Store>, anyhow::Error> {
    match settings.backend {
        StorageBackend::Postgres => {
            let store = PostgresStore::connect_lazy(settings);
            store
                .migrate()
                .await
                .context("Failed to migrate the database")?;
            Ok(Arc::new(store))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using the in-memory store, data is lost on restart");
            Ok(Arc::new(InMemoryStore::new()))
        }
    }
}

fn run(
    listener: TcpListener,
    store: Arc<dyn Store>,
    mailer: Arc<Mailer>,
    settings: Settings,
) -> Result<Server, anyhow::Error> {
    let ttl = chrono::Duration::seconds(settings.admin.token_ttl_seconds as i64);
    let signer = web::Data::new(TokenSigner::new(settings.admin.jwt_secret.clone(), ttl));
    let limiter = web::Data::new(LoginRateLimiter::from_settings(&settings.rate_limit)?);
    let admin = web::Data::new(settings.admin);
    let store: web::Data<dyn Store> = web::Data::from(store);
    let mailer = web::Data::from(mailer);

    let secret_key = Key::from(settings.application.hmac_secret.expose_secret().as_bytes());
    let message_store = CookieMessageStore::builder(secret_key.clone()).build();
    let message_framework = FlashMessagesFramework::builder(message_store).build();

    let server = HttpServer::new(move || {
        App::new()
            .wrap(message_framework.clone())
            .wrap(SessionMiddleware::new(
                CookieSessionStore::default(),
                secret_key.clone(),
            ))
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .service(
                web::resource("/subscriptions")
                    .app_data(web::JsonConfig::default().error_handler(subscribe_json_error))
                    .route(web::post().to(subscribe)),
            )
            .route("/subscriptions/confirm", web::get().to(confirm))
            .route("/unsubscribe", web::get().to(unsubscribe_prompt))
            .route("/unsubscribe", web::post().to(unsubscribe))
            .route("/login", web::get().to(login_form))
            .route("/login", web::post().to(login))
            .service(
                web::scope("/admin")
                    .wrap(from_fn(reject_anonymous_users))
                    .route("/campaigns", web::get().to(campaigns_page))
                    .route("/campaigns", web::post().to(create_campaign))
                    .route("/logout", web::post().to(logout)),
            )
            .service(
                web::scope("/api")
                    .route("/login", web::post().to(api_login))
                    .route("/verify", web::get().to(verify_token))
                    .route("/subscribers", web::get().to(list_subscribers)),
            )
            .app_data(store.clone())
            .app_data(mailer.clone())
            .app_data(admin.clone())
            .app_data(limiter.clone())
            .app_data(signer.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
