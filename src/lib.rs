pub mod authentication;
pub mod campaign_delivery;
pub mod configuration;
pub mod domain;
pub mod email_client;
pub mod email_templates;
pub mod mailer;
pub mod routes;
pub mod site_links;
pub mod startup;
pub mod storage;
pub mod subscriptions;
pub mod telemetry;
pub mod utils;
