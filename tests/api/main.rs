mod admin_campaigns;
mod api_auth;
mod confirm;
mod health_check;
mod helpers;
mod login;
mod subscriptions;
mod unsubscribe;
