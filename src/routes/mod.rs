mod admin;
mod api;
mod health_check;
mod login;
mod pages;
mod subscriptions;

pub use admin::*;
pub use api::*;
pub use health_check::*;
pub use login::*;
pub use subscriptions::*;
