use crate::authentication::{AdminSession, AdminUser};
use crate::utils::see_other;
use actix_web::{web, HttpResponse};
use actix_web_flash_messages::FlashMessage;

#[tracing::instrument(name = "Log out an admin", skip_all, fields(username = %*admin))]
pub async fn logout(session: AdminSession, admin: web::ReqData<AdminUser>) -> HttpResponse {
    session.logout();
    FlashMessage::info("You have been logged out").send();
    see_other("/login")
}
