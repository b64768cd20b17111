use crate::authentication::AdminSession;
use crate::utils::{e500, see_other};
use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::error::InternalError;
use actix_web::{FromRequest, HttpMessage};
use actix_web_lab::middleware::Next;
use std::fmt::Display;
use std::ops::Deref;

/// Username of the logged in admin, available to handlers behind [`reject_anonymous_users`].
#[derive(Clone, Debug)]
pub struct AdminUser(String);

impl Display for AdminUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl Deref for AdminUser {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

pub async fn reject_anonymous_users(
    mut req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    let session = {
        let (http_req, payload) = req.parts_mut();
        AdminSession::from_request(http_req, payload).await?
    };

    match session.get_admin().map_err(e500)? {
        Some(username) => {
            req.extensions_mut().insert(AdminUser(username));
            Ok(next.call(req).await?)
        }
        None => {
            let response = see_other("/login");
            let error = anyhow::anyhow!("Login required");
            Err(InternalError::from_response(error, response).into())
        }
    }
}
