use actix_session::{Session, SessionExt, SessionGetError, SessionInsertError};
use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use std::future::{ready, Ready};

/// Typed view over the cookie session of the admin area.
pub struct AdminSession(Session);

impl AdminSession {
    const ADMIN_KEY: &'static str = "admin_username";

    pub fn new(session: Session) -> Self {
        Self(session)
    }

    pub fn renew(&self) {
        self.0.renew();
    }

    pub fn insert_admin(&self, username: &str) -> Result<(), SessionInsertError> {
        self.0.insert(Self::ADMIN_KEY, username)
    }

    pub fn get_admin(&self) -> Result<Option<String>, SessionGetError> {
        self.0.get(Self::ADMIN_KEY)
    }

    pub fn logout(&self) {
        self.0.purge();
    }
}

impl FromRequest for AdminSession {
    type Error = <Session as FromRequest>::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(AdminSession::new(req.get_session())))
    }
}
