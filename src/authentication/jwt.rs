//! HS256 bearer tokens for the JSON admin API.
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, Secret};
use sha2::Sha256;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AdminClaims {
    pub admin: bool,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct JwtHeader {
    alg: String,
    typ: String,
}

#[derive(thiserror::Error, Debug)]
pub enum TokenError {
    #[error("Malformed token")]
    Malformed,
    #[error("Invalid token signature")]
    BadSignature,
    #[error("Token has expired")]
    Expired,
    #[error("Token does not grant admin access")]
    NotAdmin,
    #[error("Failed to encode token")]
    Encoding(#[from] serde_json::Error),
}

pub struct TokenSigner {
    secret: Secret<String>,
    ttl: Duration,
}

impl TokenSigner {
    pub fn new(secret: Secret<String>, ttl: Duration) -> Self {
        Self { secret, ttl }
    }

    /// Admin token valid from `now` for the configured lifetime.
    pub fn sign(&self, now: DateTime<Utc>) -> Result<String, TokenError> {
        self.sign_claims(&AdminClaims {
            admin: true,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        })
    }

    pub fn sign_claims(&self, claims: &AdminClaims) -> Result<String, TokenError> {
        let header = JwtHeader {
            alg: "HS256".into(),
            typ: "JWT".into(),
        };
        let header_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?);
        let claims_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?);
        let signing_input = format!("{}.{}", header_b64, claims_b64);

        let signature = self.mac(&signing_input).finalize().into_bytes();
        Ok(format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(signature)))
    }

    /// Accepts only well-formed, correctly signed, unexpired tokens carrying `admin: true`.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<AdminClaims, TokenError> {
        let mut parts = token.trim().split('.');
        let (header_b64, claims_b64, signature_b64) =
            match (parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some(h), Some(c), Some(s), None) => (h, c, s),
                _ => return Err(TokenError::Malformed),
            };

        let header: JwtHeader = decode_json(header_b64)?;
        if header.alg != "HS256" || !header.typ.eq_ignore_ascii_case("JWT") {
            return Err(TokenError::Malformed);
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| TokenError::Malformed)?;
        self.mac(&format!("{}.{}", header_b64, claims_b64))
            .verify_slice(&signature)
            .map_err(|_| TokenError::BadSignature)?;

        let claims: AdminClaims = decode_json(claims_b64)?;
        if claims.exp <= now.timestamp() {
            return Err(TokenError::Expired);
        }
        if !claims.admin {
            return Err(TokenError::NotAdmin);
        }
        Ok(claims)
    }

    fn mac(&self, signing_input: &str) -> Hmac<Sha256> {
        // HMAC accepts keys of any length
        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret.expose_secret().as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        mac
    }
}

fn decode_json<T: serde::de::DeserializeOwned>(segment: &str) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| TokenError::Malformed)?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed)
}
