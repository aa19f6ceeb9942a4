//! Bearer token identity middleware.
//!
//! Tokens are JWTs issued by an external identity provider. A request without
//! an `Authorization` header is anonymous; a request with one must carry a
//! valid token or it is rejected.
//!
//! Token identifier format: `{iss}|{sub}`, or `{sub}` for tokens without an
//! issuer. This is the key users are looked up by.

use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::AuthConfig;
use crate::{AppState, Error, Result};

/// Caller identity injected into request extensions for authenticated requests.
#[derive(Clone, Debug, PartialEq)]
pub struct Identity {
    /// Stable identifier of the external identity.
    pub token_identifier: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Claims read from the token. Only `sub` and `exp` are required.
#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    iss: Option<String>,
    name: Option<String>,
    email: Option<String>,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        let token_identifier = match claims.iss {
            Some(iss) if !iss.is_empty() => format!("{}|{}", iss, claims.sub),
            _ => claims.sub,
        };

        Identity {
            token_identifier,
            name: claims.name,
            email: claims.email,
        }
    }
}

/// Verifies bearer tokens against the configured key.
pub struct TokenVerifier {
    key: Option<DecodingKey>,
    validation: Validation,
}

impl TokenVerifier {
    /// Build a verifier from auth config.
    ///
    /// An RS256 public key takes precedence over an HS256 secret. With
    /// neither configured every token is rejected.
    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        let (key, algorithm) = if let Some(path) = &config.jwt_public_key_path {
            let pem = std::fs::read(path)?;
            let key = DecodingKey::from_rsa_pem(&pem)
                .map_err(|e| Error::Internal(format!("Invalid JWT public key {}: {}", path, e)))?;
            (Some(key), Algorithm::RS256)
        } else if let Some(secret) = &config.jwt_secret {
            (Some(DecodingKey::from_secret(secret.as_bytes())), Algorithm::HS256)
        } else {
            warn!("No JWT verification key configured, bearer tokens will be rejected");
            (None, Algorithm::HS256)
        };

        let mut validation = Validation::new(algorithm);
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }
        match &config.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Ok(Self { key, validation })
    }

    /// Verify a token and return the identity it names.
    pub fn verify(&self, token: &str) -> Result<Identity> {
        let key = self.key.as_ref().ok_or(Error::InvalidToken)?;

        let data = decode::<Claims>(token, key, &self.validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => Error::TokenExpired,
            _ => {
                debug!(error = %e, "Rejected bearer token");
                Error::InvalidToken
            }
        })?;

        Ok(data.claims.into())
    }
}

/// Middleware that resolves the caller's identity, if any.
///
/// Inserts [`Identity`] into request extensions when a valid bearer token is
/// present. Requests without an `Authorization` header pass through
/// anonymously.
///
/// # Errors
///
/// Returns 401 Unauthorized if the header is not a bearer token, or the token
/// fails verification or has expired.
pub async fn resolve_identity(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response> {
    let bearer = req
        .headers()
        .typed_try_get::<Authorization<Bearer>>()
        .map_err(|_| Error::InvalidToken)?;

    if let Some(Authorization(bearer)) = bearer {
        let identity = state.verifier.verify(bearer.token())?;
        debug!(token_identifier = %identity.token_identifier, "Resolved caller identity");
        req.extensions_mut().insert(identity);
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const SECRET: &str = "test-secret";

    fn verifier(issuer: Option<&str>, audience: Option<&str>) -> TokenVerifier {
        TokenVerifier::from_config(&AuthConfig {
            jwt_secret: Some(SECRET.to_string()),
            jwt_public_key_path: None,
            issuer: issuer.map(String::from),
            audience: audience.map(String::from),
        })
        .unwrap()
    }

    fn mint(claims: serde_json::Value) -> String {
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn exp_in(seconds: i64) -> i64 {
        chrono::Utc::now().timestamp() + seconds
    }

    #[test]
    fn test_identity_with_issuer() {
        let token = mint(json!({
            "sub": "user_42",
            "iss": "https://auth.example.com",
            "name": "Ada",
            "exp": exp_in(3600),
        }));

        let identity = verifier(Some("https://auth.example.com"), None)
            .verify(&token)
            .unwrap();

        assert_eq!(identity.token_identifier, "https://auth.example.com|user_42");
        assert_eq!(identity.name.as_deref(), Some("Ada"));
        assert_eq!(identity.email, None);
    }

    #[test]
    fn test_identity_without_issuer() {
        let token = mint(json!({ "sub": "user_42", "exp": exp_in(3600) }));
        let identity = verifier(None, None).verify(&token).unwrap();
        assert_eq!(identity.token_identifier, "user_42");
    }

    #[test]
    fn test_expired_token() {
        let token = mint(json!({ "sub": "user_42", "exp": exp_in(-3600) }));
        let err = verifier(None, None).verify(&token).unwrap_err();
        assert!(matches!(err, Error::TokenExpired));
    }

    #[test]
    fn test_wrong_secret_or_issuer() {
        let forged = encode(
            &Header::default(),
            &json!({ "sub": "user_42", "exp": exp_in(3600) }),
            &EncodingKey::from_secret(b"other-secret"),
        )
        .unwrap();
        assert!(matches!(
            verifier(None, None).verify(&forged),
            Err(Error::InvalidToken)
        ));

        let token = mint(json!({ "sub": "user_42", "iss": "evil", "exp": exp_in(3600) }));
        assert!(matches!(
            verifier(Some("good"), None).verify(&token),
            Err(Error::InvalidToken)
        ));

        assert!(matches!(
            verifier(None, None).verify("not-a-jwt"),
            Err(Error::InvalidToken)
        ));
    }

    #[test]
    fn test_audience_checked_when_configured() {
        let token = mint(json!({ "sub": "u", "aud": "larder", "exp": exp_in(3600) }));
        assert!(verifier(None, Some("larder")).verify(&token).is_ok());
        assert!(matches!(
            verifier(None, Some("elsewhere")).verify(&token),
            Err(Error::InvalidToken)
        ));
    }

    #[test]
    fn test_no_key_rejects_everything() {
        let verifier = TokenVerifier::from_config(&AuthConfig::default()).unwrap();
        let token = mint(json!({ "sub": "user_42", "exp": exp_in(3600) }));
        assert!(matches!(verifier.verify(&token), Err(Error::InvalidToken)));
    }
}
