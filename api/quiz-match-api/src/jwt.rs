use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use quiz_match_app::{
    domain::UserId,
    ports::authentication::{
        AuthenticationPort, Identity, RefreshClaims, TokenIssueError, TokenPair,
    },
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const ACCESS_TOKEN_HOURS: i64 = 8;
const REFRESH_TOKEN_DAYS: i64 = 365;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub jti: String,
    exp: usize,
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Keys {
    fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// HS256 tokens. Access and refresh tokens are signed with different
/// secrets, so one can never pass for the other.
pub struct JwtAuthenticationService {
    access: Keys,
    refresh: Keys,
}

impl JwtAuthenticationService {
    pub fn new(access_secret: &[u8], refresh_secret: &[u8]) -> Self {
        Self {
            access: Keys::new(access_secret),
            refresh: Keys::new(refresh_secret),
        }
    }

    pub fn from_env() -> Self {
        let access_secret = read_or_generate_secret("QUIZ_JWT_SECRET");
        let refresh_secret = read_or_generate_secret("QUIZ_JWT_REFRESH_SECRET");
        Self::new(&access_secret, &refresh_secret)
    }

    fn sign(
        keys: &Keys,
        identity: &Identity,
        jti: &str,
        lifetime: chrono::Duration,
    ) -> Result<String, TokenIssueError> {
        let claims = Claims {
            sub: identity.user_id.to_string(),
            username: identity.username.clone(),
            jti: jti.to_string(),
            exp: (chrono::Utc::now() + lifetime).timestamp() as usize,
        };
        encode(&Header::default(), &claims, &keys.encoding)
            .map_err(|e| TokenIssueError(e.to_string()))
    }

    fn verify(keys: &Keys, token: &str) -> Option<(Identity, String)> {
        let data = decode::<Claims>(token, &keys.decoding, &Validation::default()).ok()?;
        let user_id = Uuid::parse_str(&data.claims.sub).ok()?;
        let identity = Identity {
            user_id: UserId(user_id),
            username: data.claims.username,
        };
        Some((identity, data.claims.jti))
    }
}

impl AuthenticationPort for JwtAuthenticationService {
    fn issue_tokens(&self, identity: &Identity) -> Result<TokenPair, TokenIssueError> {
        let refresh_token_id = Uuid::new_v4().to_string();
        let access_token = Self::sign(
            &self.access,
            identity,
            &Uuid::new_v4().to_string(),
            chrono::Duration::hours(ACCESS_TOKEN_HOURS),
        )?;
        let refresh_token = Self::sign(
            &self.refresh,
            identity,
            &refresh_token_id,
            chrono::Duration::days(REFRESH_TOKEN_DAYS),
        )?;
        Ok(TokenPair {
            access_token,
            refresh_token,
            refresh_token_id,
        })
    }

    fn verify_access_token(&self, token: &str) -> Option<Identity> {
        Self::verify(&self.access, token).map(|(identity, _)| identity)
    }

    fn verify_refresh_token(&self, token: &str) -> Option<RefreshClaims> {
        Self::verify(&self.refresh, token).map(|(identity, token_id)| RefreshClaims {
            identity,
            token_id,
        })
    }
}

fn read_or_generate_secret(var: &str) -> Vec<u8> {
    if let Ok(secret) = std::env::var(var) {
        secret.as_bytes().to_vec()
    } else {
        log::warn!("{} not set, generating a random secret", var);
        Uuid::new_v4().as_bytes().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtAuthenticationService {
        JwtAuthenticationService::new(b"access-secret", b"refresh-secret")
    }

    fn alice() -> Identity {
        Identity {
            user_id: UserId::new(),
            username: "alice".to_string(),
        }
    }

    #[test]
    fn issued_tokens_verify() {
        let service = service();
        let identity = alice();
        let pair = service.issue_tokens(&identity).unwrap();

        assert_eq!(service.verify_access_token(&pair.access_token), Some(identity.clone()));
        let claims = service.verify_refresh_token(&pair.refresh_token).unwrap();
        assert_eq!(claims.identity, identity);
        assert_eq!(claims.token_id, pair.refresh_token_id);
    }

    #[test]
    fn token_kinds_are_not_interchangeable() {
        let service = service();
        let pair = service.issue_tokens(&alice()).unwrap();

        assert!(service.verify_access_token(&pair.refresh_token).is_none());
        assert!(service.verify_refresh_token(&pair.access_token).is_none());
    }

    #[test]
    fn foreign_and_expired_tokens_are_rejected() {
        let service = service();
        let other = JwtAuthenticationService::new(b"other", b"other-refresh");
        let pair = other.issue_tokens(&alice()).unwrap();
        assert!(service.verify_access_token(&pair.access_token).is_none());

        let expired = JwtAuthenticationService::sign(
            &service.access,
            &alice(),
            "jti",
            chrono::Duration::hours(-2),
        )
        .unwrap();
        assert!(service.verify_access_token(&expired).is_none());
        assert!(service.verify_access_token("not a token").is_none());
    }
}
