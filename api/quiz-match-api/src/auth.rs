use axum::{
    RequestPartsExt,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use quiz_match_app::ports::authentication::Identity;

use crate::{AppState, ServiceError};

/// Raw bearer token from the `Authorization` header.
pub struct BearerToken(pub String);

impl<S: Send + Sync> FromRequestParts<S> for BearerToken {
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| ServiceError::unauthorized("Missing bearer token"))?;
        Ok(BearerToken(bearer.token().to_string()))
    }
}

/// Caller identity from a valid access token.
pub struct Auth(pub Identity);

impl FromRequestParts<AppState> for Auth {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        app: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, app).await?;
        authenticate(app, &token).await.map(Auth)
    }
}

#[derive(serde::Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Like [`Auth`], but browsers cannot set headers on a WebSocket upgrade,
/// so the token may also come as the `token` query parameter.
pub struct UpgradeAuth(pub Identity);

impl FromRequestParts<AppState> for UpgradeAuth {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        app: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Ok(BearerToken(token)) = BearerToken::from_request_parts(parts, app).await {
            return authenticate(app, &token).await.map(UpgradeAuth);
        }
        let Query(query) = parts
            .extract::<Query<TokenQuery>>()
            .await
            .map_err(|_| ServiceError::unauthorized("Missing token"))?;
        let token = query
            .token
            .ok_or_else(|| ServiceError::unauthorized("Missing token"))?;
        authenticate(app, &token).await.map(UpgradeAuth)
    }
}

async fn authenticate(app: &AppState, token: &str) -> Result<Identity, ServiceError> {
    app.app
        .account_authenticate_use_case
        .authenticate(token)
        .await
        .ok_or_else(|| ServiceError::unauthorized("Invalid or expired authentication token"))
}
