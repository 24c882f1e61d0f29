use axum::{
    Json,
    extract::{Path, State},
};
use quiz_match_app::domain::RoomKey;

use crate::{
    AppState, ServiceError,
    auth::{Auth, BearerToken},
    envelope::Envelope,
    protocol::{RoomInfo, TokensInfo, UserDataInfo},
};

#[derive(serde::Deserialize)]
pub struct CredentialsPayload {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordPayload {
    #[serde(default)]
    old_password: String,
    #[serde(default)]
    new_password: String,
}

pub async fn sign_up(
    State(app): State<AppState>,
    Json(payload): Json<CredentialsPayload>,
) -> Result<Json<Envelope>, ServiceError> {
    let tokens = app
        .app
        .account_sign_up_use_case
        .sign_up(payload.username.trim(), &payload.password)
        .await?;
    Ok(Json(Envelope::ok(TokensInfo::from_tokens(tokens))))
}

pub async fn sign_in(
    State(app): State<AppState>,
    Json(payload): Json<CredentialsPayload>,
) -> Result<Json<Envelope>, ServiceError> {
    let tokens = app
        .app
        .account_sign_in_use_case
        .sign_in(payload.username.trim(), &payload.password)
        .await?;
    Ok(Json(Envelope::ok(TokensInfo::from_tokens(tokens))))
}

pub async fn logout(
    Auth(identity): Auth,
    State(app): State<AppState>,
) -> Result<Json<Envelope>, ServiceError> {
    app.app.account_session_use_case.logout(&identity).await?;
    Ok(Json(Envelope::ok_empty()))
}

pub async fn refresh_token(
    BearerToken(token): BearerToken,
    State(app): State<AppState>,
) -> Result<Json<Envelope>, ServiceError> {
    let tokens = app
        .app
        .account_session_use_case
        .refresh_tokens(&token)
        .await?;
    Ok(Json(Envelope::ok(TokensInfo::from_tokens(tokens))))
}

pub async fn change_password(
    Auth(identity): Auth,
    State(app): State<AppState>,
    Json(payload): Json<ChangePasswordPayload>,
) -> Result<Json<Envelope>, ServiceError> {
    app.app
        .account_change_password_use_case
        .change_password(&identity, &payload.old_password, &payload.new_password)
        .await?;
    Ok(Json(Envelope::ok_empty()))
}

pub async fn get_user_data(
    Auth(identity): Auth,
    State(app): State<AppState>,
) -> Result<Json<Envelope>, ServiceError> {
    let data = app
        .app
        .account_get_user_data_use_case
        .get_user_data(&identity)
        .await?;
    Ok(Json(Envelope::ok(UserDataInfo::from_user_data(data))))
}

pub async fn list_rooms(State(app): State<AppState>) -> Result<Json<Envelope>, ServiceError> {
    let rooms = app.app.room_query_use_case.list_rooms().await?;
    let rooms: Vec<RoomInfo> = rooms.iter().map(RoomInfo::from_room_view).collect();
    Ok(Json(Envelope::ok(rooms)))
}

pub async fn room_info(
    Path(key): Path<String>,
    State(app): State<AppState>,
) -> Result<Json<Envelope>, ServiceError> {
    let room = app
        .app
        .room_query_use_case
        .room_info(&RoomKey::new(key))
        .await?;
    Ok(Json(Envelope::ok(RoomInfo::from_room_view(&room))))
}
