use std::sync::Arc;

use axum::{
    Json, Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use quiz_match_app::{
    Application,
    domain::room::JoinRoomError,
    workflow::{
        account::{
            change_password::ChangePasswordError, profile::GetUserDataError,
            session::SessionError, sign_in::SignInError, sign_up::SignUpError,
        },
        gameplay::settle::SettleMatchError,
        room::{join::JoinRoomUseCaseError, leave::LeaveRoomError, query::RoomQueryError},
    },
};

use crate::envelope::{Envelope, Status};

mod auth;
pub mod connection;
pub mod envelope;
mod http;
pub mod jwt;
pub mod protocol;
mod ws;

pub use connection::ConnectionRegistry;
pub use jwt::JwtAuthenticationService;

#[derive(Clone)]
pub struct AppState {
    pub app: Arc<Application>,
    pub connections: Arc<ConnectionRegistry>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/auth/signup", post(http::sign_up))
        .route("/api/auth/signin", post(http::sign_in))
        .route("/api/auth/logout", get(http::logout))
        .route("/api/auth/refresh-token", get(http::refresh_token))
        .route("/api/auth/change-password", post(http::change_password))
        .route("/api/user/get-user-data", get(http::get_user_data))
        .route("/api/room/all-room", get(http::list_rooms))
        .route("/api/room/room-info/{key}", get(http::room_info))
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
}

pub async fn run(
    app: Arc<Application>,
    connections: Arc<ConnectionRegistry>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) {
    let state = AppState { app, connections };

    let port = std::env::var("QUIZ_HTTP_PORT")
        .expect("QUIZ_HTTP_PORT must be set")
        .parse::<u16>()
        .expect("QUIZ_HTTP_PORT must be a valid u16");
    let host = std::env::var("QUIZ_HOST").expect("QUIZ_HOST must be set");
    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port))
        .await
        .expect("Failed to bind HTTP listener");
    log::info!("Listening on {}:{}", host, port);

    if let Err(e) = axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal)
        .await
    {
        log::error!("HTTP server failed: {}", e);
    }
}

/// Rejected operation. The status tells the client why, the variant picks
/// the HTTP status code.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceError {
    NotFound(Status, String),
    Unauthorized(Status, String),
    BadRequest(Status, String),
    Conflict(Status, String),
    Internal(String),
}

impl ServiceError {
    pub fn unauthorized(msg: &str) -> Self {
        ServiceError::Unauthorized(Status::Unauthorized, msg.to_string())
    }

    pub fn bad_request(msg: &str) -> Self {
        ServiceError::BadRequest(Status::BadRequest, msg.to_string())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotFound(..) => StatusCode::NOT_FOUND,
            ServiceError::Unauthorized(..) => StatusCode::UNAUTHORIZED,
            ServiceError::BadRequest(..) => StatusCode::BAD_REQUEST,
            ServiceError::Conflict(..) => StatusCode::CONFLICT,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn envelope(&self) -> Envelope {
        let (status, msg) = match self {
            ServiceError::NotFound(status, msg)
            | ServiceError::Unauthorized(status, msg)
            | ServiceError::BadRequest(status, msg)
            | ServiceError::Conflict(status, msg) => (*status, msg.clone()),
            ServiceError::Internal(msg) => (Status::InternalError, msg.clone()),
        };
        Envelope::new(status, msg, serde_json::Value::Null)
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceError::NotFound(_, msg) => write!(f, "Not found: {}", msg),
            ServiceError::Unauthorized(_, msg) => write!(f, "Unauthorized: {}", msg),
            ServiceError::BadRequest(_, msg) => write!(f, "Bad request: {}", msg),
            ServiceError::Conflict(_, msg) => write!(f, "Conflict: {}", msg),
            ServiceError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::http::Response<axum::body::Body> {
        (self.status_code(), Json(self.envelope())).into_response()
    }
}

impl From<JoinRoomUseCaseError> for ServiceError {
    fn from(e: JoinRoomUseCaseError) -> Self {
        let msg = e.to_string();
        match e {
            JoinRoomUseCaseError::Rejected(JoinRoomError::RoomNotFound) => {
                ServiceError::NotFound(Status::RoomNotFound, msg)
            }
            JoinRoomUseCaseError::Rejected(JoinRoomError::RoomFull) => {
                ServiceError::Conflict(Status::RoomFull, msg)
            }
            JoinRoomUseCaseError::Rejected(JoinRoomError::AlreadyMember) => {
                ServiceError::Conflict(Status::AlreadyMember, msg)
            }
            JoinRoomUseCaseError::Rejected(JoinRoomError::MatchOver) => {
                ServiceError::Conflict(Status::MatchOver, msg)
            }
            JoinRoomUseCaseError::Storage(_) => ServiceError::Internal(msg),
        }
    }
}

impl From<LeaveRoomError> for ServiceError {
    fn from(e: LeaveRoomError) -> Self {
        ServiceError::Internal(e.to_string())
    }
}

impl From<SettleMatchError> for ServiceError {
    fn from(e: SettleMatchError) -> Self {
        ServiceError::Internal(e.to_string())
    }
}

impl From<RoomQueryError> for ServiceError {
    fn from(e: RoomQueryError) -> Self {
        match e {
            RoomQueryError::RoomNotFound => {
                ServiceError::NotFound(Status::RoomNotFound, e.to_string())
            }
            RoomQueryError::Storage(_) => ServiceError::Internal(e.to_string()),
        }
    }
}

impl From<SignUpError> for ServiceError {
    fn from(e: SignUpError) -> Self {
        let msg = e.to_string();
        match e {
            SignUpError::MissingCredentials => {
                ServiceError::BadRequest(Status::MissingCredentials, msg)
            }
            SignUpError::UsernameTaken => ServiceError::Conflict(Status::UsernameTaken, msg),
            SignUpError::Internal(_) => ServiceError::Internal(msg),
        }
    }
}

impl From<SignInError> for ServiceError {
    fn from(e: SignInError) -> Self {
        let msg = e.to_string();
        match e {
            SignInError::MissingCredentials => {
                ServiceError::BadRequest(Status::MissingCredentials, msg)
            }
            SignInError::UnknownUsername => ServiceError::NotFound(Status::UnknownUsername, msg),
            SignInError::SessionInUse => ServiceError::Conflict(Status::SessionInUse, msg),
            SignInError::WrongPassword => ServiceError::Unauthorized(Status::WrongPassword, msg),
            SignInError::Internal(_) => ServiceError::Internal(msg),
        }
    }
}

impl From<SessionError> for ServiceError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::AccessDenied => ServiceError::unauthorized("Access denied"),
            SessionError::Internal(_) => ServiceError::Internal(e.to_string()),
        }
    }
}

impl From<ChangePasswordError> for ServiceError {
    fn from(e: ChangePasswordError) -> Self {
        let msg = e.to_string();
        match e {
            ChangePasswordError::MissingCredentials => {
                ServiceError::BadRequest(Status::MissingCredentials, msg)
            }
            ChangePasswordError::WrongPassword => {
                ServiceError::Unauthorized(Status::WrongPassword, msg)
            }
            ChangePasswordError::Internal(_) => ServiceError::Internal(msg),
        }
    }
}

impl From<GetUserDataError> for ServiceError {
    fn from(e: GetUserDataError) -> Self {
        match e {
            // The token named a user that no longer exists.
            GetUserDataError::NotFound => ServiceError::unauthorized("Unknown user"),
            GetUserDataError::Internal(_) => ServiceError::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejections_keep_their_reason() {
        let err = ServiceError::from(JoinRoomUseCaseError::Rejected(JoinRoomError::RoomFull));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.envelope().status, Status::RoomFull);

        let err = ServiceError::from(SignInError::SessionInUse);
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.envelope().status, Status::SessionInUse);

        let err = ServiceError::from(SessionError::AccessDenied);
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.envelope().status, Status::Unauthorized);
    }

    #[test]
    fn storage_failures_surface_as_internal() {
        let err = ServiceError::from(SettleMatchError::Storage("disk full".to_string()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let envelope = err.envelope();
        assert_eq!(envelope.status, Status::InternalError);
        assert!(envelope.message.contains("disk full"));
    }
}
