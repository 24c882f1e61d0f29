use serde::Serialize;
use serde_json::Value;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Ok,
    NotApplicable,
    WaitingOnOpponent,
    RoomNotFound,
    RoomFull,
    AlreadyMember,
    MatchOver,
    UsernameTaken,
    SessionInUse,
    WrongPassword,
    UnknownUsername,
    MissingCredentials,
    Unauthorized,
    BadRequest,
    InternalError,
}

/// Body of every HTTP response and WebSocket reply.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Envelope {
    pub status: Status,
    pub message: String,
    pub data: Value,
}

impl Envelope {
    pub fn new(status: Status, message: impl Into<String>, data: Value) -> Self {
        Self {
            status,
            message: message.into(),
            data,
        }
    }

    pub fn ok(data: impl Serialize) -> Self {
        match serde_json::to_value(data) {
            Ok(data) => Self::new(Status::Ok, "ok", data),
            Err(e) => {
                log::error!("Failed to serialize response data: {}", e);
                Self::new(Status::InternalError, "Failed to serialize response", Value::Null)
            }
        }
    }

    pub fn ok_empty() -> Self {
        Self::new(Status::Ok, "ok", Value::Null)
    }

    pub fn not_applicable() -> Self {
        Self::new(Status::NotApplicable, "Not applicable", Value::Null)
    }

    pub fn waiting_on_opponent() -> Self {
        Self::new(Status::WaitingOnOpponent, "Waiting on opponent", Value::Null)
    }
}
