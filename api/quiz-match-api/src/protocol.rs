use quiz_match_app::{
    ports::notification::ListenerMessage,
    workflow::{
        account::{SessionTokens, profile::UserData},
        gameplay::{MatchStart, PlayerSummary, ScoreBoard, SetResult, Settlement, SubmissionTally},
        room::{MemberView, RoomView},
    },
};
use uuid::Uuid;

use crate::envelope::Envelope;

#[derive(serde::Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInfo {
    pub user_id: String,
    pub username: String,
    pub rating: f64,
}

impl PlayerInfo {
    pub fn from_summary(summary: &PlayerSummary) -> Self {
        Self {
            user_id: summary.user_id.to_string(),
            username: summary.username.clone(),
            rating: summary.rating,
        }
    }
}

#[derive(serde::Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MemberInfo {
    pub user_id: String,
    pub username: String,
    pub rating: f64,
    pub seat: usize,
}

impl MemberInfo {
    pub fn from_member_view(member: &MemberView) -> Self {
        Self {
            user_id: member.user_id.to_string(),
            username: member.username.clone(),
            rating: member.rating,
            seat: member.seat.index(),
        }
    }
}

#[derive(serde::Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoomInfo {
    pub room_key: String,
    pub rated: bool,
    pub members: Vec<MemberInfo>,
    pub current_round: usize,
    pub match_ended: bool,
    pub created_at: String,
}

impl RoomInfo {
    pub fn from_room_view(view: &RoomView) -> Self {
        Self {
            room_key: view.key.to_string(),
            rated: view.rated,
            members: view.members.iter().map(MemberInfo::from_member_view).collect(),
            current_round: view.current_round,
            match_ended: view.match_ended,
            created_at: view.created_at.to_rfc3339(),
        }
    }
}

#[derive(serde::Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TallyInfo {
    pub room_key: String,
    pub seat: usize,
    pub set_index: usize,
    pub point: i64,
    pub mistakes: u32,
}

impl TallyInfo {
    pub fn from_tally(tally: &SubmissionTally) -> Self {
        Self {
            room_key: tally.room_key.to_string(),
            seat: tally.seat.index(),
            set_index: tally.set_index,
            point: tally.point,
            mistakes: tally.mistakes,
        }
    }
}

#[derive(serde::Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SetResultInfo {
    pub room_key: String,
    pub set_index: usize,
    pub points: [i64; 2],
    /// 0 or 1 for the winning seat, 2 for a draw.
    pub outcome: u8,
}

impl SetResultInfo {
    pub fn from_set_result(result: &SetResult) -> Self {
        Self {
            room_key: result.room_key.to_string(),
            set_index: result.set_index,
            points: result.points,
            outcome: result.outcome.code(),
        }
    }
}

#[derive(serde::Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SettlementInfo {
    pub room_key: String,
    pub outcome: u8,
    pub rated: bool,
    pub is_forfeit: bool,
    pub sets_won: [f64; 2],
    pub old_ratings: [f64; 2],
    pub new_ratings: [f64; 2],
}

impl SettlementInfo {
    pub fn from_settlement(settlement: &Settlement) -> Self {
        Self {
            room_key: settlement.room_key.to_string(),
            outcome: settlement.outcome.code(),
            rated: settlement.rated,
            is_forfeit: settlement.is_forfeit,
            sets_won: settlement.sets_won,
            old_ratings: settlement.old_ratings,
            new_ratings: settlement.new_ratings,
        }
    }
}

#[derive(serde::Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBoardInfo {
    pub room_key: String,
    pub current_round: usize,
    pub points: [Vec<i64>; 2],
    pub sets_won: [f64; 2],
}

impl ScoreBoardInfo {
    pub fn from_score_board(board: &ScoreBoard) -> Self {
        Self {
            room_key: board.room_key.to_string(),
            current_round: board.current_round,
            points: board.points.clone(),
            sets_won: board.sets_won,
        }
    }
}

#[derive(serde::Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TokensInfo {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokensInfo {
    pub fn from_tokens(tokens: SessionTokens) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        }
    }
}

#[derive(serde::Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserDataInfo {
    pub username: String,
    pub rating: f64,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
}

impl UserDataInfo {
    pub fn from_user_data(data: UserData) -> Self {
        Self {
            username: data.username,
            rating: data.rating,
            wins: data.wins,
            draws: data.draws,
            losses: data.losses,
        }
    }
}

#[derive(serde::Deserialize, Debug, PartialEq)]
#[serde(
    tag = "type",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    CreateRoom {
        #[serde(default)]
        rated: bool,
    },
    JoinRoom {
        room_key: String,
    },
    LeaveRoom,
    UserStartSet {
        room_key: String,
        seat: usize,
    },
    UserSubmit {
        room_key: String,
        seat: usize,
        set_index: usize,
        delta: i64,
    },
    UserEndSet {
        room_key: String,
        seat: usize,
        set_index: usize,
    },
    DisplayScore {
        room_key: String,
    },
}

#[derive(serde::Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ClientMessageWrapper {
    #[serde(flatten)]
    pub message: ClientMessage,
    pub response_id: Uuid,
}

#[derive(serde::Serialize, Debug, Clone)]
#[serde(
    tag = "type",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    Reply {
        response_id: Uuid,
        #[serde(flatten)]
        envelope: Envelope,
    },
    StartOfMatch {
        room_key: String,
        topics: Vec<usize>,
        players: Vec<PlayerInfo>,
    },
    StartOfSet {
        room_key: String,
        round: usize,
    },
    UserAnswer {
        #[serde(flatten)]
        tally: TallyInfo,
    },
    EndOfSet {
        #[serde(flatten)]
        result: SetResultInfo,
    },
    EndOfMatch {
        #[serde(flatten)]
        settlement: SettlementInfo,
    },
    UserLeaveRoom {
        room_key: String,
        seat: usize,
    },
}

impl ServerMessage {
    pub fn from_listener_message(message: ListenerMessage) -> Self {
        match message {
            ListenerMessage::MatchStarted { start } => Self::start_of_match(&start),
            ListenerMessage::SetStarted { room_key, round } => ServerMessage::StartOfSet {
                room_key: room_key.to_string(),
                round,
            },
            ListenerMessage::Answered { tally } => ServerMessage::UserAnswer {
                tally: TallyInfo::from_tally(&tally),
            },
            ListenerMessage::SetEnded { result } => ServerMessage::EndOfSet {
                result: SetResultInfo::from_set_result(&result),
            },
            ListenerMessage::MatchEnded { settlement } => ServerMessage::EndOfMatch {
                settlement: SettlementInfo::from_settlement(&settlement),
            },
            ListenerMessage::MemberLeft { room_key, seat } => ServerMessage::UserLeaveRoom {
                room_key: room_key.to_string(),
                seat: seat.index(),
            },
        }
    }

    fn start_of_match(start: &MatchStart) -> Self {
        ServerMessage::StartOfMatch {
            room_key: start.room_key.to_string(),
            topics: start.topics.clone(),
            players: start.players.iter().map(PlayerInfo::from_summary).collect(),
        }
    }
}
