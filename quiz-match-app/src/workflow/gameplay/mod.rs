use crate::domain::{
    RoomKey, Seat, UserId,
    r#match::{MatchOutcome, SetOutcome},
    room::Room,
};

pub mod end_set;
pub mod forfeit;
pub mod pairing;
pub mod resolve;
pub mod score;
pub mod settle;
pub mod start_set;
pub mod submit;

#[derive(Clone, Debug, PartialEq)]
pub struct PlayerSummary {
    pub user_id: UserId,
    pub username: String,
    pub rating: f64,
}

/// Sent to both members once the second player has joined.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchStart {
    pub room_key: RoomKey,
    pub topics: Vec<usize>,
    pub players: [PlayerSummary; 2],
}

#[derive(Clone, Debug, PartialEq)]
pub struct SubmissionTally {
    pub room_key: RoomKey,
    pub seat: Seat,
    pub set_index: usize,
    pub point: i64,
    pub mistakes: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SetResult {
    pub room_key: RoomKey,
    pub set_index: usize,
    pub points: [i64; 2],
    pub outcome: SetOutcome,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Settlement {
    pub room_key: RoomKey,
    pub outcome: MatchOutcome,
    pub rated: bool,
    pub is_forfeit: bool,
    pub sets_won: [f64; 2],
    pub old_ratings: [f64; 2],
    pub new_ratings: [f64; 2],
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScoreBoard {
    pub room_key: RoomKey,
    pub current_round: usize,
    pub points: [Vec<i64>; 2],
    pub sets_won: [f64; 2],
}

/// Resolves a client supplied seat number to a seat held by `user`.
/// Anything else (out of range, someone else's seat, empty seat) is `None`.
pub(crate) fn acting_seat(room: &Room, user: UserId, seat_index: usize) -> Option<Seat> {
    let seat = Seat::from_index(seat_index)?;
    if room.member_at(seat) != Some(user) {
        log::debug!(
            "User {} does not hold seat {} in room {}",
            user,
            seat,
            room.key
        );
        return None;
    }
    Some(seat)
}
