use chrono::{DateTime, Utc};

use crate::domain::{
    RepoRetrieveError, RoomKey, Seat, UserId,
    room::Room,
    user::UserRepository,
};

pub mod create;
pub mod disconnect;
pub mod join;
pub mod leave;
pub mod query;

#[derive(Clone, Debug, PartialEq)]
pub struct MemberView {
    pub user_id: UserId,
    pub username: String,
    pub rating: f64,
    pub seat: Seat,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RoomView {
    pub key: RoomKey,
    pub rated: bool,
    pub members: Vec<MemberView>,
    pub current_round: usize,
    pub match_ended: bool,
    pub created_at: DateTime<Utc>,
}

pub(crate) async fn load_room_view<U: UserRepository>(
    user_repository: &U,
    room: &Room,
) -> Result<RoomView, RepoRetrieveError> {
    let mut members = Vec::with_capacity(2);
    for seat in Seat::ALL {
        let Some(user_id) = room.member_at(seat) else {
            continue;
        };
        let user = user_repository.get_user(user_id).await?;
        members.push(MemberView {
            user_id,
            username: user.username,
            rating: user.stats.rating,
            seat,
        });
    }
    Ok(RoomView {
        key: room.key.clone(),
        rated: room.rated,
        members,
        current_round: room.current_round,
        match_ended: room.match_ended,
        created_at: room.created_at,
    })
}
