use std::sync::Arc;

use crate::domain::{RoomKey, UserId, room::RoomService, seat::SeatService};

pub trait CreateRoomUseCase {
    fn create_room(&self, owner: UserId, rated: bool) -> RoomKey;
}

pub struct CreateRoomUseCaseImpl<R: RoomService, S: SeatService> {
    room_service: Arc<R>,
    seat_service: Arc<S>,
}

impl<R: RoomService, S: SeatService> CreateRoomUseCaseImpl<R, S> {
    pub fn new(room_service: Arc<R>, seat_service: Arc<S>) -> Self {
        Self {
            room_service,
            seat_service,
        }
    }
}

impl<R: RoomService + Send + Sync, S: SeatService + Send + Sync> CreateRoomUseCase for CreateRoomUseCaseImpl<R, S> {
    fn create_room(&self, owner: UserId, rated: bool) -> RoomKey {
        let room = self.room_service.create_room(owner, rated, |room| {
            for key in &room.seat_keys {
                self.seat_service.create_seat(key.clone());
            }
        });
        log::info!(
            "User {} created {} room {}",
            owner,
            if rated { "rated" } else { "unrated" },
            room.key
        );
        room.key
    }
}

#[cfg(test)]
mod tests {
    use crate::{domain::Seat, testing::MatchFixture};

    #[tokio::test]
    async fn owner_takes_the_first_seat_of_a_fresh_room() {
        let f = MatchFixture::new();
        let alice = f.users.add_user("alice", 1000.0);

        let key = f.app.room_create_use_case.create_room(alice, true);

        let info = f.app.room_query_use_case.room_info(&key).await.unwrap();
        assert!(info.rated);
        assert!(!info.match_ended);
        assert_eq!(info.members.len(), 1);
        assert_eq!(info.members[0].user_id, alice);
        assert_eq!(info.members[0].seat, Seat::First);

        let score = f.app.game_display_score_use_case.display_score(&key).await.unwrap();
        assert_eq!(score.points, [vec![0, 0, 0], vec![0, 0, 0]]);
        assert_eq!(score.sets_won, [0.0, 0.0]);
    }
}
