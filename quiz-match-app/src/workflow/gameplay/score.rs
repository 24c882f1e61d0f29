use std::sync::Arc;

use crate::{
    domain::{RoomKey, Seat, room::RoomService, seat::SeatService},
    workflow::gameplay::ScoreBoard,
};

#[async_trait::async_trait]
pub trait DisplayScoreUseCase {
    async fn display_score(&self, room_key: &RoomKey) -> Option<ScoreBoard>;
}

pub struct DisplayScoreUseCaseImpl<R: RoomService, S: SeatService> {
    room_service: Arc<R>,
    seat_service: Arc<S>,
}

impl<R: RoomService, S: SeatService> DisplayScoreUseCaseImpl<R, S> {
    pub fn new(room_service: Arc<R>, seat_service: Arc<S>) -> Self {
        Self {
            room_service,
            seat_service,
        }
    }
}

#[async_trait::async_trait]
impl<R: RoomService + Send + Sync + 'static, S: SeatService + Send + Sync + 'static>
    DisplayScoreUseCase for DisplayScoreUseCaseImpl<R, S>
{
    async fn display_score(&self, room_key: &RoomKey) -> Option<ScoreBoard> {
        let room = self.room_service.lock_room(room_key).await?;
        let first = self.seat_service.get_seat(room.seat_key(Seat::First))?;
        let second = self.seat_service.get_seat(room.seat_key(Seat::Second))?;
        Some(ScoreBoard {
            room_key: room.key.clone(),
            current_round: room.current_round,
            sets_won: [first.sets_won, second.sets_won],
            points: [first.points, second.points],
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::MatchFixture;

    use super::*;

    #[tokio::test]
    async fn score_shows_both_seats() {
        let f = MatchFixture::new();
        let (key, alice, bob) = f.paired_room(true).await;
        f.play_set(&key, alice, bob, 6, 2).await;
        f.app.game_submit_use_case.submit(bob, &key, 1, 1, 3).await;

        let score = f.app.game_display_score_use_case.display_score(&key).await.unwrap();

        assert_eq!(score.current_round, 1);
        assert_eq!(score.points, [vec![6, 0, 0], vec![2, 3, 0]]);
        assert_eq!(score.sets_won, [1.0, 0.0]);
    }

    #[tokio::test]
    async fn unknown_room_has_no_score() {
        let f = MatchFixture::new();
        let score = f
            .app
            .game_display_score_use_case
            .display_score(&RoomKey::new("missing"))
            .await;
        assert!(score.is_none());
    }
}
