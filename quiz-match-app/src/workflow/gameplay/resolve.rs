use std::sync::Arc;

use crate::{
    config::MatchConfig,
    domain::{
        RoomKey, Seat,
        r#match::decide_match,
        room::RoomService,
        seat::SeatService,
    },
    ports::notification::{ListenerMessage, ListenerNotificationPort},
    workflow::gameplay::{
        Settlement,
        settle::{SettleMatchError, SettleMatchWorkflow},
    },
};

#[async_trait::async_trait]
pub trait ResolveMatchUseCase {
    /// Settles the match if the sets decided it. `Ok(None)` covers every
    /// case where there is nothing to settle, including repeated calls.
    async fn resolve_match(&self, room_key: &RoomKey) -> Result<Option<Settlement>, SettleMatchError>;
}

pub struct ResolveMatchUseCaseImpl<
    R: RoomService,
    S: SeatService,
    W: SettleMatchWorkflow,
    L: ListenerNotificationPort,
> {
    room_service: Arc<R>,
    seat_service: Arc<S>,
    settle_workflow: Arc<W>,
    notification_port: Arc<L>,
    draw_threshold: f64,
}

impl<R: RoomService, S: SeatService, W: SettleMatchWorkflow, L: ListenerNotificationPort>
    ResolveMatchUseCaseImpl<R, S, W, L>
{
    pub fn new(
        room_service: Arc<R>,
        seat_service: Arc<S>,
        settle_workflow: Arc<W>,
        notification_port: Arc<L>,
        config: &MatchConfig,
    ) -> Self {
        Self {
            room_service,
            seat_service,
            settle_workflow,
            notification_port,
            draw_threshold: config.draw_threshold(),
        }
    }
}

#[async_trait::async_trait]
impl<
    R: RoomService + Send + Sync + 'static,
    S: SeatService + Send + Sync + 'static,
    W: SettleMatchWorkflow + Send + Sync + 'static,
    L: ListenerNotificationPort + Send + Sync + 'static,
> ResolveMatchUseCase for ResolveMatchUseCaseImpl<R, S, W, L>
{
    async fn resolve_match(&self, room_key: &RoomKey) -> Result<Option<Settlement>, SettleMatchError> {
        let Some(mut room) = self.room_service.lock_room(room_key).await else {
            return Ok(None);
        };
        if room.match_ended || room.member_count() < 2 {
            return Ok(None);
        }
        let (Some(first), Some(second)) = (
            self.seat_service.get_sets_won(room.seat_key(Seat::First)),
            self.seat_service.get_sets_won(room.seat_key(Seat::Second)),
        ) else {
            return Ok(None);
        };
        let sets_won = [first, second];
        let Some(outcome) = decide_match(sets_won, self.draw_threshold) else {
            return Ok(None);
        };

        let settlement = self
            .settle_workflow
            .settle(&mut room, outcome, sets_won, false)
            .await?;
        self.notification_port.notify_users(
            &room.members(),
            ListenerMessage::MatchEnded {
                settlement: settlement.clone(),
            },
        );
        Ok(Some(settlement))
    }
}

#[cfg(test)]
mod tests {
    use crate::{domain::r#match::MatchOutcome, testing::MatchFixture};

    use super::*;

    #[tokio::test]
    async fn open_match_is_left_alone() {
        let f = MatchFixture::new();
        let (key, alice, bob) = f.paired_room(true).await;
        f.play_set(&key, alice, bob, 3, 1).await;

        let res = f.app.game_resolve_use_case.resolve_match(&key).await.unwrap();
        assert!(res.is_none());
        assert_eq!(f.users.stats(alice).wins, 0);
    }

    #[tokio::test]
    async fn two_sets_won_settle_the_match() {
        let f = MatchFixture::new();
        let (key, alice, bob) = f.paired_room(true).await;
        f.play_set(&key, alice, bob, 1, 3).await;
        f.play_set(&key, alice, bob, 0, 2).await;
        f.notifier.clear();

        let settlement = f
            .app
            .game_resolve_use_case
            .resolve_match(&key)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(settlement.outcome, MatchOutcome::Won(Seat::Second));
        assert_eq!(settlement.sets_won, [0.0, 2.0]);
        assert_eq!(settlement.new_ratings, [992.0, 1008.0]);
        assert!(!settlement.is_forfeit);
        assert_eq!(f.users.stats(bob).wins, 1);
        assert_eq!(f.notifier.get_messages().len(), 2);
    }

    #[tokio::test]
    async fn settled_match_is_not_settled_again() {
        let f = MatchFixture::new();
        let (key, alice, bob) = f.paired_room(true).await;
        f.play_set(&key, alice, bob, 4, 0).await;
        f.play_set(&key, alice, bob, 4, 0).await;
        f.app.game_resolve_use_case.resolve_match(&key).await.unwrap().unwrap();

        f.play_set(&key, alice, bob, 0, 9).await;
        let again = f.app.game_resolve_use_case.resolve_match(&key).await.unwrap();

        assert!(again.is_none());
        assert_eq!(f.users.stats(alice).wins, 1);
        assert_eq!(f.users.stats(alice).rating, 1008.0);
        assert_eq!(f.users.stats(bob).losses, 1);
    }

    #[tokio::test]
    async fn three_drawn_sets_are_a_draw() {
        let f = MatchFixture::new();
        let (key, alice, bob) = f.paired_room(true).await;
        for _ in 0..3 {
            f.play_set(&key, alice, bob, 2, 2).await;
        }

        let settlement = f
            .app
            .game_resolve_use_case
            .resolve_match(&key)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(settlement.outcome, MatchOutcome::Draw);
        assert_eq!(settlement.new_ratings, [1000.0, 1000.0]);
    }

    #[tokio::test]
    async fn failed_settlement_can_be_retried() {
        let f = MatchFixture::new();
        let (key, alice, bob) = f.paired_room(true).await;
        f.play_set(&key, alice, bob, 4, 0).await;
        f.play_set(&key, alice, bob, 4, 0).await;
        f.notifier.clear();
        f.users.set_fail_writes(true);

        let res = f.app.game_resolve_use_case.resolve_match(&key).await;
        assert!(matches!(res, Err(SettleMatchError::Storage(_))));
        assert!(f.notifier.get_messages().is_empty());
        let info = f.app.room_query_use_case.room_info(&key).await.unwrap();
        assert!(!info.match_ended);

        f.users.set_fail_writes(false);
        let settlement = f.app.game_resolve_use_case.resolve_match(&key).await.unwrap();
        assert!(settlement.is_some());
        assert_eq!(f.users.stats(alice).wins, 1);
    }
}
