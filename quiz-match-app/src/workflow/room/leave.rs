use std::sync::Arc;

use crate::{
    domain::{RoomKey, UserId, room::RoomService, seat::SeatService},
    ports::notification::{ListenerMessage, ListenerNotificationPort},
    workflow::gameplay::{Settlement, forfeit::ForfeitMatchWorkflow, settle::SettleMatchError},
};

#[derive(Clone, Debug, PartialEq)]
pub enum LeaveOutcome {
    /// The last member left and the room is gone.
    RoomClosed,
    /// One member remains. Carries the forfeit settlement if the match was
    /// still running.
    Left { settlement: Option<Settlement> },
    NotApplicable,
}

#[derive(Debug, thiserror::Error)]
pub enum LeaveRoomError {
    #[error(transparent)]
    Settlement(#[from] SettleMatchError),
}

#[async_trait::async_trait]
pub trait LeaveRoomUseCase {
    async fn leave_room(&self, user: UserId, room_key: &RoomKey) -> Result<LeaveOutcome, LeaveRoomError>;
}

pub struct LeaveRoomUseCaseImpl<
    R: RoomService,
    S: SeatService,
    F: ForfeitMatchWorkflow,
    L: ListenerNotificationPort,
> {
    room_service: Arc<R>,
    seat_service: Arc<S>,
    forfeit_workflow: Arc<F>,
    notification_port: Arc<L>,
}

impl<R: RoomService, S: SeatService, F: ForfeitMatchWorkflow, L: ListenerNotificationPort>
    LeaveRoomUseCaseImpl<R, S, F, L>
{
    pub fn new(
        room_service: Arc<R>,
        seat_service: Arc<S>,
        forfeit_workflow: Arc<F>,
        notification_port: Arc<L>,
    ) -> Self {
        Self {
            room_service,
            seat_service,
            forfeit_workflow,
            notification_port,
        }
    }
}

#[async_trait::async_trait]
impl<
    R: RoomService + Send + Sync + 'static,
    S: SeatService + Send + Sync + 'static,
    F: ForfeitMatchWorkflow + Send + Sync + 'static,
    L: ListenerNotificationPort + Send + Sync + 'static,
> LeaveRoomUseCase for LeaveRoomUseCaseImpl<R, S, F, L>
{
    async fn leave_room(&self, user: UserId, room_key: &RoomKey) -> Result<LeaveOutcome, LeaveRoomError> {
        let Some(mut room) = self.room_service.lock_room(room_key).await else {
            return Ok(LeaveOutcome::NotApplicable);
        };
        let Some(seat) = room.seat_of(user) else {
            return Ok(LeaveOutcome::NotApplicable);
        };

        if room.member_count() == 1 {
            self.room_service.remove_member(&mut room, user);
            for key in &room.seat_keys {
                self.seat_service.delete_seat(key);
            }
            self.room_service.close_room(&mut room);
            log::info!("User {} left room {}, room closed", user, room.key);
            return Ok(LeaveOutcome::RoomClosed);
        }

        let settlement = if room.match_ended {
            None
        } else {
            Some(self.forfeit_workflow.forfeit(&mut room, seat).await?)
        };

        self.room_service.remove_member(&mut room, user);
        self.seat_service.set_playing(room.seat_key(seat), false);
        log::info!("User {} left room {}", user, room.key);

        let remaining = room.members();
        if let Some(settlement) = &settlement {
            let mut recipients = remaining.clone();
            recipients.push(user);
            self.notification_port.notify_users(
                &recipients,
                ListenerMessage::MatchEnded {
                    settlement: settlement.clone(),
                },
            );
        }
        self.notification_port.notify_users(
            &remaining,
            ListenerMessage::MemberLeft {
                room_key: room.key.clone(),
                seat,
            },
        );

        Ok(LeaveOutcome::Left { settlement })
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        domain::{Seat, r#match::MatchOutcome},
        testing::MatchFixture,
    };

    use super::*;

    #[tokio::test]
    async fn leaving_mid_match_forfeits() {
        let f = MatchFixture::new();
        let (key, alice, bob) = f.paired_room(true).await;
        f.play_set(&key, alice, bob, 5, 3).await;
        f.notifier.clear();

        let outcome = f.app.room_leave_use_case.leave_room(alice, &key).await.unwrap();

        let LeaveOutcome::Left {
            settlement: Some(settlement),
        } = outcome.clone()
        else {
            panic!("expected a forfeit settlement, got {:?}", outcome);
        };
        assert_eq!(settlement.outcome, MatchOutcome::Won(Seat::Second));
        assert_eq!(settlement.sets_won, [0.0, 2.0]);
        assert!(settlement.is_forfeit);
        assert_eq!(f.users.stats(bob).wins, 1);
        assert_eq!(f.users.stats(alice).losses, 1);

        let bob_messages = f.notifier.messages_for(bob);
        assert!(matches!(bob_messages[0], ListenerMessage::MatchEnded { .. }));
        assert!(matches!(
            bob_messages[1],
            ListenerMessage::MemberLeft { seat: Seat::First, .. }
        ));
        assert_eq!(f.notifier.messages_for(alice).len(), 1);

        let info = f.app.room_query_use_case.room_info(&key).await.unwrap();
        assert!(info.match_ended);
        assert_eq!(info.members.len(), 1);
    }

    #[tokio::test]
    async fn failed_forfeit_keeps_the_leaver_seated() {
        let f = MatchFixture::new();
        let (key, alice, _) = f.paired_room(true).await;
        f.users.set_fail_writes(true);

        let res = f.app.room_leave_use_case.leave_room(alice, &key).await;
        assert!(matches!(
            res,
            Err(LeaveRoomError::Settlement(SettleMatchError::Storage(_)))
        ));

        let info = f.app.room_query_use_case.room_info(&key).await.unwrap();
        assert!(!info.match_ended);
        assert_eq!(info.members.len(), 2);
        assert!(f.notifier.get_messages().is_empty());
    }

    #[tokio::test]
    async fn last_member_closes_the_room() {
        let f = MatchFixture::new();
        let (key, alice, bob) = f.paired_room(false).await;

        f.app.room_leave_use_case.leave_room(alice, &key).await.unwrap();
        let outcome = f.app.room_leave_use_case.leave_room(bob, &key).await.unwrap();

        assert_eq!(outcome, LeaveOutcome::RoomClosed);
        assert!(f.app.room_query_use_case.room_info(&key).await.is_err());
        assert!(f.app.game_display_score_use_case.display_score(&key).await.is_none());
        assert_eq!(f.users.stats(bob).wins, 1);
    }

    #[tokio::test]
    async fn leaving_an_ended_match_does_not_settle_again() {
        let f = MatchFixture::new();
        let (key, alice, bob) = f.paired_room(true).await;
        f.play_set(&key, alice, bob, 4, 1).await;
        f.play_set(&key, alice, bob, 2, 0).await;
        f.app.game_resolve_use_case.resolve_match(&key).await.unwrap().unwrap();
        let rating = f.users.stats(alice).rating;

        let outcome = f.app.room_leave_use_case.leave_room(bob, &key).await.unwrap();

        assert_eq!(outcome, LeaveOutcome::Left { settlement: None });
        assert_eq!(f.users.stats(alice).rating, rating);
        assert_eq!(f.users.stats(alice).wins, 1);
    }

    #[tokio::test]
    async fn stranger_cannot_leave() {
        let f = MatchFixture::new();
        let (key, _, _) = f.paired_room(true).await;
        let res = f
            .app
            .room_leave_use_case
            .leave_room(UserId::new(), &key)
            .await
            .unwrap();
        assert_eq!(res, LeaveOutcome::NotApplicable);
    }
}
