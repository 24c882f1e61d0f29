use std::sync::Arc;

use crate::{
    domain::{
        Seat,
        r#match::MatchOutcome,
        rating::RatingService,
        room::Room,
        user::UserRepository,
    },
    workflow::gameplay::Settlement,
};

#[derive(Debug, thiserror::Error)]
pub enum SettleMatchError {
    #[error("Match in room is already settled")]
    AlreadySettled,
    #[error("Room does not hold two players")]
    MissingPlayers,
    #[error("Failed to store settlement: {0}")]
    Storage(String),
}

/// Applies a decided outcome to both users and closes the match. The room
/// is only marked as ended once both user records were written.
#[async_trait::async_trait]
pub trait SettleMatchWorkflow {
    async fn settle(
        &self,
        room: &mut Room,
        outcome: MatchOutcome,
        sets_won: [f64; 2],
        is_forfeit: bool,
    ) -> Result<Settlement, SettleMatchError>;
}

pub struct SettleMatchWorkflowImpl<U: UserRepository, R: RatingService> {
    user_repository: Arc<U>,
    rating_service: Arc<R>,
}

impl<U: UserRepository, R: RatingService> SettleMatchWorkflowImpl<U, R> {
    pub fn new(user_repository: Arc<U>, rating_service: Arc<R>) -> Self {
        Self {
            user_repository,
            rating_service,
        }
    }
}

#[async_trait::async_trait]
impl<
    U: UserRepository + Send + Sync + 'static,
    R: RatingService + Send + Sync + 'static,
> SettleMatchWorkflow for SettleMatchWorkflowImpl<U, R>
{
    async fn settle(
        &self,
        room: &mut Room,
        outcome: MatchOutcome,
        sets_won: [f64; 2],
        is_forfeit: bool,
    ) -> Result<Settlement, SettleMatchError> {
        if room.match_ended {
            return Err(SettleMatchError::AlreadySettled);
        }
        let (Some(first), Some(second)) =
            (room.member_at(Seat::First), room.member_at(Seat::Second))
        else {
            return Err(SettleMatchError::MissingPlayers);
        };

        let rated = room.rated;
        let rating_service = self.rating_service.clone();
        let (old_ratings, new_ratings) = self
            .user_repository
            .update_user_pair(first, second, move |first_stats, second_stats| {
                let first_score = outcome.score_for(Seat::First);
                let (first_rating, second_rating) = rating_service.rate_pair(
                    first_stats.rating,
                    second_stats.rating,
                    first_score,
                    rated,
                );
                (
                    first_stats.record(first_score, first_rating),
                    second_stats.record(first_score.inverse(), second_rating),
                    (
                        [first_stats.rating, second_stats.rating],
                        [first_rating, second_rating],
                    ),
                )
            })
            .await
            .map_err(|e| {
                log::error!("Failed to settle match in room {}: {}", room.key, e);
                SettleMatchError::Storage(e.to_string())
            })?;

        room.end_match();
        log::info!(
            "Match in room {} settled with outcome {} (forfeit: {})",
            room.key,
            outcome.code(),
            is_forfeit
        );

        Ok(Settlement {
            room_key: room.key.clone(),
            outcome,
            rated,
            is_forfeit,
            sets_won,
            old_ratings,
            new_ratings,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        config::MatchConfig,
        domain::{
            UserId,
            rating::RatingServiceImpl,
            room::{RoomService, RoomServiceImpl},
        },
        testing::{MockUserRepository, SequenceKeyGenerator},
    };

    use super::*;

    async fn paired_room(
        repo: &MockUserRepository,
        rated: bool,
    ) -> (crate::domain::room::RoomGuard, UserId, UserId) {
        let rooms = RoomServiceImpl::new(SequenceKeyGenerator::new(&[]), &MatchConfig::default());
        let alice = repo.add_user("alice", 1000.0);
        let bob = repo.add_user("bob", 1000.0);
        let room = rooms.create_room(alice, rated, |_| {});
        let (guard, _) = rooms.join_room(&room.key, bob).await.unwrap();
        (guard, alice, bob)
    }

    fn workflow(
        repo: &MockUserRepository,
    ) -> SettleMatchWorkflowImpl<MockUserRepository, RatingServiceImpl> {
        SettleMatchWorkflowImpl::new(
            Arc::new(repo.clone()),
            Arc::new(RatingServiceImpl::new(&MatchConfig::default())),
        )
    }

    #[tokio::test]
    async fn settlement_updates_both_users() {
        let repo = MockUserRepository::default();
        let (mut room, alice, bob) = paired_room(&repo, true).await;

        let settlement = workflow(&repo)
            .settle(&mut room, MatchOutcome::Won(Seat::First), [2.0, 1.0], false)
            .await
            .unwrap();

        assert!(room.match_ended);
        assert_eq!(settlement.old_ratings, [1000.0, 1000.0]);
        assert_eq!(settlement.new_ratings, [1008.0, 992.0]);
        assert!(!settlement.is_forfeit);

        let alice_stats = repo.stats(alice);
        let bob_stats = repo.stats(bob);
        assert_eq!((alice_stats.rating, alice_stats.wins), (1008.0, 1));
        assert_eq!((bob_stats.rating, bob_stats.losses), (992.0, 1));
    }

    #[tokio::test]
    async fn unrated_draw_keeps_ratings() {
        let repo = MockUserRepository::default();
        let (mut room, alice, bob) = paired_room(&repo, false).await;

        let settlement = workflow(&repo)
            .settle(&mut room, MatchOutcome::Draw, [1.5, 1.5], false)
            .await
            .unwrap();

        assert_eq!(settlement.new_ratings, [1000.0, 1000.0]);
        assert_eq!(repo.stats(alice).draws, 1);
        assert_eq!(repo.stats(bob).draws, 1);
    }

    #[tokio::test]
    async fn failed_write_leaves_match_open() {
        let repo = MockUserRepository::default();
        let (mut room, alice, bob) = paired_room(&repo, true).await;
        repo.set_fail_writes(true);

        let res = workflow(&repo)
            .settle(&mut room, MatchOutcome::Won(Seat::Second), [0.0, 2.0], false)
            .await;

        assert!(matches!(res, Err(SettleMatchError::Storage(_))));
        assert!(!room.match_ended);
        assert_eq!(repo.stats(alice).rating, 1000.0);
        assert_eq!(repo.stats(bob).wins, 0);

        repo.set_fail_writes(false);
        let retried = workflow(&repo)
            .settle(&mut room, MatchOutcome::Won(Seat::Second), [0.0, 2.0], false)
            .await;
        assert!(retried.is_ok());
        assert!(room.match_ended);
    }

    #[tokio::test]
    async fn second_settlement_is_refused() {
        let repo = MockUserRepository::default();
        let (mut room, alice, _) = paired_room(&repo, true).await;
        let workflow = workflow(&repo);

        workflow
            .settle(&mut room, MatchOutcome::Won(Seat::First), [2.0, 0.0], false)
            .await
            .unwrap();
        let again = workflow
            .settle(&mut room, MatchOutcome::Won(Seat::First), [2.0, 0.0], false)
            .await;

        assert!(matches!(again, Err(SettleMatchError::AlreadySettled)));
        assert_eq!(repo.stats(alice).wins, 1);
    }
}
