use std::{sync::Arc, time::Duration};

use crate::{
    config::MatchConfig,
    domain::{RoomKey, UserId},
    workflow::room::leave::{LeaveOutcome, LeaveRoomError, LeaveRoomUseCase},
};

#[async_trait::async_trait]
pub trait DisconnectUseCase {
    /// Leaves every room a departed socket held. A leave that fails (a
    /// forfeit that could not be stored) is retried with a doubling delay.
    /// Returns the rooms that still could not be left.
    async fn disconnect(&self, user: UserId, room_keys: Vec<RoomKey>) -> Vec<RoomKey>;
}

pub struct DisconnectUseCaseImpl<L: LeaveRoomUseCase> {
    leave_use_case: Arc<L>,
    attempts: u32,
    first_delay: Duration,
}

impl<L: LeaveRoomUseCase> DisconnectUseCaseImpl<L> {
    pub fn new(leave_use_case: Arc<L>, config: &MatchConfig) -> Self {
        Self {
            leave_use_case,
            attempts: config.leave_retry_attempts.max(1),
            first_delay: Duration::from_millis(config.leave_retry_delay_ms),
        }
    }

    async fn leave_with_retry(
        &self,
        user: UserId,
        room_key: &RoomKey,
    ) -> Result<LeaveOutcome, LeaveRoomError> {
        let mut delay = self.first_delay;
        let mut attempt = 1;
        loop {
            match self.leave_use_case.leave_room(user, room_key).await {
                Ok(outcome) => return Ok(outcome),
                Err(e) if attempt < self.attempts => {
                    log::warn!(
                        "Leave of {} from room {} failed (attempt {}/{}), retrying in {:?}: {}",
                        user,
                        room_key,
                        attempt,
                        self.attempts,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait::async_trait]
impl<L: LeaveRoomUseCase + Send + Sync + 'static> DisconnectUseCase for DisconnectUseCaseImpl<L> {
    async fn disconnect(&self, user: UserId, room_keys: Vec<RoomKey>) -> Vec<RoomKey> {
        let leaves = room_keys.into_iter().map(|room_key| async move {
            match self.leave_with_retry(user, &room_key).await {
                Ok(_) => None,
                Err(e) => {
                    log::error!("Giving up on leave of {} from room {}: {}", user, room_key, e);
                    Some(room_key)
                }
            }
        });
        futures::future::join_all(leaves)
            .await
            .into_iter()
            .flatten()
            .collect()
    }
}
