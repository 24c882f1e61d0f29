use std::sync::Arc;

use crate::{
    config::MatchConfig,
    domain::{Seat, r#match::pick_topics, room::Room, user::UserRepository},
    ports::notification::{ListenerMessage, ListenerNotificationPort},
    workflow::gameplay::{MatchStart, PlayerSummary},
};

#[derive(Debug, thiserror::Error)]
pub enum PairingError {
    #[error("Room does not hold two players")]
    NotPaired,
    #[error("Failed to load players: {0}")]
    Storage(String),
}

/// Announces the match once the room is full.
#[async_trait::async_trait]
pub trait PairingWorkflow {
    async fn start_match(&self, room: &Room) -> Result<MatchStart, PairingError>;
}

pub struct PairingWorkflowImpl<U: UserRepository, L: ListenerNotificationPort> {
    user_repository: Arc<U>,
    notification_port: Arc<L>,
    topic_pool_size: usize,
    topics_per_match: usize,
}

impl<U: UserRepository, L: ListenerNotificationPort> PairingWorkflowImpl<U, L> {
    pub fn new(user_repository: Arc<U>, notification_port: Arc<L>, config: &MatchConfig) -> Self {
        Self {
            user_repository,
            notification_port,
            topic_pool_size: config.topic_pool_size,
            topics_per_match: config.topics_per_match,
        }
    }

    async fn summary(&self, room: &Room, seat: Seat) -> Result<PlayerSummary, PairingError> {
        let user_id = room.member_at(seat).ok_or(PairingError::NotPaired)?;
        let user = self
            .user_repository
            .get_user(user_id)
            .await
            .map_err(|e| PairingError::Storage(e.to_string()))?;
        Ok(PlayerSummary {
            user_id,
            username: user.username,
            rating: user.stats.rating,
        })
    }
}

#[async_trait::async_trait]
impl<
    U: UserRepository + Send + Sync + 'static,
    L: ListenerNotificationPort + Send + Sync + 'static,
> PairingWorkflow for PairingWorkflowImpl<U, L>
{
    async fn start_match(&self, room: &Room) -> Result<MatchStart, PairingError> {
        let first = self.summary(room, Seat::First).await?;
        let second = self.summary(room, Seat::Second).await?;
        let start = MatchStart {
            room_key: room.key.clone(),
            topics: pick_topics(self.topic_pool_size, self.topics_per_match),
            players: [first, second],
        };

        log::info!(
            "Match in room {} starts: {} vs {}",
            room.key,
            start.players[0].username,
            start.players[1].username
        );
        self.notification_port.notify_users(
            &room.members(),
            ListenerMessage::MatchStarted {
                start: start.clone(),
            },
        );
        Ok(start)
    }
}
