use std::sync::Arc;

use crate::{
    domain::{
        RoomKey, UserId,
        room::{JoinRoomError, RoomService},
        user::UserRepository,
    },
    workflow::{
        gameplay::pairing::PairingWorkflow,
        room::{RoomView, load_room_view},
    },
};

#[derive(Debug, thiserror::Error)]
pub enum JoinRoomUseCaseError {
    #[error(transparent)]
    Rejected(#[from] JoinRoomError),
    #[error("Failed to load room members: {0}")]
    Storage(String),
}

#[async_trait::async_trait]
pub trait JoinRoomUseCase {
    async fn join_room(&self, user: UserId, room_key: &RoomKey) -> Result<RoomView, JoinRoomUseCaseError>;
}

pub struct JoinRoomUseCaseImpl<R: RoomService, U: UserRepository, P: PairingWorkflow> {
    room_service: Arc<R>,
    user_repository: Arc<U>,
    pairing_workflow: Arc<P>,
}

impl<R: RoomService, U: UserRepository, P: PairingWorkflow> JoinRoomUseCaseImpl<R, U, P> {
    pub fn new(room_service: Arc<R>, user_repository: Arc<U>, pairing_workflow: Arc<P>) -> Self {
        Self {
            room_service,
            user_repository,
            pairing_workflow,
        }
    }
}

#[async_trait::async_trait]
impl<
    R: RoomService + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    P: PairingWorkflow + Send + Sync + 'static,
> JoinRoomUseCase for JoinRoomUseCaseImpl<R, U, P>
{
    async fn join_room(&self, user: UserId, room_key: &RoomKey) -> Result<RoomView, JoinRoomUseCaseError> {
        let (mut room, seat) = self.room_service.join_room(room_key, user).await?;

        let view = match load_room_view(self.user_repository.as_ref(), &room).await {
            Ok(view) => view,
            Err(e) => {
                log::error!("Failed to load members of room {}: {}", room.key, e);
                self.room_service.remove_member(&mut room, user);
                return Err(JoinRoomUseCaseError::Storage(e.to_string()));
            }
        };

        if room.member_count() == 2 {
            if let Err(e) = self.pairing_workflow.start_match(&room).await {
                log::error!("Failed to start match in room {}: {}", room.key, e);
                self.room_service.remove_member(&mut room, user);
                return Err(JoinRoomUseCaseError::Storage(e.to_string()));
            }
        }

        log::info!("User {} joined room {} on seat {}", user, room.key, seat);
        Ok(view)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        domain::Seat,
        ports::notification::ListenerMessage,
        testing::MatchFixture,
    };

    use super::*;

    #[tokio::test]
    async fn second_join_starts_the_match() {
        let f = MatchFixture::new();
        let alice = f.users.add_user("alice", 1000.0);
        let bob = f.users.add_user("bob", 1200.0);
        let key = f.app.room_create_use_case.create_room(alice, true);

        let view = f.app.room_join_use_case.join_room(bob, &key).await.unwrap();

        assert_eq!(view.members.len(), 2);
        assert_eq!(view.members[0].username, "alice");
        assert_eq!(view.members[1].seat, Seat::Second);
        assert_eq!(view.members[1].rating, 1200.0);

        let messages = f.notifier.get_messages();
        assert_eq!(messages.len(), 2);
        for (_, message) in &messages {
            assert!(matches!(
                message,
                ListenerMessage::MatchStarted { start }
                    if start.topics.len() == 3 && start.players[1].username == "bob"
            ));
        }
    }

    #[tokio::test]
    async fn third_join_leaves_membership_unchanged() {
        let f = MatchFixture::new();
        let (key, alice, bob) = f.paired_room(true).await;
        let carol = f.users.add_user("carol", 1000.0);

        let res = f.app.room_join_use_case.join_room(carol, &key).await;
        assert!(matches!(
            res,
            Err(JoinRoomUseCaseError::Rejected(JoinRoomError::RoomFull))
        ));

        let info = f.app.room_query_use_case.room_info(&key).await.unwrap();
        let members: Vec<UserId> = info.members.iter().map(|m| m.user_id).collect();
        assert_eq!(members, vec![alice, bob]);
    }

    #[tokio::test]
    async fn unknown_player_is_not_seated() {
        let f = MatchFixture::new();
        let alice = f.users.add_user("alice", 1000.0);
        let key = f.app.room_create_use_case.create_room(alice, false);

        let ghost = UserId::new();
        let res = f.app.room_join_use_case.join_room(ghost, &key).await;
        assert!(matches!(res, Err(JoinRoomUseCaseError::Storage(_))));

        let info = f.app.room_query_use_case.room_info(&key).await.unwrap();
        assert_eq!(info.members.len(), 1);
        assert!(f.notifier.get_messages().is_empty());
    }
}
