use std::sync::Arc;

use crate::{
    domain::{RoomKey, room::RoomService, user::UserRepository},
    workflow::room::{RoomView, load_room_view},
};

#[derive(Debug, thiserror::Error)]
pub enum RoomQueryError {
    #[error("Room not found")]
    RoomNotFound,
    #[error("Failed to load room members: {0}")]
    Storage(String),
}

#[async_trait::async_trait]
pub trait RoomQueryUseCase {
    /// Open rooms, oldest first.
    async fn list_rooms(&self) -> Result<Vec<RoomView>, RoomQueryError>;
    async fn room_info(&self, room_key: &RoomKey) -> Result<RoomView, RoomQueryError>;
}

pub struct RoomQueryUseCaseImpl<R: RoomService, U: UserRepository> {
    room_service: Arc<R>,
    user_repository: Arc<U>,
}

impl<R: RoomService, U: UserRepository> RoomQueryUseCaseImpl<R, U> {
    pub fn new(room_service: Arc<R>, user_repository: Arc<U>) -> Self {
        Self {
            room_service,
            user_repository,
        }
    }
}

#[async_trait::async_trait]
impl<R: RoomService + Send + Sync + 'static, U: UserRepository + Send + Sync + 'static>
    RoomQueryUseCase for RoomQueryUseCaseImpl<R, U>
{
    async fn list_rooms(&self) -> Result<Vec<RoomView>, RoomQueryError> {
        let rooms = self.room_service.list_rooms().await;
        let mut views = Vec::with_capacity(rooms.len());
        for room in rooms {
            let view = load_room_view(self.user_repository.as_ref(), &room)
                .await
                .map_err(|e| RoomQueryError::Storage(e.to_string()))?;
            views.push(view);
        }
        Ok(views)
    }

    async fn room_info(&self, room_key: &RoomKey) -> Result<RoomView, RoomQueryError> {
        let room = self
            .room_service
            .lock_room(room_key)
            .await
            .ok_or(RoomQueryError::RoomNotFound)?
            .clone();
        load_room_view(self.user_repository.as_ref(), &room)
            .await
            .map_err(|e| RoomQueryError::Storage(e.to_string()))
    }
}
