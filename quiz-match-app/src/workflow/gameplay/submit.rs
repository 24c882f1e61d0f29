use std::sync::Arc;

use crate::{
    config::MatchConfig,
    domain::{RoomKey, UserId, room::RoomService, seat::SeatService},
    ports::notification::{ListenerMessage, ListenerNotificationPort},
    workflow::gameplay::{SubmissionTally, acting_seat},
};

#[async_trait::async_trait]
pub trait SubmitAnswerUseCase {
    /// `None` when the submission does not apply to any open seat.
    async fn submit(
        &self,
        user: UserId,
        room_key: &RoomKey,
        seat: usize,
        set_index: usize,
        delta: i64,
    ) -> Option<SubmissionTally>;
}

pub struct SubmitAnswerUseCaseImpl<R: RoomService, S: SeatService, L: ListenerNotificationPort> {
    room_service: Arc<R>,
    seat_service: Arc<S>,
    notification_port: Arc<L>,
    set_count: usize,
}

impl<R: RoomService, S: SeatService, L: ListenerNotificationPort> SubmitAnswerUseCaseImpl<R, S, L> {
    pub fn new(
        room_service: Arc<R>,
        seat_service: Arc<S>,
        notification_port: Arc<L>,
        config: &MatchConfig,
    ) -> Self {
        Self {
            room_service,
            seat_service,
            notification_port,
            set_count: config.set_count,
        }
    }
}

#[async_trait::async_trait]
impl<
    R: RoomService + Send + Sync + 'static,
    S: SeatService + Send + Sync + 'static,
    L: ListenerNotificationPort + Send + Sync + 'static,
> SubmitAnswerUseCase for SubmitAnswerUseCaseImpl<R, S, L>
{
    async fn submit(
        &self,
        user: UserId,
        room_key: &RoomKey,
        seat: usize,
        set_index: usize,
        delta: i64,
    ) -> Option<SubmissionTally> {
        if set_index >= self.set_count {
            log::debug!("Submission for set {} in room {} dropped", set_index, room_key);
            return None;
        }
        let room = self.room_service.lock_room(room_key).await?;
        let seat = acting_seat(&room, user, seat)?;
        let record = self
            .seat_service
            .apply_submission(room.seat_key(seat), set_index, delta)?;

        let tally = SubmissionTally {
            room_key: room.key.clone(),
            seat,
            set_index,
            point: record.point(set_index),
            mistakes: record.mistakes,
        };
        self.notification_port.notify_users(
            &room.members(),
            ListenerMessage::Answered {
                tally: tally.clone(),
            },
        );
        Some(tally)
    }
}
