use std::sync::Arc;

use crate::{
    config::MatchConfig,
    domain::{RoomKey, UserId, room::RoomService, seat::SeatService},
    ports::notification::{ListenerMessage, ListenerNotificationPort},
    workflow::gameplay::acting_seat,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartSetResult {
    Started { round: usize },
    WaitingOnOpponent,
    NotApplicable,
}

#[async_trait::async_trait]
pub trait StartSetUseCase {
    async fn start_set(&self, user: UserId, room_key: &RoomKey, seat: usize) -> StartSetResult;
}

pub struct StartSetUseCaseImpl<R: RoomService, S: SeatService, L: ListenerNotificationPort> {
    room_service: Arc<R>,
    seat_service: Arc<S>,
    notification_port: Arc<L>,
    set_count: usize,
}

impl<R: RoomService, S: SeatService, L: ListenerNotificationPort> StartSetUseCaseImpl<R, S, L> {
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
> StartSetUseCase for StartSetUseCaseImpl<R, S, L>
{
    async fn start_set(&self, user: UserId, room_key: &RoomKey, seat: usize) -> StartSetResult {
        let Some(room) = self.room_service.lock_room(room_key).await else {
            return StartSetResult::NotApplicable;
        };
        let Some(seat) = acting_seat(&room, user, seat) else {
            return StartSetResult::NotApplicable;
        };
        if room.match_ended || room.current_round >= self.set_count {
            log::debug!("Set start in finished room {} ignored", room.key);
            return StartSetResult::NotApplicable;
        }
        let opponent = seat.opponent();
        if room.member_at(opponent).is_none() {
            return StartSetResult::NotApplicable;
        }
        let Some(opponent_record) = self.seat_service.get_seat(room.seat_key(opponent)) else {
            return StartSetResult::NotApplicable;
        };
        if self
            .seat_service
            .set_playing(room.seat_key(seat), true)
            .is_none()
        {
            return StartSetResult::NotApplicable;
        }
        if !opponent_record.is_playing {
            return StartSetResult::WaitingOnOpponent;
        }

        for key in &room.seat_keys {
            self.seat_service.start_new_set(key);
        }
        log::info!("Set {} started in room {}", room.current_round, room.key);
        self.notification_port.notify_users(
            &room.members(),
            ListenerMessage::SetStarted {
                room_key: room.key.clone(),
                round: room.current_round,
            },
        );
        StartSetResult::Started {
            round: room.current_round,
        }
    }
}
