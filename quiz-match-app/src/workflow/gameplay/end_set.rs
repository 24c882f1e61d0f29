use std::sync::Arc;

use crate::{
    config::MatchConfig,
    domain::{
        RoomKey, Seat, UserId,
        r#match::decide_set,
        room::{Room, RoomService},
        seat::SeatService,
    },
    ports::notification::{ListenerMessage, ListenerNotificationPort},
    workflow::gameplay::{SetResult, acting_seat},
};

#[derive(Clone, Debug, PartialEq)]
pub enum EndSetResult {
    /// Both seats finished the current set and it was scored.
    Decided(SetResult),
    /// Report for a set that was already scored. Nothing changed.
    Replayed(SetResult),
    WaitingOnOpponent,
    NotApplicable,
}

#[async_trait::async_trait]
pub trait EndSetUseCase {
    async fn end_set(
        &self,
        user: UserId,
        room_key: &RoomKey,
        seat: usize,
        reported_set_index: usize,
    ) -> EndSetResult;
}

pub struct EndSetUseCaseImpl<R: RoomService, S: SeatService, L: ListenerNotificationPort> {
    room_service: Arc<R>,
    seat_service: Arc<S>,
    notification_port: Arc<L>,
    set_count: usize,
}

impl<R: RoomService, S: SeatService, L: ListenerNotificationPort> EndSetUseCaseImpl<R, S, L> {
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

    fn set_points(&self, room: &Room, set_index: usize) -> Option<[i64; 2]> {
        let first = self.seat_service.get_seat(room.seat_key(Seat::First))?;
        let second = self.seat_service.get_seat(room.seat_key(Seat::Second))?;
        Some([first.point(set_index), second.point(set_index)])
    }
}

#[async_trait::async_trait]
impl<
    R: RoomService + Send + Sync + 'static,
    S: SeatService + Send + Sync + 'static,
    L: ListenerNotificationPort + Send + Sync + 'static,
> EndSetUseCase for EndSetUseCaseImpl<R, S, L>
{
    async fn end_set(
        &self,
        user: UserId,
        room_key: &RoomKey,
        seat: usize,
        reported_set_index: usize,
    ) -> EndSetResult {
        let Some(mut room) = self.room_service.lock_room(room_key).await else {
            return EndSetResult::NotApplicable;
        };
        let Some(seat) = acting_seat(&room, user, seat) else {
            return EndSetResult::NotApplicable;
        };
        if room.current_round >= self.set_count {
            return EndSetResult::NotApplicable;
        }

        if reported_set_index < room.current_round {
            let Some(points) = self.set_points(&room, reported_set_index) else {
                return EndSetResult::NotApplicable;
            };
            log::debug!(
                "Stale end of set {} in room {} replayed",
                reported_set_index,
                room.key
            );
            let result = SetResult {
                room_key: room.key.clone(),
                set_index: reported_set_index,
                points,
                outcome: decide_set(points),
            };
            self.notification_port.notify_user(
                user,
                ListenerMessage::SetEnded {
                    result: result.clone(),
                },
            );
            return EndSetResult::Replayed(result);
        }

        if self
            .seat_service
            .set_playing(room.seat_key(seat), false)
            .is_none()
        {
            return EndSetResult::NotApplicable;
        }
        let Some(opponent) = self.seat_service.get_seat(room.seat_key(seat.opponent())) else {
            return EndSetResult::NotApplicable;
        };
        if opponent.is_playing {
            return EndSetResult::WaitingOnOpponent;
        }

        let set_index = room.current_round;
        let Some(points) = self.set_points(&room, set_index) else {
            return EndSetResult::NotApplicable;
        };
        let outcome = decide_set(points);
        for seat in Seat::ALL {
            self.seat_service
                .credit_set(room.seat_key(seat), outcome.credit_for(seat));
        }
        room.current_round += 1;

        log::info!(
            "Set {} in room {} ended {}:{} (outcome {})",
            set_index,
            room.key,
            points[0],
            points[1],
            outcome.code()
        );
        let result = SetResult {
            room_key: room.key.clone(),
            set_index,
            points,
            outcome,
        };
        self.notification_port.notify_users(
            &room.members(),
            ListenerMessage::SetEnded {
                result: result.clone(),
            },
        );
        EndSetResult::Decided(result)
    }
}
