use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::{DashMap, mapref::entry::Entry};
use rand::{Rng, distr::Alphanumeric};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    config::MatchConfig,
    domain::{RoomKey, Seat, SeatKey, UserId, r#match::MatchPhase},
};

#[derive(Clone, Debug)]
pub struct Room {
    pub key: RoomKey,
    pub rated: bool,
    pub seat_keys: [SeatKey; 2],
    pub current_round: usize,
    pub match_ended: bool,
    pub created_at: DateTime<Utc>,
    members: [Option<UserId>; 2],
    paired: bool,
    closed: bool,
}

impl Room {
    fn new(key: RoomKey, owner: UserId, rated: bool) -> Self {
        Self {
            seat_keys: Seat::ALL.map(|seat| SeatKey::for_seat(&key, seat)),
            key,
            rated,
            current_round: 0,
            match_ended: false,
            created_at: Utc::now(),
            members: [Some(owner), None],
            paired: false,
            closed: false,
        }
    }

    pub fn member_at(&self, seat: Seat) -> Option<UserId> {
        self.members[seat.index()]
    }

    pub fn seat_of(&self, user: UserId) -> Option<Seat> {
        Seat::ALL
            .into_iter()
            .find(|seat| self.member_at(*seat) == Some(user))
    }

    /// Members in seat order.
    pub fn members(&self) -> Vec<UserId> {
        self.members.iter().flatten().copied().collect()
    }

    pub fn member_count(&self) -> usize {
        self.members.iter().flatten().count()
    }

    pub fn seat_key(&self, seat: Seat) -> &SeatKey {
        &self.seat_keys[seat.index()]
    }

    pub fn phase(&self) -> MatchPhase {
        if self.match_ended {
            MatchPhase::Settled
        } else if !self.paired {
            MatchPhase::WaitingForPlayers
        } else {
            MatchPhase::InProgress {
                round: self.current_round,
            }
        }
    }

    /// Flips `match_ended` to true. Returns false if it already was.
    pub fn end_match(&mut self) -> bool {
        if self.match_ended {
            return false;
        }
        self.match_ended = true;
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum JoinRoomError {
    #[error("Room not found")]
    RoomNotFound,
    #[error("Room is full")]
    RoomFull,
    #[error("Already a member of this room")]
    AlreadyMember,
    #[error("The match in this room is already over")]
    MatchOver,
}

/// Exclusive access to one room. Every read-modify-write on a room and its
/// seats happens while holding this guard.
pub type RoomGuard = OwnedMutexGuard<Room>;

pub trait RoomKeyGenerator {
    fn generate(&self, length: usize) -> RoomKey;
}

pub struct RandomRoomKeyGenerator;

impl RoomKeyGenerator for RandomRoomKeyGenerator {
    fn generate(&self, length: usize) -> RoomKey {
        let key: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(length)
            .map(char::from)
            .collect();
        RoomKey::new(key)
    }
}

#[async_trait::async_trait]
pub trait RoomService {
    /// Allocates a fresh key and registers the room. `prepare` runs once the
    /// key is reserved and before the room becomes visible.
    fn create_room<F: FnOnce(&Room) + Send>(&self, owner: UserId, rated: bool, prepare: F)
    -> Room;
    async fn lock_room(&self, key: &RoomKey) -> Option<RoomGuard>;
    async fn join_room(&self, key: &RoomKey, user: UserId) -> Result<(RoomGuard, Seat), JoinRoomError>;
    fn remove_member(&self, room: &mut Room, user: UserId) -> Option<Seat>;
    /// Unregisters the room. Anyone still waiting on its lock sees it as gone.
    fn close_room(&self, room: &mut Room);
    async fn list_rooms(&self) -> Vec<Room>;
}

pub struct RoomServiceImpl<K: RoomKeyGenerator> {
    key_generator: K,
    key_length: usize,
    rooms: Arc<DashMap<RoomKey, Arc<Mutex<Room>>>>,
}

impl<K: RoomKeyGenerator> RoomServiceImpl<K> {
    pub fn new(key_generator: K, config: &MatchConfig) -> Self {
        Self {
            key_generator,
            key_length: config.room_key_length,
            rooms: Arc::new(DashMap::new()),
        }
    }

    fn room_handle(&self, key: &RoomKey) -> Option<Arc<Mutex<Room>>> {
        self.rooms.get(key).map(|entry| entry.value().clone())
    }
}

#[async_trait::async_trait]
impl<K: RoomKeyGenerator + Send + Sync> RoomService for RoomServiceImpl<K> {
    fn create_room<F: FnOnce(&Room) + Send>(
        &self,
        owner: UserId,
        rated: bool,
        prepare: F,
    ) -> Room {
        loop {
            let key = self.key_generator.generate(self.key_length);
            match self.rooms.entry(key) {
                Entry::Occupied(entry) => {
                    log::debug!("Room key {} already taken, generating another", entry.key());
                }
                Entry::Vacant(entry) => {
                    let room = Room::new(entry.key().clone(), owner, rated);
                    prepare(&room);
                    entry.insert(Arc::new(Mutex::new(room.clone())));
                    return room;
                }
            }
        }
    }

    async fn lock_room(&self, key: &RoomKey) -> Option<RoomGuard> {
        let handle = self.room_handle(key)?;
        let guard = handle.lock_owned().await;
        if guard.closed {
            return None;
        }
        Some(guard)
    }

    async fn join_room(
        &self,
        key: &RoomKey,
        user: UserId,
    ) -> Result<(RoomGuard, Seat), JoinRoomError> {
        let mut room = self
            .lock_room(key)
            .await
            .ok_or(JoinRoomError::RoomNotFound)?;
        if room.seat_of(user).is_some() {
            return Err(JoinRoomError::AlreadyMember);
        }
        let Some(seat) = Seat::ALL
            .into_iter()
            .find(|seat| room.member_at(*seat).is_none())
        else {
            return Err(JoinRoomError::RoomFull);
        };
        if room.match_ended {
            return Err(JoinRoomError::MatchOver);
        }
        room.members[seat.index()] = Some(user);
        if room.member_count() == 2 {
            room.paired = true;
        }
        Ok((room, seat))
    }

    fn remove_member(&self, room: &mut Room, user: UserId) -> Option<Seat> {
        let seat = room.seat_of(user)?;
        room.members[seat.index()] = None;
        if !room.match_ended && room.member_count() < 2 {
            room.paired = false;
        }
        Some(seat)
    }

    fn close_room(&self, room: &mut Room) {
        room.closed = true;
        self.rooms.remove(&room.key);
    }

    async fn list_rooms(&self) -> Vec<Room> {
        let handles: Vec<Arc<Mutex<Room>>> = self
            .rooms
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        let mut rooms = Vec::with_capacity(handles.len());
        for handle in handles {
            let room = handle.lock().await;
            if !room.closed {
                rooms.push(room.clone());
            }
        }
        rooms.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        rooms
    }
}
