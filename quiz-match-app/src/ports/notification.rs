use crate::{
    domain::{RoomKey, Seat, UserId},
    workflow::gameplay::{MatchStart, SetResult, Settlement, SubmissionTally},
};

/// Push channel towards connected users. Room broadcasts are addressed to
/// the room's members.
pub trait ListenerNotificationPort {
    fn notify_user(&self, user: UserId, message: ListenerMessage) {
        self.notify_users(&[user], message);
    }
    fn notify_users(&self, users: &[UserId], message: ListenerMessage);
}

#[derive(Clone, Debug)]
pub enum ListenerMessage {
    MatchStarted {
        start: MatchStart,
    },
    SetStarted {
        room_key: RoomKey,
        round: usize,
    },
    Answered {
        tally: SubmissionTally,
    },
    SetEnded {
        result: SetResult,
    },
    MatchEnded {
        settlement: Settlement,
    },
    MemberLeft {
        room_key: RoomKey,
        seat: Seat,
    },
}
