use std::sync::Arc;

use dashmap::DashMap;

use crate::{
    config::MatchConfig,
    domain::{SeatKey, rating::MatchScore},
};

#[derive(Clone, Debug, PartialEq)]
pub struct SeatRecord {
    pub key: SeatKey,
    pub points: Vec<i64>,
    pub mistakes: u32,
    pub is_playing: bool,
    pub sets_won: f64,
}

impl SeatRecord {
    pub fn point(&self, set_index: usize) -> i64 {
        self.points.get(set_index).copied().unwrap_or(0)
    }
}

/// Per-seat scoring state. Callers serialize access per room, the store
/// itself only guarantees that each single operation is atomic.
pub trait SeatService {
    fn create_seat(&self, key: SeatKey) -> SeatRecord;
    fn delete_seat(&self, key: &SeatKey) -> bool;
    fn get_seat(&self, key: &SeatKey) -> Option<SeatRecord>;
    fn set_playing(&self, key: &SeatKey, playing: bool) -> Option<SeatRecord>;
    fn start_new_set(&self, key: &SeatKey) -> Option<SeatRecord>;
    /// A zero delta counts as a miss and bumps the mistake counter.
    fn apply_submission(&self, key: &SeatKey, set_index: usize, delta: i64)
    -> Option<SeatRecord>;
    fn credit_set(&self, key: &SeatKey, credit: MatchScore) -> Option<SeatRecord>;
    fn get_sets_won(&self, key: &SeatKey) -> Option<f64>;
}

pub struct SeatServiceImpl {
    set_count: usize,
    seats: Arc<DashMap<SeatKey, SeatRecord>>,
}

impl SeatServiceImpl {
    pub fn new(config: &MatchConfig) -> Self {
        Self {
            set_count: config.set_count,
            seats: Arc::new(DashMap::new()),
        }
    }

    fn modify<F: FnOnce(&mut SeatRecord) -> Option<()>>(
        &self,
        key: &SeatKey,
        f: F,
    ) -> Option<SeatRecord> {
        let mut seat = self.seats.get_mut(key)?;
        f(seat.value_mut())?;
        Some(seat.clone())
    }
}

impl SeatService for SeatServiceImpl {
    fn create_seat(&self, key: SeatKey) -> SeatRecord {
        let seat = SeatRecord {
            key: key.clone(),
            points: vec![0; self.set_count],
            mistakes: 0,
            is_playing: false,
            sets_won: 0.0,
        };
        self.seats.insert(key, seat.clone());
        seat
    }

    fn delete_seat(&self, key: &SeatKey) -> bool {
        self.seats.remove(key).is_some()
    }

    fn get_seat(&self, key: &SeatKey) -> Option<SeatRecord> {
        self.seats.get(key).map(|seat| seat.clone())
    }

    fn set_playing(&self, key: &SeatKey, playing: bool) -> Option<SeatRecord> {
        self.modify(key, |seat| {
            seat.is_playing = playing;
            Some(())
        })
    }

    fn start_new_set(&self, key: &SeatKey) -> Option<SeatRecord> {
        self.modify(key, |seat| {
            seat.mistakes = 0;
            Some(())
        })
    }

    fn apply_submission(
        &self,
        key: &SeatKey,
        set_index: usize,
        delta: i64,
    ) -> Option<SeatRecord> {
        self.modify(key, |seat| {
            let point = seat.points.get_mut(set_index)?;
            if delta != 0 {
                *point = point.checked_add(delta)?;
            } else {
                seat.mistakes += 1;
            }
            Some(())
        })
    }

    fn credit_set(&self, key: &SeatKey, credit: MatchScore) -> Option<SeatRecord> {
        self.modify(key, |seat| {
            seat.sets_won += credit.value();
            Some(())
        })
    }

    fn get_sets_won(&self, key: &SeatKey) -> Option<f64> {
        self.seats.get(key).map(|seat| seat.sets_won)
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::{RoomKey, Seat};

    use super::*;

    fn store_with_seat() -> (SeatServiceImpl, SeatKey) {
        let store = SeatServiceImpl::new(&MatchConfig::default());
        let key = SeatKey::for_seat(&RoomKey::new("AbCd1234"), Seat::First);
        store.create_seat(key.clone());
        (store, key)
    }

    #[test]
    fn new_seat_is_idle_and_empty() {
        let (store, key) = store_with_seat();
        let seat = store.get_seat(&key).unwrap();
        assert_eq!(key.to_string(), "AbCd1234_1");
        assert_eq!(seat.points, vec![0, 0, 0]);
        assert_eq!(seat.mistakes, 0);
        assert!(!seat.is_playing);
        assert_eq!(seat.sets_won, 0.0);
    }

    #[test]
    fn submission_adds_points_to_its_set_only() {
        let (store, key) = store_with_seat();
        store.apply_submission(&key, 1, 3).unwrap();
        let seat = store.apply_submission(&key, 1, 2).unwrap();
        assert_eq!(seat.points, vec![0, 5, 0]);
        assert_eq!(seat.mistakes, 0);
    }

    #[test]
    fn zero_submission_is_a_mistake() {
        let (store, key) = store_with_seat();
        store.apply_submission(&key, 0, 0).unwrap();
        let seat = store.apply_submission(&key, 0, 0).unwrap();
        assert_eq!(seat.points, vec![0, 0, 0]);
        assert_eq!(seat.mistakes, 2);

        let seat = store.start_new_set(&key).unwrap();
        assert_eq!(seat.mistakes, 0);
        let seat = store.start_new_set(&key).unwrap();
        assert_eq!(seat.mistakes, 0);
    }

    #[test]
    fn out_of_range_set_is_ignored() {
        let (store, key) = store_with_seat();
        assert!(store.apply_submission(&key, 3, 4).is_none());
        assert_eq!(store.get_seat(&key).unwrap().points, vec![0, 0, 0]);
    }

    #[test]
    fn submission_overflow_is_rejected() {
        let (store, key) = store_with_seat();
        store.apply_submission(&key, 0, i64::MAX).unwrap();
        assert!(store.apply_submission(&key, 0, 1).is_none());
        assert!(store.apply_submission(&key, 0, i64::MIN).is_some());
        assert!(store.apply_submission(&key, 0, i64::MIN).is_none());

        let seat = store.get_seat(&key).unwrap();
        assert_eq!(seat.points, vec![-1, 0, 0]);
        assert_eq!(seat.mistakes, 0);
    }

    #[test]
    fn credits_accumulate() {
        let (store, key) = store_with_seat();
        store.credit_set(&key, MatchScore::Win).unwrap();
        store.credit_set(&key, MatchScore::Draw).unwrap();
        store.credit_set(&key, MatchScore::Loss).unwrap();
        assert_eq!(store.get_sets_won(&key), Some(1.5));
    }

    #[test]
    fn missing_seat_is_reported_as_none() {
        let (store, key) = store_with_seat();
        assert!(store.delete_seat(&key));
        assert!(!store.delete_seat(&key));
        assert!(store.get_sets_won(&key).is_none());
        assert!(store.set_playing(&key, true).is_none());
        assert!(store.apply_submission(&key, 0, 1).is_none());
    }
}
