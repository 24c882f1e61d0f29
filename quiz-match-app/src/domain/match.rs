use crate::domain::{Seat, rating::MatchScore};

/// Where a room stands in its match lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchPhase {
    WaitingForPlayers,
    InProgress { round: usize },
    Settled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetOutcome {
    Won(Seat),
    Draw,
}

impl SetOutcome {
    /// Wire code: 0 and 1 name the winning seat, 2 is a draw.
    pub fn code(self) -> u8 {
        match self {
            SetOutcome::Won(seat) => seat.index() as u8,
            SetOutcome::Draw => 2,
        }
    }

    pub fn credit_for(self, seat: Seat) -> MatchScore {
        match self {
            SetOutcome::Won(winner) if winner == seat => MatchScore::Win,
            SetOutcome::Won(_) => MatchScore::Loss,
            SetOutcome::Draw => MatchScore::Draw,
        }
    }
}

pub fn decide_set(points: [i64; 2]) -> SetOutcome {
    if points[0] > points[1] {
        SetOutcome::Won(Seat::First)
    } else if points[1] > points[0] {
        SetOutcome::Won(Seat::Second)
    } else {
        SetOutcome::Draw
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchOutcome {
    Won(Seat),
    Draw,
}

impl MatchOutcome {
    pub fn code(self) -> u8 {
        match self {
            MatchOutcome::Won(seat) => seat.index() as u8,
            MatchOutcome::Draw => 2,
        }
    }

    pub fn score_for(self, seat: Seat) -> MatchScore {
        match self {
            MatchOutcome::Won(winner) if winner == seat => MatchScore::Win,
            MatchOutcome::Won(_) => MatchScore::Loss,
            MatchOutcome::Draw => MatchScore::Draw,
        }
    }
}

/// Natural end of a match. A seat above the draw threshold wins outright,
/// both seats exactly at it is a draw, anything else is still open.
pub fn decide_match(sets_won: [f64; 2], draw_threshold: f64) -> Option<MatchOutcome> {
    if sets_won[0] > draw_threshold {
        return Some(MatchOutcome::Won(Seat::First));
    }
    if sets_won[1] > draw_threshold {
        return Some(MatchOutcome::Won(Seat::Second));
    }
    if sets_won[0] == draw_threshold && sets_won[1] == draw_threshold {
        return Some(MatchOutcome::Draw);
    }
    None
}

/// Outcome when the opponent of `remaining` walks out.
pub fn decide_forfeit(remaining: Seat, remaining_sets_won: f64, draw_threshold: f64) -> MatchOutcome {
    if remaining_sets_won >= draw_threshold {
        MatchOutcome::Draw
    } else {
        MatchOutcome::Won(remaining)
    }
}

/// Set tally reported for a forfeit: a draw shows both seats at the
/// threshold, a walk-over shows a clean win for the remaining seat.
pub fn forfeit_tally(outcome: MatchOutcome, set_count: usize) -> [f64; 2] {
    let draw_threshold = set_count as f64 / 2.0;
    let clean_win = (set_count / 2 + 1) as f64;
    match outcome {
        MatchOutcome::Draw => [draw_threshold, draw_threshold],
        MatchOutcome::Won(Seat::First) => [clean_win, 0.0],
        MatchOutcome::Won(Seat::Second) => [0.0, clean_win],
    }
}

/// Pseudo-random pick of `count` distinct topic indices out of `pool_size`.
pub fn pick_topics(pool_size: usize, count: usize) -> Vec<usize> {
    let count = count.min(pool_size);
    rand::seq::index::sample(&mut rand::rng(), pool_size, count).into_vec()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    const THRESHOLD: f64 = 1.5;

    #[test]
    fn higher_points_win_the_set() {
        assert_eq!(decide_set([5, 3]), SetOutcome::Won(Seat::First));
        assert_eq!(decide_set([2, 7]), SetOutcome::Won(Seat::Second));
        assert_eq!(decide_set([4, 4]), SetOutcome::Draw);
        assert_eq!(decide_set([5, 3]).code(), 0);
        assert_eq!(decide_set([4, 4]).code(), 2);
    }

    #[test]
    fn set_credits() {
        let outcome = SetOutcome::Won(Seat::Second);
        assert_eq!(outcome.credit_for(Seat::First), MatchScore::Loss);
        assert_eq!(outcome.credit_for(Seat::Second), MatchScore::Win);
        assert_eq!(SetOutcome::Draw.credit_for(Seat::First), MatchScore::Draw);
    }

    #[test]
    fn match_is_open_until_decided() {
        assert_eq!(decide_match([0.0, 0.0], THRESHOLD), None);
        assert_eq!(decide_match([1.0, 1.0], THRESHOLD), None);
        assert_eq!(decide_match([1.5, 0.5], THRESHOLD), None);
        assert_eq!(
            decide_match([2.0, 0.0], THRESHOLD),
            Some(MatchOutcome::Won(Seat::First))
        );
        assert_eq!(
            decide_match([0.5, 2.5], THRESHOLD),
            Some(MatchOutcome::Won(Seat::Second))
        );
        assert_eq!(decide_match([1.5, 1.5], THRESHOLD), Some(MatchOutcome::Draw));
    }

    #[test]
    fn every_three_set_sequence_resolves() {
        let outcomes = [
            SetOutcome::Won(Seat::First),
            SetOutcome::Won(Seat::Second),
            SetOutcome::Draw,
        ];
        for a in outcomes {
            for b in outcomes {
                for c in outcomes {
                    let mut sets_won = [0.0; 2];
                    for outcome in [a, b, c] {
                        for seat in Seat::ALL {
                            sets_won[seat.index()] += outcome.credit_for(seat).value();
                        }
                    }
                    let decided = decide_match(sets_won, THRESHOLD);
                    assert!(decided.is_some(), "{:?} left {:?} open", [a, b, c], sets_won);
                    if decided == Some(MatchOutcome::Draw) {
                        assert_eq!(sets_won, [1.5, 1.5]);
                    }
                }
            }
        }
    }

    #[test]
    fn forfeit_below_threshold_is_a_walk_over() {
        let outcome = decide_forfeit(Seat::Second, 1.0, THRESHOLD);
        assert_eq!(outcome, MatchOutcome::Won(Seat::Second));
        assert_eq!(forfeit_tally(outcome, 3), [0.0, 2.0]);
        assert_eq!(outcome.score_for(Seat::First), MatchScore::Loss);
    }

    #[test]
    fn forfeit_at_threshold_is_a_draw() {
        let outcome = decide_forfeit(Seat::First, 1.5, THRESHOLD);
        assert_eq!(outcome, MatchOutcome::Draw);
        assert_eq!(forfeit_tally(outcome, 3), [1.5, 1.5]);
    }

    #[test]
    fn topics_are_distinct_and_in_range() {
        for _ in 0..50 {
            let topics = pick_topics(10, 3);
            assert_eq!(topics.len(), 3);
            assert!(topics.iter().all(|t| *t < 10));
            assert_eq!(topics.iter().collect::<HashSet<_>>().len(), 3);
        }
        assert_eq!(pick_topics(2, 3).len(), 2);
    }
}
