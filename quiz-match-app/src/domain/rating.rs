use crate::config::MatchConfig;

/// Score of one side of a match: 1 for a win, 0.5 for a draw, 0 for a loss.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MatchScore {
    Win,
    Draw,
    Loss,
}

impl MatchScore {
    pub fn value(self) -> f64 {
        match self {
            MatchScore::Win => 1.0,
            MatchScore::Draw => 0.5,
            MatchScore::Loss => 0.0,
        }
    }

    pub fn inverse(self) -> Self {
        match self {
            MatchScore::Win => MatchScore::Loss,
            MatchScore::Draw => MatchScore::Draw,
            MatchScore::Loss => MatchScore::Win,
        }
    }
}

/// Elo update for one player, rounded to two decimals. Unrated matches
/// leave the rating untouched.
pub fn next_rating(
    self_rating: f64,
    opponent_rating: f64,
    score: MatchScore,
    rated: bool,
    k_factor: f64,
) -> f64 {
    if !rated {
        return self_rating;
    }
    let expected = 1.0 / (1.0 + 10f64.powf((opponent_rating - self_rating) / 400.0));
    let rating = self_rating + k_factor * (score.value() - expected);
    (rating * 100.0).round() / 100.0
}

pub trait RatingService {
    fn next_rating(&self, self_rating: f64, opponent_rating: f64, score: MatchScore, rated: bool)
    -> f64;

    /// New ratings of both sides given the first side's score. Both are
    /// computed from the old ratings.
    fn rate_pair(
        &self,
        first_rating: f64,
        second_rating: f64,
        first_score: MatchScore,
        rated: bool,
    ) -> (f64, f64) {
        (
            self.next_rating(first_rating, second_rating, first_score, rated),
            self.next_rating(second_rating, first_rating, first_score.inverse(), rated),
        )
    }
}

pub struct RatingServiceImpl {
    k_factor: f64,
}

impl RatingServiceImpl {
    pub fn new(config: &MatchConfig) -> Self {
        Self {
            k_factor: config.k_factor,
        }
    }
}

impl RatingService for RatingServiceImpl {
    fn next_rating(
        &self,
        self_rating: f64,
        opponent_rating: f64,
        score: MatchScore,
        rated: bool,
    ) -> f64 {
        next_rating(self_rating, opponent_rating, score, rated, self.k_factor)
    }
}
