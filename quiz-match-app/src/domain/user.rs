use crate::domain::{
    RepoCreateError, RepoRetrieveError, RepoUpdateError, UserId, rating::MatchScore,
};

#[derive(Clone, Debug)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
    pub refresh_token_hash: Option<String>,
    pub stats: UserStats,
}

impl User {
    pub fn new(username: String, password_hash: String, initial_rating: f64) -> Self {
        Self {
            id: UserId::new(),
            username,
            password_hash,
            refresh_token_hash: None,
            stats: UserStats::new(initial_rating),
        }
    }

    pub fn has_active_session(&self) -> bool {
        self.refresh_token_hash.is_some()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UserStats {
    pub rating: f64,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
}

impl UserStats {
    pub fn new(rating: f64) -> Self {
        Self {
            rating,
            wins: 0,
            draws: 0,
            losses: 0,
        }
    }

    /// Stats after one settled match.
    pub fn record(self, score: MatchScore, new_rating: f64) -> Self {
        let mut next = Self {
            rating: new_rating,
            ..self
        };
        match score {
            MatchScore::Win => next.wins += 1,
            MatchScore::Draw => next.draws += 1,
            MatchScore::Loss => next.losses += 1,
        }
        next
    }
}

#[async_trait::async_trait]
pub trait UserRepository {
    async fn create_user(&self, user: User) -> Result<(), RepoCreateError>;
    async fn get_user(&self, id: UserId) -> Result<User, RepoRetrieveError>;
    async fn get_user_by_username(&self, username: &str) -> Result<User, RepoRetrieveError>;
    async fn update_password_hash(
        &self,
        id: UserId,
        password_hash: String,
    ) -> Result<(), RepoUpdateError>;
    async fn update_refresh_token_hash(
        &self,
        id: UserId,
        refresh_token_hash: Option<String>,
    ) -> Result<(), RepoUpdateError>;
    /// Reads both users' stats, lets `calc_fn` derive the new ones and
    /// writes both. Either both rows change or neither does.
    async fn update_user_pair<R: Send + 'static>(
        &self,
        first: UserId,
        second: UserId,
        calc_fn: impl FnOnce(UserStats, UserStats) -> (UserStats, UserStats, R) + Send + 'static,
    ) -> Result<R, RepoUpdateError>;
}
