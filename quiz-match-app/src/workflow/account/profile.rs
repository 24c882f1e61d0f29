use std::sync::Arc;

use crate::{
    domain::{RepoRetrieveError, user::UserRepository},
    ports::authentication::Identity,
};

#[derive(Clone, Debug, PartialEq)]
pub struct UserData {
    pub username: String,
    pub rating: f64,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum GetUserDataError {
    #[error("User not found")]
    NotFound,
    #[error("Failed to load user: {0}")]
    Internal(String),
}

#[async_trait::async_trait]
pub trait GetUserDataUseCase {
    async fn get_user_data(&self, identity: &Identity) -> Result<UserData, GetUserDataError>;
}

pub struct GetUserDataUseCaseImpl<U: UserRepository> {
    user_repository: Arc<U>,
}

impl<U: UserRepository> GetUserDataUseCaseImpl<U> {
    pub fn new(user_repository: Arc<U>) -> Self {
        Self { user_repository }
    }
}

#[async_trait::async_trait]
impl<U: UserRepository + Send + Sync + 'static> GetUserDataUseCase for GetUserDataUseCaseImpl<U> {
    async fn get_user_data(&self, identity: &Identity) -> Result<UserData, GetUserDataError> {
        let user = match self.user_repository.get_user(identity.user_id).await {
            Ok(user) => user,
            Err(RepoRetrieveError::NotFound) => return Err(GetUserDataError::NotFound),
            Err(e) => return Err(GetUserDataError::Internal(e.to_string())),
        };
        Ok(UserData {
            username: user.username,
            rating: user.stats.rating,
            wins: user.stats.wins,
            draws: user.stats.draws,
            losses: user.stats.losses,
        })
    }
}
