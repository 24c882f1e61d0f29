use std::sync::Arc;

use crate::{
    config::MatchConfig,
    domain::{
        RepoCreateError,
        account::{CredentialService, is_blank},
        user::{User, UserRepository},
    },
    workflow::account::{SessionTokens, sign_in::SignInUseCase},
};

#[derive(Debug, thiserror::Error)]
pub enum SignUpError {
    #[error("Username and password are required")]
    MissingCredentials,
    #[error("Username is already taken")]
    UsernameTaken,
    #[error("Sign up failed: {0}")]
    Internal(String),
}

#[async_trait::async_trait]
pub trait SignUpUseCase {
    /// Creates the account and signs it in.
    async fn sign_up(&self, username: &str, password: &str) -> Result<SessionTokens, SignUpError>;
}

pub struct SignUpUseCaseImpl<U: UserRepository, C: CredentialService, S: SignInUseCase> {
    user_repository: Arc<U>,
    credential_service: Arc<C>,
    sign_in_use_case: Arc<S>,
    initial_rating: f64,
}

impl<U: UserRepository, C: CredentialService, S: SignInUseCase> SignUpUseCaseImpl<U, C, S> {
    pub fn new(
        user_repository: Arc<U>,
        credential_service: Arc<C>,
        sign_in_use_case: Arc<S>,
        config: &MatchConfig,
    ) -> Self {
        Self {
            user_repository,
            credential_service,
            sign_in_use_case,
            initial_rating: config.initial_rating,
        }
    }
}

#[async_trait::async_trait]
impl<
    U: UserRepository + Send + Sync + 'static,
    C: CredentialService + Send + Sync + 'static,
    S: SignInUseCase + Send + Sync + 'static,
> SignUpUseCase for SignUpUseCaseImpl<U, C, S>
{
    async fn sign_up(&self, username: &str, password: &str) -> Result<SessionTokens, SignUpError> {
        if is_blank(username) || is_blank(password) {
            return Err(SignUpError::MissingCredentials);
        }
        let password_hash = self
            .credential_service
            .hash(password)
            .map_err(|e| SignUpError::Internal(e.to_string()))?;
        let user = User::new(username.to_string(), password_hash, self.initial_rating);

        match self.user_repository.create_user(user).await {
            Ok(()) => {}
            Err(RepoCreateError::Conflict) => return Err(SignUpError::UsernameTaken),
            Err(e) => {
                log::error!("Failed to create user {}: {}", username, e);
                return Err(SignUpError::Internal(e.to_string()));
            }
        }
        log::info!("User {} signed up", username);

        self.sign_in_use_case
            .sign_in(username, password)
            .await
            .map_err(|e| SignUpError::Internal(e.to_string()))
    }
}
