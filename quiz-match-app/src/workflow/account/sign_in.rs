use std::sync::Arc;

use crate::{
    domain::{
        RepoRetrieveError,
        account::{CredentialService, is_blank},
        user::UserRepository,
    },
    ports::authentication::AuthenticationPort,
    workflow::account::{SessionTokens, identity_of, open_session},
};

#[derive(Debug, thiserror::Error)]
pub enum SignInError {
    #[error("Username and password are required")]
    MissingCredentials,
    #[error("Unknown username")]
    UnknownUsername,
    #[error("Account already has an active session")]
    SessionInUse,
    #[error("Wrong password")]
    WrongPassword,
    #[error("Sign in failed: {0}")]
    Internal(String),
}

#[async_trait::async_trait]
pub trait SignInUseCase {
    async fn sign_in(&self, username: &str, password: &str) -> Result<SessionTokens, SignInError>;
}

pub struct SignInUseCaseImpl<U: UserRepository, A: AuthenticationPort, C: CredentialService> {
    user_repository: Arc<U>,
    authentication_port: Arc<A>,
    credential_service: Arc<C>,
}

impl<U: UserRepository, A: AuthenticationPort, C: CredentialService> SignInUseCaseImpl<U, A, C> {
    pub fn new(
        user_repository: Arc<U>,
        authentication_port: Arc<A>,
        credential_service: Arc<C>,
    ) -> Self {
        Self {
            user_repository,
            authentication_port,
            credential_service,
        }
    }
}

#[async_trait::async_trait]
impl<
    U: UserRepository + Send + Sync + 'static,
    A: AuthenticationPort + Send + Sync + 'static,
    C: CredentialService + Send + Sync + 'static,
> SignInUseCase for SignInUseCaseImpl<U, A, C>
{
    async fn sign_in(&self, username: &str, password: &str) -> Result<SessionTokens, SignInError> {
        if is_blank(username) || is_blank(password) {
            return Err(SignInError::MissingCredentials);
        }
        let user = match self.user_repository.get_user_by_username(username).await {
            Ok(user) => user,
            Err(RepoRetrieveError::NotFound) => return Err(SignInError::UnknownUsername),
            Err(e) => return Err(SignInError::Internal(e.to_string())),
        };
        if user.has_active_session() {
            log::debug!("Sign in for {} refused, session in use", user.username);
            return Err(SignInError::SessionInUse);
        }
        if !self.credential_service.verify(password, &user.password_hash) {
            return Err(SignInError::WrongPassword);
        }

        let tokens = open_session(
            self.user_repository.as_ref(),
            self.authentication_port.as_ref(),
            self.credential_service.as_ref(),
            &identity_of(&user),
        )
        .await
        .map_err(SignInError::Internal)?;
        log::info!("User {} signed in", user.username);
        Ok(tokens)
    }
}
