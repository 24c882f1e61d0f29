use std::sync::Arc;

use crate::{
    domain::{account::CredentialService, user::UserRepository},
    ports::authentication::{AuthenticationPort, Identity},
    workflow::account::{SessionTokens, identity_of, open_session},
};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Access denied")]
    AccessDenied,
    #[error("Session update failed: {0}")]
    Internal(String),
}

#[async_trait::async_trait]
pub trait SessionUseCase {
    async fn logout(&self, identity: &Identity) -> Result<(), SessionError>;
    /// Trades a valid refresh token for a new pair. The presented token is
    /// no longer accepted afterwards.
    async fn refresh_tokens(&self, refresh_token: &str) -> Result<SessionTokens, SessionError>;
}

pub struct SessionUseCaseImpl<U: UserRepository, A: AuthenticationPort, C: CredentialService> {
    user_repository: Arc<U>,
    authentication_port: Arc<A>,
    credential_service: Arc<C>,
}

impl<U: UserRepository, A: AuthenticationPort, C: CredentialService> SessionUseCaseImpl<U, A, C> {
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
> SessionUseCase for SessionUseCaseImpl<U, A, C>
{
    async fn logout(&self, identity: &Identity) -> Result<(), SessionError> {
        self.user_repository
            .update_refresh_token_hash(identity.user_id, None)
            .await
            .map_err(|e| SessionError::Internal(e.to_string()))?;
        log::info!("User {} logged out", identity.username);
        Ok(())
    }

    async fn refresh_tokens(&self, refresh_token: &str) -> Result<SessionTokens, SessionError> {
        let claims = self
            .authentication_port
            .verify_refresh_token(refresh_token)
            .ok_or(SessionError::AccessDenied)?;
        let user = self
            .user_repository
            .get_user(claims.identity.user_id)
            .await
            .map_err(|_| SessionError::AccessDenied)?;
        if user.username != claims.identity.username {
            return Err(SessionError::AccessDenied);
        }
        let Some(stored_hash) = &user.refresh_token_hash else {
            return Err(SessionError::AccessDenied);
        };
        if !self.credential_service.verify(&claims.token_id, stored_hash) {
            log::debug!("Stale refresh token presented for {}", user.username);
            return Err(SessionError::AccessDenied);
        }

        open_session(
            self.user_repository.as_ref(),
            self.authentication_port.as_ref(),
            self.credential_service.as_ref(),
            &identity_of(&user),
        )
        .await
        .map_err(SessionError::Internal)
    }
}
