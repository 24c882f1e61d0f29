use std::sync::Arc;

use crate::{
    domain::{
        account::{CredentialService, is_blank},
        user::UserRepository,
    },
    ports::authentication::Identity,
};

#[derive(Debug, thiserror::Error)]
pub enum ChangePasswordError {
    #[error("Old and new password are required")]
    MissingCredentials,
    #[error("Wrong password")]
    WrongPassword,
    #[error("Password change failed: {0}")]
    Internal(String),
}

#[async_trait::async_trait]
pub trait ChangePasswordUseCase {
    async fn change_password(
        &self,
        identity: &Identity,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), ChangePasswordError>;
}

pub struct ChangePasswordUseCaseImpl<U: UserRepository, C: CredentialService> {
    user_repository: Arc<U>,
    credential_service: Arc<C>,
}

impl<U: UserRepository, C: CredentialService> ChangePasswordUseCaseImpl<U, C> {
    pub fn new(user_repository: Arc<U>, credential_service: Arc<C>) -> Self {
        Self {
            user_repository,
            credential_service,
        }
    }
}

#[async_trait::async_trait]
impl<U: UserRepository + Send + Sync + 'static, C: CredentialService + Send + Sync + 'static>
    ChangePasswordUseCase for ChangePasswordUseCaseImpl<U, C>
{
    async fn change_password(
        &self,
        identity: &Identity,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), ChangePasswordError> {
        if is_blank(old_password) || is_blank(new_password) {
            return Err(ChangePasswordError::MissingCredentials);
        }
        let user = self
            .user_repository
            .get_user(identity.user_id)
            .await
            .map_err(|e| ChangePasswordError::Internal(e.to_string()))?;
        if !self.credential_service.verify(old_password, &user.password_hash) {
            return Err(ChangePasswordError::WrongPassword);
        }
        let password_hash = self
            .credential_service
            .hash(new_password)
            .map_err(|e| ChangePasswordError::Internal(e.to_string()))?;
        self.user_repository
            .update_password_hash(user.id, password_hash)
            .await
            .map_err(|e| ChangePasswordError::Internal(e.to_string()))?;
        log::info!("User {} changed their password", user.username);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::MatchFixture;

    use super::*;

    #[tokio::test]
    async fn password_change_requires_the_old_password() {
        let f = MatchFixture::new();
        let tokens = f
            .app
            .account_sign_up_use_case
            .sign_up("alice", "secret")
            .await
            .unwrap();
        let identity = f
            .app
            .account_authenticate_use_case
            .authenticate(&tokens.access_token)
            .await
            .unwrap();
        let use_case = &f.app.account_change_password_use_case;

        let res = use_case.change_password(&identity, "wrong", "better").await;
        assert!(matches!(res, Err(ChangePasswordError::WrongPassword)));
        let res = use_case.change_password(&identity, "secret", "").await;
        assert!(matches!(res, Err(ChangePasswordError::MissingCredentials)));

        use_case
            .change_password(&identity, "secret", "better")
            .await
            .unwrap();
        f.app.account_session_use_case.logout(&identity).await.unwrap();
        let sign_in = &f.app.account_sign_in_use_case;
        assert!(sign_in.sign_in("alice", "secret").await.is_err());
        assert!(sign_in.sign_in("alice", "better").await.is_ok());
    }
}
