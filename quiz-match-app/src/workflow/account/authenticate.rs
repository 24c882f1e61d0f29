use std::sync::Arc;

use crate::{
    domain::user::UserRepository,
    ports::authentication::{AuthenticationPort, Identity},
};

#[async_trait::async_trait]
pub trait AuthenticateUseCase {
    /// Identity behind an access token, if the token is valid and still
    /// names an existing user.
    async fn authenticate(&self, access_token: &str) -> Option<Identity>;
}

pub struct AuthenticateUseCaseImpl<U: UserRepository, A: AuthenticationPort> {
    user_repository: Arc<U>,
    authentication_port: Arc<A>,
}

impl<U: UserRepository, A: AuthenticationPort> AuthenticateUseCaseImpl<U, A> {
    pub fn new(user_repository: Arc<U>, authentication_port: Arc<A>) -> Self {
        Self {
            user_repository,
            authentication_port,
        }
    }
}

#[async_trait::async_trait]
impl<U: UserRepository + Send + Sync + 'static, A: AuthenticationPort + Send + Sync + 'static>
    AuthenticateUseCase for AuthenticateUseCaseImpl<U, A>
{
    async fn authenticate(&self, access_token: &str) -> Option<Identity> {
        let identity = self.authentication_port.verify_access_token(access_token)?;
        match self.user_repository.get_user(identity.user_id).await {
            Ok(user) if user.username == identity.username => Some(identity),
            Ok(_) => {
                log::debug!("Token username does not match user {}", identity.user_id);
                None
            }
            Err(e) => {
                log::debug!("Token for unknown user {}: {}", identity.user_id, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::MatchFixture;

    #[tokio::test]
    async fn token_must_name_an_existing_user() {
        let f = MatchFixture::new();
        let alice = f.users.add_user("alice", 1000.0);
        let use_case = &f.app.account_authenticate_use_case;

        let identity = use_case
            .authenticate(&format!("access:{}:alice", alice))
            .await
            .unwrap();
        assert_eq!(identity.user_id, alice);

        assert!(use_case.authenticate(&format!("access:{}:mallory", alice)).await.is_none());
        assert!(use_case.authenticate("access:not-a-uuid:alice").await.is_none());
        assert!(use_case.authenticate("garbage").await.is_none());
    }
}
