use crate::{
    domain::{account::CredentialService, user::{User, UserRepository}},
    ports::authentication::{AuthenticationPort, Identity},
};

pub mod authenticate;
pub mod change_password;
pub mod profile;
pub mod session;
pub mod sign_in;
pub mod sign_up;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// Issues a fresh token pair for `identity` and makes its refresh token the
/// only one accepted for the account.
pub(crate) async fn open_session<U: UserRepository, A: AuthenticationPort, C: CredentialService>(
    user_repository: &U,
    authentication_port: &A,
    credential_service: &C,
    identity: &Identity,
) -> Result<SessionTokens, String> {
    let tokens = authentication_port
        .issue_tokens(identity)
        .map_err(|e| e.to_string())?;
    let token_hash = credential_service
        .hash(&tokens.refresh_token_id)
        .map_err(|e| e.to_string())?;
    user_repository
        .update_refresh_token_hash(identity.user_id, Some(token_hash))
        .await
        .map_err(|e| e.to_string())?;
    Ok(SessionTokens {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
    })
}

pub(crate) fn identity_of(user: &User) -> Identity {
    Identity {
        user_id: user.id,
        username: user.username.clone(),
    }
}
