use crate::domain::UserId;

/// Verified caller identity attached to a connection or request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub username: String,
}

#[derive(Clone, Debug)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Random id embedded in the refresh token. Only its hash is stored.
    pub refresh_token_id: String,
}

#[derive(Clone, Debug)]
pub struct RefreshClaims {
    pub identity: Identity,
    pub token_id: String,
}

#[derive(Debug, thiserror::Error)]
#[error("Failed to issue token: {0}")]
pub struct TokenIssueError(pub String);

pub trait AuthenticationPort {
    fn issue_tokens(&self, identity: &Identity) -> Result<TokenPair, TokenIssueError>;
    fn verify_access_token(&self, token: &str) -> Option<Identity>;
    fn verify_refresh_token(&self, token: &str) -> Option<RefreshClaims>;
}
