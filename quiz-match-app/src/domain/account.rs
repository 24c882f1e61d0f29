use crate::config::MatchConfig;

#[derive(Debug, thiserror::Error)]
#[error("Failed to hash secret: {0}")]
pub struct HashError(String);

/// One-way hashing for passwords and refresh-token ids.
pub trait CredentialService {
    fn hash(&self, secret: &str) -> Result<String, HashError>;
    fn verify(&self, secret: &str, hash: &str) -> bool;
}

pub struct BcryptCredentialService {
    cost: u32,
}

impl BcryptCredentialService {
    pub fn new(config: &MatchConfig) -> Self {
        Self {
            cost: config.password_hash_cost,
        }
    }
}

impl CredentialService for BcryptCredentialService {
    fn hash(&self, secret: &str) -> Result<String, HashError> {
        bcrypt::hash(secret, self.cost).map_err(|e| HashError(e.to_string()))
    }

    fn verify(&self, secret: &str, hash: &str) -> bool {
        match bcrypt::verify(secret, hash) {
            Ok(valid) => valid,
            Err(e) => {
                log::warn!("Stored hash could not be checked: {}", e);
                false
            }
        }
    }
}

pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
