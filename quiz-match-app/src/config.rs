use std::str::FromStr;

/// Tunables of the match rules. Every service that needs one of these
/// receives the config at construction.
#[derive(Clone, Debug)]
pub struct MatchConfig {
    pub k_factor: f64,
    pub set_count: usize,
    pub topic_pool_size: usize,
    pub topics_per_match: usize,
    pub room_key_length: usize,
    pub initial_rating: f64,
    pub password_hash_cost: u32,
    /// Attempts at leaving a room for a socket that is gone.
    pub leave_retry_attempts: u32,
    /// Delay before the first retry. Doubles with every further attempt.
    pub leave_retry_delay_ms: u64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            k_factor: 16.0,
            set_count: 3,
            topic_pool_size: 10,
            topics_per_match: 3,
            room_key_length: 8,
            initial_rating: 1000.0,
            password_hash_cost: bcrypt::DEFAULT_COST,
            leave_retry_attempts: 5,
            leave_retry_delay_ms: 200,
        }
    }
}

impl MatchConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let config = Self {
            k_factor: read_env("QUIZ_K_FACTOR", defaults.k_factor),
            set_count: read_env("QUIZ_SET_COUNT", defaults.set_count).max(1),
            topic_pool_size: read_env("QUIZ_TOPIC_POOL_SIZE", defaults.topic_pool_size),
            topics_per_match: read_env("QUIZ_TOPICS_PER_MATCH", defaults.topics_per_match),
            room_key_length: read_env("QUIZ_ROOM_KEY_LENGTH", defaults.room_key_length).max(1),
            initial_rating: read_env("QUIZ_INITIAL_RATING", defaults.initial_rating),
            password_hash_cost: read_env("QUIZ_PASSWORD_HASH_COST", defaults.password_hash_cost),
            leave_retry_attempts: read_env("QUIZ_LEAVE_RETRY_ATTEMPTS", defaults.leave_retry_attempts)
                .max(1),
            leave_retry_delay_ms: read_env("QUIZ_LEAVE_RETRY_DELAY_MS", defaults.leave_retry_delay_ms),
        };
        if config.topics_per_match > config.topic_pool_size {
            log::warn!(
                "QUIZ_TOPICS_PER_MATCH ({}) exceeds QUIZ_TOPIC_POOL_SIZE ({}), clamping",
                config.topics_per_match,
                config.topic_pool_size
            );
            return Self {
                topics_per_match: config.topic_pool_size,
                ..config
            };
        }
        config
    }

    /// Set credit each seat holds in a drawn match. Anything above it
    /// wins the match outright.
    pub fn draw_threshold(&self) -> f64 {
        self.set_count as f64 / 2.0
    }
}

fn read_env<T: FromStr + std::fmt::Display + Copy>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                log::warn!("Invalid value {:?} for {}, using {}", raw, name, default);
                default
            }
        },
        Err(_) => default,
    }
}
