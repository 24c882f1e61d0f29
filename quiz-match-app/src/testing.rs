use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use dashmap::DashMap;

use crate::{
    Application, build_application,
    config::MatchConfig,
    domain::{
        RepoCreateError, RepoRetrieveError, RepoUpdateError, RoomKey, UserId,
        room::{RandomRoomKeyGenerator, RoomKeyGenerator},
        user::{User, UserRepository, UserStats},
    },
    ports::{
        authentication::{AuthenticationPort, Identity, RefreshClaims, TokenIssueError, TokenPair},
        notification::{ListenerMessage, ListenerNotificationPort},
    },
};

/// Hands out the given keys in order, then random ones.
pub struct SequenceKeyGenerator {
    keys: Mutex<VecDeque<String>>,
}

impl SequenceKeyGenerator {
    pub fn new(keys: &[&str]) -> Self {
        Self {
            keys: Mutex::new(keys.iter().map(|k| k.to_string()).collect()),
        }
    }
}

impl RoomKeyGenerator for SequenceKeyGenerator {
    fn generate(&self, length: usize) -> RoomKey {
        match self.keys.lock().unwrap().pop_front() {
            Some(key) => RoomKey::new(key),
            None => RandomRoomKeyGenerator.generate(length),
        }
    }
}

#[derive(Clone, Default)]
pub struct MockUserRepository {
    pub users: Arc<DashMap<UserId, User>>,
    pub fail_writes: Arc<AtomicBool>,
}

#[allow(unused)]
impl MockUserRepository {
    pub fn add_user(&self, username: &str, rating: f64) -> UserId {
        let user = User::new(username.to_string(), "hash".to_string(), rating);
        let id = user.id;
        self.users.insert(id, user);
        id
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn stats(&self, id: UserId) -> UserStats {
        self.users.get(&id).unwrap().stats
    }

    fn check_writable(&self) -> Result<(), RepoUpdateError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RepoUpdateError::StorageError("write refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl UserRepository for MockUserRepository {
    async fn create_user(&self, user: User) -> Result<(), RepoCreateError> {
        if self.users.iter().any(|u| u.username == user.username) {
            return Err(RepoCreateError::Conflict);
        }
        self.users.insert(user.id, user);
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> Result<User, RepoRetrieveError> {
        self.users
            .get(&id)
            .map(|u| u.clone())
            .ok_or(RepoRetrieveError::NotFound)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<User, RepoRetrieveError> {
        self.users
            .iter()
            .find(|u| u.username == username)
            .map(|u| u.clone())
            .ok_or(RepoRetrieveError::NotFound)
    }

    async fn update_password_hash(
        &self,
        id: UserId,
        password_hash: String,
    ) -> Result<(), RepoUpdateError> {
        self.check_writable()?;
        let mut user = self.users.get_mut(&id).ok_or(RepoUpdateError::NotFound)?;
        user.password_hash = password_hash;
        Ok(())
    }

    async fn update_refresh_token_hash(
        &self,
        id: UserId,
        refresh_token_hash: Option<String>,
    ) -> Result<(), RepoUpdateError> {
        self.check_writable()?;
        let mut user = self.users.get_mut(&id).ok_or(RepoUpdateError::NotFound)?;
        user.refresh_token_hash = refresh_token_hash;
        Ok(())
    }

    async fn update_user_pair<R: Send + 'static>(
        &self,
        first: UserId,
        second: UserId,
        calc_fn: impl FnOnce(UserStats, UserStats) -> (UserStats, UserStats, R) + Send + 'static,
    ) -> Result<R, RepoUpdateError> {
        self.check_writable()?;
        let first_stats = self.users.get(&first).ok_or(RepoUpdateError::NotFound)?.stats;
        let second_stats = self.users.get(&second).ok_or(RepoUpdateError::NotFound)?.stats;
        let (first_stats, second_stats, result) = calc_fn(first_stats, second_stats);
        self.users.get_mut(&first).ok_or(RepoUpdateError::NotFound)?.stats = first_stats;
        self.users.get_mut(&second).ok_or(RepoUpdateError::NotFound)?.stats = second_stats;
        Ok(result)
    }
}

#[derive(Clone, Default)]
pub struct MockNotificationPort {
    pub sent_messages: Arc<Mutex<Vec<(UserId, ListenerMessage)>>>,
}

#[allow(unused)]
impl MockNotificationPort {
    pub fn get_messages(&self) -> Vec<(UserId, ListenerMessage)> {
        self.sent_messages.lock().unwrap().clone()
    }

    pub fn messages_for(&self, user: UserId) -> Vec<ListenerMessage> {
        self.get_messages()
            .into_iter()
            .filter(|(to, _)| *to == user)
            .map(|(_, msg)| msg)
            .collect()
    }

    pub fn clear(&self) {
        self.sent_messages.lock().unwrap().clear();
    }
}

impl ListenerNotificationPort for MockNotificationPort {
    fn notify_users(&self, users: &[UserId], message: ListenerMessage) {
        let mut sent = self.sent_messages.lock().unwrap();
        for user in users {
            sent.push((*user, message.clone()));
        }
    }
}

/// Tokens are plain strings: `access:<id>:<name>` and
/// `refresh:<id>:<name>:<token id>`.
#[derive(Default)]
pub struct MockAuthenticationPort {
    counter: Mutex<u64>,
}

impl MockAuthenticationPort {
    fn parse_identity(id: &str, username: &str) -> Option<Identity> {
        Some(Identity {
            user_id: UserId(uuid::Uuid::parse_str(id).ok()?),
            username: username.to_string(),
        })
    }
}

impl AuthenticationPort for MockAuthenticationPort {
    fn issue_tokens(&self, identity: &Identity) -> Result<TokenPair, TokenIssueError> {
        let mut counter = self.counter.lock().unwrap();
        *counter += 1;
        let token_id = format!("tid{}", counter);
        Ok(TokenPair {
            access_token: format!("access:{}:{}", identity.user_id, identity.username),
            refresh_token: format!(
                "refresh:{}:{}:{}",
                identity.user_id, identity.username, token_id
            ),
            refresh_token_id: token_id,
        })
    }

    fn verify_access_token(&self, token: &str) -> Option<Identity> {
        let parts: Vec<&str> = token.split(':').collect();
        match parts.as_slice() {
            ["access", id, username] => Self::parse_identity(id, username),
            _ => None,
        }
    }

    fn verify_refresh_token(&self, token: &str) -> Option<RefreshClaims> {
        let parts: Vec<&str> = token.split(':').collect();
        match parts.as_slice() {
            ["refresh", id, username, token_id] => Some(RefreshClaims {
                identity: Self::parse_identity(id, username)?,
                token_id: token_id.to_string(),
            }),
            _ => None,
        }
    }
}

/// A full application over in-memory adapters.
pub struct MatchFixture {
    pub users: MockUserRepository,
    pub notifier: MockNotificationPort,
    pub app: Application,
}

#[allow(unused)]
impl MatchFixture {
    pub fn new() -> Self {
        let config = MatchConfig {
            password_hash_cost: 4,
            leave_retry_delay_ms: 5,
            ..MatchConfig::default()
        };
        let users = MockUserRepository::default();
        let notifier = MockNotificationPort::default();
        let app = build_application(
            Arc::new(users.clone()),
            Arc::new(notifier.clone()),
            Arc::new(MockAuthenticationPort::default()),
            &config,
        );
        Self {
            users,
            notifier,
            app,
        }
    }

    /// Room with alice on the first seat and bob on the second. Messages
    /// sent while pairing are discarded.
    pub async fn paired_room(&self, rated: bool) -> (RoomKey, UserId, UserId) {
        let alice = self.users.add_user("alice", 1000.0);
        let bob = self.users.add_user("bob", 1000.0);
        let key = self.app.room_create_use_case.create_room(alice, rated);
        self.app.room_join_use_case.join_room(bob, &key).await.unwrap();
        self.notifier.clear();
        (key, alice, bob)
    }

    /// Plays the current set to the end with the given points per seat.
    pub async fn play_set(&self, key: &RoomKey, first: UserId, second: UserId, first_points: i64, second_points: i64) {
        let round = self
            .app
            .game_display_score_use_case
            .display_score(key)
            .await
            .unwrap()
            .current_round;
        let app = &self.app;
        app.game_start_set_use_case.start_set(first, key, 0).await;
        app.game_start_set_use_case.start_set(second, key, 1).await;
        if first_points != 0 {
            app.game_submit_use_case.submit(first, key, 0, round, first_points).await.unwrap();
        }
        if second_points != 0 {
            app.game_submit_use_case.submit(second, key, 1, round, second_points).await.unwrap();
        }
        app.game_end_set_use_case.end_set(first, key, 0, round).await;
        app.game_end_set_use_case.end_set(second, key, 1, round).await;
    }
}
