use dashmap::DashMap;
use quiz_match_app::{
    domain::UserId,
    ports::notification::{ListenerMessage, ListenerNotificationPort},
};
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use crate::protocol::ServerMessage;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Open sockets per user. Pushes for a user go to every one of them.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: DashMap<UserId, DashMap<ConnectionId, UnboundedSender<ServerMessage>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_connection(
        &self,
        user: UserId,
        connection_id: ConnectionId,
        sender: UnboundedSender<ServerMessage>,
    ) {
        self.connections
            .entry(user)
            .or_default()
            .insert(connection_id, sender);
    }

    pub fn remove_connection(&self, user: UserId, connection_id: ConnectionId) {
        if let Some(user_connections) = self.connections.get(&user) {
            user_connections.remove(&connection_id);
        }
        self.connections
            .remove_if(&user, |_, user_connections| user_connections.is_empty());
    }

    pub fn connection_count(&self, user: UserId) -> usize {
        self.connections
            .get(&user)
            .map(|user_connections| user_connections.len())
            .unwrap_or(0)
    }
}

impl ListenerNotificationPort for ConnectionRegistry {
    fn notify_users(&self, users: &[UserId], message: ListenerMessage) {
        let server_message = ServerMessage::from_listener_message(message);
        for user in users {
            let Some(user_connections) = self.connections.get(user) else {
                log::debug!("No open connection for user {}", user);
                continue;
            };
            for entry in user_connections.iter() {
                if entry.value().send(server_message.clone()).is_err() {
                    log::debug!("Connection {} already closed", entry.key());
                }
            }
        }
    }
}
