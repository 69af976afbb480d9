//! Auth session provider interface.
//!
//! The auth provider owns sign-in, tokens and refresh. The storefront only
//! needs two things from it: the current session, and a stream of session
//! changes it can subscribe to and later drop.

use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use floa_core::UserId;

use super::SessionError;

/// Queued changes per subscriber before it is considered lagging.
pub(super) const CHANNEL_CAPACITY: usize = 16;

/// An authenticated session as reported by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: AuthUser,
}

/// The user behind an [`AuthSession`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

/// Free-form metadata attached to the user at sign-up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default)]
    pub is_admin: Option<bool>,
}

/// Kind of auth state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEvent {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
}

/// One auth state transition and the session after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthChange {
    pub event: AuthEvent,
    pub session: Option<AuthSession>,
}

/// Registration for session change notifications.
///
/// Changes are delivered in the order the provider emitted them. Dropping the
/// subscription unregisters it.
#[derive(Debug)]
pub struct Subscription {
    receiver: broadcast::Receiver<AuthChange>,
}

impl Subscription {
    #[must_use]
    pub const fn new(receiver: broadcast::Receiver<AuthChange>) -> Self {
        Self { receiver }
    }

    /// Wait for the next change.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Lagged`] if changes were dropped because this
    /// subscriber fell behind, and [`SessionError::Closed`] once the provider
    /// is gone.
    pub async fn recv(&mut self) -> Result<AuthChange, SessionError> {
        self.receiver.recv().await.map_err(|e| match e {
            broadcast::error::RecvError::Lagged(skipped) => SessionError::Lagged(skipped),
            broadcast::error::RecvError::Closed => SessionError::Closed,
        })
    }

    /// Discard every change already queued, returning how many were dropped.
    pub fn skip_pending(&mut self) -> u64 {
        let mut skipped = 0_u64;
        loop {
            match self.receiver.try_recv() {
                Ok(_) => skipped += 1,
                Err(broadcast::error::TryRecvError::Lagged(n)) => skipped += n,
                Err(broadcast::error::TryRecvError::Empty | broadcast::error::TryRecvError::Closed) => {
                    return skipped;
                }
            }
        }
    }
}

/// Source of auth sessions.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Fetch the current session, `None` when signed out.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot be reached.
    async fn current_session(&self) -> Result<Option<AuthSession>, SessionError>;

    /// Register for session changes.
    fn subscribe(&self) -> Subscription;
}

/// In-process provider the host application pushes auth transitions into.
///
/// Bridges whatever auth SDK the host embeds: call [`Self::publish`] from its
/// auth state callback.
#[derive(Debug)]
pub struct ChannelSessionProvider {
    current: RwLock<Option<AuthSession>>,
    sender: broadcast::Sender<AuthChange>,
}

impl Default for ChannelSessionProvider {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ChannelSessionProvider {
    /// Create a provider whose current session is `initial`.
    #[must_use]
    pub fn new(initial: Option<AuthSession>) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            current: RwLock::new(initial),
            sender,
        }
    }

    /// Record a transition and notify subscribers.
    pub fn publish(&self, event: AuthEvent, session: Option<AuthSession>) {
        match self.current.write() {
            Ok(mut current) => current.clone_from(&session),
            Err(poisoned) => poisoned.into_inner().clone_from(&session),
        }
        // No subscribers is not an error; the session is still recorded.
        let _ = self.sender.send(AuthChange { event, session });
    }

    pub fn sign_in(&self, session: AuthSession) {
        self.publish(AuthEvent::SignedIn, Some(session));
    }

    pub fn sign_out(&self) {
        self.publish(AuthEvent::SignedOut, None);
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl SessionProvider for ChannelSessionProvider {
    async fn current_session(&self) -> Result<Option<AuthSession>, SessionError> {
        self.current
            .read()
            .map(|current| current.clone())
            .map_err(|_| SessionError::Provider("session lock poisoned".to_string()))
    }

    fn subscribe(&self) -> Subscription {
        Subscription::new(self.sender.subscribe())
    }
}
