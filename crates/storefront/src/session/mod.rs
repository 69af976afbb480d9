//! Session projection.
//!
//! [`SessionProjector`] listens to a [`SessionProvider`] and turns every auth
//! session it reports into a [`SessionView`]: whether someone is signed in,
//! their email, and whether they are an admin. The admin flag comes from the
//! `profiles` table when it can be reached and from the session metadata
//! otherwise.
//!
//! Each notification is reconciled completely, profile lookup included,
//! before the resulting view is published. Consumers never see a view where
//! the signed-in flag has changed but the admin flag has not caught up.
//!
//! The last known email and the admin flag are mirrored into the key-value
//! store so other parts of the UI can show identity hints without awaiting
//! the session.

mod guard;
mod profile;
mod provider;

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use floa_core::{Email, UserId};

pub use guard::{Access, GuardDecision, HOME_ROUTE, RouteGuard};
pub use profile::{ProfileDirectory, ProfileError, ProfileRecord};
pub use provider::{
    AuthChange, AuthEvent, AuthSession, AuthUser, ChannelSessionProvider, SessionProvider,
    Subscription, UserMetadata,
};

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::storage::{
    self, KeyValueStore, SharedStore, StorageError, Stored, Validated, encode_json, keys,
    validate_json,
};

/// Errors from a [`SessionProvider`].
#[derive(Debug, Error)]
pub enum SessionError {
    /// The provider could not produce a session.
    #[error("session provider error: {0}")]
    Provider(String),

    /// The subscriber fell behind and missed changes.
    #[error("session subscriber lagged by {0} changes")]
    Lagged(u64),

    /// The provider has shut down.
    #[error("session provider closed")]
    Closed,
}

/// Identity state visible to the UI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionView {
    pub is_logged_in: bool,
    pub email: Option<Email>,
    pub is_admin: bool,
    /// False until the first reconciliation has finished.
    pub is_ready: bool,
}

impl SessionView {
    /// A resolved signed-out view.
    #[must_use]
    pub const fn signed_out() -> Self {
        Self {
            is_logged_in: false,
            email: None,
            is_admin: false,
            is_ready: true,
        }
    }
}

struct AdminFlag(bool);

impl Stored for AdminFlag {
    fn validate(raw: &str) -> Validated<Self> {
        match validate_json::<bool>(raw, "a boolean") {
            Validated::Valid(flag) => Validated::Valid(Self(flag)),
            Validated::UseDefault(rejection) => Validated::UseDefault(rejection),
        }
    }

    fn encode(&self) -> Result<String, StorageError> {
        encode_json(&self.0)
    }
}

impl Stored for Email {
    fn validate(raw: &str) -> Validated<Self> {
        validate_json(raw, "an email address")
    }

    fn encode(&self) -> Result<String, StorageError> {
        encode_json(self.as_str())
    }
}

/// The email of the last signed-in user, as mirrored in `store`.
#[must_use]
pub fn last_known_email(store: &dyn KeyValueStore) -> Option<Email> {
    storage::load(store, keys::USER_EMAIL).into_option()
}

/// Whether `store` records the signed-in user as an admin.
#[must_use]
pub fn stored_admin_flag(store: &dyn KeyValueStore) -> bool {
    storage::load::<AdminFlag>(store, keys::IS_ADMIN)
        .into_option()
        .is_some_and(|flag| flag.0)
}

/// Derive the view for `session`, mirroring identity hints into `store`.
///
/// `None` means signed out. A failed profile lookup falls back to the
/// metadata admin flag; it never fails the reconciliation.
pub async fn reconcile(
    session: Option<&AuthSession>,
    profiles: &dyn ProfileDirectory,
    store: &dyn KeyValueStore,
) -> SessionView {
    let Some(session) = session else {
        forget(store, keys::USER_EMAIL);
        forget(store, keys::IS_ADMIN);
        clear_sentry_user();
        return SessionView::signed_out();
    };
    let user = &session.user;

    let email = user.email.as_deref().and_then(|raw| {
        Email::parse(raw)
            .inspect_err(|e| tracing::warn!(user_id = %user.id, error = %e, "Ignoring invalid session email"))
            .ok()
    });
    match &email {
        Some(email) => remember(store, keys::USER_EMAIL, email),
        None => forget(store, keys::USER_EMAIL),
    }

    let is_admin = resolve_admin(user, profiles).await;
    if is_admin {
        remember(store, keys::IS_ADMIN, &AdminFlag(true));
    } else {
        forget(store, keys::IS_ADMIN);
    }

    set_sentry_user(&user.id, email.as_ref().map(Email::as_str));

    SessionView {
        is_logged_in: true,
        email,
        is_admin,
        is_ready: true,
    }
}

async fn resolve_admin(user: &AuthUser, profiles: &dyn ProfileDirectory) -> bool {
    let from_metadata = user.user_metadata.is_admin.unwrap_or(false);
    match profiles.fetch_is_admin(user.id).await {
        Ok(Some(is_admin)) => is_admin,
        Ok(None) => {
            tracing::debug!(user_id = %user.id, "No profile row, using metadata admin flag");
            from_metadata
        }
        Err(e) => {
            tracing::warn!(user_id = %user.id, error = %e, "Profile lookup failed, using metadata admin flag");
            from_metadata
        }
    }
}

fn remember<T: Stored>(store: &dyn KeyValueStore, key: &str, value: &T) {
    if let Err(e) = storage::save(store, key, value) {
        tracing::warn!(key, error = %e, "Failed to store identity hint");
    }
}

fn forget(store: &dyn KeyValueStore, key: &str) {
    if let Err(e) = store.remove(key) {
        tracing::warn!(key, error = %e, "Failed to clear identity hint");
    }
}

/// Create the profile of a newly registered user.
///
/// New users start as customers. The local admin flag is left alone: the
/// next reconciliation reads the profile and writes it.
///
/// # Errors
///
/// Returns an error if the upsert fails.
pub async fn register_profile(
    profiles: &dyn ProfileDirectory,
    user_id: UserId,
) -> Result<(), ProfileError> {
    profiles
        .upsert_profile(&ProfileRecord::customer(user_id))
        .await
        .inspect_err(|e| tracing::warn!(%user_id, error = %e, "Failed to create profile"))
}

/// Keeps a [`SessionView`] in sync with a [`SessionProvider`].
///
/// Runs one background task that processes notifications strictly in order.
/// Dropping the projector unsubscribes from the provider and cancels any
/// lookup still in flight; its result is never published.
#[derive(Debug)]
pub struct SessionProjector {
    view: watch::Receiver<SessionView>,
    task: JoinHandle<()>,
}

impl SessionProjector {
    /// Subscribe to `provider` and start reconciling.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn spawn(
        provider: Arc<dyn SessionProvider>,
        profiles: Arc<dyn ProfileDirectory>,
        store: SharedStore,
    ) -> Self {
        let (sender, view) = watch::channel(SessionView::default());
        // Subscribe before the initial fetch so no transition slips between them.
        let subscription = provider.subscribe();
        let task = tokio::spawn(run(provider, subscription, profiles, store, sender));
        Self { view, task }
    }

    /// The latest published view.
    #[must_use]
    pub fn view(&self) -> SessionView {
        self.view.borrow().clone()
    }

    /// A receiver that is notified of every new view.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<SessionView> {
        self.view.clone()
    }

    /// Wait until the first reconciliation has completed.
    pub async fn ready(&self) -> SessionView {
        let mut view = self.view.clone();
        match view.wait_for(|view| view.is_ready).await {
            Ok(ready) => SessionView::clone(&ready),
            Err(_) => self.view(),
        }
    }

    /// Stop listening for session changes.
    pub fn shutdown(self) {
        drop(self);
    }
}

impl Drop for SessionProjector {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(
    provider: Arc<dyn SessionProvider>,
    mut subscription: Subscription,
    profiles: Arc<dyn ProfileDirectory>,
    store: SharedStore,
    sender: watch::Sender<SessionView>,
) {
    let initial = provider.current_session().await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to fetch initial session, treating as signed out");
        None
    });
    let view = reconcile(initial.as_ref(), profiles.as_ref(), store.as_ref()).await;
    tracing::debug!(logged_in = view.is_logged_in, admin = view.is_admin, "Session ready");
    if sender.send(view).is_err() {
        return;
    }

    loop {
        let session = match subscription.recv().await {
            Ok(change) => {
                tracing::debug!(event = ?change.event, "Session changed");
                change.session
            }
            Err(SessionError::Lagged(missed)) => {
                // Queued changes are older than the session refetched below.
                let skipped = missed + subscription.skip_pending();
                tracing::warn!(skipped, "Missed session changes, refetching current session");
                match provider.current_session().await {
                    Ok(session) => session,
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to refetch session");
                        continue;
                    }
                }
            }
            Err(_) => {
                tracing::debug!("Session provider closed");
                return;
            }
        };

        let view = reconcile(session.as_ref(), profiles.as_ref(), store.as_ref()).await;
        if sender.send(view).is_err() {
            return;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::Notify;
    use uuid::Uuid;

    use super::provider::CHANNEL_CAPACITY;
    use super::*;
    use crate::storage::MemoryStore;

    /// Profile directory answering from a fixed result.
    struct FixedProfiles {
        answer: Result<Option<bool>, String>,
        upserts: Mutex<Vec<ProfileRecord>>,
    }

    impl FixedProfiles {
        fn new(answer: Result<Option<bool>, String>) -> Self {
            Self {
                answer,
                upserts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ProfileDirectory for FixedProfiles {
        async fn fetch_is_admin(&self, _user_id: UserId) -> Result<Option<bool>, ProfileError> {
            self.answer.clone().map_err(ProfileError::Unavailable)
        }

        async fn upsert_profile(&self, profile: &ProfileRecord) -> Result<(), ProfileError> {
            self.upserts.lock().unwrap().push(*profile);
            Ok(())
        }
    }

    /// Profile directory that blocks until released.
    struct GatedProfiles {
        gate: Notify,
    }

    #[async_trait]
    impl ProfileDirectory for GatedProfiles {
        async fn fetch_is_admin(&self, _user_id: UserId) -> Result<Option<bool>, ProfileError> {
            self.gate.notified().await;
            Ok(Some(true))
        }

        async fn upsert_profile(&self, _profile: &ProfileRecord) -> Result<(), ProfileError> {
            Ok(())
        }
    }

    fn session(metadata_admin: Option<bool>) -> AuthSession {
        AuthSession {
            user: AuthUser {
                id: UserId::new(Uuid::new_v4()),
                email: Some("marie@floa.shop".to_string()),
                user_metadata: UserMetadata {
                    is_admin: metadata_admin,
                },
            },
        }
    }

    #[tokio::test]
    async fn test_profile_overrides_metadata() {
        let store = MemoryStore::new();
        let profiles = FixedProfiles::new(Ok(Some(true)));

        let view = reconcile(Some(&session(Some(false))), &profiles, &store).await;
        assert!(view.is_logged_in);
        assert!(view.is_admin);
        assert!(view.is_ready);
        assert!(stored_admin_flag(&store));
    }

    #[tokio::test]
    async fn test_profile_can_revoke_metadata_admin() {
        let store = MemoryStore::new();
        let profiles = FixedProfiles::new(Ok(Some(false)));

        let view = reconcile(Some(&session(Some(true))), &profiles, &store).await;
        assert!(!view.is_admin);
        assert!(!stored_admin_flag(&store));
    }

    #[tokio::test]
    async fn test_lookup_error_falls_back_to_metadata() {
        let store = MemoryStore::new();
        let profiles = FixedProfiles::new(Err("timeout".to_string()));

        let view = reconcile(Some(&session(Some(false))), &profiles, &store).await;
        assert!(!view.is_admin);

        let view = reconcile(Some(&session(Some(true))), &profiles, &store).await;
        assert!(view.is_admin);
    }

    #[tokio::test]
    async fn test_missing_profile_falls_back_to_metadata() {
        let store = MemoryStore::new();
        let profiles = FixedProfiles::new(Ok(None));

        let view = reconcile(Some(&session(None)), &profiles, &store).await;
        assert!(!view.is_admin);
    }

    #[tokio::test]
    async fn test_identity_hints_follow_session() {
        let store = MemoryStore::new();
        let profiles = FixedProfiles::new(Ok(Some(true)));

        let view = reconcile(Some(&session(None)), &profiles, &store).await;
        assert_eq!(view.email.as_ref().map(Email::as_str), Some("marie@floa.shop"));
        assert_eq!(
            last_known_email(&store).as_ref().map(Email::as_str),
            Some("marie@floa.shop")
        );
        assert_eq!(
            store.get(keys::USER_EMAIL).unwrap().as_deref(),
            Some("\"marie@floa.shop\"")
        );

        let view = reconcile(None, &profiles, &store).await;
        assert_eq!(view, SessionView::signed_out());
        assert_eq!(last_known_email(&store), None);
        assert!(!stored_admin_flag(&store));
        assert_eq!(store.get(keys::IS_ADMIN).unwrap(), None);
    }

    #[tokio::test]
    async fn test_signed_out_skips_profile_lookup() {
        let store = MemoryStore::new();
        let profiles = GatedProfiles {
            gate: Notify::new(),
        };
        // Would block forever if the lookup ran.
        let view = reconcile(None, &profiles, &store).await;
        assert!(view.is_ready);
        assert!(!view.is_logged_in);
    }

    #[tokio::test]
    async fn test_register_profile_upserts_customer() {
        let profiles = FixedProfiles::new(Ok(None));
        let user_id = UserId::new(Uuid::new_v4());

        register_profile(&profiles, user_id).await.unwrap();

        let upserts = profiles.upserts.lock().unwrap();
        assert_eq!(upserts.as_slice(), &[ProfileRecord::customer(user_id)]);
    }

    #[tokio::test]
    async fn test_projector_not_ready_until_lookup_completes() {
        let provider = Arc::new(ChannelSessionProvider::new(Some(session(Some(false)))));
        let profiles = Arc::new(GatedProfiles {
            gate: Notify::new(),
        });
        let projector = SessionProjector::spawn(
            provider,
            profiles.clone(),
            Arc::new(MemoryStore::new()),
        );

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!projector.view().is_ready);

        profiles.gate.notify_one();
        let view = projector.ready().await;
        assert!(view.is_ready && view.is_logged_in && view.is_admin);
    }

    #[tokio::test]
    async fn test_projector_follows_changes() {
        let provider = Arc::new(ChannelSessionProvider::default());
        let projector = SessionProjector::spawn(
            provider.clone(),
            Arc::new(FixedProfiles::new(Ok(Some(true)))),
            Arc::new(MemoryStore::new()),
        );

        let view = projector.ready().await;
        assert!(!view.is_logged_in);

        let mut updates = projector.watch();
        provider.sign_in(session(None));
        let view = updates
            .wait_for(|view| view.is_logged_in)
            .await
            .unwrap()
            .clone();
        assert!(view.is_admin);

        provider.sign_out();
        let view = updates
            .wait_for(|view| !view.is_logged_in)
            .await
            .unwrap()
            .clone();
        assert!(!view.is_admin);
    }

    /// Memory store that logs every write to the admin flag.
    #[derive(Default)]
    struct AdminFlagLog {
        inner: MemoryStore,
        writes: Mutex<Vec<String>>,
    }

    impl KeyValueStore for AdminFlagLog {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            if key == keys::IS_ADMIN {
                self.writes.lock().unwrap().push(value.to_string());
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            if key == keys::IS_ADMIN {
                self.writes.lock().unwrap().push("removed".to_string());
            }
            self.inner.remove(key)
        }
    }

    #[tokio::test]
    async fn test_lagged_projector_resyncs_to_latest_session() {
        let provider = Arc::new(ChannelSessionProvider::default());
        let store = Arc::new(AdminFlagLog::default());
        let projector = SessionProjector::spawn(
            provider.clone(),
            Arc::new(FixedProfiles::new(Ok(Some(true)))),
            store.clone(),
        );
        projector.ready().await;
        store.writes.lock().unwrap().clear();

        // Overflow the subscription without yielding, ending signed out.
        for _ in 0..CHANNEL_CAPACITY + 4 {
            provider.sign_in(session(None));
        }
        provider.sign_out();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let writes = store.writes.lock().unwrap().clone();
        assert_eq!(writes, vec!["removed".to_string()]);
        assert!(!projector.view().is_logged_in);
        assert!(!stored_admin_flag(store.as_ref()));
    }

    #[tokio::test]
    async fn test_drop_unsubscribes() {
        let provider = Arc::new(ChannelSessionProvider::default());
        let projector = SessionProjector::spawn(
            provider.clone(),
            Arc::new(FixedProfiles::new(Ok(None))),
            Arc::new(MemoryStore::new()),
        );
        projector.ready().await;
        assert_eq!(provider.subscriber_count(), 1);

        projector.shutdown();
        // Abort lands at the task's next poll.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(provider.subscriber_count(), 0);
    }
}
