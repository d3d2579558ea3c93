use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, broadcast, watch};

use crate::{
    models::{Principal, RoleRecord},
    resolver::RoleResolver,
};

/// SessionState
///
/// What every page-level reader sees. Only the provider writes it.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Nothing is known yet; the auth provider has not reported.
    Loading,
    /// No principal.
    SignedOut,
    /// A principal is present but its role has not been computed yet.
    Resolving(Principal),
    /// Role resolution finished. `record` is `None` for an unresolved principal.
    Ready {
        principal: Principal,
        record: Option<RoleRecord>,
    },
}

impl SessionState {
    pub fn principal(&self) -> Option<&Principal> {
        match self {
            SessionState::Resolving(principal) | SessionState::Ready { principal, .. } => {
                Some(principal)
            }
            SessionState::Loading | SessionState::SignedOut => None,
        }
    }

    pub fn record(&self) -> Option<&RoleRecord> {
        match self {
            SessionState::Ready { record, .. } => record.as_ref(),
            _ => None,
        }
    }
}

/// AuthEvent
///
/// Session-change notifications from the auth provider (plus explicit logouts).
#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    SignedIn(Principal),
    TokenRefreshed(Principal),
    SignedOut,
}

/// SessionProvider
///
/// Injectable session container: one writer (the auth event stream), many readers
/// through `watch` receivers.
///
/// Every event takes a new generation number. Resolutions run one at a time, and a
/// result is published only if its generation is still the latest, so a slow lookup for
/// an old sign-in can never overwrite a newer sign-in or a sign-out.
pub struct SessionProvider {
    resolver: RoleResolver,
    state: watch::Sender<SessionState>,
    generation: AtomicU64,
    resolving: Mutex<()>,
}

impl SessionProvider {
    pub fn new(resolver: RoleResolver) -> Self {
        let (state, _) = watch::channel(SessionState::Loading);
        Self {
            resolver,
            state,
            generation: AtomicU64::new(0),
            resolving: Mutex::new(()),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Writes `next` only if no newer event has been accepted. The generation check and
    /// the write both happen under the watch lock.
    fn publish(&self, generation: u64, next: SessionState) -> bool {
        self.state.send_if_modified(|state| {
            if !self.is_current(generation) {
                return false;
            }
            *state = next;
            true
        })
    }

    /// handle_event
    ///
    /// Applies one auth event. Returns once this event's resolution either published or
    /// was discarded as stale.
    pub async fn handle_event(&self, event: AuthEvent) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let principal = match event {
            AuthEvent::SignedOut => {
                tracing::debug!(generation, "session signed out");
                self.publish(generation, SessionState::SignedOut);
                return;
            }
            AuthEvent::SignedIn(principal) | AuthEvent::TokenRefreshed(principal) => principal,
        };

        self.publish(generation, SessionState::Resolving(principal.clone()));

        let _serialized = self.resolving.lock().await;
        if !self.is_current(generation) {
            tracing::debug!(generation, "session event superseded before resolution");
            return;
        }

        let record = self.resolver.resolve(&principal).await;

        if !self.publish(generation, SessionState::Ready { principal, record }) {
            tracing::debug!(generation, "discarding stale role resolution");
        }
    }

    /// run
    ///
    /// Drains an event stream in order until the sender side closes. Lagged receivers
    /// skip ahead; only the newest state matters.
    pub async fn run(&self, mut events: broadcast::Receiver<AuthEvent>) {
        loop {
            match events.recv().await {
                Ok(event) => self.handle_event(event).await,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "session event stream lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}
