use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::client::api::{ApiError, RelationshipApi};
use crate::client::cache::StatusCache;
use crate::client::clock::Clock;
use crate::client::signal::{SessionSignal, SignalBus};
use crate::modules::push::message::RelationshipEvent;
use crate::modules::relationship::model::DerivedStatus;

/// How long an optimistic transition outranks asynchronous updates. Long
/// enough to cover a normal round trip, short enough that a lost response
/// cannot wedge the display.
pub const GUARD_HOLD: Duration = Duration::from_millis(2500);

/// Delay before re-fetching authoritative status after a sibling-session
/// signal, so the server has settled by the time we ask.
pub const RECONCILE_DELAY: Duration = Duration::from_millis(300);

/// The five mutations a session can initiate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    Request,
    Cancel,
    Accept,
    Decline,
    Unfriend,
}

impl UserAction {
    /// Status the action lands on when the server agrees.
    pub fn desired(&self) -> DerivedStatus {
        match self {
            UserAction::Request => DerivedStatus::Pending,
            UserAction::Accept => DerivedStatus::Friends,
            UserAction::Cancel | UserAction::Decline | UserAction::Unfriend => DerivedStatus::None,
        }
    }
}

/// Window during which the optimistically displayed status outranks weaker
/// asynchronous updates for the same target.
#[derive(Debug, Clone, Copy)]
struct OptimisticGuard {
    desired: DerivedStatus,
    expires_at: Instant,
}

/// Handle returned by [`ReconciliationEngine::begin`]; feed it back through
/// `complete` with the server's answer.
#[derive(Debug)]
pub struct ActionTicket {
    target: Uuid,
    action: UserAction,
    previous: Option<DerivedStatus>,
}

/// Per-session arbiter for the three asynchronous status sources: the
/// session's own call results, server push events, and sibling-session
/// signals. Updates flow through rank comparison against the optimistic
/// guard; a weaker late update never overwrites a stronger displayed state.
pub struct ReconciliationEngine<A: RelationshipApi> {
    viewer: Uuid,
    api: Arc<A>,
    bus: Arc<dyn SignalBus>,
    clock: Arc<dyn Clock>,
    cache: StatusCache,
    states: HashMap<Uuid, DerivedStatus>,
    guards: HashMap<Uuid, OptimisticGuard>,
    busy: HashSet<Uuid>,
    refresh_due: HashMap<Uuid, Instant>,
    guard_hold: Duration,
    reconcile_delay: Duration,
}

impl<A: RelationshipApi> ReconciliationEngine<A> {
    pub fn new(viewer: Uuid, api: Arc<A>, bus: Arc<dyn SignalBus>, clock: Arc<dyn Clock>) -> Self {
        Self::with_timings(viewer, api, bus, clock, GUARD_HOLD, RECONCILE_DELAY)
    }

    pub fn with_timings(
        viewer: Uuid,
        api: Arc<A>,
        bus: Arc<dyn SignalBus>,
        clock: Arc<dyn Clock>,
        guard_hold: Duration,
        reconcile_delay: Duration,
    ) -> Self {
        Self {
            viewer,
            api,
            bus,
            cache: StatusCache::new(clock.clone()),
            clock,
            states: HashMap::new(),
            guards: HashMap::new(),
            busy: HashSet::new(),
            refresh_due: HashMap::new(),
            guard_hold,
            reconcile_delay,
        }
    }

    /// Status the UI should render for `target` right now. Falls back to the
    /// cache when no live state exists; `None` means the caller has to fetch.
    pub fn displayed(&self, target: &Uuid) -> Option<DerivedStatus> {
        if *target == self.viewer {
            return Some(DerivedStatus::Myself);
        }
        self.states.get(target).copied().or_else(|| self.cache.get(target))
    }

    /// Start a mutation: apply the desired status optimistically, arm the
    /// guard, and mark the target busy. Returns `None` when the action is a
    /// no-op (self target, or a call for this target already in flight); the
    /// caller then just keeps rendering `displayed`.
    pub fn begin(&mut self, target: Uuid, action: UserAction) -> Option<ActionTicket> {
        if target == self.viewer || !self.busy.insert(target) {
            return None;
        }

        let previous = self.states.get(&target).copied();
        let desired = action.desired();
        self.guards.insert(
            target,
            OptimisticGuard { desired, expires_at: self.clock.now() + self.guard_hold },
        );
        self.states.insert(target, desired);
        self.cache.set(target, desired);

        Some(ActionTicket { target, action, previous })
    }

    /// Finish a mutation with the server's answer. Success adopts the
    /// returned status as authoritative and signals sibling sessions; failure
    /// rolls the optimistic transition back.
    pub fn complete(
        &mut self,
        ticket: ActionTicket,
        result: Result<DerivedStatus, ApiError>,
    ) -> Result<DerivedStatus, ApiError> {
        let ActionTicket { target, action, previous } = ticket;
        self.busy.remove(&target);

        match result {
            Ok(status) => {
                // Re-arm the guard with the confirmed status for the rest of
                // the hold window: a duplicate or out-of-order push emitted
                // before this confirmation must not regress the display.
                if let Some(guard) = self.guards.get_mut(&target) {
                    guard.desired = status;
                }
                self.states.insert(target, status);
                self.cache.set(target, status);
                self.bus.publish(SessionSignal { status, target_id: target });
                Ok(status)
            }
            Err(err) => {
                self.guards.remove(&target);
                tracing::debug!(%target, ?action, %err, "relationship action failed, rolling back");
                match previous {
                    Some(status) => {
                        self.states.insert(target, status);
                        self.cache.set(target, status);
                    }
                    None => {
                        self.states.remove(&target);
                        self.cache.set(target, DerivedStatus::None);
                    }
                }
                Err(err)
            }
        }
    }

    /// Run a full mutation round trip: optimistic apply, network call,
    /// confirm or roll back. A no-op `begin` resolves to the currently
    /// displayed status.
    pub async fn perform(
        &mut self,
        target: Uuid,
        action: UserAction,
    ) -> Result<DerivedStatus, ApiError> {
        let Some(ticket) = self.begin(target, action) else {
            return Ok(self.displayed(&target).unwrap_or(DerivedStatus::None));
        };

        let api = self.api.clone();
        let result = match action {
            UserAction::Request => api.request(target).await,
            UserAction::Cancel => api.cancel(target).await,
            UserAction::Accept => api.accept(target).await,
            UserAction::Decline => api.decline(target).await,
            UserAction::Unfriend => api.unfriend(target).await,
        };

        self.complete(ticket, result)
    }

    /// Ingest a push frame. Frames addressed to another account arrive via
    /// the broadcast fallback and are dropped here.
    pub fn on_push(&mut self, target_user_id: Uuid, event: RelationshipEvent) {
        if target_user_id != self.viewer {
            return;
        }
        if let Some((other, status)) = self.project(event) {
            self.guarded_apply(other, status);
        }
    }

    /// Ingest a sibling-session signal: adopt the status (subject to the
    /// guard) and schedule a delayed authoritative re-fetch.
    pub fn on_signal(&mut self, signal: SessionSignal) {
        if signal.target_id == self.viewer {
            return;
        }
        self.guarded_apply(signal.target_id, signal.status);
        self.refresh_due.insert(signal.target_id, self.clock.now() + self.reconcile_delay);
    }

    /// Drain the targets whose delayed re-fetch has come due. The host loop
    /// calls this on its tick and feeds each target to [`Self::refresh`].
    pub fn take_due_refreshes(&mut self) -> Vec<Uuid> {
        let now = self.clock.now();
        let due: Vec<Uuid> = self
            .refresh_due
            .iter()
            .filter(|(_, at)| **at <= now)
            .map(|(target, _)| *target)
            .collect();
        for target in &due {
            self.refresh_due.remove(target);
        }
        due
    }

    /// Fetch authoritative status for `target` and fold it in.
    pub async fn refresh(&mut self, target: Uuid) -> Result<DerivedStatus, ApiError> {
        let api = self.api.clone();
        let status = api.status(target).await?;
        self.guarded_apply(target, status);
        Ok(status)
    }

    /// Translate an event about the viewer into the status of the other
    /// account as seen from here.
    fn project(&self, event: RelationshipEvent) -> Option<(Uuid, DerivedStatus)> {
        let me = self.viewer;
        match event {
            RelationshipEvent::RequestCreated { from_user_id, to_user_id, .. } => {
                if me == from_user_id {
                    Some((to_user_id, DerivedStatus::Pending))
                } else if me == to_user_id {
                    Some((from_user_id, DerivedStatus::Incoming))
                } else {
                    None
                }
            }
            RelationshipEvent::RequestCanceled { from_user_id, to_user_id }
            | RelationshipEvent::Declined { from_user_id, to_user_id } => {
                if me == from_user_id {
                    Some((to_user_id, DerivedStatus::None))
                } else if me == to_user_id {
                    Some((from_user_id, DerivedStatus::None))
                } else {
                    None
                }
            }
            RelationshipEvent::Accepted { a, b } => {
                Self::other_of(me, a, b).map(|other| (other, DerivedStatus::Friends))
            }
            RelationshipEvent::Removed { a, b } => {
                Self::other_of(me, a, b).map(|other| (other, DerivedStatus::None))
            }
        }
    }

    fn other_of(me: Uuid, a: Uuid, b: Uuid) -> Option<Uuid> {
        if me == a {
            Some(b)
        } else if me == b {
            Some(a)
        } else {
            None
        }
    }

    /// Adopt `incoming` for `target` unless a live guard outranks it. Equal
    /// rank with a different status means a genuine concurrent transition
    /// (crossed requests); the asynchronous source wins.
    fn guarded_apply(&mut self, target: Uuid, incoming: DerivedStatus) {
        if target == self.viewer {
            return;
        }

        if let Some(guard) = self.guards.get(&target) {
            if guard.expires_at > self.clock.now() {
                if incoming.rank() < guard.desired.rank() {
                    tracing::debug!(%target, ?incoming, "discarding update outranked by in-flight action");
                    return;
                }
                if incoming.rank() == guard.desired.rank() && incoming != guard.desired {
                    tracing::warn!(
                        %target,
                        ?incoming,
                        desired = ?guard.desired,
                        "concurrent transition disagrees with in-flight action, adopting it"
                    );
                }
            } else {
                self.guards.remove(&target);
            }
        }

        self.states.insert(target, incoming);
        self.cache.set(target, incoming);
    }
}
