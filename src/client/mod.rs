/// Client-side relationship state.
///
/// A relationship's derived status reaches a session from three asynchronous
/// sources: the result of the session's own call, a push event from the
/// server, and a signal from another open session of the same account. This
/// module keeps those sources from visibly fighting each other:
///
/// - Status cache with TTL for zero-latency first paint
/// - Reconciliation engine with rank-based arbitration and optimistic guards
/// - Same-origin signal bus so sibling sessions converge without polling
pub mod api;
pub mod cache;
pub mod clock;
pub mod reconcile;
pub mod signal;
