//! Playback timing and scheduling scopes.
//!
//! Every timer the game arms belongs to a *scope*: the playback chain of one
//! round (note plays plus the delay before the next round) or the elapsed-time
//! ticker. A scope is revoked as a unit, so a stopped or failed game can never
//! be touched by a timer it armed earlier. The number of timers in a playback
//! scope grows with the sequence, which is why handles are tracked per scope
//! rather than by name.

use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// What a timer does when it fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerKind {
    /// Play `sequence[index]`.
    PlayNote { index: usize },
    /// Round complete: grow the sequence and replay it.
    ExtendSequence,
    /// One second of play elapsed.
    Tick,
}

/// Delivered back to the state machine when a timer fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerEvent {
    pub scope: ScopeId,
    pub id: TimerId,
    pub kind: TimerKind,
}

/// Offsets for playing a sequence of `len` notes: the first after `lead_in_ms`,
/// each following one `speed_ms` later.
pub fn playback_plan(len: usize, speed_ms: f64, lead_in_ms: u32) -> Vec<(u32, TimerKind)> {
    (0..len)
        .map(|index| {
            let offset = (index as f64 * speed_ms).round() as u32;
            (lead_in_ms.saturating_add(offset), TimerKind::PlayNote { index })
        })
        .collect()
}

/// Pending host timer handles grouped by scope.
#[derive(Debug)]
pub struct ScopeRegistry<H> {
    scopes: HashMap<ScopeId, Vec<(TimerId, H)>>,
}

impl<H> Default for ScopeRegistry<H> {
    fn default() -> Self {
        Self { scopes: HashMap::new() }
    }
}

impl<H> ScopeRegistry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, scope: ScopeId, id: TimerId, handle: H) {
        self.scopes.entry(scope).or_default().push((id, handle));
    }

    /// A timer fired and is no longer pending. Returns its handle so the host
    /// can release it.
    pub fn fired(&mut self, scope: ScopeId, id: TimerId) -> Option<H> {
        let timers = self.scopes.get_mut(&scope)?;
        let handle = timers
            .iter()
            .position(|(t, _)| *t == id)
            .map(|at| timers.swap_remove(at).1);
        if timers.is_empty() {
            self.scopes.remove(&scope);
        }
        handle
    }

    /// Remove every pending timer of `scope`, returning the handles to clear.
    pub fn revoke(&mut self, scope: ScopeId) -> Vec<H> {
        self.scopes
            .remove(&scope)
            .map(|timers| timers.into_iter().map(|(_, h)| h).collect())
            .unwrap_or_default()
    }

    pub fn pending(&self, scope: ScopeId) -> usize {
        self.scopes.get(&scope).map_or(0, Vec::len)
    }

    pub fn total_pending(&self) -> usize {
        self.scopes.values().map(Vec::len).sum()
    }
}
