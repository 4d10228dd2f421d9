//! Per-peer relevance scoping
//!
//! Before every send the peer's [`Scope`] picks which entities are worth a
//! delta. An entity is in scope when the peer controls it or the evaluator
//! says so; recently sent entities can be held back, and the result is ordered
//! least-recently-sent first so a packet that runs out of room rotates fairly
//! across sends.

use crate::entity::Entity;
use indexmap::IndexMap;
use statecast_core::{Command, ControllerId, EntityId, State, Tick};
use std::fmt;

/// Decides whether an entity is relevant to one peer
pub trait ScopeEvaluator<S> {
    fn evaluate(&self, entity_id: EntityId, state: &S) -> bool;
}

/// Everything is relevant
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysRelevant;

impl<S> ScopeEvaluator<S> for AlwaysRelevant {
    fn evaluate(&self, _entity_id: EntityId, _state: &S) -> bool {
        true
    }
}

impl<S, F> ScopeEvaluator<S> for F
where
    F: Fn(EntityId, &S) -> bool,
{
    fn evaluate(&self, entity_id: EntityId, state: &S) -> bool {
        self(entity_id, state)
    }
}

/// Relevance and send history for one peer
pub struct Scope<S> {
    evaluator: Box<dyn ScopeEvaluator<S>>,
    min_resend_interval: u32,
    last_sent: IndexMap<EntityId, Tick>,
}

impl<S: 'static> Scope<S> {
    pub fn new(min_resend_interval: u32) -> Self {
        Self::with_evaluator(AlwaysRelevant, min_resend_interval)
    }

    pub fn with_evaluator(evaluator: impl ScopeEvaluator<S> + 'static, min_resend_interval: u32) -> Self {
        Self {
            evaluator: Box::new(evaluator),
            min_resend_interval,
            last_sent: IndexMap::new(),
        }
    }

    pub fn set_evaluator(&mut self, evaluator: impl ScopeEvaluator<S> + 'static) {
        self.evaluator = Box::new(evaluator);
    }

    /// Entities to diff for a send at `tick`, least recently sent first
    pub fn evaluate<'a, C: Command + 'a>(
        &self,
        candidates: impl IntoIterator<Item = &'a Entity<S, C>>,
        tick: Tick,
        controller: ControllerId,
    ) -> Vec<EntityId>
    where
        S: State + 'a,
    {
        let mut selected: Vec<(EntityId, Option<Tick>)> = candidates
            .into_iter()
            .filter_map(|entity| {
                let id = entity.id();
                let controlled = entity.controller() == Some(controller);
                if !controlled && !self.evaluator.evaluate(id, entity.state()) {
                    return None;
                }
                let last_sent = self.last_sent(id);
                if !controlled && self.is_throttled(last_sent, tick) {
                    return None;
                }
                Some((id, last_sent))
            })
            .collect();

        // None sorts first, so never-sent entities lead; the sort is stable
        selected.sort_by_key(|(_, last_sent)| *last_sent);
        selected.into_iter().map(|(id, _)| id).collect()
    }

    fn is_throttled(&self, last_sent: Option<Tick>, tick: Tick) -> bool {
        match last_sent {
            Some(sent) => tick.diff(sent) < self.min_resend_interval as i64,
            None => false,
        }
    }

    /// Note that a delta for `entity_id` went out at `tick`
    pub fn register_sent(&mut self, entity_id: EntityId, tick: Tick) {
        self.last_sent.insert(entity_id, tick);
    }

    pub fn last_sent(&self, entity_id: EntityId) -> Option<Tick> {
        self.last_sent.get(&entity_id).copied()
    }

    /// Drop the history of a destroyed entity
    pub fn forget(&mut self, entity_id: EntityId) {
        self.last_sent.shift_remove(&entity_id);
    }

    pub fn clear(&mut self) {
        self.last_sent.clear();
    }
}

impl<S> fmt::Debug for Scope<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("min_resend_interval", &self.min_resend_interval)
            .field("last_sent", &self.last_sent)
            .finish_non_exhaustive()
    }
}
