//! Explicit state factory context
//!
//! Decoding a delta needs to build an empty state of the right variant from a
//! type id read off the wire. The registry owns those constructors and the
//! compressor for the type id, and is passed by reference wherever it is
//! needed.

use crate::compressor::IntCompressor;
use crate::error::{DecodeError, Result};
use crate::state::State;
use indexmap::IndexMap;

/// Constructor for a blank state of one variant
pub type StateFactory<S> = fn() -> S;

/// Maps factory type ids to state constructors
#[derive(Debug, Clone)]
pub struct Registry<S> {
    factories: IndexMap<u32, StateFactory<S>>,
    type_compressor: IntCompressor,
}

impl<S: State> Registry<S> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            factories: IndexMap::new(),
            type_compressor: IntCompressor::new(0, 0),
        }
    }

    /// Register a blank-state constructor under the type id it reports
    ///
    /// Registering the same type id twice replaces the earlier constructor.
    pub fn register(&mut self, factory: StateFactory<S>) -> &mut Self {
        let type_id = factory().type_id();
        self.factories.insert(type_id, factory);
        self.rebuild_compressor();
        self
    }

    /// Builder-style [`Registry::register`]
    pub fn with(mut self, factory: StateFactory<S>) -> Self {
        self.register(factory);
        self
    }

    fn rebuild_compressor(&mut self) {
        let min = self.factories.keys().copied().min().unwrap_or(0);
        let max = self.factories.keys().copied().max().unwrap_or(0);
        self.type_compressor = IntCompressor::new(min, max);
    }

    /// Build a blank state for a type id read from the wire
    pub fn create_state(&self, type_id: u32) -> Result<S> {
        self.factories
            .get(&type_id)
            .map(|factory| factory())
            .ok_or(DecodeError::UnknownStateType(type_id))
    }

    pub fn contains(&self, type_id: u32) -> bool {
        self.factories.contains_key(&type_id)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    pub fn type_compressor(&self) -> &IntCompressor {
        &self.type_compressor
    }
}

impl<S: State> Default for Registry<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_state::*;

    #[test]
    fn test_register_and_create() {
        let registry = Registry::new()
            .with(TestState::blank_pawn)
            .with(TestState::blank_crate);

        assert_eq!(registry.len(), 2);
        assert!(registry.contains(PAWN));
        assert_eq!(registry.create_state(CRATE).unwrap(), TestState::blank_crate());
        assert_eq!(registry.type_compressor().required_bits(), 1);
    }

    #[test]
    fn test_unknown_type() {
        let registry = Registry::new().with(TestState::blank_pawn);
        assert_eq!(
            registry.create_state(9),
            Err(DecodeError::UnknownStateType(9))
        );
    }

    #[test]
    fn test_single_type_needs_no_bits() {
        let registry = Registry::new().with(TestState::blank_pawn);
        assert_eq!(registry.type_compressor().required_bits(), 0);
    }
}
