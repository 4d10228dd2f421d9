//! The room: tick, live entities and the controller roster
//!
//! The [`Simulation`] hook gets mutable access to the room once per tick to
//! move entities, drain their commands, spawn and remove them.

use crate::entity::Entity;
use indexmap::{IndexMap, IndexSet};
use statecast_core::{Command, ControllerId, EntityId, State, Tick};
use statecast_dejitter::DejitterBuffer;

const DEFAULT_COMMAND_CAPACITY: usize = 64;

/// Game logic driven by the server once per tick
pub trait Simulation<S, C> {
    fn server_update(&mut self, room: &mut Room<S, C>);
}

impl<S, C, F> Simulation<S, C> for F
where
    F: FnMut(&mut Room<S, C>),
{
    fn server_update(&mut self, room: &mut Room<S, C>) {
        self(room)
    }
}

/// Live entities of one simulation
#[derive(Debug, Clone)]
pub struct Room<S, C> {
    tick: Tick,
    fixed_delta: f32,
    entities: IndexMap<EntityId, Entity<S, C>>,
    last_entity_id: EntityId,
    controllers: IndexSet<ControllerId>,
    record_capacity: usize,
    record_divisor: u32,
    command_capacity: usize,
}

impl<S: State, C: Command> Room<S, C> {
    /// Create an empty room
    ///
    /// Entity record histories get `record_capacity` slots spanning
    /// `record_divisor` ticks each.
    pub fn new(fixed_delta: f32, record_capacity: usize, record_divisor: u32) -> Self {
        Self {
            tick: Tick::INVALID,
            fixed_delta,
            entities: IndexMap::new(),
            last_entity_id: EntityId::INVALID,
            controllers: IndexSet::new(),
            record_capacity,
            record_divisor,
            command_capacity: DEFAULT_COMMAND_CAPACITY,
        }
    }

    /// Give every entity created from now on `capacity` command slots
    pub fn with_command_capacity(mut self, capacity: usize) -> Self {
        self.command_capacity = capacity;
        self
    }

    /// Current tick; invalid until the first update
    pub fn tick(&self) -> Tick {
        self.tick
    }

    /// Seconds per tick
    pub fn fixed_delta(&self) -> f32 {
        self.fixed_delta
    }

    pub(crate) fn advance_tick(&mut self) -> Tick {
        self.tick = self.tick.next();
        self.tick
    }

    /// Spawn an entity; ids are allocated in increasing order from 1
    pub fn create_entity(&mut self, state: S) -> EntityId {
        self.last_entity_id = self.last_entity_id.next();
        let id = self.last_entity_id;
        let records = DejitterBuffer::with_divisor(self.record_capacity, self.record_divisor);
        let commands = DejitterBuffer::new(self.command_capacity);
        self.entities.insert(id, Entity::new(id, state, records, commands));
        id
    }

    /// Mark an entity for removal at the next send tick.
    ///
    /// Returns false if the entity does not exist or is already removing.
    pub fn mark_for_removal(&mut self, id: EntityId) -> bool {
        match self.entities.get_mut(&id) {
            Some(entity) if !entity.is_removing() => {
                entity.mark_removing();
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity<S, C>> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity<S, C>> {
        self.entities.get_mut(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Entities in creation order
    pub fn entities(&self) -> impl Iterator<Item = &Entity<S, C>> {
        self.entities.values()
    }

    pub fn entities_mut(&mut self) -> impl Iterator<Item = &mut Entity<S, C>> {
        self.entities.values_mut()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Controllers of connected peers
    pub fn controllers(&self) -> impl Iterator<Item = ControllerId> + '_ {
        self.controllers.iter().copied()
    }

    pub(crate) fn add_controller(&mut self, controller: ControllerId) {
        self.controllers.insert(controller);
    }

    pub(crate) fn remove_controller(&mut self, controller: ControllerId) {
        self.controllers.shift_remove(&controller);
    }

    /// Record every entity's state at the current tick
    pub(crate) fn store_records(&mut self) {
        let tick = self.tick;
        for entity in self.entities.values_mut() {
            entity.store_record(tick);
        }
    }

    /// Take every entity marked for removal out of the room
    pub(crate) fn flush_removed(&mut self) -> Vec<Entity<S, C>> {
        let removing: Vec<EntityId> = self
            .entities
            .values()
            .filter(|entity| entity.is_removing())
            .map(Entity::id)
            .collect();
        removing
            .into_iter()
            .filter_map(|id| self.entities.shift_remove(&id))
            .collect()
    }
}
