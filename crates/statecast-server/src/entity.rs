//! Server-side entities
//!
//! An entity owns its authoritative state, the history of records used as diff
//! bases, its current controller and a dejitter buffer of the commands its
//! controller sent. Commands are handed to the simulation in tick order and
//! never behind a tick already handed out.

use statecast_core::{
    create_delta, create_record, Command, ControllerId, EntityId, Registry, State, StateDelta, StateRecord, Tick,
    TimedCommand,
};
use statecast_dejitter::DejitterBuffer;

/// One synchronized object in a [`Room`](crate::Room)
#[derive(Debug, Clone)]
pub struct Entity<S, C> {
    id: EntityId,
    state: S,
    controller: Option<ControllerId>,
    removing: bool,
    records: DejitterBuffer<StateRecord<S>>,
    commands: DejitterBuffer<TimedCommand<C>>,
    /// Controller's estimated tick, set by the server each tick
    command_tick: Tick,
    /// Newest command tick handed out by `drain_commands`
    drained: Tick,
}

impl<S: State, C: Command> Entity<S, C> {
    pub(crate) fn new(
        id: EntityId,
        state: S,
        records: DejitterBuffer<StateRecord<S>>,
        commands: DejitterBuffer<TimedCommand<C>>,
    ) -> Self {
        Self {
            id,
            state,
            controller: None,
            removing: false,
            records,
            commands,
            command_tick: Tick::INVALID,
            drained: Tick::INVALID,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    /// Controller allowed to send commands to this entity
    pub fn controller(&self) -> Option<ControllerId> {
        self.controller
    }

    pub(crate) fn set_controller(&mut self, controller: Option<ControllerId>) {
        self.controller = controller;
    }

    /// Marked for removal; it leaves the room on the next send tick
    pub fn is_removing(&self) -> bool {
        self.removing
    }

    pub(crate) fn mark_removing(&mut self) {
        self.removing = true;
    }

    /// Whether a command batch from `controller` may reach this entity
    pub fn accepts_commands_from(&self, controller: ControllerId) -> bool {
        self.controller == Some(controller) && !self.removing
    }

    /// Buffer a command from the controller.
    ///
    /// Resent ticks and ticks at or before the last drain are rejected.
    pub(crate) fn receive_command(&mut self, command: TimedCommand<C>) -> bool {
        if command.tick <= self.drained || self.commands.get(command.tick).is_some() {
            return false;
        }
        self.commands.store(command)
    }

    /// Commands received since the last drain, in ascending tick order
    pub fn drain_commands(&mut self) -> std::vec::IntoIter<TimedCommand<C>> {
        let drained = self.drained;
        let pending: Vec<TimedCommand<C>> = self
            .commands
            .iter()
            .filter(|command| command.tick > drained)
            .cloned()
            .collect();
        if let Some(last) = pending.last() {
            self.drained = last.tick;
        }
        pending.into_iter()
    }

    pub fn pending_commands(&self) -> usize {
        self.commands.iter().filter(|command| command.tick > self.drained).count()
    }

    /// Command for the controller's estimated tick: the newest one at or before it
    pub fn latest_command(&self) -> Option<&TimedCommand<C>> {
        self.commands.latest_at(self.command_tick)
    }

    /// The controlling peer's estimated tick; invalid while uncontrolled
    pub fn command_tick(&self) -> Tick {
        self.command_tick
    }

    pub(crate) fn set_command_tick(&mut self, tick: Tick) {
        self.command_tick = tick;
    }

    /// Forget every command; a new controller counts ticks on its own clock
    pub(crate) fn clear_commands(&mut self) {
        self.commands.clear();
        self.command_tick = Tick::INVALID;
        self.drained = Tick::INVALID;
    }

    /// Snapshot the state at `tick` unless it matches the latest record
    pub(crate) fn store_record(&mut self, tick: Tick) -> bool {
        match create_record(tick, &self.state, self.records.latest()) {
            Some(record) => self.records.store(record),
            None => false,
        }
    }

    /// Record describing the state as of `tick`
    pub fn record_at(&self, tick: Tick) -> Option<&StateRecord<S>> {
        self.records.latest_at(tick)
    }

    pub fn records(&self) -> &DejitterBuffer<StateRecord<S>> {
        &self.records
    }

    /// Delta for one destination peer.
    ///
    /// `acked` is the newest tick that peer has acknowledged for this entity.
    /// Without one there is no basis, and the immutable partition is included.
    pub(crate) fn produce_delta(
        &self,
        registry: &Registry<S>,
        tick: Tick,
        destination: ControllerId,
        acked: Option<Tick>,
    ) -> Option<StateDelta<S>> {
        let basis = acked.and_then(|acked| self.records.latest_at(acked));
        create_delta(
            registry,
            tick,
            self.id,
            &self.state,
            basis,
            self.controller == Some(destination),
            acked.is_none(),
            false,
        )
    }
}
