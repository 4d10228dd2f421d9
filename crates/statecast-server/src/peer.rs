//! Server-side session for one connected client
//!
//! A peer estimates the client's clock, buffers the client's commands against
//! jitter, remembers which server ticks the client has acknowledged and builds
//! the client's packets.

use crate::room::Room;
use crate::scope::{Scope, ScopeEvaluator};
use indexmap::IndexSet;
use log::{debug, trace};
use statecast_core::{BitWriter, Command, ControllerId, EntityId, Registry, State, StateDelta, Tick, TimedCommand};
use statecast_dejitter::DejitterBuffer;
use statecast_netcode::{
    ClientPacket, ClockConfig, ClockEstimator, Error, PacketLimits, RemovalNotice, Result, ServerPacket, Transport,
    View,
};

/// One connected client, as seen by the server
#[derive(Debug)]
pub struct ServerPeer<K, S, C> {
    key: K,
    controller: ControllerId,
    clock: ClockEstimator,
    command_buffer: DejitterBuffer<TimedCommand<C>>,
    scope: Scope<S>,
    controlled: IndexSet<EntityId>,
    latest_command: Option<TimedCommand<C>>,
    command_ack: Tick,
    acked_view: View,
    /// Reused between sends
    candidates: Vec<StateDelta<S>>,
    outgoing: Vec<StateDelta<S>>,
    writer: BitWriter,
}

impl<K, S, C> ServerPeer<K, S, C>
where
    S: State + 'static,
    C: Command,
{
    pub fn new(key: K, controller: ControllerId, clock: ClockConfig, command_capacity: usize, scope: Scope<S>) -> Self {
        Self {
            key,
            controller,
            clock: ClockEstimator::new(clock),
            command_buffer: DejitterBuffer::new(command_capacity),
            scope,
            controlled: IndexSet::new(),
            latest_command: None,
            command_ack: Tick::INVALID,
            acked_view: View::new(),
            candidates: Vec::new(),
            outgoing: Vec::new(),
            writer: BitWriter::new(),
        }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn controller(&self) -> ControllerId {
        self.controller
    }

    /// Estimated client tick
    pub fn estimated_remote(&self) -> Tick {
        self.clock.estimated_remote()
    }

    /// Command for the estimated client tick, if one arrived in time
    pub fn latest_command(&self) -> Option<&TimedCommand<C>> {
        self.latest_command.as_ref()
    }

    /// Newest client command tick consumed, echoed back to the client
    pub fn command_ack(&self) -> Tick {
        self.command_ack
    }

    /// Server ticks the client has acknowledged, per entity
    pub fn acked_view(&self) -> &View {
        &self.acked_view
    }

    pub fn controlled(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.controlled.iter().copied()
    }

    pub fn controls(&self, entity_id: EntityId) -> bool {
        self.controlled.contains(&entity_id)
    }

    pub fn scope(&self) -> &Scope<S> {
        &self.scope
    }

    pub fn set_scope_evaluator(&mut self, evaluator: impl ScopeEvaluator<S> + 'static) {
        self.scope.set_evaluator(evaluator);
    }

    pub(crate) fn grant_control(&mut self, entity_id: EntityId) {
        self.controlled.insert(entity_id);
    }

    pub(crate) fn release_control(&mut self, entity_id: EntityId) -> bool {
        self.controlled.shift_remove(&entity_id)
    }

    /// Step the client clock and pick the command for the estimated tick
    ///
    /// Returns the number of client ticks to process this local tick.
    pub fn update(&mut self) -> u32 {
        let ticks = self.clock.advance();
        self.latest_command = self.command_buffer.latest_at(self.clock.estimated_remote()).cloned();
        if let Some(command) = &self.latest_command {
            self.command_ack = command.tick;
        }
        ticks
    }

    /// Whether the client has seen a packet at or after the removal
    fn has_acked_removal(&self, notice: &RemovalNotice) -> bool {
        self.acked_view
            .latest_tick(notice.entity_id)
            .is_some_and(|tick| tick >= notice.removed_tick)
    }

    /// Build and transmit this peer's packet for `tick`.
    ///
    /// Returns how many deltas went out. Deltas that do not fit the byte
    /// budget are dropped for this send and not registered, so the scope
    /// offers them again first next time.
    #[allow(clippy::too_many_arguments)]
    pub fn send_packet<T: Transport<K>>(
        &mut self,
        tick: Tick,
        room: &Room<S, C>,
        removals: &[RemovalNotice],
        registry: &Registry<S>,
        transport: &mut T,
        limits: &PacketLimits,
    ) -> Result<usize> {
        for entity_id in self.scope.evaluate(room.entities(), tick, self.controller) {
            let Some(entity) = room.get(entity_id) else {
                continue;
            };
            let acked = self.acked_view.latest_tick(entity_id);
            if let Some(delta) = entity.produce_delta(registry, tick, self.controller, acked) {
                self.candidates.push(delta);
            }
        }

        let mut packet = ServerPacket::new(tick, self.command_ack);
        packet.deltas = std::mem::take(&mut self.outgoing);

        // notices may take half the budget; the rest wait for a later send
        let budget = limits.max_packet_bytes.saturating_mul(8) as u64;
        let mut removal_bits = 0u64;
        let mut held = 0usize;
        for notice in removals.iter().filter(|notice| !self.has_acked_removal(notice)) {
            let bits = notice.bit_len() as u64;
            if packet.removals.len() as u32 >= limits.max_removals || removal_bits + bits > budget / 2 {
                held += 1;
                continue;
            }
            removal_bits += bits;
            packet.removals.push(*notice);
        }

        let mut used = packet.overhead_bits(limits.max_deltas) as u64;
        let mut pending = 0usize;
        for delta in self.candidates.drain(..) {
            let bits = delta.bit_len(registry) as u64;
            if packet.deltas.len() as u32 >= limits.max_deltas || used + bits > budget {
                pending += 1;
                continue;
            }
            used += bits;
            packet.deltas.push(delta);
        }

        self.writer.clear();
        packet.encode(registry, &mut self.writer);
        let sent = transport.send(&self.key, self.writer.as_bytes());

        let count = packet.deltas.len();
        if sent.is_ok() {
            for delta in &packet.deltas {
                self.scope.register_sent(delta.entity_id(), tick);
            }
            trace!(
                "{} {}: {} deltas ({} pending), {} removals ({} held), {} bytes",
                self.controller,
                tick,
                count,
                pending,
                packet.removals.len(),
                held,
                self.writer.byte_len()
            );
        }

        self.outgoing = packet.deltas;
        self.outgoing.clear();
        sent.map_err(|e| Error::Transport(e.to_string()))?;
        Ok(count)
    }

    /// Decode a client packet and absorb its clock, view and commands
    pub fn receive_packet(&mut self, bytes: &[u8], limits: &PacketLimits) -> Result<ClientPacket<C>> {
        let packet = ClientPacket::decode(bytes, limits)?;
        self.clock.update_latest(packet.tick);
        self.acked_view.integrate(&packet.view);
        for update in &packet.command_updates {
            for command in &update.commands {
                if !self.command_buffer.store(command.clone()) {
                    trace!("{} dropped stale command for {}", self.controller, command.tick);
                }
            }
        }
        Ok(packet)
    }

    /// Forget a destroyed entity once no notice for it is pending
    pub(crate) fn forget(&mut self, entity_id: EntityId) {
        self.scope.forget(entity_id);
        self.acked_view.remove(entity_id);
        self.controlled.shift_remove(&entity_id);
    }

    /// Revoke control of everything this peer controls and drop its buffered
    /// commands
    pub fn shutdown(&mut self, room: &mut Room<S, C>) {
        for entity_id in self.controlled.drain(..) {
            if let Some(entity) = room.get_mut(entity_id) {
                if entity.controller() == Some(self.controller) {
                    entity.set_controller(None);
                    entity.clear_commands();
                }
            }
        }
        self.command_buffer.clear();
        self.latest_command = None;
        debug!("{} shut down", self.controller);
    }
}
