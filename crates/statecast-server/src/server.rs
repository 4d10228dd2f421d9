//! Server - Tick loop, broadcast and command routing
//!
//! The server owns the room and one [`ServerPeer`] per connected client.
//!
//! ## Per tick
//!
//! ```text
//! advance room tick
//!  ├── every peer: step client clock, point its entities at the estimate
//!  ├── Simulation::server_update(room)
//!  └── on send ticks:
//!       ├── store entity records
//!       ├── flush removed entities into the destroyed log
//!       ├── prune expired removal notices
//!       └── every peer: scope, diff, pack, send
//! ```
//!
//! Inbound packets are pushed by the host through [`Server::receive`]; their
//! command batches reach an entity only while the sending peer controls it.

use crate::config::ServerConfig;
use crate::error::{Error, Result};
use crate::peer::ServerPeer;
use crate::room::{Room, Simulation};
use crate::scope::{AlwaysRelevant, Scope, ScopeEvaluator};
use indexmap::IndexMap;
use log::{debug, info, trace, warn};
use statecast_core::{Command, ControllerId, EntityId, Registry, State, Tick};
use statecast_netcode::{CommandUpdate, RemovalNotice, Transport};
use std::fmt::Debug;
use std::hash::Hash;

/// Authoritative server for one room
#[derive(Debug)]
pub struct Server<K, S, C> {
    config: ServerConfig,
    registry: Registry<S>,
    room: Room<S, C>,
    peers: IndexMap<K, ServerPeer<K, S, C>>,
    last_controller: ControllerId,
    /// Removal notices still being sent, by entity
    destroyed: IndexMap<EntityId, RemovalNotice>,
}

impl<K, S, C> Server<K, S, C>
where
    K: Clone + Eq + Hash + Debug,
    S: State + 'static,
    C: Command,
{
    pub fn new(config: ServerConfig, registry: Registry<S>) -> Self {
        let room = Room::new(
            config.fixed_delta(),
            config.record_buffer_length,
            config.server_send_rate,
        )
        .with_command_capacity(config.command_buffer_length);
        Self {
            config,
            registry,
            room,
            peers: IndexMap::new(),
            last_controller: ControllerId(0),
            destroyed: IndexMap::new(),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry<S> {
        &self.registry
    }

    pub fn room(&self) -> &Room<S, C> {
        &self.room
    }

    pub fn room_mut(&mut self) -> &mut Room<S, C> {
        &mut self.room
    }

    pub fn tick(&self) -> Tick {
        self.room.tick()
    }

    // ========================================================================
    // Peers
    // ========================================================================

    /// Connect a peer and give it a fresh controller id
    pub fn add_peer(&mut self, key: K) -> Result<ControllerId> {
        self.add_peer_with_evaluator(key, AlwaysRelevant)
    }

    /// Connect a peer with its own relevance policy
    pub fn add_peer_with_evaluator(
        &mut self,
        key: K,
        evaluator: impl ScopeEvaluator<S> + 'static,
    ) -> Result<ControllerId> {
        if self.peers.contains_key(&key) {
            return Err(Error::duplicate_peer(&key));
        }

        self.last_controller = ControllerId(self.last_controller.raw() + 1);
        let controller = self.last_controller;
        let scope = Scope::with_evaluator(evaluator, self.config.min_resend_interval);
        let peer = ServerPeer::new(
            key.clone(),
            controller,
            self.config.client_clock(),
            self.config.command_buffer_length,
            scope,
        );
        self.peers.insert(key.clone(), peer);
        self.room.add_controller(controller);
        info!("peer {:?} connected as {}", key, controller);
        Ok(controller)
    }

    /// Disconnect a peer; the entities it controlled become uncontrolled
    pub fn remove_peer(&mut self, key: &K) -> Result<()> {
        let mut peer = self
            .peers
            .shift_remove(key)
            .ok_or_else(|| Error::unknown_peer(key))?;
        self.room.remove_controller(peer.controller());
        peer.shutdown(&mut self.room);
        info!("peer {:?} ({}) disconnected", key, peer.controller());
        Ok(())
    }

    pub fn peer(&self, key: &K) -> Option<&ServerPeer<K, S, C>> {
        self.peers.get(key)
    }

    pub fn peers(&self) -> impl Iterator<Item = &ServerPeer<K, S, C>> {
        self.peers.values()
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    pub fn set_scope_evaluator(
        &mut self,
        key: &K,
        evaluator: impl ScopeEvaluator<S> + 'static,
    ) -> Result<()> {
        let peer = self.peers.get_mut(key).ok_or_else(|| Error::unknown_peer(key))?;
        peer.set_scope_evaluator(evaluator);
        Ok(())
    }

    fn peer_by_controller(&mut self, controller: ControllerId) -> Option<&mut ServerPeer<K, S, C>> {
        self.peers.values_mut().find(|peer| peer.controller() == controller)
    }

    // ========================================================================
    // Entities
    // ========================================================================

    pub fn create_entity(&mut self, state: S) -> EntityId {
        self.room.create_entity(state)
    }

    /// Mark an entity for removal and revoke its control right away; it leaves
    /// the room on the next send tick
    pub fn remove_entity(&mut self, id: EntityId) -> Result<()> {
        if !self.room.contains(id) {
            return Err(Error::EntityNotFound(id));
        }
        self.revoke_control(id)?;
        self.room.mark_for_removal(id);
        Ok(())
    }

    /// Hand control of an entity to a peer, taking it from any previous one
    pub fn assign_control(&mut self, key: &K, id: EntityId) -> Result<()> {
        let controller = self
            .peers
            .get(key)
            .map(ServerPeer::controller)
            .ok_or_else(|| Error::unknown_peer(key))?;
        match self.room.get(id) {
            Some(entity) if !entity.is_removing() => {}
            _ => return Err(Error::EntityNotFound(id)),
        }

        self.revoke_control(id)?;
        if let Some(entity) = self.room.get_mut(id) {
            entity.set_controller(Some(controller));
        }
        if let Some(peer) = self.peers.get_mut(key) {
            peer.grant_control(id);
        }
        debug!("{} now controlled by {}", id, controller);
        Ok(())
    }

    /// Take control of an entity away from whoever has it
    pub fn revoke_control(&mut self, id: EntityId) -> Result<Option<ControllerId>> {
        let entity = self.room.get_mut(id).ok_or(Error::EntityNotFound(id))?;
        let previous = entity.controller();
        entity.set_controller(None);
        entity.clear_commands();
        if let Some(controller) = previous {
            if let Some(peer) = self.peer_by_controller(controller) {
                peer.release_control(id);
            }
        }
        Ok(previous)
    }

    /// Notices for destroyed entities still being sent
    pub fn removal_notices(&self) -> impl Iterator<Item = &RemovalNotice> {
        self.destroyed.values()
    }

    // ========================================================================
    // Tick loop
    // ========================================================================

    /// Run one simulation step, broadcasting on send ticks
    pub fn update<Sim, T>(&mut self, simulation: &mut Sim, transport: &mut T)
    where
        Sim: Simulation<S, C>,
        T: Transport<K>,
    {
        let tick = self.room.advance_tick();
        for peer in self.peers.values_mut() {
            peer.update();
            for id in peer.controlled() {
                if let Some(entity) = self.room.get_mut(id) {
                    entity.set_command_tick(peer.estimated_remote());
                }
            }
        }

        simulation.server_update(&mut self.room);

        if tick.is_send_tick(self.config.server_send_rate) {
            self.room.store_records();
            self.flush_removed(tick);
            self.prune_removals(tick);
            self.broadcast(tick, transport);
        }
    }

    fn flush_removed(&mut self, tick: Tick) {
        for entity in self.room.flush_removed() {
            let id = entity.id();
            if let Some(controller) = entity.controller() {
                if let Some(peer) = self.peer_by_controller(controller) {
                    peer.release_control(id);
                }
            }
            self.destroyed.insert(id, RemovalNotice::new(id, tick));
            debug!("{} removed at {}", id, tick);
        }
    }

    fn prune_removals(&mut self, tick: Tick) {
        let retention = self.config.removal_retention as i64;
        let expired: Vec<EntityId> = self
            .destroyed
            .values()
            .filter(|notice| tick.diff(notice.removed_tick) > retention)
            .map(|notice| notice.entity_id)
            .collect();
        for id in expired {
            self.destroyed.shift_remove(&id);
            for peer in self.peers.values_mut() {
                peer.forget(id);
            }
        }
    }

    fn broadcast<T: Transport<K>>(&mut self, tick: Tick, transport: &mut T) {
        let removals: Vec<RemovalNotice> = self.destroyed.values().copied().collect();
        let limits = self.config.packet_limits;
        for peer in self.peers.values_mut() {
            if let Err(e) = peer.send_packet(tick, &self.room, &removals, &self.registry, transport, &limits) {
                warn!("send to {:?} failed: {}", peer.key(), e);
            }
        }
    }

    // ========================================================================
    // Receive
    // ========================================================================

    /// Process a datagram from a peer.
    ///
    /// Packets from unknown peers are dropped. A packet that does not decode
    /// is returned as [`Error::Decode`] so the host can disconnect the peer.
    pub fn receive(&mut self, key: &K, bytes: &[u8]) -> Result<()> {
        let limits = self.config.packet_limits;
        let Some(peer) = self.peers.get_mut(key) else {
            warn!("dropping {} bytes from unknown peer {:?}", bytes.len(), key);
            return Ok(());
        };
        let controller = peer.controller();
        let packet = peer.receive_packet(bytes, &limits).map_err(|e| match e {
            statecast_netcode::Error::Decode(source) => {
                warn!("malformed packet from {:?} ({}): {}", key, controller, source);
                Error::Decode {
                    peer: controller,
                    source,
                }
            }
            other => Error::Netcode(other),
        })?;

        for update in packet.command_updates {
            self.process_command_update(controller, update);
        }
        Ok(())
    }

    /// Route one batch to its entity iff `controller` controls it and it is
    /// not being removed. Returns whether the batch was dispatched.
    fn process_command_update(&mut self, controller: ControllerId, update: CommandUpdate<C>) -> bool {
        let Some(entity) = self.room.get_mut(update.entity_id) else {
            debug!("{} sent commands for unknown {}", controller, update.entity_id);
            return false;
        };
        if !entity.accepts_commands_from(controller) {
            debug!(
                "dropping {} commands from {} for {}",
                update.commands.len(),
                controller,
                update.entity_id
            );
            return false;
        }
        let mut rejected = 0;
        for command in update.commands {
            if !entity.receive_command(command) {
                rejected += 1;
            }
        }
        if rejected > 0 {
            trace!(
                "{} sent {} stale or repeated commands for {}",
                controller, rejected, update.entity_id
            );
        }
        true
    }
}
