//! Transport trait for outbound datagrams
//!
//! The engine never owns sockets. Hosts implement [`Transport`] for their
//! network stack (UDP, WebRTC, an in-memory loopback in tests) and push
//! inbound bytes into the server themselves.

use std::fmt;

/// Unreliable, unordered datagram sender keyed by peer
///
/// `K` is whatever the host uses to tell peers apart: a socket address, a
/// connection handle, an index.
pub trait Transport<K> {
    /// Error type for this transport
    type Error: fmt::Display;

    /// Send one datagram to a peer; delivery is best effort
    fn send(&mut self, key: &K, bytes: &[u8]) -> Result<(), Self::Error>;
}

/// Loopback transport that keeps every datagram it is handed
#[derive(Debug, Clone)]
pub struct RecordingTransport<K> {
    sent: Vec<(K, Vec<u8>)>,
}

impl<K: Clone> RecordingTransport<K> {
    pub fn new() -> Self {
        Self { sent: Vec::new() }
    }

    pub fn sent(&self) -> &[(K, Vec<u8>)] {
        &self.sent
    }

    /// Datagrams sent to `key`, oldest first
    pub fn sent_to<'a>(&'a self, key: &'a K) -> impl Iterator<Item = &'a [u8]> + 'a
    where
        K: PartialEq,
    {
        self.sent
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, bytes)| bytes.as_slice())
    }

    /// Take everything sent so far
    pub fn drain(&mut self) -> Vec<(K, Vec<u8>)> {
        std::mem::take(&mut self.sent)
    }
}

impl<K: Clone> Default for RecordingTransport<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone> Transport<K> for RecordingTransport<K> {
    type Error = std::convert::Infallible;

    fn send(&mut self, key: &K, bytes: &[u8]) -> Result<(), Self::Error> {
        self.sent.push((key.clone(), bytes.to_vec()));
        Ok(())
    }
}
