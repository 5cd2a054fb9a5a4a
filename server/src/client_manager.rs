//! Connection bookkeeping for the UDP server
//!
//! Every datagram source that joined a room becomes a [`Client`]. The manager
//! assigns player ids, remembers which room each client sits in and reports
//! clients that went silent so the server can take them out of their room.

use log::info;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// A connected player
#[derive(Debug)]
pub struct Client {
    /// Player id assigned by the server, also used as the snake owner id
    pub id: u32,
    pub addr: SocketAddr,
    pub name: String,
    /// Normalized code of the room this client joined
    pub room: String,
    /// Last time we received any packet from this client
    pub last_seen: Instant,
}

impl Client {
    pub fn new(id: u32, addr: SocketAddr, name: String, room: String) -> Self {
        Self {
            id,
            addr,
            name,
            room,
            last_seen: Instant::now(),
        }
    }

    /// Returns true if nothing arrived from this client within `timeout`
    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }
}

pub struct ClientManager {
    clients: HashMap<u32, Client>,
    next_client_id: u32,
    max_clients: usize,
    timeout: Duration,
}

impl ClientManager {
    /// Client ids start from 1 and are never reused
    pub fn new(max_clients: usize, timeout: Duration) -> Self {
        Self {
            clients: HashMap::new(),
            next_client_id: 1,
            max_clients,
            timeout,
        }
    }

    /// Registers a client; `None` when the server is at capacity
    pub fn add_client(&mut self, addr: SocketAddr, name: String, room: String) -> Option<u32> {
        if self.clients.len() >= self.max_clients {
            return None;
        }

        let client_id = self.next_client_id;
        self.next_client_id += 1;

        info!(
            "Client {} ({}) connected from {} to room {}",
            client_id, name, addr, room
        );
        self.clients
            .insert(client_id, Client::new(client_id, addr, name, room));

        Some(client_id)
    }

    /// Removes a client and returns it, so the caller can leave its room
    pub fn remove_client(&mut self, client_id: &u32) -> Option<Client> {
        let client = self.clients.remove(client_id)?;
        info!("Client {} disconnected", client.id);
        Some(client)
    }

    pub fn get(&self, client_id: &u32) -> Option<&Client> {
        self.clients.get(client_id)
    }

    pub fn find_client_by_addr(&self, addr: SocketAddr) -> Option<u32> {
        self.clients
            .iter()
            .find(|(_, client)| client.addr == addr)
            .map(|(id, _)| *id)
    }

    /// Refreshes liveness for the client at `addr`; returns its id and room
    pub fn touch(&mut self, addr: SocketAddr) -> Option<(u32, String)> {
        let client = self.clients.values_mut().find(|c| c.addr == addr)?;
        client.last_seen = Instant::now();
        Some((client.id, client.room.clone()))
    }

    pub fn count_in_room(&self, room: &str) -> usize {
        self.clients.values().filter(|c| c.room == room).count()
    }

    /// Removes clients that went silent and returns `(id, room)` for each
    pub fn check_timeouts(&mut self) -> Vec<(u32, String)> {
        let timeout = self.timeout;
        let timed_out: Vec<u32> = self
            .clients
            .iter()
            .filter(|(_, client)| client.is_timed_out(timeout))
            .map(|(id, _)| *id)
            .collect();

        timed_out
            .into_iter()
            .filter_map(|id| self.remove_client(&id))
            .map(|client| (client.id, client.room))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_addr() -> SocketAddr {
        "127.0.0.1:8080".parse().unwrap()
    }

    fn test_addr2() -> SocketAddr {
        "127.0.0.1:8081".parse().unwrap()
    }

    fn manager(max_clients: usize) -> ClientManager {
        ClientManager::new(max_clients, Duration::from_secs(5))
    }

    #[test]
    fn test_client_timeout() {
        let mut client = Client::new(1, test_addr(), "alice".into(), "LOBBY".into());
        assert!(!client.is_timed_out(Duration::from_secs(1)));

        client.last_seen = Instant::now() - Duration::from_secs(2);
        assert!(client.is_timed_out(Duration::from_secs(1)));
    }

    #[test]
    fn test_add_multiple_clients() {
        let mut manager = manager(3);

        let id1 = manager.add_client(test_addr(), "alice".into(), "LOBBY".into());
        let id2 = manager.add_client(test_addr2(), "bob".into(), "ARENA".into());

        assert_eq!(id1, Some(1));
        assert_eq!(id2, Some(2));
        assert_eq!(manager.len(), 2);
        assert_eq!(manager.count_in_room("LOBBY"), 1);
        assert_eq!(manager.count_in_room("ARENA"), 1);
    }

    #[test]
    fn test_add_client_max_capacity() {
        let mut manager = manager(1);

        assert!(manager
            .add_client(test_addr(), "alice".into(), "LOBBY".into())
            .is_some());
        assert!(manager
            .add_client(test_addr2(), "bob".into(), "LOBBY".into())
            .is_none());
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_remove_client_returns_room() {
        let mut manager = manager(2);
        let id = manager
            .add_client(test_addr(), "alice".into(), "ARENA".into())
            .unwrap();

        let removed = manager.remove_client(&id).unwrap();
        assert_eq!(removed.room, "ARENA");
        assert!(manager.is_empty());
        assert!(manager.remove_client(&id).is_none());
    }

    #[test]
    fn test_find_and_touch_by_addr() {
        let mut manager = manager(2);
        let id = manager
            .add_client(test_addr(), "alice".into(), "LOBBY".into())
            .unwrap();

        assert_eq!(manager.find_client_by_addr(test_addr()), Some(id));
        assert_eq!(manager.find_client_by_addr(test_addr2()), None);
        assert_eq!(manager.touch(test_addr()), Some((id, "LOBBY".to_string())));
        assert_eq!(manager.touch(test_addr2()), None);
    }

    #[test]
    fn test_check_timeouts_removes_silent_clients() {
        let mut manager = manager(2);
        let stale = manager
            .add_client(test_addr(), "alice".into(), "LOBBY".into())
            .unwrap();
        let fresh = manager
            .add_client(test_addr2(), "bob".into(), "LOBBY".into())
            .unwrap();

        if let Some(client) = manager.clients.get_mut(&stale) {
            client.last_seen = Instant::now() - Duration::from_secs(10);
        }

        let timed_out = manager.check_timeouts();
        assert_eq!(timed_out, vec![(stale, "LOBBY".to_string())]);
        assert!(manager.get(&fresh).is_some());
        assert_eq!(manager.len(), 1);
    }
}
