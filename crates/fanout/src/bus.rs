// SPDX-FileCopyrightText: Baselayer contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Bridges the blocking zmq SUB socket to the websocket server's async
//! actors: a dedicated thread owns the socket and a small topic-refcount
//! table, forwarding every frame it receives onto a
//! [`tokio::sync::broadcast`] channel the actors subscribe to.

use bytes::Bytes;
use std::collections::HashMap;
use std::thread;
use tokio::sync::{broadcast, mpsc};

/// One message as received from the bus, before the websocket server
/// decides which sockets it is relevant to.
#[derive(Debug, Clone)]
pub struct FanoutMessage {
    pub routing_key: String,
    pub payload: Bytes,
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Subscribe(String),
    Unsubscribe(String),
}

/// What the socket thread should do in response to a refcount transition.
#[derive(Debug, PartialEq, Eq)]
enum SocketAction {
    Subscribe(String),
    Unsubscribe(String),
    None,
}

/// Applies `cmd` to `refcounts` and reports whether a 0→1 or 1→0 edge was
/// crossed, since libzmq does not itself refcount repeated `subscribe()`
/// calls on the same topic.
fn apply_command(refcounts: &mut HashMap<String, usize>, cmd: Command) -> SocketAction {
    match cmd {
        Command::Subscribe(topic) => {
            let count = refcounts.entry(topic.clone()).or_insert(0);
            *count += 1;
            if *count == 1 {
                SocketAction::Subscribe(topic)
            } else {
                SocketAction::None
            }
        }
        Command::Unsubscribe(topic) => match refcounts.get_mut(&topic) {
            Some(count) => {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    refcounts.remove(&topic);
                    SocketAction::Unsubscribe(topic)
                } else {
                    SocketAction::None
                }
            }
            None => SocketAction::None,
        },
    }
}

/// Handle to the running SUB-socket thread.
#[derive(Clone)]
pub struct SubBus {
    cmd_tx: mpsc::UnboundedSender<Command>,
    broadcast_tx: broadcast::Sender<FanoutMessage>,
}

impl SubBus {
    /// Connects SUB to `egress`, subscribes to the broadcast topic `*` and
    /// starts forwarding.
    pub fn spawn(egress: &str) -> zmq::Result<Self> {
        let ctx = zmq::Context::new();
        let socket = ctx.socket(zmq::SUB)?;
        socket.connect(egress)?;
        socket.set_subscribe(b"*")?;

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (broadcast_tx, _) = broadcast::channel(1024);
        let broadcast_tx_thread = broadcast_tx.clone();

        thread::Builder::new()
            .name("baselayer-sub-bus".into())
            .spawn(move || run(socket, cmd_rx, broadcast_tx_thread))
            .expect("spawning the SUB-bus thread never fails under normal OS resource limits");

        Ok(Self { cmd_tx, broadcast_tx })
    }

    /// Starts routing messages addressed to `user_id` to this server, if
    /// this is the first socket requesting them.
    pub fn subscribe_user(&self, user_id: i64) {
        let _ = self.cmd_tx.send(Command::Subscribe(user_id.to_string()));
    }

    /// Stops routing messages addressed to `user_id`, if no socket on this
    /// server is still listening for them.
    pub fn unsubscribe_user(&self, user_id: i64) {
        let _ = self.cmd_tx.send(Command::Unsubscribe(user_id.to_string()));
    }

    /// A fresh receiver that observes every message forwarded from now on.
    pub fn receiver(&self) -> broadcast::Receiver<FanoutMessage> {
        self.broadcast_tx.subscribe()
    }
}

fn run(socket: zmq::Socket, mut cmd_rx: mpsc::UnboundedReceiver<Command>, broadcast_tx: broadcast::Sender<FanoutMessage>) {
    let mut refcounts: HashMap<String, usize> = HashMap::new();

    loop {
        while let Ok(cmd) = cmd_rx.try_recv() {
            match apply_command(&mut refcounts, cmd) {
                SocketAction::Subscribe(topic) => {
                    if let Err(e) = socket.set_subscribe(topic.as_bytes()) {
                        log::error!("sub-bus: failed to subscribe to {topic}: {e}");
                    }
                }
                SocketAction::Unsubscribe(topic) => {
                    if let Err(e) = socket.set_unsubscribe(topic.as_bytes()) {
                        log::error!("sub-bus: failed to unsubscribe from {topic}: {e}");
                    }
                }
                SocketAction::None => {}
            }
        }

        match socket.poll(zmq::POLLIN, 50) {
            Ok(n) if n > 0 => {}
            Ok(_) => continue,
            Err(e) => {
                log::error!("sub-bus: poll failed: {e}");
                continue;
            }
        }

        let routing_key = match socket.recv_bytes(zmq::DONTWAIT) {
            Ok(bytes) => bytes,
            Err(zmq::Error::EAGAIN) => continue,
            Err(e) => {
                log::error!("sub-bus: failed to receive routing key: {e}");
                continue;
            }
        };
        let payload = match socket.recv_bytes(0) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::error!("sub-bus: failed to receive payload frame: {e}");
                continue;
            }
        };

        let routing_key = match String::from_utf8(routing_key) {
            Ok(s) => s,
            Err(_) => {
                log::warn!("sub-bus: routing key was not valid UTF-8, dropping message");
                continue;
            }
        };

        // A lagging or absent receiver is not an error: broadcast::send
        // only fails when every receiver has been dropped.
        let _ = broadcast_tx.send(FanoutMessage {
            routing_key,
            payload: Bytes::from(payload),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_subscriber_triggers_a_socket_subscribe() {
        let mut refcounts = HashMap::new();
        let action = apply_command(&mut refcounts, Command::Subscribe("42".into()));
        assert_eq!(action, SocketAction::Subscribe("42".into()));
        assert_eq!(refcounts.get("42"), Some(&1));
    }

    #[test]
    fn second_subscriber_to_the_same_topic_does_not_resubscribe() {
        let mut refcounts = HashMap::new();
        apply_command(&mut refcounts, Command::Subscribe("42".into()));
        let action = apply_command(&mut refcounts, Command::Subscribe("42".into()));
        assert_eq!(action, SocketAction::None);
        assert_eq!(refcounts.get("42"), Some(&2));
    }

    #[test]
    fn last_unsubscribe_triggers_a_socket_unsubscribe_and_clears_the_entry() {
        let mut refcounts = HashMap::new();
        apply_command(&mut refcounts, Command::Subscribe("42".into()));
        apply_command(&mut refcounts, Command::Subscribe("42".into()));
        let action = apply_command(&mut refcounts, Command::Unsubscribe("42".into()));
        assert_eq!(action, SocketAction::None);
        assert_eq!(refcounts.get("42"), Some(&1));

        let action = apply_command(&mut refcounts, Command::Unsubscribe("42".into()));
        assert_eq!(action, SocketAction::Unsubscribe("42".into()));
        assert!(!refcounts.contains_key("42"));
    }

    #[test]
    fn unsubscribing_an_unknown_topic_is_a_no_op() {
        let mut refcounts = HashMap::new();
        let action = apply_command(&mut refcounts, Command::Unsubscribe("99".into()));
        assert_eq!(action, SocketAction::None);
        assert!(refcounts.is_empty());
    }
}
