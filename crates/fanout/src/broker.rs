// SPDX-FileCopyrightText: Baselayer contributors
//
// SPDX-License-Identifier: Apache-2.0

//! The message bus broker: forwards every multipart message it receives on
//! its PULL (ingress) socket straight to its PUB (egress) socket.
//!
//! zmq's socket API blocks, so it cannot run on the async executor handler
//! processes use elsewhere; the broker gets its own OS thread instead,
//! matching the single-threaded-forwarder process model.

use std::thread::{self, JoinHandle};

/// A running broker forwarder thread. Dropping this does not stop the
/// thread — the broker is meant to run for the lifetime of the process.
pub struct Broker {
    handle: JoinHandle<()>,
}

impl Broker {
    /// Binds PULL on `ingress` and PUB on `egress` and starts forwarding.
    pub fn spawn(ingress: &str, egress: &str) -> zmq::Result<Self> {
        let ctx = zmq::Context::new();
        let pull = ctx.socket(zmq::PULL)?;
        pull.bind(ingress)?;
        let pub_ = ctx.socket(zmq::PUB)?;
        pub_.bind(egress)?;

        let handle = thread::Builder::new()
            .name("baselayer-broker".into())
            .spawn(move || forward(&pull, &pub_))
            .expect("spawning the broker thread never fails under normal OS resource limits");

        Ok(Self { handle })
    }

    /// Blocks until the broker thread exits (it normally never does).
    pub fn join(self) {
        let _ = self.handle.join();
    }
}

fn forward(pull: &zmq::Socket, pub_: &zmq::Socket) {
    loop {
        let routing_key = match pull.recv_bytes(0) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::error!("broker: failed to receive routing key: {e}");
                continue;
            }
        };
        let more = pull.get_rcvmore().unwrap_or(false);
        if !more {
            log::warn!("broker: dropping single-frame message, expected routing key + payload");
            continue;
        }
        let payload = match pull.recv_bytes(0) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::error!("broker: failed to receive payload frame: {e}");
                continue;
            }
        };

        if let Err(e) = pub_.send(&routing_key, zmq::SNDMORE) {
            log::error!("broker: failed to forward routing key: {e}");
            continue;
        }
        if let Err(e) = pub_.send(&payload, 0) {
            log::error!("broker: failed to forward payload: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn forwards_a_multipart_message_from_pull_to_pub() {
        let ingress = "tcp://127.0.0.1:17301";
        let egress = "tcp://127.0.0.1:17302";
        let _broker = Broker::spawn(ingress, egress).expect("broker binds");

        // Give the broker thread time to start its receive loop.
        thread::sleep(Duration::from_millis(100));

        let ctx = zmq::Context::new();
        let push = ctx.socket(zmq::PUSH).unwrap();
        push.connect(ingress).unwrap();
        let sub = ctx.socket(zmq::SUB).unwrap();
        sub.connect(egress).unwrap();
        sub.set_subscribe(b"room-1").unwrap();

        // Subscriptions propagate asynchronously; give the PUB socket time
        // to see it before sending.
        thread::sleep(Duration::from_millis(200));

        push.send("room-1", zmq::SNDMORE).unwrap();
        push.send("hello", 0).unwrap();

        let routing_key = sub.recv_string(0).unwrap().unwrap();
        assert_eq!(routing_key, "room-1");
        assert!(sub.get_rcvmore().unwrap());
        let payload = sub.recv_string(0).unwrap().unwrap();
        assert_eq!(payload, "hello");
    }
}
