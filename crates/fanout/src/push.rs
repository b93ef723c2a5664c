// SPDX-FileCopyrightText: Baselayer contributors
//
// SPDX-License-Identifier: Apache-2.0

//! The handler-side half of the fan-out plane: a process-wide PUSH socket
//! connected to the broker's ingress, used to publish actions to
//! subscribers.

use crate::error::Result;
use serde::Serialize;
use serde_json::Value;
use std::sync::Mutex;

/// Who a published message is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Every open socket on every websocket server.
    Broadcast,
    /// Every socket currently authenticated as this user.
    User(i64),
}

impl Target {
    fn routing_key(self) -> String {
        match self {
            Target::Broadcast => "*".to_string(),
            Target::User(id) => id.to_string(),
        }
    }

    fn json_user_id(self) -> Value {
        match self {
            Target::Broadcast => Value::String("*".to_string()),
            Target::User(id) => Value::from(id),
        }
    }
}

#[derive(Serialize)]
struct Envelope<'a> {
    user_id: Value,
    #[serde(rename = "actionType")]
    action_type: &'a str,
    payload: Value,
}

/// A process-wide handle to the broker's ingress socket. Sends are
/// non-blocking: the ZMQ PUSH socket queues internally and a failed send
/// is logged, never propagated as a request failure, since fan-out is
/// best-effort.
///
/// zmq's `Socket` is `Send` but not `Sync`; the mutex only ever guards a
/// non-blocking send, so contention is not a concern.
pub struct PushClient {
    socket: Mutex<zmq::Socket>,
}

impl PushClient {
    /// Connects PUSH to the broker's ingress address.
    pub fn connect(ingress: &str) -> zmq::Result<Self> {
        let ctx = zmq::Context::new();
        let socket = ctx.socket(zmq::PUSH)?;
        socket.connect(ingress)?;
        Ok(Self {
            socket: Mutex::new(socket),
        })
    }

    /// Publishes `action_type`/`payload` to `target`.
    #[tracing::instrument(skip(self, payload))]
    pub fn push(&self, target: Target, action_type: &str, payload: Value) -> Result<()> {
        let envelope = Envelope {
            user_id: target.json_user_id(),
            action_type,
            payload,
        };
        let body = serde_json::to_vec(&envelope)?;

        let socket = self.socket.lock().expect("push socket mutex is never poisoned");
        socket.send(target.routing_key().as_bytes(), zmq::SNDMORE | zmq::DONTWAIT)?;
        socket.send(&body, zmq::DONTWAIT)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_routes_to_the_wildcard_topic() {
        assert_eq!(Target::Broadcast.routing_key(), "*");
    }

    #[test]
    fn user_target_routes_to_its_id() {
        assert_eq!(Target::User(7).routing_key(), "7");
    }

    #[test]
    fn envelope_carries_the_routing_target_as_its_user_id_field() {
        let envelope = Envelope {
            user_id: Target::User(7).json_user_id(),
            action_type: "RELOAD",
            payload: serde_json::json!({}),
        };
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["user_id"], serde_json::json!(7));
        assert_eq!(value["actionType"], serde_json::json!("RELOAD"));
    }
}
