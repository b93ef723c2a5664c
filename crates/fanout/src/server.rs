// SPDX-FileCopyrightText: Baselayer contributors
//
// SPDX-License-Identifier: Apache-2.0

//! The websocket server: one actor per connection, authenticating the
//! socket against a short-lived token before subscribing it to its user's
//! messages on the bus.

use crate::bus::{FanoutMessage, SubBus};
use crate::token;
use actix::{Actor, ActorContext, AsyncContext, Running, StreamHandler};
use actix_web::{web, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(45);
const MAX_AUTH_FAILURES: u8 = 3;
const OUTBOX_CAPACITY: usize = 64;

/// Shared state every connection handler needs: the signing secret and a
/// handle to the SUB-socket bus.
#[derive(Clone)]
pub struct FanoutState {
    pub secret: Arc<[u8]>,
    pub bus: SubBus,
}

/// `GET /ws` — upgrades to a websocket and hands the connection to a
/// fresh [`WsSession`].
pub async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<FanoutState>,
) -> actix_web::Result<HttpResponse> {
    ws::start(
        WsSession::new(state.secret.clone(), state.bus.clone()),
        &req,
        stream,
    )
}

struct WsSession {
    secret: Arc<[u8]>,
    bus: SubBus,
    user_id: Option<i64>,
    auth_failures: u8,
    outbox: VecDeque<bytestring::ByteString>,
}

impl WsSession {
    fn new(secret: Arc<[u8]>, bus: SubBus) -> Self {
        Self {
            secret,
            bus,
            user_id: None,
            auth_failures: 0,
            outbox: VecDeque::with_capacity(OUTBOX_CAPACITY),
        }
    }

    fn send_control(ctx: &mut ws::WebsocketContext<Self>, action_type: &str) {
        let body = serde_json::json!({ "actionType": action_type }).to_string();
        ctx.text(body);
    }

    fn request_auth(ctx: &mut ws::WebsocketContext<Self>) {
        Self::send_control(ctx, "AUTH REQUEST");
    }

    fn handle_auth_attempt(&mut self, raw_token: &str, ctx: &mut ws::WebsocketContext<Self>) {
        match token::verify(&self.secret, raw_token) {
            Ok(user_id) => {
                let user_id = user_id.inner().to_owned();
                self.user_id = Some(user_id);
                self.bus.subscribe_user(user_id);
                Self::send_control(ctx, "AUTH OK");
            }
            Err(_) => {
                Self::send_control(ctx, "AUTH FAILED");
                self.auth_failures += 1;
                if self.auth_failures < MAX_AUTH_FAILURES {
                    Self::request_auth(ctx);
                }
            }
        }
    }

    /// Enqueues `text` for delivery, dropping the oldest queued message if
    /// the bounded outbox is already full rather than blocking the actor
    /// on a slow client.
    fn enqueue(&mut self, text: bytestring::ByteString, ctx: &mut ws::WebsocketContext<Self>) {
        if self.outbox.len() >= OUTBOX_CAPACITY {
            self.outbox.pop_front();
            log::warn!("websocket outbox full for user {:?}, dropping oldest message", self.user_id);
        }
        self.outbox.push_back(text);
        self.flush(ctx);
    }

    fn flush(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        for msg in self.outbox.drain(..) {
            ctx.text(msg);
        }
    }
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        Self::request_auth(ctx);

        // One-way keepalive: defeats idle-timeout proxies between the
        // server and the browser. No reply is expected or required.
        ctx.run_interval(HEARTBEAT_INTERVAL, |_act, ctx| {
            ctx.binary(&b"<3"[..]);
        });

        let stream = BroadcastStream::new(self.bus.receiver()).filter_map(|msg| msg.ok());
        ctx.add_stream(stream);
    }

    fn stopping(&mut self, _ctx: &mut Self::Context) -> Running {
        if let Some(user_id) = self.user_id {
            self.bus.unsubscribe_user(user_id);
        }
        Running::Stop
    }
}

impl StreamHandler<FanoutMessage> for WsSession {
    fn handle(&mut self, msg: FanoutMessage, ctx: &mut Self::Context) {
        let targeted = match (self.user_id, msg.routing_key.as_str()) {
            (_, "*") => true,
            (Some(uid), key) => key == uid.to_string(),
            (None, _) => false,
        };
        if !targeted {
            return;
        }

        match std::str::from_utf8(&msg.payload) {
            Ok(text) => self.enqueue(bytestring::ByteString::from(text.to_owned()), ctx),
            Err(_) => log::warn!("dropping non-UTF8 fan-out payload"),
        }
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                log::warn!("websocket protocol error: {e}");
                ctx.stop();
                return;
            }
        };

        match msg {
            ws::Message::Ping(bytes) => ctx.pong(&bytes),
            ws::Message::Pong(_) => {}
            ws::Message::Text(text) => {
                if self.user_id.is_none() {
                    self.handle_auth_attempt(text.trim(), ctx);
                }
            }
            ws::Message::Close(reason) => {
                ctx.close(reason);
                ctx.stop();
            }
            ws::Message::Binary(_) | ws::Message::Continuation(_) | ws::Message::Nop => {}
        }
    }
}
