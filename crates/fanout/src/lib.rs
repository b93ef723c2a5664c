// SPDX-FileCopyrightText: Baselayer contributors
//
// SPDX-License-Identifier: Apache-2.0

//! The websocket fan-out plane: a ZeroMQ PULL/PUB broker, the handler-side
//! PUSH client, and an authenticated `actix-web-actors` websocket server
//! that bridges the two to browser subscribers.

mod broker;
mod bus;
mod error;
mod push;
mod server;
mod token;

pub use broker::Broker;
pub use bus::{FanoutMessage, SubBus};
pub use error::{FanoutError, Result, TokenError};
pub use push::{PushClient, Target};
pub use server::{ws_index, FanoutState};
pub use token::{issue as issue_token, verify as verify_token};
