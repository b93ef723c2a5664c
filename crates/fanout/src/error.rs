// SPDX-FileCopyrightText: Baselayer contributors
//
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

/// Errors raised while issuing or verifying a websocket auth token.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is malformed or its signature does not verify")]
    Invalid,
    #[error("token has expired")]
    Expired,
}

/// Errors raised by the broker and push client.
#[derive(Debug, Error)]
pub enum FanoutError {
    #[error("zmq error: {0}")]
    Zmq(#[from] zmq::Error),
    #[error("failed to serialize fan-out envelope: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T, E = FanoutError> = std::result::Result<T, E>;
