// SPDX-FileCopyrightText: Baselayer contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Connection-pool gauges, sampled on every checkout.
//!
//! Kept deliberately small: Baselayer does not wrap every query in an
//! instrumented [`diesel::Connection`] (that trait's method set is brittle
//! to hand-roll across diesel point releases, and diesel 2 does not expose
//! the per-query hooks the wrapper would need). Instead the pool's own
//! `r2d2::State` is sampled in [`super::Db::get_conn`] and exposed here for
//! an application to forward into whatever metrics backend it uses.
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time connection-pool occupancy.
#[derive(Debug, Default)]
pub struct DatabaseMetrics {
    connections: AtomicU64,
    idle_connections: AtomicU64,
    checkouts: AtomicU64,
    checkout_errors: AtomicU64,
}

impl DatabaseMetrics {
    pub fn record_state(&self, connections: u32, idle_connections: u32) {
        self.connections.store(connections as u64, Ordering::Relaxed);
        self.idle_connections
            .store(idle_connections as u64, Ordering::Relaxed);
    }

    pub fn record_checkout(&self) {
        self.checkouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_checkout_error(&self) {
        self.checkout_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connections(&self) -> u64 {
        self.connections.load(Ordering::Relaxed)
    }

    pub fn idle_connections(&self) -> u64 {
        self.idle_connections.load(Ordering::Relaxed)
    }

    pub fn checkouts(&self) -> u64 {
        self.checkouts.load(Ordering::Relaxed)
    }

    pub fn checkout_errors(&self) -> u64 {
        self.checkout_errors.load(Ordering::Relaxed)
    }
}
