// SPDX-FileCopyrightText: Baselayer contributors
//
// SPDX-License-Identifier: Apache-2.0

use crate::metrics::DatabaseMetrics;
use crate::{DatabaseError, DbConnection};
use diesel::r2d2::ConnectionManager;
use diesel::{r2d2, PgConnection};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

type DbPool = r2d2::Pool<ConnectionManager<PgConnection>>;

/// Database connection settings, loaded by an application's own config layer
/// and passed to [`Db::connect`].
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default)]
    pub min_idle_connections: Option<u32>,
}

fn default_max_connections() -> u32 {
    10
}

/// Db container that uses a connection pool to hand out connections
///
/// Uses an r2d2 connection pool to manage multiple established connections.
pub struct Db {
    metrics: Option<Arc<DatabaseMetrics>>,
    pool: DbPool,
}

impl Db {
    /// Creates a new Db instance from the specified database settings.
    #[tracing::instrument(skip(config))]
    pub fn connect(config: &DatabaseConfig) -> crate::Result<Self> {
        Self::connect_url(&config.url, config.max_connections, config.min_idle_connections)
    }

    /// Creates a new Db instance from the specified database url.
    pub fn connect_url(db_url: &str, max_conns: u32, min_idle: Option<u32>) -> crate::Result<Self> {
        let manager = ConnectionManager::<PgConnection>::new(db_url);

        let pool = r2d2::Pool::builder()
            .max_size(max_conns)
            .min_idle(min_idle)
            .connection_timeout(Duration::from_secs(10))
            .build(manager)
            .map_err(|e| {
                log::error!("Unable to create database connection pool, {}", e);
                DatabaseError::R2D2Error(e.to_string())
            })?;

        Ok(Self {
            metrics: None,
            pool,
        })
    }

    /// Set the metrics to use for this database pool
    pub fn set_metrics(&mut self, metrics: Arc<DatabaseMetrics>) {
        self.metrics = Some(metrics);
    }

    /// Returns an established connection from the connection pool
    pub fn get_conn(&self) -> crate::Result<DbConnection> {
        let res = self.pool.get();

        if let Some(metrics) = &self.metrics {
            let state = self.pool.state();
            metrics.record_state(state.connections, state.idle_connections);
        }

        match res {
            Ok(conn) => {
                if let Some(metrics) = &self.metrics {
                    metrics.record_checkout();
                }
                Ok(conn)
            }
            Err(e) => {
                if let Some(metrics) = &self.metrics {
                    metrics.record_checkout_error();
                }
                let state = self.pool.state();
                let msg = format!(
                    "Unable to get connection from connection pool.
                                Error: {}
                                Pool State:
                                    {:?}",
                    e, state
                );
                log::error!("{}", &msg);
                Err(DatabaseError::R2D2Error(msg))
            }
        }
    }
}
