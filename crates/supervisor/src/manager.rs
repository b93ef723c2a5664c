// SPDX-FileCopyrightText: Baselayer contributors
//
// SPDX-License-Identifier: Apache-2.0

//! The migration manager: runs pending migrations once at startup, then
//! serves `GET /` with a cached `{"migrated": bool}` for every handler
//! process polling the gate.

use actix_web::{get, web, HttpResponse};
use baselayer_db_storage::migrations;
use std::sync::Mutex;
use std::time::{Duration, Instant};

const CACHE_TTL: Duration = Duration::from_secs(10);

struct Cached {
    migrated: bool,
    checked_at: Instant,
}

/// Shared state behind the manager's status endpoint.
pub struct MigrationManager {
    db_url: String,
    cache: Mutex<Option<Cached>>,
}

impl MigrationManager {
    /// Runs any pending migration now. Returns the underlying error so the
    /// caller can exit non-zero and let the process supervisor restart it,
    /// per the manager's documented failure contract.
    pub async fn run_pending_migrations(db_url: &str) -> anyhow::Result<()> {
        if !migrations::has_embedded_migrations() {
            log::info!("migration manager: no migrations embedded, nothing to run");
            return Ok(());
        }
        let report = migrations::migrate_from_url(db_url).await?;
        log::info!(
            "migration manager: applied {} migration(s)",
            report.applied_migrations().len()
        );
        Ok(())
    }

    pub fn new(db_url: String) -> Self {
        Self {
            db_url,
            cache: Mutex::new(None),
        }
    }

    /// Returns the cached migration status, refreshing it if the cache is
    /// older than ten seconds or empty.
    async fn migrated(&self) -> bool {
        if !migrations::has_embedded_migrations() {
            return true;
        }

        let stale = {
            let cache = self.cache.lock().expect("migration manager cache mutex is never poisoned");
            match &*cache {
                Some(cached) => cached.checked_at.elapsed() >= CACHE_TTL,
                None => true,
            }
        };

        if stale {
            let migrated = migrations::migrate_from_url(&self.db_url).await.is_ok();
            let mut cache = self.cache.lock().expect("migration manager cache mutex is never poisoned");
            *cache = Some(Cached {
                migrated,
                checked_at: Instant::now(),
            });
            migrated
        } else {
            self.cache
                .lock()
                .expect("migration manager cache mutex is never poisoned")
                .as_ref()
                .expect("checked for staleness above")
                .migrated
        }
    }
}

#[get("/")]
pub async fn status(manager: web::Data<MigrationManager>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "migrated": manager.migrated().await }))
}
