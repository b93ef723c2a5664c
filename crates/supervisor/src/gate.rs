// SPDX-FileCopyrightText: Baselayer contributors
//
// SPDX-License-Identifier: Apache-2.0

//! The migration gate: run by every API handler process before it binds
//! its listening port, so it never accepts traffic against a schema that
//! hasn't finished migrating.

use serde::Deserialize;
use std::time::Duration;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct StatusBody {
    migrated: bool,
}

/// Polls the migration manager's `GET /` at `manager_url` with doubling
/// backoff (capped at 30s) until it reports `{"migrated": true}`.
///
/// There is no overall deadline: a permanently un-migrated database keeps
/// the caller parked here forever, by design, rather than letting the
/// process start serving against a stale schema.
#[tracing::instrument(skip(client))]
pub async fn wait_for_migration(client: &reqwest::Client, manager_url: &str) {
    let mut backoff = INITIAL_BACKOFF;

    loop {
        match poll_once(client, manager_url).await {
            Ok(true) => {
                log::info!("migration gate: schema is up to date");
                return;
            }
            Ok(false) => log::info!("migration gate: not yet migrated, retrying in {backoff:?}"),
            Err(e) => log::warn!("migration gate: status check failed ({e}), retrying in {backoff:?}"),
        }

        tokio::time::sleep(backoff).await;
        backoff = (backoff * 2).min(MAX_BACKOFF);
    }
}

async fn poll_once(client: &reqwest::Client, manager_url: &str) -> reqwest::Result<bool> {
    let body: StatusBody = client.get(manager_url).send().await?.json().await?;
    Ok(body.migrated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_is_capped_at_thirty_seconds() {
        let mut backoff = INITIAL_BACKOFF;
        let mut seen = vec![backoff];
        for _ in 0..8 {
            backoff = (backoff * 2).min(MAX_BACKOFF);
            seen.push(backoff);
        }
        assert_eq!(
            seen,
            vec![1, 2, 4, 8, 16, 30, 30, 30, 30]
                .into_iter()
                .map(Duration::from_secs)
                .collect::<Vec<_>>()
        );
    }
}
