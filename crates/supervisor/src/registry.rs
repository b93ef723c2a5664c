// SPDX-FileCopyrightText: Baselayer contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Service discovery and composition: the supervisor aggregates a config
//! fragment per service directory, then applies `services.enabled` /
//! `services.disabled` to decide what actually starts.

use crate::error::{Result, SupervisorError};
use std::collections::HashSet;

const WILDCARD: &str = "*";

/// One service's discovered fragment. Only the name matters to
/// composition; each service loads the rest of its own config
/// separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceFragment {
    pub name: String,
}

/// The resolved set of services the supervisor should start, after
/// `services.disabled`/`services.enabled` have been applied to the
/// discovered fragments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRegistry {
    active: HashSet<String>,
}

impl ServiceRegistry {
    /// Composes `fragments` with the `enabled`/`disabled` lists from
    /// configuration.
    ///
    /// Validates that `fragments` has no duplicate service names, and
    /// that no name is listed in both `enabled` and `disabled` — the
    /// latter is a hard configuration error even when `disabled`
    /// contains the `"*"` wildcard, since naming a service explicitly in
    /// both lists can never express a coherent intent.
    pub fn compose(fragments: &[ServiceFragment], enabled: &[String], disabled: &[String]) -> Result<Self> {
        let mut seen = HashSet::new();
        for fragment in fragments {
            if !seen.insert(fragment.name.clone()) {
                return Err(SupervisorError::DuplicateService {
                    name: fragment.name.clone(),
                });
            }
        }

        let disabled_names: HashSet<&str> = disabled.iter().map(String::as_str).filter(|n| *n != WILDCARD).collect();
        for name in enabled {
            if disabled_names.contains(name.as_str()) {
                return Err(SupervisorError::ConflictingServiceEntry { name: name.clone() });
            }
        }

        let mut active: HashSet<String> = if disabled.iter().any(|n| n == WILDCARD) {
            HashSet::new()
        } else {
            seen.iter().filter(|name| !disabled_names.contains(name.as_str())).cloned().collect()
        };
        active.extend(enabled.iter().cloned());

        Ok(Self { active })
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.active.contains(name)
    }

    pub fn active_services(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.active.iter().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragments(names: &[&str]) -> Vec<ServiceFragment> {
        names.iter().map(|n| ServiceFragment { name: n.to_string() }).collect()
    }

    #[test]
    fn with_no_overrides_every_discovered_service_is_active() {
        let registry = ServiceRegistry::compose(&fragments(&["api", "websocket"]), &[], &[]).unwrap();
        assert!(registry.is_active("api"));
        assert!(registry.is_active("websocket"));
    }

    #[test]
    fn disabled_removes_a_named_service() {
        let registry = ServiceRegistry::compose(&fragments(&["api", "websocket"]), &[], &["websocket".to_string()]).unwrap();
        assert!(registry.is_active("api"));
        assert!(!registry.is_active("websocket"));
    }

    #[test]
    fn wildcard_disables_everything_and_enabled_reintroduces_individual_services() {
        let registry = ServiceRegistry::compose(
            &fragments(&["api", "websocket", "broker"]),
            &["broker".to_string()],
            &[WILDCARD.to_string()],
        )
        .unwrap();
        assert!(!registry.is_active("api"));
        assert!(!registry.is_active("websocket"));
        assert!(registry.is_active("broker"));
    }

    #[test]
    fn naming_a_service_in_both_lists_is_a_configuration_error() {
        let err = ServiceRegistry::compose(
            &fragments(&["api"]),
            &["api".to_string()],
            &["api".to_string()],
        )
        .unwrap_err();
        assert!(matches!(err, SupervisorError::ConflictingServiceEntry { name } if name == "api"));
    }

    #[test]
    fn duplicate_fragment_names_are_rejected() {
        let err = ServiceRegistry::compose(&fragments(&["api", "api"]), &[], &[]).unwrap_err();
        assert!(matches!(err, SupervisorError::DuplicateService { name } if name == "api"));
    }
}
