// SPDX-FileCopyrightText: Baselayer contributors
//
// SPDX-License-Identifier: Apache-2.0

//! The access-policy algebra: five ways to say which rows of an entity
//! are accessible to a principal, closed under AND/OR composition.

use crate::compiler::CompiledFilter;
use crate::error::{AclError, Result};
use crate::registry::{EntityRegistry, EntitySpec};
use baselayer_types::Principal;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessMode {
    Create,
    Read,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Logic {
    And,
    Or,
}

/// A custom policy function: given the entity it was registered for and
/// the requesting principal, produce the accessible-row filter directly.
pub type CustomFn = Arc<dyn Fn(&EntitySpec, &Principal) -> CompiledFilter + Send + Sync>;

#[derive(Clone)]
pub enum Policy {
    /// All rows are accessible.
    Public,
    /// Only admins see any row.
    Restricted,
    /// Accessible iff, after traversing the dotted relationship chain, the
    /// terminal row's primary key equals the principal's effective user id.
    AccessibleIfUserMatches(Vec<&'static str>),
    /// Accessible iff every named related row is itself accessible under
    /// the given mode.
    AccessibleIfRelatedRowsAreAccessible(Vec<(&'static str, AccessMode)>),
    /// Logical combination of sub-policies.
    Composed(Vec<Policy>, Logic),
    /// Escape hatch: caller-supplied compiler.
    Custom(CustomFn),
}

impl std::fmt::Debug for Policy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Policy::Public => write!(f, "Public"),
            Policy::Restricted => write!(f, "Restricted"),
            Policy::AccessibleIfUserMatches(chain) => {
                write!(f, "AccessibleIfUserMatches({chain:?})")
            }
            Policy::AccessibleIfRelatedRowsAreAccessible(clauses) => {
                write!(f, "AccessibleIfRelatedRowsAreAccessible({clauses:?})")
            }
            Policy::Composed(policies, logic) => {
                write!(f, "Composed({policies:?}, {logic:?})")
            }
            Policy::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

impl Policy {
    pub fn and(self, other: Policy) -> Policy {
        match self {
            Policy::Composed(mut policies, Logic::And) => {
                policies.push(other);
                Policy::Composed(policies, Logic::And)
            }
            me => Policy::Composed(vec![me, other], Logic::And),
        }
    }

    pub fn or(self, other: Policy) -> Policy {
        match self {
            Policy::Composed(mut policies, Logic::Or) => {
                policies.push(other);
                Policy::Composed(policies, Logic::Or)
            }
            me => Policy::Composed(vec![me, other], Logic::Or),
        }
    }

    /// Construction-time validation: rejects an empty relationship chain
    /// and any first-hop relationship name that
    /// does not exist on `spec`. Chains deeper than one hop are resolved,
    /// and can only be fully validated, against the registry at compile
    /// time since the related entity may not be registered yet.
    pub(crate) fn validate(&self, spec: EntitySpec) -> Result<()> {
        match self {
            Policy::Public | Policy::Restricted | Policy::Custom(_) => Ok(()),
            Policy::AccessibleIfUserMatches(chain) => {
                let first = chain.first().ok_or(AclError::EmptyChain)?;
                if spec.relationship(first).is_none() {
                    return Err(AclError::UnknownRelationship {
                        entity: spec.table,
                        name: *first,
                    });
                }
                Ok(())
            }
            Policy::AccessibleIfRelatedRowsAreAccessible(clauses) => {
                if clauses.is_empty() {
                    return Err(AclError::EmptyChain);
                }
                for (name, _) in clauses {
                    if spec.relationship(name).is_none() {
                        return Err(AclError::UnknownRelationship {
                            entity: spec.table,
                            name: *name,
                        });
                    }
                }
                Ok(())
            }
            Policy::Composed(policies, _) => {
                for p in policies {
                    p.validate(spec)?;
                }
                Ok(())
            }
        }
    }

    pub(crate) fn compile(
        &self,
        spec: EntitySpec,
        principal: &Principal,
        registry: &EntityRegistry,
    ) -> Result<CompiledFilter> {
        crate::compiler::compile(self, spec, principal, registry)
    }
}

impl std::ops::BitAnd for Policy {
    type Output = Policy;
    fn bitand(self, rhs: Policy) -> Policy {
        self.and(rhs)
    }
}

impl std::ops::BitOr for Policy {
    type Output = Policy;
    fn bitor(self, rhs: Policy) -> Policy {
        self.or(rhs)
    }
}
