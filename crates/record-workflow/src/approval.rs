//! Approval tracker: role to level mapping, per-level upsert, and status derivation.

use chrono::{DateTime, Utc};
use record_types::{Actor, ApprovalEntry, ApprovalStatus, Decision, Record};
use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;

/// Maps an actor's role to an approval level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelPolicy {
    /// lowercase role -> level.
    levels: HashMap<String, u32>,
    default_level: u32,
}

impl LevelPolicy {
    /// Empty table; every role maps to `default_level`.
    pub fn new(default_level: u32) -> Self {
        Self {
            levels: HashMap::new(),
            default_level,
        }
    }

    /// manager -> 2, admin -> 3, anything else -> 1.
    pub fn standard() -> Self {
        Self::new(1).with_role("manager", 2).with_role("admin", 3)
    }

    pub fn with_role(mut self, role: &str, level: u32) -> Self {
        self.levels.insert(role.trim().to_lowercase(), level);
        self
    }

    pub fn level_for(&self, role: &str) -> u32 {
        self.levels
            .get(&role.trim().to_lowercase())
            .copied()
            .unwrap_or(self.default_level)
    }

    /// Every level this table can produce.
    pub fn levels(&self) -> BTreeSet<u32> {
        let mut out: BTreeSet<u32> = self.levels.values().copied().collect();
        out.insert(self.default_level);
        out
    }
}

impl Default for LevelPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

/// Levels that must each hold an approval before a record counts as approved.
///
/// An empty set means only the entries present are considered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalPolicy {
    required_levels: BTreeSet<u32>,
}

impl ApprovalPolicy {
    pub fn new(levels: impl IntoIterator<Item = u32>) -> Self {
        Self {
            required_levels: levels.into_iter().collect(),
        }
    }

    /// No required levels: approved as soon as every present entry is approved.
    pub fn vacuous() -> Self {
        Self {
            required_levels: BTreeSet::new(),
        }
    }

    pub fn required_levels(&self) -> &BTreeSet<u32> {
        &self.required_levels
    }
}

impl Default for ApprovalPolicy {
    fn default() -> Self {
        Self::new(LevelPolicy::standard().levels())
    }
}

/// Comma-separated level list, e.g. `"1,2,3"`. Blank input is the vacuous policy.
impl FromStr for ApprovalPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut levels = BTreeSet::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let level: u32 = part
                .parse()
                .map_err(|_| format!("invalid approval level: {:?}", part))?;
            if level == 0 {
                return Err("approval levels start at 1".to_string());
            }
            levels.insert(level);
        }
        Ok(Self {
            required_levels: levels,
        })
    }
}

/// Overwrite the entry at `level`, or append one. Keeps at most one entry per level.
pub fn upsert_decision(
    approvers: &mut Vec<ApprovalEntry>,
    level: u32,
    user: &str,
    decision: Decision,
    at: DateTime<Utc>,
) {
    let status = ApprovalStatus::from(decision);
    match approvers.iter_mut().find(|a| a.level == level) {
        Some(entry) => {
            entry.status = status;
            entry.approved_at = at;
            entry.user = user.to_string();
        }
        None => approvers.push(ApprovalEntry {
            level,
            user: user.to_string(),
            approved_at: at,
            status,
        }),
    }
}

/// Aggregate status after applying `decision`.
///
/// Approved when every present entry is approved and every required level has an
/// entry; otherwise Rejected if the decision just applied was a rejection;
/// otherwise unchanged.
pub fn derive_status(
    approvers: &[ApprovalEntry],
    required_levels: &BTreeSet<u32>,
    decision: Decision,
    prior: ApprovalStatus,
) -> ApprovalStatus {
    let all_approved = approvers
        .iter()
        .all(|a| a.status == ApprovalStatus::Approved);
    let required_present = required_levels
        .iter()
        .all(|level| approvers.iter().any(|a| a.level == *level));
    if all_approved && required_present {
        ApprovalStatus::Approved
    } else if decision == Decision::Rejected {
        ApprovalStatus::Rejected
    } else {
        prior
    }
}

/// Apply `decision` at `level` to the record and recompute its status.
pub fn decide(
    record: &mut Record,
    actor: &Actor,
    level: u32,
    decision: Decision,
    policy: &ApprovalPolicy,
    at: DateTime<Utc>,
) {
    upsert_decision(&mut record.approvers, level, &actor.id, decision, at);
    record.approval_status = derive_status(
        &record.approvers,
        policy.required_levels(),
        decision,
        record.approval_status,
    );
}
