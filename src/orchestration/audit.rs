//! Consistency checks between member statuses, the stored queue and a fresh
//! ranking. Findings are reported, never repaired here.

use crate::domain::{Member, MemberId, MemberStatus, QueueEntry};
use crate::engine::RankedMember;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum QueueInconsistency {
    /// Ranked this run but has no stored entry.
    #[serde(rename_all = "camelCase")]
    EligibleMemberNotQueued { member_id: MemberId },
    /// Stored entry belongs to a member who is no longer Active.
    #[serde(rename_all = "camelCase")]
    QueuedMemberNotActive {
        member_id: MemberId,
        status: MemberStatus,
    },
    /// Stored entry has no member row behind it.
    #[serde(rename_all = "camelCase")]
    QueuedMemberMissing { member_id: MemberId },
    #[serde(rename_all = "camelCase")]
    DuplicatePosition {
        queue_position: i64,
        member_ids: Vec<MemberId>,
    },
    /// Sorted positions are not exactly 1..=n.
    #[serde(rename_all = "camelCase")]
    NonContiguousPositions { expected: i64, found: i64 },
}

/// Compare the stored queue against member rows and the current ranking.
///
/// `members` should hold every member regardless of status.
pub fn audit_queue(
    members: &[Member],
    entries: &[QueueEntry],
    ranked: &[RankedMember],
) -> Vec<QueueInconsistency> {
    let by_id: HashMap<MemberId, &Member> = members.iter().map(|m| (m.id, m)).collect();
    let queued: HashSet<MemberId> = entries.iter().map(|e| e.member_id).collect();
    let mut findings = Vec::new();

    for member in ranked {
        if !queued.contains(&member.member_id) {
            findings.push(QueueInconsistency::EligibleMemberNotQueued {
                member_id: member.member_id,
            });
        }
    }

    let mut by_position: BTreeMap<i64, Vec<MemberId>> = BTreeMap::new();
    for entry in entries {
        match by_id.get(&entry.member_id) {
            None => findings.push(QueueInconsistency::QueuedMemberMissing {
                member_id: entry.member_id,
            }),
            Some(member) if !member.status.is_active() => {
                findings.push(QueueInconsistency::QueuedMemberNotActive {
                    member_id: entry.member_id,
                    status: member.status.clone(),
                })
            }
            Some(_) => {}
        }
        by_position
            .entry(entry.queue_position)
            .or_default()
            .push(entry.member_id);
    }

    for (position, mut ids) in by_position.iter().map(|(p, ids)| (*p, ids.clone())) {
        if ids.len() > 1 {
            ids.sort();
            findings.push(QueueInconsistency::DuplicatePosition {
                queue_position: position,
                member_ids: ids,
            });
        }
    }

    // Positions are checked after collapsing duplicates, so a duplicate alone
    // does not also count as a gap.
    for (expected, found) in (1..).zip(by_position.keys().copied()) {
        if expected != found {
            findings.push(QueueInconsistency::NonContiguousPositions { expected, found });
            break;
        }
    }

    findings
}

pub(crate) fn log_findings(findings: &[QueueInconsistency]) {
    for finding in findings {
        match finding {
            QueueInconsistency::EligibleMemberNotQueued { member_id } => {
                warn!(member_id = %member_id, "Eligible member has no queue entry")
            }
            QueueInconsistency::QueuedMemberNotActive { member_id, status } => {
                warn!(member_id = %member_id, status = %status, "Queued member is not active")
            }
            QueueInconsistency::QueuedMemberMissing { member_id } => {
                warn!(member_id = %member_id, "Queue entry references unknown member")
            }
            QueueInconsistency::DuplicatePosition {
                queue_position,
                member_ids,
            } => warn!(queue_position, ?member_ids, "Duplicate queue position"),
            QueueInconsistency::NonContiguousPositions { expected, found } => {
                warn!(expected, found, "Queue positions have a gap")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Cents, TimeMs};

    fn member(id: i64, status: MemberStatus) -> Member {
        Member::new(MemberId::new(id), format!("m{}", id), status)
    }

    fn entry(id: i64, position: i64) -> QueueEntry {
        QueueEntry::new(MemberId::new(id), position, TimeMs::new(0))
    }

    fn ranked(id: i64, position: i64) -> RankedMember {
        RankedMember {
            member_id: MemberId::new(id),
            queue_position: position,
            tenure_start: TimeMs::new(0),
            total_paid: Cents::ZERO,
            continuous_tenure_months: 0,
            last_payment_date: TimeMs::new(0),
        }
    }

    #[test]
    fn test_consistent_queue_has_no_findings() {
        let members = vec![member(1, MemberStatus::Active), member(2, MemberStatus::Active)];
        let entries = vec![entry(1, 1), entry(2, 2)];
        let findings = audit_queue(&members, &entries, &[ranked(1, 1), ranked(2, 2)]);
        assert!(findings.is_empty());
    }

    #[test]
    fn test_detects_each_inconsistency() {
        let members = vec![
            member(1, MemberStatus::Active),
            member(2, MemberStatus::Inactive),
            member(3, MemberStatus::Active),
            member(4, MemberStatus::Active),
        ];
        let entries = vec![entry(2, 1), entry(3, 1), entry(9, 3)];
        let findings = audit_queue(&members, &entries, &[ranked(1, 1), ranked(3, 2)]);

        assert!(findings.contains(&QueueInconsistency::EligibleMemberNotQueued {
            member_id: MemberId::new(1)
        }));
        assert!(findings.contains(&QueueInconsistency::QueuedMemberNotActive {
            member_id: MemberId::new(2),
            status: MemberStatus::Inactive,
        }));
        assert!(findings.contains(&QueueInconsistency::QueuedMemberMissing {
            member_id: MemberId::new(9)
        }));
        assert!(findings.contains(&QueueInconsistency::DuplicatePosition {
            queue_position: 1,
            member_ids: vec![MemberId::new(2), MemberId::new(3)],
        }));
        assert!(findings.contains(&QueueInconsistency::NonContiguousPositions {
            expected: 2,
            found: 3
        }));
        assert_eq!(findings.len(), 5);
    }

    #[test]
    fn test_finding_serializes_with_kind_tag() {
        let json = serde_json::to_value(QueueInconsistency::EligibleMemberNotQueued {
            member_id: MemberId::new(7),
        })
        .unwrap();
        assert_eq!(json["kind"], "eligibleMemberNotQueued");
        assert_eq!(json["memberId"], 7);
    }
}
