//! Queue ranking over eligible members.

use crate::config::BusinessRules;
use crate::domain::{
    sort_queue_deterministic, Cents, Member, MemberId, Payment, QueueOrderingKey, TimeMs,
};
use crate::engine::payout::DAYS_PER_MONTH;
use crate::engine::{ContinuityChecker, PaymentIndex, PaymentStatusResolver, TenureCalculator};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Tenure facts for one member, derived fresh on each run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenureRecord {
    pub member_id: MemberId,
    pub tenure_start: TimeMs,
    pub continuous_tenure_months: i64,
    pub total_paid: Cents,
    pub last_payment_date: TimeMs,
}

/// One row of the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedMember {
    pub member_id: MemberId,
    pub queue_position: i64,
    pub tenure_start: TimeMs,
    pub total_paid: Cents,
    pub continuous_tenure_months: i64,
    pub last_payment_date: TimeMs,
}

/// Why a member was left out of the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
    NotActive,
    NoTenure,
    Broken,
    InDefault,
}

#[derive(Debug, Clone)]
pub struct QueueRanker {
    tenure: TenureCalculator,
    continuity: ContinuityChecker,
    standing: PaymentStatusResolver,
}

impl QueueRanker {
    pub fn new(rules: &BusinessRules) -> Self {
        Self {
            tenure: TenureCalculator::new(rules),
            continuity: ContinuityChecker::new(rules),
            standing: PaymentStatusResolver::new(rules),
        }
    }

    /// Tenure record for an eligible member, or the reason they are excluded.
    pub fn evaluate(
        &self,
        member: &Member,
        payments: &[Payment],
        now: TimeMs,
    ) -> Result<TenureRecord, Exclusion> {
        if !member.status.is_active() {
            return Err(Exclusion::NotActive);
        }
        let tenure_start = self.tenure.tenure_start(payments).ok_or(Exclusion::NoTenure)?;

        let scan = self.continuity.scan_history(payments, tenure_start);
        if !self.continuity.scan_is_continuous(&scan, now) {
            return Err(Exclusion::Broken);
        }
        if self.standing.resolve(member.id, payments, now).is_in_default {
            return Err(Exclusion::InDefault);
        }

        Ok(TenureRecord {
            member_id: member.id,
            tenure_start,
            continuous_tenure_months: now.days_since(tenure_start).div_euclid(DAYS_PER_MONTH),
            total_paid: payments
                .iter()
                .filter(|p| p.is_completed())
                .map(|p| p.amount)
                .sum(),
            last_payment_date: scan.last_payment_date,
        })
    }

    /// Rank every eligible member: ascending tenure start, then member id.
    /// Positions are 1-based with no gaps.
    pub fn rank(&self, members: &[Member], index: &PaymentIndex, now: TimeMs) -> Vec<RankedMember> {
        let mut eligible: Vec<TenureRecord> = members
            .iter()
            .filter_map(|member| {
                match self.evaluate(member, index.payments_for(member.id), now) {
                    Ok(record) => Some(record),
                    Err(reason) => {
                        debug!(member_id = %member.id, ?reason, "Member excluded from queue");
                        None
                    }
                }
            })
            .collect();

        sort_queue_deterministic(&mut eligible, |r| {
            QueueOrderingKey::new(r.tenure_start, r.member_id)
        });

        eligible
            .into_iter()
            .enumerate()
            .map(|(idx, r)| RankedMember {
                member_id: r.member_id,
                queue_position: (idx + 1) as i64,
                tenure_start: r.tenure_start,
                total_paid: r.total_paid,
                continuous_tenure_months: r.continuous_tenure_months,
                last_payment_date: r.last_payment_date,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MemberStatus;

    fn day(n: i64) -> TimeMs {
        TimeMs::new(0).plus_days(n)
    }

    fn active(id: i64) -> Member {
        Member::new(MemberId::new(id), format!("member-{}", id), MemberStatus::Active)
    }

    fn paid_up(r: &BusinessRules, id: i64, start_day: i64, through_day: i64) -> Vec<Payment> {
        let member = MemberId::new(id);
        let mut payments = vec![Payment::completed(member, r.signup_fee, day(start_day))];
        let mut d = start_day + 30;
        while d <= through_day {
            payments.push(Payment::completed(member, r.monthly_fee, day(d)));
            d += 30;
        }
        payments
    }

    #[test]
    fn test_scenario_b_member_id_breaks_ties() {
        let r = BusinessRules::default();
        let ranker = QueueRanker::new(&r);
        let index = PaymentIndex::build(
            paid_up(&r, 5, 0, 90)
                .into_iter()
                .chain(paid_up(&r, 3, 0, 90)),
        );

        let ranked = ranker.rank(&[active(5), active(3)], &index, day(95));
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].member_id, MemberId::new(3));
        assert_eq!(ranked[0].queue_position, 1);
        assert_eq!(ranked[1].member_id, MemberId::new(5));
        assert_eq!(ranked[1].queue_position, 2);
    }

    #[test]
    fn test_positions_are_dense_and_ordered_by_tenure() {
        let r = BusinessRules::default();
        let ranker = QueueRanker::new(&r);
        let mut payments = Vec::new();
        let mut members = Vec::new();
        for (id, start) in [(10, 20), (11, 0), (12, 10), (13, 5)] {
            payments.extend(paid_up(&r, id, start, 100));
            members.push(active(id));
        }
        let index = PaymentIndex::build(payments);

        let ranked = ranker.rank(&members, &index, day(105));
        let positions: Vec<i64> = ranked.iter().map(|m| m.queue_position).collect();
        assert_eq!(positions, vec![1, 2, 3, 4]);
        let ids: Vec<i64> = ranked.iter().map(|m| m.member_id.as_i64()).collect();
        assert_eq!(ids, vec![11, 13, 12, 10]);
    }

    #[test]
    fn test_exclusions() {
        let r = BusinessRules::default();
        let ranker = QueueRanker::new(&r);

        let mut inactive = active(1);
        inactive.status = MemberStatus::Inactive;
        assert_eq!(
            ranker.evaluate(&inactive, &paid_up(&r, 1, 0, 60), day(61)),
            Err(Exclusion::NotActive)
        );
        assert_eq!(ranker.evaluate(&active(2), &[], day(1)), Err(Exclusion::NoTenure));

        let scenario_a = vec![
            Payment::completed(MemberId::new(3), r.signup_fee, day(0)),
            Payment::completed(MemberId::new(3), r.monthly_fee, day(30)),
            Payment::completed(MemberId::new(3), r.monthly_fee, day(61)),
            Payment::completed(MemberId::new(3), r.monthly_fee, day(92)),
        ];
        assert_eq!(
            ranker.evaluate(&active(3), &scenario_a, day(95)),
            Err(Exclusion::Broken)
        );
    }

    #[test]
    fn test_in_default_member_excluded_before_enforcement() {
        let r = BusinessRules::default();
        let ranker = QueueRanker::new(&r);
        // Continuous on payments alone, but no monthly fee since signup.
        let payments = vec![
            Payment::completed(MemberId::new(1), r.signup_fee, day(0)),
            Payment::completed(MemberId::new(1), r.signup_fee, day(20)),
        ];
        assert_eq!(
            ranker.evaluate(&active(1), &payments, day(45)),
            Err(Exclusion::InDefault)
        );

        let index = PaymentIndex::build(payments);
        assert!(ranker.rank(&[active(1)], &index, day(45)).is_empty());
    }

    #[test]
    fn test_rank_is_idempotent() {
        let r = BusinessRules::default();
        let ranker = QueueRanker::new(&r);
        let mut payments = Vec::new();
        for id in 1..=5 {
            payments.extend(paid_up(&r, id, (id % 2) * 3, 60));
        }
        let members: Vec<Member> = (1..=5).map(active).collect();
        let index = PaymentIndex::build(payments);

        let first = ranker.rank(&members, &index, day(62));
        let second = ranker.rank(&members, &index, day(62));
        assert_eq!(first.len(), 5);
        assert_eq!(first, second);
    }

    #[test]
    fn test_tenure_record_fields() {
        let r = BusinessRules::default();
        let ranker = QueueRanker::new(&r);
        let payments = paid_up(&r, 1, 0, 90);
        let record = ranker.evaluate(&active(1), &payments, day(95)).unwrap();
        assert_eq!(record.tenure_start, day(0));
        assert_eq!(record.last_payment_date, day(90));
        assert_eq!(record.continuous_tenure_months, 3);
        assert_eq!(
            record.total_paid,
            Cents(r.signup_fee.as_i64() + 3 * r.monthly_fee.as_i64())
        );
    }
}
