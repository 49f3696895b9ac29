use queuekeeper::config::BusinessRules;
use queuekeeper::db::init_db;
use queuekeeper::domain::{Cents, Member, MemberId, MemberStatus, Payment, PaymentStatus, TimeMs};
use queuekeeper::{Ledger, QueueService, Repository};
use std::sync::Arc;
use tempfile::TempDir;

struct TestEnv {
    repo: Arc<Repository>,
    service: QueueService,
    rules: BusinessRules,
    _temp: TempDir,
}

async fn setup() -> TestEnv {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");
    let repo = Arc::new(Repository::new(pool));
    let rules = BusinessRules {
        launch_date: TimeMs::new(0),
        ..BusinessRules::default()
    };
    let ledger: Arc<dyn Ledger> = repo.clone();
    let service = QueueService::new(ledger, rules.clone(), 4);

    TestEnv {
        repo,
        service,
        rules,
        _temp: temp_dir,
    }
}

fn day(n: i64) -> TimeMs {
    TimeMs::new(0).plus_days(n)
}

async fn add_member(env: &TestEnv, id: i64, status: MemberStatus) {
    env.repo
        .insert_member(&Member::new(MemberId::new(id), format!("member-{}", id), status))
        .await
        .unwrap();
}

/// Signup on `start`, then a monthly payment every 30 days through `through`.
async fn pay_up(env: &TestEnv, id: i64, start: i64, through: i64) {
    let member = MemberId::new(id);
    let mut payments = vec![Payment::completed(member, env.rules.signup_fee, day(start))];
    let mut d = start + 30;
    while d <= through {
        payments.push(Payment::completed(member, env.rules.monthly_fee, day(d)));
        d += 30;
    }
    env.repo.insert_payments_batch(&payments).await.unwrap();
}

async fn stored_queue(env: &TestEnv) -> Vec<(i64, i64)> {
    env.repo
        .query_queue_entries()
        .await
        .unwrap()
        .iter()
        .map(|e| (e.member_id.as_i64(), e.queue_position))
        .collect()
}

#[tokio::test]
async fn test_preview_orders_by_tenure_then_member_id() {
    let env = setup().await;
    for id in [3, 5, 8] {
        add_member(&env, id, MemberStatus::Active).await;
    }
    pay_up(&env, 5, 0, 90).await;
    pay_up(&env, 3, 0, 90).await;
    pay_up(&env, 8, 10, 90).await;

    let ranked = env.service.compute_winner_order_at(day(95)).await.unwrap();
    let order: Vec<(i64, i64)> = ranked
        .iter()
        .map(|m| (m.member_id.as_i64(), m.queue_position))
        .collect();
    assert_eq!(order, vec![(3, 1), (5, 2), (8, 3)]);

    // Preview never writes.
    assert!(stored_queue(&env).await.is_empty());
}

#[tokio::test]
async fn test_ineligible_members_are_left_out() {
    let env = setup().await;
    for id in 1..=5 {
        add_member(&env, id, MemberStatus::Active).await;
    }
    add_member(&env, 6, MemberStatus::Suspended).await;

    pay_up(&env, 1, 0, 90).await;
    // Late on the day-61 payment: 31-day gap.
    env.repo
        .insert_payments_batch(&[
            Payment::completed(MemberId::new(2), env.rules.signup_fee, day(0)),
            Payment::completed(MemberId::new(2), env.rules.monthly_fee, day(30)),
            Payment::completed(MemberId::new(2), env.rules.monthly_fee, day(61)),
            Payment::completed(MemberId::new(2), env.rules.monthly_fee, day(92)),
        ])
        .await
        .unwrap();
    // Monthly fees but never a signup.
    env.repo
        .insert_payment(&Payment::completed(MemberId::new(3), env.rules.monthly_fee, day(90)))
        .await
        .unwrap();
    // Signup still pending.
    env.repo
        .insert_payment(&Payment::new(
            MemberId::new(4),
            env.rules.signup_fee,
            day(90),
            PaymentStatus::Pending,
        ))
        .await
        .unwrap();
    // Stopped paying after signup.
    pay_up(&env, 5, 0, 0).await;
    pay_up(&env, 6, 0, 90).await;

    let ranked = env.service.compute_winner_order_at(day(95)).await.unwrap();
    let ids: Vec<i64> = ranked.iter().map(|m| m.member_id.as_i64()).collect();
    assert_eq!(ids, vec![1]);
    assert_eq!(ranked[0].queue_position, 1);
}

#[tokio::test]
async fn test_rejoining_member_ranks_from_new_signup() {
    let env = setup().await;
    for id in [1, 2] {
        add_member(&env, id, MemberStatus::Active).await;
    }
    pay_up(&env, 1, 0, 30).await;
    // Lapsed after day 30, signed up again on day 100.
    pay_up(&env, 1, 100, 130).await;
    pay_up(&env, 2, 50, 140).await;

    assert_eq!(
        env.service.tenure_start(MemberId::new(1)).await.unwrap(),
        Some(day(100))
    );

    let ranked = env.service.compute_winner_order_at(day(140)).await.unwrap();
    let order: Vec<(i64, TimeMs)> = ranked
        .iter()
        .map(|m| (m.member_id.as_i64(), m.tenure_start))
        .collect();
    assert_eq!(order, vec![(2, day(50)), (1, day(100))]);
}

#[tokio::test]
async fn test_sync_writes_dense_positions_and_is_idempotent() {
    let env = setup().await;
    for id in 1..=4 {
        add_member(&env, id, MemberStatus::Active).await;
    }
    for (id, start) in [(1, 9), (2, 3), (3, 6), (4, 0)] {
        pay_up(&env, id, start, 90).await;
    }

    let report = env.service.sync_queue_positions_at(day(95)).await.unwrap();
    assert_eq!(report.upserted, 4);
    assert_eq!(report.removed, 0);
    assert!(report.failures.is_empty());

    let first = stored_queue(&env).await;
    assert_eq!(first, vec![(4, 1), (2, 2), (3, 3), (1, 4)]);

    env.service.sync_queue_positions_at(day(95)).await.unwrap();
    assert_eq!(stored_queue(&env).await, first);
    assert!(env.service.audit_queue_at(day(95)).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_sync_closes_gaps_after_membership_change() {
    let env = setup().await;
    for id in 1..=3 {
        add_member(&env, id, MemberStatus::Active).await;
        pay_up(&env, id, id, 90).await;
    }
    env.service.sync_queue_positions_at(day(95)).await.unwrap();
    assert_eq!(stored_queue(&env).await, vec![(1, 1), (2, 2), (3, 3)]);

    // Manual admin action outside the engine.
    env.repo
        .update_member_status(MemberId::new(1), &MemberStatus::Won)
        .await
        .unwrap();

    let findings = env.service.audit_queue_at(day(95)).await.unwrap();
    assert!(!findings.is_empty());

    let report = env.service.sync_queue_positions_at(day(95)).await.unwrap();
    assert_eq!(report.removed, 1);
    assert_eq!(stored_queue(&env).await, vec![(2, 1), (3, 2)]);
}

#[tokio::test]
async fn test_payout_status_from_ledger() {
    let env = setup().await;
    add_member(&env, 1, MemberStatus::Active).await;
    env.repo
        .insert_payments_batch(&[
            Payment::completed(MemberId::new(1), Cents::new(12_500_000), day(10)),
            Payment::completed(MemberId::new(1), Cents::new(12_500_000), day(20)),
            Payment::new(
                MemberId::new(1),
                Cents::new(9_999_999),
                day(30),
                PaymentStatus::Failed,
            ),
        ])
        .await
        .unwrap();

    let status = env.service.compute_payout_status_at(day(400)).await;
    assert_eq!(status.total_revenue, Cents::new(25_000_000));
    assert_eq!(status.potential_winners, 2);
    assert!(status.fund_ready);
    assert!(status.time_ready);
    assert!(status.payout_ready);
    assert!(!status.degraded);

    let early = env.service.compute_payout_status_at(day(300)).await;
    assert!(!early.time_ready);
    assert!(!early.payout_ready);
    assert_eq!(early.days_until_eligible, 60);
}
