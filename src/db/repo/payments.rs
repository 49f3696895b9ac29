use super::Repository;
use crate::domain::{Cents, MemberId, Payment, PaymentStatus, TimeMs};
use crate::ledger::LedgerError;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::str::FromStr;

fn payment_from_row(row: &SqliteRow) -> Result<Payment, LedgerError> {
    let status: String = row.try_get("status")?;
    let status = PaymentStatus::from_str(&status).map_err(LedgerError::Corrupt)?;
    Ok(Payment {
        member_id: MemberId::new(row.try_get("member_id")?),
        amount: Cents::new(row.try_get("amount_cents")?),
        payment_date: TimeMs::new(row.try_get("payment_date")?),
        status,
    })
}

impl Repository {
    // =========================================================================
    // Payment operations
    // =========================================================================

    /// Append a payment row. Returns the new payment id.
    ///
    /// # Errors
    /// Returns an error if the insert fails (e.g. unknown member).
    pub async fn insert_payment(&self, payment: &Payment) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO payments (member_id, amount_cents, payment_date, status)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(payment.member_id.as_i64())
        .bind(payment.amount.as_i64())
        .bind(payment.payment_date.as_ms())
        .bind(payment.status.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Insert several payments in one transaction.
    pub async fn insert_payments_batch(&self, payments: &[Payment]) -> Result<usize, sqlx::Error> {
        if payments.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        for payment in payments {
            sqlx::query(
                r#"
                INSERT INTO payments (member_id, amount_cents, payment_date, status)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(payment.member_id.as_i64())
            .bind(payment.amount.as_i64())
            .bind(payment.payment_date.as_ms())
            .bind(payment.status.as_str())
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(payments.len())
    }

    /// Settle a Pending payment. Settled payments never change again, so
    /// this returns false for anything not currently Pending.
    pub async fn settle_payment(
        &self,
        payment_id: i64,
        status: PaymentStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE payments SET status = ? WHERE id = ? AND status = 'Pending'")
            .bind(status.as_str())
            .bind(payment_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Completed payments ordered by (payment_date, member_id, id), for one
    /// member or for everyone.
    pub async fn query_completed_payments(
        &self,
        member_id: Option<MemberId>,
    ) -> Result<Vec<Payment>, LedgerError> {
        let rows = match member_id {
            Some(member_id) => {
                sqlx::query(
                    r#"
                    SELECT member_id, amount_cents, payment_date, status
                    FROM payments
                    WHERE status = 'Completed' AND member_id = ?
                    ORDER BY payment_date ASC, id ASC
                    "#,
                )
                .bind(member_id.as_i64())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT member_id, amount_cents, payment_date, status
                    FROM payments
                    WHERE status = 'Completed'
                    ORDER BY payment_date ASC, member_id ASC, id ASC
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.iter().map(payment_from_row).collect()
    }

    pub async fn sum_completed_payments(&self) -> Result<Cents, sqlx::Error> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount_cents), 0) FROM payments WHERE status = 'Completed'",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(Cents::new(total))
    }
}
