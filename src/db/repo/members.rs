use super::Repository;
use crate::domain::{Member, MemberId, MemberStatus, TimeMs};
use crate::ledger::LedgerError;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

fn member_from_row(row: &SqliteRow) -> Result<Member, LedgerError> {
    let status: String = row.try_get("status")?;
    let join_date: Option<i64> = row.try_get("join_date")?;
    Ok(Member {
        id: MemberId::new(row.try_get("id")?),
        name: row.try_get("name")?,
        status: MemberStatus::from(status),
        join_date: join_date.map(TimeMs::new),
    })
}

impl Repository {
    // =========================================================================
    // Member operations
    // =========================================================================

    /// Insert a member, or refresh name/status/join date if the id exists.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    pub async fn insert_member(&self, member: &Member) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO members (id, name, status, join_date)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                status = excluded.status,
                join_date = excluded.join_date
            "#,
        )
        .bind(member.id.as_i64())
        .bind(&member.name)
        .bind(member.status.as_str())
        .bind(member.join_date.map(|t| t.as_ms()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Members ordered by id, optionally filtered by status.
    ///
    /// The filter compares parsed statuses, so it agrees with how rows are
    /// read back (`"active"` and `"Active"` are both Active).
    ///
    /// # Errors
    /// Returns an error if the query fails or a row cannot be decoded.
    pub async fn query_members(
        &self,
        status: Option<&MemberStatus>,
    ) -> Result<Vec<Member>, LedgerError> {
        let rows = sqlx::query("SELECT id, name, status, join_date FROM members ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;

        let mut members = Vec::with_capacity(rows.len());
        for row in &rows {
            let member = member_from_row(row)?;
            if status.map_or(true, |s| &member.status == s) {
                members.push(member);
            }
        }
        Ok(members)
    }

    pub async fn query_member(&self, member_id: MemberId) -> Result<Option<Member>, LedgerError> {
        let row = sqlx::query("SELECT id, name, status, join_date FROM members WHERE id = ?")
            .bind(member_id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(member_from_row).transpose()
    }

    /// Overwrite a member's status. Returns false when the member does not exist.
    pub async fn update_member_status(
        &self,
        member_id: MemberId,
        status: &MemberStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE members SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(member_id.as_i64())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
