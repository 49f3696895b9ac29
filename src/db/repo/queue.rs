use super::Repository;
use crate::domain::{MemberId, QueueEntry, TimeMs};
use crate::ledger::LedgerError;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

fn entry_from_row(row: &SqliteRow) -> Result<QueueEntry, LedgerError> {
    Ok(QueueEntry {
        member_id: MemberId::new(row.try_get("member_id")?),
        queue_position: row.try_get("queue_position")?,
        subscription_active: row.try_get("subscription_active")?,
        updated_at: TimeMs::new(row.try_get("updated_at")?),
    })
}

impl Repository {
    // =========================================================================
    // Queue operations
    // =========================================================================

    /// Insert or move a member's queue entry.
    pub async fn store_queue_entry(&self, entry: &QueueEntry) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO queue (member_id, queue_position, subscription_active, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(member_id) DO UPDATE SET
                queue_position = excluded.queue_position,
                subscription_active = excluded.subscription_active,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(entry.member_id.as_i64())
        .bind(entry.queue_position)
        .bind(entry.subscription_active)
        .bind(entry.updated_at.as_ms())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn delete_queue_entry(&self, member_id: MemberId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM queue WHERE member_id = ?")
            .bind(member_id.as_i64())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Queue entries ordered by (queue_position, member_id).
    pub async fn query_queue_entries(&self) -> Result<Vec<QueueEntry>, LedgerError> {
        let rows = sqlx::query(
            r#"
            SELECT member_id, queue_position, subscription_active, updated_at
            FROM queue
            ORDER BY queue_position ASC, member_id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(entry_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use crate::domain::{Member, MemberStatus};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_upsert_moves_existing_entry() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .to_string();
        let repo = Repository::new(init_db(&db_path).await.expect("init_db failed"));
        let id = MemberId::new(1);
        repo.insert_member(&Member::new(id, "m", MemberStatus::Active))
            .await
            .unwrap();

        repo.store_queue_entry(&QueueEntry::new(id, 3, TimeMs::new(10)))
            .await
            .unwrap();
        repo.store_queue_entry(&QueueEntry::new(id, 1, TimeMs::new(20)))
            .await
            .unwrap();

        let entries = repo.query_queue_entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].queue_position, 1);
        assert_eq!(entries[0].updated_at, TimeMs::new(20));
        assert!(entries[0].subscription_active);

        assert!(repo.delete_queue_entry(id).await.unwrap());
        assert!(!repo.delete_queue_entry(id).await.unwrap());
    }
}
