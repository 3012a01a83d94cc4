use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::MySqlPool;
use tracing::debug;

use super::{StoreError, is_unique_violation};
use crate::model::attendance::AttendanceRecord;
use crate::model::student::StudentRecord;
use crate::scan::ledger::{InsertOutcome, LedgerStore};
use crate::scan::resolver::EnrollmentStore;

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EnrollmentStore for MySqlStore {
    async fn find_student(&self, id: u64) -> Result<Option<StudentRecord>, StoreError> {
        let student = sqlx::query_as::<_, StudentRecord>(
            r#"
            SELECT id, name, cnic AS national_id, course
            FROM admissions
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(student)
    }
}

#[async_trait]
impl LedgerStore for MySqlStore {
    async fn find_mark(
        &self,
        code_data: &str,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let record = sqlx::query_as::<_, AttendanceRecord>(
            r#"
            SELECT code_data, date, time, scanned_at
            FROM attendance_ledger
            WHERE code_data = ? AND date = ?
            "#,
        )
        .bind(code_data)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn insert_mark(&self, record: &AttendanceRecord) -> Result<InsertOutcome, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance_ledger (code_data, date, time, scanned_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&record.code_data)
        .bind(record.date)
        .bind(record.time)
        .bind(record.scanned_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(InsertOutcome::Inserted),
            // uq_attendance_code_date rejected the second writer
            Err(e) if is_unique_violation(&e) => {
                debug!(date = %record.date, "ledger insert hit unique key");
                Ok(InsertOutcome::Conflict)
            }
            Err(e) => Err(e.into()),
        }
    }
}
