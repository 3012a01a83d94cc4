use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use sqlx::MySqlPool;
use std::time::Duration;

use crate::model::student::StudentRecord;

/// In-memory copy of recently seen students, keyed by admission id.
#[derive(Clone)]
pub struct StudentCache {
    inner: Cache<u64, StudentRecord>,
}

impl StudentCache {
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(capacity) // tune based on memory
                .time_to_live(ttl)
                .build(),
        }
    }

    pub async fn get(&self, id: u64) -> Option<StudentRecord> {
        self.inner.get(&id).await
    }

    pub async fn insert(&self, student: StudentRecord) {
        self.inner.insert(student.id, student).await;
    }

    /// Batch insert, awaited concurrently
    async fn batch_insert(&self, students: &mut Vec<StudentRecord>) {
        let futures: Vec<_> = students
            .drain(..)
            .map(|s| self.inner.insert(s.id, s))
            .collect();

        futures::future::join_all(futures).await;
    }

    /// Load only RECENT admissions into the cache (batched)
    pub async fn warmup(&self, pool: &MySqlPool, days: u32, batch_size: usize) -> Result<usize> {
        let batch_size = batch_size.max(1);
        let mut stream = sqlx::query_as::<_, StudentRecord>(
            r#"
            SELECT id, name, cnic AS national_id, course
            FROM admissions
            WHERE created_at >= NOW() - INTERVAL ? DAY
            ORDER BY created_at DESC
            "#,
        )
        .bind(days)
        .fetch(pool);

        let mut batch = Vec::with_capacity(batch_size);
        let mut total_count = 0usize;

        while let Some(row) = stream.next().await {
            batch.push(row?);
            total_count += 1;

            if batch.len() >= batch_size {
                self.batch_insert(&mut batch).await;
            }
        }

        // Insert any remaining students
        if !batch.is_empty() {
            self.batch_insert(&mut batch).await;
        }

        log::info!(
            "Student cache warmup complete: {} admissions (last {} days)",
            total_count,
            days
        );

        Ok(total_count)
    }
}
