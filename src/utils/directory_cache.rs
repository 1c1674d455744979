use anyhow::Result;
use async_trait::async_trait;
use futures_util::StreamExt;
use moka::future::Cache;
use sqlx::{FromRow, MySqlPool};
use std::str::FromStr;
use std::time::Duration;

use crate::error::StoreError;
use crate::model::department::DepartmentId;
use crate::model::employee::{DirectoryEntry, OrgRole};
use crate::model::leave_request::RequesterClass;
use crate::store::Directory;

const DIRECTORY_CAPACITY: u64 = 50_000;

#[derive(FromRow)]
struct EmployeeRow {
    employee_id: String,
    name: String,
    department: String,
    employee_type: String,
    role: Option<String>,
}

impl EmployeeRow {
    fn into_entry(self) -> Result<DirectoryEntry, StoreError> {
        let department = DepartmentId::normalize(&self.department).ok_or_else(|| {
            StoreError::Corrupt(format!("employee {} has no department", self.employee_id))
        })?;
        let employee_type = RequesterClass::from_str(&self.employee_type).map_err(|_| {
            StoreError::Corrupt(format!("employee_type = {:?}", self.employee_type))
        })?;
        // Unknown or blank roles mean "no reviewer role".
        let role = self
            .role
            .as_deref()
            .and_then(|role| OrgRole::from_str(role.trim()).ok());

        Ok(DirectoryEntry {
            employee_id: self.employee_id,
            name: self.name,
            department,
            employee_type,
            role,
        })
    }
}

/// Employee directory read from the `employees` table, fronted by an
/// in-memory cache.
#[derive(Clone)]
pub struct CachedDirectory {
    pool: MySqlPool,
    cache: Cache<String, DirectoryEntry>,
}

impl CachedDirectory {
    pub fn new(pool: MySqlPool, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(DIRECTORY_CAPACITY)
            .time_to_live(ttl)
            .build();
        Self { pool, cache }
    }

    /// Batch insert entries into the cache
    async fn batch_insert(&self, entries: Vec<DirectoryEntry>) {
        let futures: Vec<_> = entries
            .into_iter()
            .map(|entry| self.cache.insert(entry.employee_id.clone(), entry))
            .collect();

        // Await all insertions concurrently
        futures::future::join_all(futures).await;
    }

    /// Load the whole directory into the cache (batched)
    pub async fn warmup(&self, batch_size: usize) -> Result<()> {
        let mut stream = sqlx::query_as::<_, EmployeeRow>(
            r#"
            SELECT employee_id, name, department, employee_type, role
            FROM employees
            "#,
        )
        .fetch(&self.pool);

        let mut batch = Vec::with_capacity(batch_size);
        let mut total = 0usize;
        let mut skipped = 0usize;

        while let Some(row) = stream.next().await {
            match row?.into_entry() {
                Ok(entry) => {
                    batch.push(entry);
                    total += 1;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping directory row");
                    skipped += 1;
                }
            }

            if batch.len() >= batch_size {
                self.batch_insert(std::mem::take(&mut batch)).await;
            }
        }

        if !batch.is_empty() {
            self.batch_insert(batch).await;
        }

        log::info!(
            "Directory cache warmup complete: {} employees ({} skipped)",
            total,
            skipped
        );

        Ok(())
    }
}

#[async_trait]
impl Directory for CachedDirectory {
    async fn lookup(&self, employee_id: &str) -> Result<Option<DirectoryEntry>, StoreError> {
        let key = employee_id.trim().to_string();
        if let Some(entry) = self.cache.get(&key).await {
            return Ok(Some(entry));
        }

        let row = sqlx::query_as::<_, EmployeeRow>(
            r#"
            SELECT employee_id, name, department, employee_type, role
            FROM employees
            WHERE employee_id = ?
            "#,
        )
        .bind(&key)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let entry = row.into_entry()?;
                self.cache.insert(key, entry.clone()).await;
                Ok(Some(entry))
            }
            None => Ok(None),
        }
    }
}
