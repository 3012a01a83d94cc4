use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::model::student::StudentRecord;
use crate::store::StoreError;
use crate::utils::student_cache::StudentCache;

/// Authoritative table of admitted students.
#[async_trait]
pub trait EnrollmentStore: Send + Sync + 'static {
    async fn find_student(&self, id: u64) -> Result<Option<StudentRecord>, StoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(StudentRecord),
    NotFound,
    LookupError,
}

pub struct IdentityResolver {
    store: Arc<dyn EnrollmentStore>,
    cache: StudentCache,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn EnrollmentStore>, cache: StudentCache) -> Self {
        Self { store, cache }
    }

    pub fn cache(&self) -> &StudentCache {
        &self.cache
    }

    /// Single point lookup. Only hits are cached; misses and faults always
    /// go back to the store on the next scan.
    ///
    /// A cached hit is not re-checked: a student whose admission row is
    /// deleted or renamed keeps resolving to the cached record until the
    /// entry expires (`STUDENT_CACHE_TTL_SECS`).
    pub async fn resolve(&self, student_id: u64) -> Resolution {
        if let Some(student) = self.cache.get(student_id).await {
            debug!(student_id, "student served from cache");
            return Resolution::Found(student);
        }

        match self.store.find_student(student_id).await {
            Ok(Some(student)) => {
                self.cache.insert(student.clone()).await;
                Resolution::Found(student)
            }
            Ok(None) => {
                info!(student_id, "no admission record for scanned id");
                Resolution::NotFound
            }
            Err(e) => {
                error!(error = %e, student_id, "student lookup failed");
                Resolution::LookupError
            }
        }
    }
}
