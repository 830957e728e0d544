use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// DependentRow
///
/// A student record as stored, projected to the fields needed to build a
/// `DependentRecord`. Names are raw; `display_name` is derived by the verifier.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Default)]
pub struct DependentRow {
    pub id: Uuid,
    pub given_name: String,
    pub family_name: String,
    pub group_label: Option<String>,
    pub contact_phone: Option<String>,
}

/// StoreError
///
/// Failure of the dependent-record lookup. Distinct from an empty result,
/// which is a successful lookup.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("dependent store query failed: {0}")]
    Database(#[from] sqlx::Error),
    #[error("dependent store did not answer within {0:?}")]
    Timeout(Duration),
    #[error("dependent store unavailable: {0}")]
    Unavailable(String),
}

/// DependentStore
///
/// Read-only contract for looking up the students linked to a guardian.
///
/// **Send + Sync + async_trait** are required to share the store as an
/// `Arc<dyn DependentStore>` across request tasks.
#[async_trait]
pub trait DependentStore: Send + Sync {
    /// Every record whose guardian email equals `email` exactly (case-sensitive),
    /// in the store's natural order.
    async fn find_by_guardian_email(&self, email: &str) -> Result<Vec<DependentRow>, StoreError>;
}

/// DependentStoreState
///
/// The concrete type used to share the store across the application state.
pub type DependentStoreState = Arc<dyn DependentStore>;

/// PostgresRepository
///
/// `DependentStore` backed by the `students` table.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DependentStore for PostgresRepository {
    /// find_by_guardian_email
    ///
    /// No ORDER BY and no case folding: the verifier owns ordering, and emails
    /// are compared exactly as written.
    async fn find_by_guardian_email(&self, email: &str) -> Result<Vec<DependentRow>, StoreError> {
        sqlx::query_as::<_, DependentRow>(
            r#"
            SELECT id,
                   first_name AS given_name,
                   last_name AS family_name,
                   class_name AS group_label,
                   guardian_phone AS contact_phone
            FROM students
            WHERE guardian_email = $1
            "#,
        )
        .bind(email)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::Database)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MockMode {
    Rows,
    Failing,
    Stalled,
    Forbidden,
}

/// MockDependentStore
///
/// In-memory `DependentStore` for tests. Counts calls and records the emails
/// it was queried with so tests can assert exactly when enrichment happened.
pub struct MockDependentStore {
    rows: Vec<DependentRow>,
    mode: MockMode,
    calls: AtomicUsize,
    queried: Mutex<Vec<String>>,
}

impl MockDependentStore {
    /// Answers every lookup with `rows`.
    pub fn with_rows(rows: Vec<DependentRow>) -> Self {
        Self::build(rows, MockMode::Rows)
    }

    /// Answers every lookup with an empty result.
    pub fn empty() -> Self {
        Self::build(vec![], MockMode::Rows)
    }

    /// Fails every lookup with `StoreError::Unavailable`.
    pub fn new_failing() -> Self {
        Self::build(vec![], MockMode::Failing)
    }

    /// Never answers; used to exercise the enrichment timeout.
    pub fn new_stalled() -> Self {
        Self::build(vec![], MockMode::Stalled)
    }

    /// Panics if queried at all.
    pub fn new_forbidden() -> Self {
        Self::build(vec![], MockMode::Forbidden)
    }

    fn build(rows: Vec<DependentRow>, mode: MockMode) -> Self {
        Self {
            rows,
            mode,
            calls: AtomicUsize::new(0),
            queried: Mutex::new(vec![]),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn queried_emails(&self) -> Vec<String> {
        self.queried
            .lock()
            .map(|emails| emails.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DependentStore for MockDependentStore {
    async fn find_by_guardian_email(&self, email: &str) -> Result<Vec<DependentRow>, StoreError> {
        if self.mode == MockMode::Forbidden {
            panic!("dependent store must not be queried here (email: {email})");
        }

        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut queried) = self.queried.lock() {
            queried.push(email.to_string());
        }

        match self.mode {
            MockMode::Rows => Ok(self.rows.clone()),
            MockMode::Failing => Err(StoreError::Unavailable(
                "Mock Store Error: Simulation requested".to_string(),
            )),
            MockMode::Stalled | MockMode::Forbidden => std::future::pending().await,
        }
    }
}
