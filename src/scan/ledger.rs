use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use strum_macros::{Display, EnumString};
use tracing::{error, info, warn};

use crate::model::attendance::AttendanceRecord;
use crate::model::student::StudentRecord;
use crate::store::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The `(code_data, date)` key already exists; nothing was written.
    Conflict,
}

/// Append-only attendance ledger with a unique `(code_data, date)` key.
#[async_trait]
pub trait LedgerStore: Send + Sync + 'static {
    async fn find_mark(
        &self,
        code_data: &str,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError>;

    /// Must report a key collision as `Conflict`, never as an error.
    async fn insert_mark(&self, record: &AttendanceRecord) -> Result<InsertOutcome, StoreError>;
}

/// Calendar date, time of day and UTC instant taken from one clock reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanInstant {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub scanned_at: DateTime<Utc>,
}

impl ScanInstant {
    /// `date` and `time` are read in the zone `moment` carries.
    pub fn at<Tz: TimeZone>(moment: &DateTime<Tz>) -> Self {
        let local = moment.naive_local();
        let time = local.time();
        Self {
            date: local.date(),
            time: time.with_nanosecond(0).unwrap_or(time),
            scanned_at: moment.with_timezone(&Utc),
        }
    }
}

/// Which calendar a ledger day follows (`LEDGER_TZ`). The time of day is
/// always the server's local wall clock.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LedgerClock {
    /// Day rolls over at UTC midnight.
    #[default]
    Utc,
    /// Day rolls over at the server's local midnight.
    Local,
}

impl LedgerClock {
    pub fn now(self) -> ScanInstant {
        self.instant(&Local::now())
    }

    /// `moment` carries the local zone; only the date depends on the clock.
    pub fn instant<Tz: TimeZone>(self, moment: &DateTime<Tz>) -> ScanInstant {
        let mut instant = ScanInstant::at(moment);
        if self == LedgerClock::Utc {
            instant.date = instant.scanned_at.date_naive();
        }
        instant
    }

    pub fn today(self) -> NaiveDate {
        self.now().date
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerOutcome {
    Committed(String),
    AlreadyMarked,
    WriteError,
}

pub struct LedgerWriter {
    store: Arc<dyn LedgerStore>,
}

impl LedgerWriter {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub async fn commit(
        &self,
        student: &StudentRecord,
        code_data: &str,
        at: &ScanInstant,
    ) -> LedgerOutcome {
        match self.store.find_mark(code_data, at.date).await {
            Ok(Some(existing)) => {
                info!(
                    student_id = student.id,
                    date = %at.date,
                    first_scan = %existing.scanned_at,
                    "attendance already marked"
                );
                return LedgerOutcome::AlreadyMarked;
            }
            Ok(None) => {}
            Err(e) => {
                error!(error = %e, student_id = student.id, "attendance pre-check failed");
                return LedgerOutcome::WriteError;
            }
        }

        let record = AttendanceRecord {
            code_data: code_data.to_string(),
            date: at.date,
            time: at.time,
            scanned_at: at.scanned_at,
        };

        // The pre-check can pass on two devices at once; the store's unique
        // key decides who wins.
        match self.store.insert_mark(&record).await {
            Ok(InsertOutcome::Inserted) => {
                info!(student_id = student.id, date = %at.date, "attendance committed");
                LedgerOutcome::Committed(student.name.clone())
            }
            Ok(InsertOutcome::Conflict) => {
                warn!(
                    student_id = student.id,
                    date = %at.date,
                    "concurrent scan committed first"
                );
                LedgerOutcome::AlreadyMarked
            }
            Err(e) => {
                error!(error = %e, student_id = student.id, "attendance insert failed");
                LedgerOutcome::WriteError
            }
        }
    }
}
