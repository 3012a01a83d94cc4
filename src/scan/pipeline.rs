use strum_macros::IntoStaticStr;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::decoder::decode_payload;
use super::ledger::{LedgerClock, LedgerOutcome, LedgerWriter, ScanInstant};
use super::resolver::{IdentityResolver, Resolution};
use crate::model::student::StudentRecord;

/// Terminal state of one scan. Every scan ends in exactly one of these.
#[derive(Debug, Clone, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ScanOutcome {
    Committed { name: String },
    AlreadyMarked,
    InvalidPayload,
    NotFound { student_id: u64 },
    LookupError,
    WriteError,
}

impl ScanOutcome {
    pub fn kind(&self) -> &'static str {
        self.into()
    }

    /// Operator notification text.
    pub fn message(&self) -> String {
        match self {
            ScanOutcome::Committed { name } => {
                format!("Attendance marked successfully for {name}!")
            }
            ScanOutcome::AlreadyMarked => {
                "Attendance already marked for today. Please try again tomorrow.".to_string()
            }
            ScanOutcome::InvalidPayload => "Invalid QR code".to_string(),
            ScanOutcome::NotFound { .. } => {
                "Student not found in the admission records".to_string()
            }
            ScanOutcome::LookupError => "Error looking up student. Please try again.".to_string(),
            ScanOutcome::WriteError => {
                "Failed to save attendance. Please try again later.".to_string()
            }
        }
    }

    pub fn is_committed(&self) -> bool {
        matches!(self, ScanOutcome::Committed { .. })
    }
}

#[derive(Debug, Clone)]
pub struct ScanReport {
    pub scan_id: Uuid,
    pub outcome: ScanOutcome,
    /// Set once the scanned id resolved to an admission.
    pub student: Option<StudentRecord>,
}

/// decode → resolve → duplicate check → commit, for one scanned code.
pub struct AttendancePipeline {
    resolver: IdentityResolver,
    ledger: LedgerWriter,
    clock: LedgerClock,
}

impl AttendancePipeline {
    pub fn new(resolver: IdentityResolver, ledger: LedgerWriter) -> Self {
        Self {
            resolver,
            ledger,
            clock: LedgerClock::default(),
        }
    }

    pub fn with_clock(mut self, clock: LedgerClock) -> Self {
        self.clock = clock;
        self
    }

    /// Clock that stamps scans arriving without an explicit instant.
    pub fn clock(&self) -> LedgerClock {
        self.clock
    }

    pub fn resolver(&self) -> &IdentityResolver {
        &self.resolver
    }

    pub async fn process(&self, code_data: &str, at: ScanInstant) -> ScanReport {
        self.run(Uuid::new_v4(), code_data, at).await
    }

    #[instrument(name = "attendance_scan", skip(self, code_data, at), fields(date = %at.date))]
    async fn run(&self, scan_id: Uuid, code_data: &str, at: ScanInstant) -> ScanReport {
        let report = |outcome, student| ScanReport {
            scan_id,
            outcome,
            student,
        };

        let payload = match decode_payload(code_data) {
            Ok(p) => p,
            Err(e) => {
                warn!(reason = %e, "rejected scanned code");
                return report(ScanOutcome::InvalidPayload, None);
            }
        };
        debug!(student_id = payload.id, "code decoded, resolving student");

        let student = match self.resolver.resolve(payload.id).await {
            Resolution::Found(s) => s,
            Resolution::NotFound => {
                return report(
                    ScanOutcome::NotFound {
                        student_id: payload.id,
                    },
                    None,
                );
            }
            Resolution::LookupError => return report(ScanOutcome::LookupError, None),
        };
        debug!(student_id = student.id, "student resolved, writing ledger");

        let outcome = match self.ledger.commit(&student, code_data, &at).await {
            LedgerOutcome::Committed(name) => ScanOutcome::Committed { name },
            LedgerOutcome::AlreadyMarked => ScanOutcome::AlreadyMarked,
            LedgerOutcome::WriteError => ScanOutcome::WriteError,
        };
        info!(outcome = outcome.kind(), student_id = student.id, "scan finished");

        report(outcome, Some(student))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::utils::student_cache::StudentCache;
    use chrono::{FixedOffset, TimeZone};
    use std::sync::Arc;
    use std::time::Duration;

    const ALI_CODE: &str = r#"{"id":42,"name":"Ali","CNIC":"4130112345671"}"#;

    fn pipeline(store: Arc<MemoryStore>) -> AttendancePipeline {
        AttendancePipeline::new(
            IdentityResolver::new(store.clone(), StudentCache::new(100, Duration::from_secs(60))),
            LedgerWriter::new(store),
        )
    }

    fn may_1(hour: u32, min: u32) -> ScanInstant {
        let tz = FixedOffset::east_opt(5 * 3600).unwrap();
        ScanInstant::at(&tz.with_ymd_and_hms(2024, 5, 1, hour, min, 0).unwrap())
    }

    #[tokio::test]
    async fn enrolled_student_commits_then_is_already_marked() {
        let store = Arc::new(MemoryStore::with_students([MemoryStore::student(42, "Ali")]));
        let pipeline = pipeline(store.clone());

        let first = pipeline.process(ALI_CODE, may_1(9, 0)).await;
        assert_eq!(first.outcome, ScanOutcome::Committed { name: "Ali".into() });
        assert_eq!(first.student.map(|s| s.id), Some(42));
        assert_eq!(store.mark_count(), 1);

        let second = pipeline.process(ALI_CODE, may_1(9, 5)).await;
        assert_eq!(second.outcome, ScanOutcome::AlreadyMarked);
        assert_eq!(store.mark_count(), 1);
        assert_ne!(first.scan_id, second.scan_id);
    }

    #[tokio::test]
    async fn replays_after_commit_are_always_already_marked() {
        let store = Arc::new(MemoryStore::with_students([MemoryStore::student(42, "Ali")]));
        let pipeline = pipeline(store.clone());

        pipeline.process(ALI_CODE, may_1(9, 0)).await;
        for min in 1..6 {
            let report = pipeline.process(ALI_CODE, may_1(10, min)).await;
            assert_eq!(report.outcome, ScanOutcome::AlreadyMarked);
        }
        assert_eq!(store.mark_count(), 1);
    }

    #[tokio::test]
    async fn unknown_student_never_reaches_the_ledger() {
        let store = Arc::new(MemoryStore::with_students([MemoryStore::student(42, "Ali")]));
        let pipeline = pipeline(store.clone());

        let report = pipeline
            .process(r#"{"id":999,"name":"Ghost","CNIC":"0000000000000"}"#, may_1(9, 0))
            .await;

        assert_eq!(report.outcome, ScanOutcome::NotFound { student_id: 999 });
        assert!(report.student.is_none());
        assert_eq!(store.ledger_read_calls(), 0);
        assert_eq!(store.insert_calls(), 0);
        assert_eq!(store.mark_count(), 0);
    }

    #[tokio::test]
    async fn invalid_payload_makes_no_store_calls() {
        let store = Arc::new(MemoryStore::with_students([MemoryStore::student(42, "Ali")]));
        let pipeline = pipeline(store.clone());

        for text in ["not json", "[1,2]", r#"{"name":"Ali"}"#, ""] {
            let report = pipeline.process(text, may_1(9, 0)).await;
            assert_eq!(report.outcome, ScanOutcome::InvalidPayload, "text: {text:?}");
        }

        let oversized = format!(r#"{{"id":42,"name":"{}"}}"#, "A".repeat(600));
        let report = pipeline.process(&oversized, may_1(9, 0)).await;
        assert_eq!(report.outcome, ScanOutcome::InvalidPayload);
        assert_eq!(store.total_calls(), 0);
    }

    #[tokio::test]
    async fn lookup_fault_is_reported_and_recoverable() {
        let store = Arc::new(MemoryStore::with_students([MemoryStore::student(42, "Ali")]));
        let pipeline = pipeline(store.clone());

        store.fail_lookups(true);
        let report = pipeline.process(ALI_CODE, may_1(9, 0)).await;
        assert_eq!(report.outcome, ScanOutcome::LookupError);
        assert_eq!(store.ledger_read_calls(), 0);

        store.fail_lookups(false);
        let report = pipeline.process(ALI_CODE, may_1(9, 1)).await;
        assert!(report.outcome.is_committed());
    }

    #[tokio::test]
    async fn write_fault_is_reported_and_recoverable() {
        let store = Arc::new(MemoryStore::with_students([MemoryStore::student(42, "Ali")]));
        let pipeline = pipeline(store.clone());

        store.fail_writes(true);
        let report = pipeline.process(ALI_CODE, may_1(9, 0)).await;
        assert_eq!(report.outcome, ScanOutcome::WriteError);
        assert!(report.student.is_some());

        store.fail_writes(false);
        let report = pipeline.process(ALI_CODE, may_1(9, 1)).await;
        assert!(report.outcome.is_committed());
        assert_eq!(store.mark_count(), 1);
    }

    #[tokio::test]
    async fn ledger_is_keyed_on_the_raw_code_text() {
        let store = Arc::new(MemoryStore::with_students([MemoryStore::student(42, "Ali")]));
        let pipeline = pipeline(store.clone());

        pipeline.process(ALI_CODE, may_1(9, 0)).await;

        let marks = store.marks();
        assert_eq!(marks.len(), 1);
        assert_eq!(marks[0].code_data, ALI_CODE);
        assert_eq!(marks[0].date.to_string(), "2024-05-01");
        assert_eq!(marks[0].time.to_string(), "09:00:00");
    }

    #[test]
    fn outcome_kinds_and_messages() {
        let committed = ScanOutcome::Committed { name: "Ali".into() };
        assert_eq!(committed.kind(), "committed");
        assert_eq!(committed.message(), "Attendance marked successfully for Ali!");
        assert_eq!(ScanOutcome::AlreadyMarked.kind(), "already_marked");
        assert_eq!(ScanOutcome::NotFound { student_id: 1 }.kind(), "not_found");
        assert_eq!(ScanOutcome::InvalidPayload.message(), "Invalid QR code");
        assert_eq!(ScanOutcome::WriteError.kind(), "write_error");
    }

    #[test]
    fn pipeline_carries_its_ledger_clock() {
        let store = Arc::new(MemoryStore::default());
        assert_eq!(pipeline(store.clone()).clock(), LedgerClock::Utc);
        assert_eq!(
            pipeline(store).with_clock(LedgerClock::Local).clock(),
            LedgerClock::Local
        );
    }
}
