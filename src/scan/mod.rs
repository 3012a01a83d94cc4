//! QR attendance check-in: decode a scanned code, resolve the student,
//! and write at most one ledger row per code per day.

pub mod decoder;
pub mod ledger;
pub mod pipeline;
pub mod resolver;
pub mod worker;

pub use decoder::{
    FrameRead, InvalidPayload, MAX_CODE_CHARS, PresentationFilter, ScanPayload, decode_payload,
};
pub use ledger::{
    InsertOutcome, LedgerClock, LedgerOutcome, LedgerStore, LedgerWriter, ScanInstant,
};
pub use pipeline::{AttendancePipeline, ScanOutcome, ScanReport};
pub use resolver::{EnrollmentStore, IdentityResolver, Resolution};
pub use worker::{CodeSource, DriveStats, LineSource, Offer, ScanHandle, ScanLoop, drive};

use std::sync::Arc;

use crate::store::MySqlStore;
use crate::utils::student_cache::StudentCache;

/// Pipeline wired to MySQL for both the enrollment table and the ledger.
pub fn mysql_pipeline(
    store: MySqlStore,
    cache: StudentCache,
    clock: LedgerClock,
) -> AttendancePipeline {
    let store = Arc::new(store);
    AttendancePipeline::new(
        IdentityResolver::new(store.clone(), cache),
        LedgerWriter::new(store),
    )
    .with_clock(clock)
}
