use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;

use super::StoreError;
use crate::model::attendance::AttendanceRecord;
use crate::model::student::StudentRecord;
use crate::scan::ledger::{InsertOutcome, LedgerStore};
use crate::scan::resolver::EnrollmentStore;

/// Enrollment + ledger store kept in process memory, with call counters and
/// switches for injecting faults.
#[derive(Default)]
pub struct MemoryStore {
    students: Mutex<HashMap<u64, StudentRecord>>,
    marks: Mutex<HashMap<(String, NaiveDate), AttendanceRecord>>,

    lookup_calls: AtomicUsize,
    ledger_read_calls: AtomicUsize,
    insert_calls: AtomicUsize,

    fail_lookups: AtomicBool,
    fail_ledger_reads: AtomicBool,
    fail_writes: AtomicBool,
    hide_marks: AtomicBool,
}

impl MemoryStore {
    pub fn with_students(students: impl IntoIterator<Item = StudentRecord>) -> Self {
        let store = Self::default();
        for s in students {
            store.add_student(s);
        }
        store
    }

    pub fn student(id: u64, name: &str) -> StudentRecord {
        StudentRecord {
            id,
            name: name.to_string(),
            national_id: "4130112345671".to_string(),
            course: "English Grammar".to_string(),
        }
    }

    pub fn add_student(&self, student: StudentRecord) {
        self.students.lock().unwrap().insert(student.id, student);
    }

    pub fn remove_student(&self, id: u64) {
        self.students.lock().unwrap().remove(&id);
    }

    pub fn fail_lookups(&self, on: bool) {
        self.fail_lookups.store(on, Ordering::SeqCst);
    }

    pub fn fail_ledger_reads(&self, on: bool) {
        self.fail_ledger_reads.store(on, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, on: bool) {
        self.fail_writes.store(on, Ordering::SeqCst);
    }

    /// Makes `find_mark` miss existing rows, as a pre-check racing another
    /// device would.
    pub fn hide_marks_from_reads(&self, on: bool) {
        self.hide_marks.store(on, Ordering::SeqCst);
    }

    pub fn lookup_calls(&self) -> usize {
        self.lookup_calls.load(Ordering::SeqCst)
    }

    pub fn ledger_read_calls(&self) -> usize {
        self.ledger_read_calls.load(Ordering::SeqCst)
    }

    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.lookup_calls() + self.ledger_read_calls() + self.insert_calls()
    }

    pub fn mark_count(&self) -> usize {
        self.marks.lock().unwrap().len()
    }

    pub fn marks(&self) -> Vec<AttendanceRecord> {
        self.marks.lock().unwrap().values().cloned().collect()
    }
}

#[async_trait]
impl EnrollmentStore for MemoryStore {
    async fn find_student(&self, id: u64) -> Result<Option<StudentRecord>, StoreError> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("enrollment store unreachable".into()));
        }
        Ok(self.students.lock().unwrap().get(&id).cloned())
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn find_mark(
        &self,
        code_data: &str,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        self.ledger_read_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_ledger_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("ledger unreachable".into()));
        }
        if self.hide_marks.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(self
            .marks
            .lock()
            .unwrap()
            .get(&(code_data.to_string(), date))
            .cloned())
    }

    async fn insert_mark(&self, record: &AttendanceRecord) -> Result<InsertOutcome, StoreError> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("ledger write rejected".into()));
        }

        let mut marks = self.marks.lock().unwrap();
        let key = (record.code_data.clone(), record.date);
        if marks.contains_key(&key) {
            return Ok(InsertOutcome::Conflict);
        }
        marks.insert(key, record.clone());
        Ok(InsertOutcome::Inserted)
    }
}
