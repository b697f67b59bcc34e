use rusqlite::{Connection, ErrorCode, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

use crate::config::StoreConfig;
use crate::db;
use crate::grade::{grade_of, Grade};

pub const MARKS_MIN: f64 = 0.0;
pub const MARKS_MAX: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub roll_no: i64,
    pub name: String,
    pub marks: f64,
    pub grade: Grade,
}

impl StudentRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let roll_no: i64 = row.get(0)?;
        let name: String = row.get(1)?;
        let marks: f64 = row.get(2)?;
        // The label is derived; recompute rather than trust the column.
        Ok(Self {
            roll_no,
            name,
            marks,
            grade: grade_of(marks),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("roll number must be positive, got {0}")]
    NonPositiveRollNo(i64),
    #[error("name must not be empty")]
    EmptyName,
    #[error("marks must be a finite number")]
    MarksNotFinite,
    #[error("marks must be between 0 and 100, got {0}")]
    MarksOutOfRange(f64),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("roll number {roll_no} already exists")]
    DuplicateKey { roll_no: i64 },
    #[error("roll number {roll_no} not found")]
    NotFound { roll_no: i64 },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Stable code used on the IPC wire.
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::DuplicateKey { .. } => "duplicate_key",
            StoreError::NotFound { .. } => "not_found",
            StoreError::Validation(_) => "validation_failed",
            StoreError::Storage(_) | StoreError::Io(_) => "storage_error",
        }
    }
}

/// Checks a candidate record before it reaches the table. Returns the
/// trimmed name that will be stored.
pub fn validate(roll_no: i64, name: &str, marks: f64) -> Result<String, ValidationError> {
    if roll_no <= 0 {
        return Err(ValidationError::NonPositiveRollNo(roll_no));
    }
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if !marks.is_finite() {
        return Err(ValidationError::MarksNotFinite);
    }
    if !(MARKS_MIN..=MARKS_MAX).contains(&marks) {
        return Err(ValidationError::MarksOutOfRange(marks));
    }
    Ok(name.to_string())
}

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(f, _) if f.code == ErrorCode::ConstraintViolation
    )
}

const SELECT_STUDENT: &str = "SELECT roll_no, name, marks, grade FROM students";

/// Handle to the student table. Holds no connection; every operation opens
/// one, runs, and drops it.
#[derive(Debug, Clone)]
pub struct RecordStore {
    config: StoreConfig,
}

impl RecordStore {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        Ok(db::connect(&self.config)?)
    }

    /// Creates the schema if absent and repairs stale grade labels. Safe to
    /// call on every start.
    pub fn initialize(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.config.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut conn = self.connect()?;
        db::ensure_schema(&conn)?;
        let refreshed = db::refresh_grades(&mut conn)?;
        if refreshed > 0 {
            debug!(refreshed, "rewrote stale grade labels");
        }
        Ok(())
    }

    pub fn add(&self, roll_no: i64, name: &str, marks: f64) -> Result<StudentRecord, StoreError> {
        let name = validate(roll_no, name, marks)?;
        let grade = grade_of(marks);
        let conn = self.connect()?;
        match conn.execute(
            "INSERT INTO students(roll_no, name, marks, grade) VALUES(?, ?, ?, ?)",
            (roll_no, &name, marks, grade.as_str()),
        ) {
            Ok(_) => {}
            Err(e) if is_constraint_violation(&e) => {
                debug!(roll_no, "insert rejected: duplicate roll number");
                return Err(StoreError::DuplicateKey { roll_no });
            }
            Err(e) => return Err(e.into()),
        }
        debug!(roll_no, %grade, "student added");
        Ok(StudentRecord {
            roll_no,
            name,
            marks,
            grade,
        })
    }

    pub fn update(
        &self,
        roll_no: i64,
        name: &str,
        marks: f64,
    ) -> Result<StudentRecord, StoreError> {
        let name = validate(roll_no, name, marks)?;
        let grade = grade_of(marks);
        let conn = self.connect()?;
        let changed = conn.execute(
            "UPDATE students SET name = ?, marks = ?, grade = ? WHERE roll_no = ?",
            (&name, marks, grade.as_str(), roll_no),
        )?;
        if changed == 0 {
            debug!(roll_no, "update rejected: no such roll number");
            return Err(StoreError::NotFound { roll_no });
        }
        debug!(roll_no, %grade, "student updated");
        Ok(StudentRecord {
            roll_no,
            name,
            marks,
            grade,
        })
    }

    pub fn delete(&self, roll_no: i64) -> Result<(), StoreError> {
        let conn = self.connect()?;
        let changed = conn.execute("DELETE FROM students WHERE roll_no = ?", [roll_no])?;
        if changed == 0 {
            debug!(roll_no, "delete rejected: no such roll number");
            return Err(StoreError::NotFound { roll_no });
        }
        debug!(roll_no, "student deleted");
        Ok(())
    }

    pub fn find(&self, roll_no: i64) -> Result<Option<StudentRecord>, StoreError> {
        let conn = self.connect()?;
        let sql = format!("{SELECT_STUDENT} WHERE roll_no = ?");
        let found = conn
            .query_row(&sql, [roll_no], StudentRecord::from_row)
            .optional()?;
        Ok(found)
    }

    pub fn exists(&self, roll_no: i64) -> Result<bool, StoreError> {
        let conn = self.connect()?;
        let hit: Option<i64> = conn
            .query_row("SELECT 1 FROM students WHERE roll_no = ?", [roll_no], |r| {
                r.get(0)
            })
            .optional()?;
        Ok(hit.is_some())
    }

    /// All records, ascending by roll number.
    pub fn list_all(&self) -> Result<Vec<StudentRecord>, StoreError> {
        let conn = self.connect()?;
        let sql = format!("{SELECT_STUDENT} ORDER BY roll_no");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], StudentRecord::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        let conn = self.connect()?;
        let n: usize = conn.query_row("SELECT COUNT(*) FROM students", [], |r| r.get(0))?;
        Ok(n)
    }

    /// Mean marks, or `None` for an empty table.
    pub fn average_marks(&self) -> Result<Option<f64>, StoreError> {
        let conn = self.connect()?;
        let avg: Option<f64> =
            conn.query_row("SELECT AVG(marks) FROM students", [], |r| r.get(0))?;
        Ok(avg)
    }

    /// Highest marks; ties go to the lowest roll number.
    pub fn topper(&self) -> Result<Option<StudentRecord>, StoreError> {
        let conn = self.connect()?;
        let sql = format!("{SELECT_STUDENT} ORDER BY marks DESC, roll_no ASC LIMIT 1");
        let top = conn
            .query_row(&sql, [], StudentRecord::from_row)
            .optional()?;
        Ok(top)
    }

    /// Number of records per grade. Every grade is present, zero-filled.
    pub fn grade_counts(&self) -> Result<BTreeMap<Grade, usize>, StoreError> {
        let mut counts: BTreeMap<Grade, usize> = Grade::ALL.into_iter().map(|g| (g, 0)).collect();
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT marks FROM students")?;
        let marks = stmt
            .query_map([], |r| r.get::<_, f64>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        for m in marks {
            *counts.entry(grade_of(m)).or_insert(0) += 1;
        }
        Ok(counts)
    }
}
