use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OpenFlags};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex};

use rubric_types::SuiteResult;

#[derive(Debug)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEntity {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub metadata: Option<serde_json::Value>,
}

impl Store {
    /// Open a new store at the given path (e.g., "rubric.db")
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_URI,
        )?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        store.init_schema()?;
        Ok(store)
    }

    /// Initialize the SQLite schema
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS runs (
                id INTEGER PRIMARY KEY,
                created_at TEXT NOT NULL,
                metadata TEXT
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS subjects (
                id INTEGER PRIMARY KEY,
                run_id INTEGER NOT NULL,
                subject_id TEXT,
                output TEXT NOT NULL,
                passed BOOLEAN NOT NULL,
                FOREIGN KEY(run_id) REFERENCES runs(id)
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS verdicts (
                id INTEGER PRIMARY KEY,
                subject_id INTEGER NOT NULL,
                op TEXT NOT NULL,
                passed BOOLEAN NOT NULL,
                reason TEXT NOT NULL,
                details TEXT,
                FOREIGN KEY(subject_id) REFERENCES subjects(id)
            )",
            [],
        )?;

        Ok(())
    }

    /// Create a new run entry
    pub fn create_run(&self, metadata: Option<serde_json::Value>) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO runs (created_at, metadata) VALUES (?1, ?2)",
            params![now.to_rfc3339(), metadata.map(|v| v.to_string())],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// Save a full suite result into the database
    pub fn save_suite(&self, run_id: i64, result: &SuiteResult) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        for case in &result.cases {
            tx.execute(
                "INSERT INTO subjects (run_id, subject_id, output, passed)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    run_id,
                    case.subject.id,
                    case.subject.output.to_string(),
                    case.passed()
                ],
            )?;
            let subject_row_id = tx.last_insert_rowid();

            for cv in &case.verdicts {
                tx.execute(
                    "INSERT INTO verdicts (subject_id, op, passed, reason, details)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        subject_row_id,
                        cv.op,
                        cv.verdict.result,
                        cv.verdict.reason,
                        cv.verdict.details.as_ref().map(|d| d.to_string())
                    ],
                )?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    /// Count verdicts saved for a run, for inspection and tests.
    pub fn verdict_count(&self, run_id: i64) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count = conn.query_row(
            "SELECT COUNT(*) FROM verdicts v
             JOIN subjects s ON s.id = v.subject_id
             WHERE s.run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rubric_types::{CheckVerdict, Subject, SubjectResult, Verdict};
    use serde_json::json;

    #[test]
    fn save_suite_round_trips() {
        let path = std::env::temp_dir().join("rubric_store_test.db");
        let _ = std::fs::remove_file(&path);

        let store = Store::open(&path).unwrap();
        let run_id = store.create_run(Some(json!({"suite": "smoke"}))).unwrap();

        let cases = vec![SubjectResult {
            subject: Subject::with_id("0", json!("hello world")),
            verdicts: vec![
                CheckVerdict {
                    op: "Contains".into(),
                    verdict: Verdict::pass("keyword hello found in output"),
                },
                CheckVerdict {
                    op: "OneLine".into(),
                    verdict: Verdict::pass("output is a single line"),
                },
            ],
        }];
        let summary = SuiteResult::summarize(&cases);
        let result = SuiteResult { cases, summary };

        store.save_suite(run_id, &result).unwrap();
        assert_eq!(store.verdict_count(run_id).unwrap(), 2);

        let _ = std::fs::remove_file(&path);
    }
}
