use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::StoreConfig;
use crate::grade::{grade_of, Grade};

pub const DB_FILE_NAME: &str = "rollbook.sqlite3";

pub fn db_path(workspace: &Path) -> PathBuf {
    workspace.join(DB_FILE_NAME)
}

/// Opens a connection for a single operation. Callers drop it when done.
pub fn connect(config: &StoreConfig) -> rusqlite::Result<Connection> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let conn = Connection::open_with_flags(&config.path, flags)?;
    conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
    Ok(conn)
}

pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            roll_no INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            marks REAL NOT NULL,
            grade TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS admin(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT UNIQUE NOT NULL,
            password TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

/// Fails unless both tables exist with the columns this build reads.
/// Does not create anything.
pub fn check_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.prepare("SELECT roll_no, name, marks, grade FROM students LIMIT 1")?;
    conn.prepare("SELECT id, username, password FROM admin LIMIT 1")?;
    Ok(())
}

/// Rewrites any grade label that no longer matches its marks, e.g. rows
/// written by an older build with different bands or edited by hand.
/// Returns the number of rows touched.
pub fn refresh_grades(conn: &mut Connection) -> rusqlite::Result<usize> {
    let tx = conn.transaction()?;
    let stale = {
        let mut stmt = tx.prepare("SELECT roll_no, marks, grade FROM students")?;
        let rows = stmt
            .query_map([], |row| {
                let roll_no: i64 = row.get(0)?;
                let marks: f64 = row.get(1)?;
                let grade: String = row.get(2)?;
                Ok((roll_no, marks, grade))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter()
            .filter_map(|(roll_no, marks, stored)| {
                let expected = grade_of(marks);
                match stored.parse::<Grade>() {
                    Ok(g) if g == expected => None,
                    _ => Some((roll_no, expected)),
                }
            })
            .collect::<Vec<_>>()
    };

    for (roll_no, grade) in &stale {
        tx.execute(
            "UPDATE students SET grade = ? WHERE roll_no = ?",
            (grade.as_str(), roll_no),
        )?;
    }
    tx.commit()?;
    Ok(stale.len())
}
