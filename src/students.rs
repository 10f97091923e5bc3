use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// One row of `StudentMarks`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentRecord {
    #[serde(rename = "StudentID")]
    pub student_id: i64,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Semester")]
    pub semester: String,
    #[serde(rename = "Subject")]
    pub subject: String,
    #[serde(rename = "Marks")]
    pub marks: f64,
    #[serde(rename = "TotalMarks")]
    pub total_marks: f64,
}

/// Validated body of a create or update request.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentInput {
    pub name: String,
    pub semester: String,
    pub subject: String,
    pub marks: f64,
    pub total_marks: f64,
}

#[derive(Debug, Deserialize)]
struct RawStudentInput {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Semester")]
    semester: SemesterValue,
    #[serde(rename = "Subject")]
    subject: String,
    #[serde(rename = "Marks")]
    marks: f64,
    #[serde(rename = "TotalMarks")]
    total_marks: f64,
}

/// Semester is sent either as `"3"` or `3`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SemesterValue {
    Text(String),
    Number(i64),
}

impl SemesterValue {
    fn into_text(self) -> String {
        match self {
            SemesterValue::Text(s) => s,
            SemesterValue::Number(n) => n.to_string(),
        }
    }
}

impl StudentInput {
    /// Parses and validates a request body.
    ///
    /// Syntax errors map to [`AppError::InvalidJson`]; a well-formed body with
    /// missing or bad fields maps to [`AppError::Validation`].
    pub fn from_json(body: &[u8]) -> Result<Self> {
        let raw: RawStudentInput = serde_json::from_slice(body).map_err(|e| {
            if e.is_syntax() || e.is_eof() {
                AppError::InvalidJson
            } else {
                AppError::Validation(format!("invalid student record: {e}"))
            }
        })?;
        Self::validate(raw)
    }

    fn validate(raw: RawStudentInput) -> Result<Self> {
        let name = required_text("Name", raw.name)?;
        let semester = required_text("Semester", raw.semester.into_text())?;
        let subject = required_text("Subject", raw.subject)?;
        let marks = required_number("Marks", raw.marks)?;
        let total_marks = required_number("TotalMarks", raw.total_marks)?;
        Ok(Self {
            name,
            semester,
            subject,
            marks,
            total_marks,
        })
    }
}

fn required_text(field: &str, value: String) -> Result<String> {
    let t = value.trim();
    if t.is_empty() {
        return Err(AppError::Validation(format!("{field} must not be empty")));
    }
    Ok(t.to_string())
}

fn required_number(field: &str, value: f64) -> Result<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(AppError::Validation(format!(
            "{field} must be a non-negative number"
        )));
    }
    Ok(value)
}

pub(crate) const SELECT_COLUMNS: &str =
    "SELECT StudentID, Name, Semester, Subject, Marks, TotalMarks FROM StudentMarks";

pub(crate) fn record_from_row(row: &Row<'_>) -> rusqlite::Result<StudentRecord> {
    Ok(StudentRecord {
        student_id: row.get(0)?,
        name: row.get(1)?,
        semester: row.get(2)?,
        subject: row.get(3)?,
        marks: row.get(4)?,
        total_marks: row.get(5)?,
    })
}

pub fn list_all(conn: &Connection) -> Result<Vec<StudentRecord>> {
    let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY StudentID"))?;
    let rows = stmt
        .query_map([], record_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub fn get(conn: &Connection, id: i64) -> Result<StudentRecord> {
    conn.query_row(
        &format!("{SELECT_COLUMNS} WHERE StudentID = ?"),
        [id],
        record_from_row,
    )
    .optional()?
    .ok_or(AppError::NotFound { id })
}

/// Inserts a record and returns the id storage assigned to it.
pub fn create(conn: &Connection, input: &StudentInput) -> Result<i64> {
    conn.execute(
        "INSERT INTO StudentMarks (Name, Semester, Subject, Marks, TotalMarks)
         VALUES (?, ?, ?, ?, ?)",
        (
            &input.name,
            &input.semester,
            &input.subject,
            input.marks,
            input.total_marks,
        ),
    )?;
    let id = conn.last_insert_rowid();
    tracing::info!(id, subject = %input.subject, "student record added");
    Ok(id)
}

/// Replaces every field of the row keyed by `id`.
pub fn update(conn: &Connection, id: i64, input: &StudentInput) -> Result<()> {
    let changed = conn.execute(
        "UPDATE StudentMarks
         SET Name = ?, Semester = ?, Subject = ?, Marks = ?, TotalMarks = ?
         WHERE StudentID = ?",
        (
            &input.name,
            &input.semester,
            &input.subject,
            input.marks,
            input.total_marks,
            id,
        ),
    )?;
    if changed == 0 {
        return Err(AppError::NotFound { id });
    }
    tracing::info!(id, "student record updated");
    Ok(())
}

pub fn delete(conn: &Connection, id: i64) -> Result<()> {
    let changed = conn.execute("DELETE FROM StudentMarks WHERE StudentID = ?", [id])?;
    if changed == 0 {
        return Err(AppError::NotFound { id });
    }
    tracing::info!(id, "student record deleted");
    Ok(())
}
