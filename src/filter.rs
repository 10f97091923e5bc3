use rusqlite::{params_from_iter, Connection};

use crate::error::Result;
use crate::students::{record_from_row, StudentRecord, SELECT_COLUMNS};

/// Optional equality constraints for a filtered listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentFilter {
    pub subject: Option<String>,
    pub semester: Option<String>,
}

impl StudentFilter {
    /// Builds a filter from raw query pairs. A repeated key keeps its first value.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut out = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_ref() {
                "subject" => &mut out.subject,
                "semester" => &mut out.semester,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into());
            }
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterQuery {
    pub sql: String,
    pub params: Vec<String>,
}

fn present(v: Option<&str>) -> Option<&str> {
    v.map(str::trim).filter(|t| !t.is_empty())
}

impl FilterQuery {
    /// Every present constraint becomes one `AND <column> = ?` clause.
    pub fn build(filter: &StudentFilter) -> Self {
        let mut sql = format!("{SELECT_COLUMNS} WHERE 1=1");
        let mut params = Vec::new();

        if let Some(subject) = present(filter.subject.as_deref()) {
            sql.push_str(" AND Subject = ?");
            params.push(subject.to_string());
        }
        if let Some(semester) = present(filter.semester.as_deref()) {
            sql.push_str(" AND Semester = ?");
            params.push(semester.to_string());
        }

        sql.push_str(" ORDER BY StudentID");
        Self { sql, params }
    }
}

pub fn filter(conn: &Connection, filter: &StudentFilter) -> Result<Vec<StudentRecord>> {
    let query = FilterQuery::build(filter);
    let mut stmt = conn.prepare(&query.sql)?;
    let rows = stmt
        .query_map(params_from_iter(query.params.iter()), record_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    tracing::debug!(
        constraints = query.params.len(),
        matched = rows.len(),
        "filtered student records"
    );
    Ok(rows)
}
