// src/store/reports.rs
// Bug report CRUD, search, and statistics

use super::Database;
use crate::report::{determine_priority, BugReport, DraftReport, Priority, ReportStatus};
use anyhow::{anyhow, Result};
use chrono::{DateTime, Datelike, NaiveDateTime, Utc};
use rusqlite::{params, Row};
use std::collections::BTreeMap;

/// Columns a caller is allowed to update after creation
const UPDATE_WHITELIST: &[&str] = &[
    "summary",
    "pages",
    "steps",
    "components",
    "status",
    "priority",
    "assigned_to",
    "notes",
];

/// Aggregate counts over the stored reports
#[derive(Debug, Clone, Default)]
pub struct ReportStats {
    pub total: u64,
    pub recent_7_days: u64,
    pub by_status: BTreeMap<String, u64>,
    pub by_priority: BTreeMap<String, u64>,
}

/// Result of an update call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    /// No whitelisted field was present in the request
    NothingToUpdate,
    NotFound,
}

/// SQLite-friendly timestamp format, comparable with datetime('now', ...)
const SQLITE_TS: &str = "%Y-%m-%d %H:%M:%S";

fn now_string() -> String {
    Utc::now().format(SQLITE_TS).to_string()
}

fn parse_ts(raw: &str) -> DateTime<Utc> {
    NaiveDateTime::parse_from_str(raw, SQLITE_TS)
        .map(|naive| naive.and_utc())
        .unwrap_or_default()
}

fn row_to_report(row: &Row<'_>) -> rusqlite::Result<BugReport> {
    Ok(BugReport {
        report_id: row.get("report_id")?,
        reporter: row.get("user_id")?,
        channel_id: row.get("channel_id")?,
        summary: row.get("summary")?,
        pages: row.get("pages")?,
        steps: row.get("steps")?,
        components: row.get("components")?,
        status: ReportStatus::parse(&row.get::<_, String>("status")?)
            .unwrap_or(ReportStatus::New),
        priority: Priority::parse(&row.get::<_, String>("priority")?)
            .unwrap_or(Priority::Medium),
        assigned_to: row.get("assigned_to")?,
        notes: row.get("notes")?,
        created_at: parse_ts(&row.get::<_, String>("created_at")?),
        updated_at: parse_ts(&row.get::<_, String>("updated_at")?),
    })
}

impl Database {
    /// Generate the next report ID for the current year: `BUG-<year>-<NNN>`,
    /// where NNN is the count of that year's reports plus one. Recomputed
    /// from existing rows, not a stored counter.
    fn next_report_id(&self, year: i32) -> Result<String> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM bug_reports WHERE report_id LIKE ?1",
            params![format!("BUG-{year}-%")],
            |row| row.get(0),
        )?;
        Ok(format!("BUG-{year}-{:03}", count + 1))
    }

    /// Persist a completed draft and return the stored report.
    ///
    /// Priority is inferred from the draft text; missing required fields are
    /// rejected before anything is written.
    pub fn save_report(
        &self,
        draft: &DraftReport,
        reporter: &str,
        channel_id: Option<&str>,
    ) -> Result<BugReport> {
        let summary = draft
            .summary
            .clone()
            .ok_or_else(|| anyhow!("draft is missing a summary"))?;
        let pages = draft
            .pages
            .clone()
            .ok_or_else(|| anyhow!("draft is missing affected pages"))?;
        let steps = draft
            .steps
            .clone()
            .ok_or_else(|| anyhow!("draft is missing reproduction steps"))?;

        let now = Utc::now();
        let report_id = self.next_report_id(now.year())?;
        let priority = determine_priority(draft);
        let ts = now_string();

        self.conn().execute(
            "INSERT INTO bug_reports
               (report_id, user_id, channel_id, summary, pages, steps, components,
                status, priority, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
            params![
                report_id,
                reporter,
                channel_id,
                summary,
                pages,
                steps,
                draft.components,
                ReportStatus::New.as_str(),
                priority.as_str(),
                ts,
            ],
        )?;

        Ok(BugReport {
            report_id,
            reporter: reporter.to_string(),
            channel_id: channel_id.map(|c| c.to_string()),
            summary,
            pages,
            steps,
            components: draft.components.clone(),
            status: ReportStatus::New,
            priority,
            assigned_to: None,
            notes: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Fetch one report by its public ID
    pub fn get_report(&self, report_id: &str) -> Result<Option<BugReport>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT * FROM bug_reports WHERE report_id = ?1")?;
        let mut rows = stmt.query_map(params![report_id], row_to_report)?;
        Ok(rows.next().transpose()?)
    }

    /// Most recent reports, optionally filtered by status
    pub fn list_reports(
        &self,
        status: Option<ReportStatus>,
        limit: usize,
    ) -> Result<Vec<BugReport>> {
        let conn = self.conn();
        let reports = match status {
            Some(status) => {
                let mut stmt = conn.prepare(
                    "SELECT * FROM bug_reports WHERE status = ?1
                     ORDER BY created_at DESC, id DESC LIMIT ?2",
                )?;
                let rows = stmt.query_map(params![status.as_str(), limit as i64], row_to_report)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT * FROM bug_reports ORDER BY created_at DESC, id DESC LIMIT ?1",
                )?;
                let rows = stmt.query_map(params![limit as i64], row_to_report)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
        };
        Ok(reports)
    }

    /// Substring search over summary, pages, steps and components
    pub fn search_reports(&self, query: &str, limit: usize) -> Result<Vec<BugReport>> {
        let term = format!("%{query}%");
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT * FROM bug_reports
             WHERE summary LIKE ?1 OR pages LIKE ?1 OR steps LIKE ?1 OR components LIKE ?1
             ORDER BY created_at DESC, id DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![term, limit as i64], row_to_report)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Update whitelisted fields of a report. Unknown fields are ignored
    /// rather than rejected, matching the permissive update contract.
    pub fn update_report(
        &self,
        report_id: &str,
        updates: &BTreeMap<String, String>,
    ) -> Result<UpdateOutcome> {
        let mut clauses = Vec::new();
        let mut values: Vec<&dyn rusqlite::ToSql> = Vec::new();
        for (key, value) in updates {
            if UPDATE_WHITELIST.contains(&key.as_str()) {
                clauses.push(format!("{key} = ?{}", clauses.len() + 1));
                values.push(value);
            }
        }
        if clauses.is_empty() {
            return Ok(UpdateOutcome::NothingToUpdate);
        }

        let ts = now_string();
        clauses.push(format!("updated_at = ?{}", clauses.len() + 1));
        values.push(&ts);
        let sql = format!(
            "UPDATE bug_reports SET {} WHERE report_id = ?{}",
            clauses.join(", "),
            clauses.len() + 1
        );
        values.push(&report_id);

        let changed = self.conn().execute(&sql, values.as_slice())?;
        Ok(if changed > 0 {
            UpdateOutcome::Updated
        } else {
            UpdateOutcome::NotFound
        })
    }

    /// Remove a report entirely
    pub fn delete_report(&self, report_id: &str) -> Result<bool> {
        let changed = self
            .conn()
            .execute("DELETE FROM bug_reports WHERE report_id = ?1", params![report_id])?;
        Ok(changed > 0)
    }

    /// Totals, 7-day recent count, and per-status / per-priority breakdowns
    pub fn report_stats(&self) -> Result<ReportStats> {
        let conn = self.conn();
        let total: i64 = conn.query_row("SELECT COUNT(*) FROM bug_reports", [], |r| r.get(0))?;
        let recent: i64 = conn.query_row(
            "SELECT COUNT(*) FROM bug_reports WHERE created_at >= datetime('now', '-7 days')",
            [],
            |r| r.get(0),
        )?;

        let mut by_status = BTreeMap::new();
        let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM bug_reports GROUP BY status")?;
        let rows = stmt.query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?)))?;
        for row in rows {
            let (status, count) = row?;
            by_status.insert(status, count as u64);
        }

        let mut by_priority = BTreeMap::new();
        let mut stmt =
            conn.prepare("SELECT priority, COUNT(*) FROM bug_reports GROUP BY priority")?;
        let rows = stmt.query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?)))?;
        for row in rows {
            let (priority, count) = row?;
            by_priority.insert(priority, count as u64);
        }

        Ok(ReportStats {
            total: total as u64,
            recent_7_days: recent as u64,
            by_status,
            by_priority,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(summary: &str) -> DraftReport {
        DraftReport {
            summary: Some(summary.to_string()),
            pages: Some("https://shop.example.com".to_string()),
            steps: Some("open the cart".to_string()),
            components: None,
        }
    }

    #[test]
    fn test_report_ids_increase_within_year() {
        let db = Database::open_in_memory().unwrap();
        let year = Utc::now().year();
        let first = db.save_report(&draft("first"), "U1", None).unwrap();
        let second = db.save_report(&draft("second"), "U1", None).unwrap();
        assert_eq!(first.report_id, format!("BUG-{year}-001"));
        assert_eq!(second.report_id, format!("BUG-{year}-002"));
        assert!(second.report_id > first.report_id);
    }

    #[test]
    fn test_save_rejects_incomplete_draft() {
        let db = Database::open_in_memory().unwrap();
        let incomplete = DraftReport {
            summary: Some("only summary".into()),
            ..Default::default()
        };
        assert!(db.save_report(&incomplete, "U1", None).is_err());
    }

    #[test]
    fn test_get_and_list() {
        let db = Database::open_in_memory().unwrap();
        let saved = db.save_report(&draft("cart is broken"), "U1", Some("C9")).unwrap();

        let fetched = db.get_report(&saved.report_id).unwrap().unwrap();
        assert_eq!(fetched.summary, "cart is broken");
        assert_eq!(fetched.channel_id.as_deref(), Some("C9"));
        assert_eq!(fetched.status, ReportStatus::New);
        // "broken" is a high-priority keyword
        assert_eq!(fetched.priority, Priority::High);

        assert_eq!(db.list_reports(None, 10).unwrap().len(), 1);
        assert_eq!(
            db.list_reports(Some(ReportStatus::Resolved), 10).unwrap().len(),
            0
        );
        assert!(db.get_report("BUG-1999-001").unwrap().is_none());
    }

    #[test]
    fn test_search_matches_any_text_field() {
        let db = Database::open_in_memory().unwrap();
        db.save_report(&draft("slow dashboard"), "U1", None).unwrap();
        db.save_report(&draft("login fails"), "U2", None).unwrap();

        let hits = db.search_reports("dashboard", 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].summary, "slow dashboard");

        // pages field is searched too
        let hits = db.search_reports("shop.example.com", 10).unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_update_respects_whitelist() {
        let db = Database::open_in_memory().unwrap();
        let saved = db.save_report(&draft("to update"), "U1", None).unwrap();

        let mut updates = BTreeMap::new();
        updates.insert("status".to_string(), "resolved".to_string());
        updates.insert("report_id".to_string(), "BUG-9999-999".to_string());
        let outcome = db.update_report(&saved.report_id, &updates).unwrap();
        assert_eq!(outcome, UpdateOutcome::Updated);

        let fetched = db.get_report(&saved.report_id).unwrap().unwrap();
        assert_eq!(fetched.status, ReportStatus::Resolved);

        let mut bogus = BTreeMap::new();
        bogus.insert("report_id".to_string(), "BUG-9999-999".to_string());
        assert_eq!(
            db.update_report(&saved.report_id, &bogus).unwrap(),
            UpdateOutcome::NothingToUpdate
        );
        assert_eq!(
            db.update_report("BUG-1999-001", &updates).unwrap(),
            UpdateOutcome::NotFound
        );
    }

    #[test]
    fn test_delete_report() {
        let db = Database::open_in_memory().unwrap();
        let saved = db.save_report(&draft("temp"), "U1", None).unwrap();
        assert!(db.delete_report(&saved.report_id).unwrap());
        assert!(!db.delete_report(&saved.report_id).unwrap());
    }

    #[test]
    fn test_stats_counts() {
        let db = Database::open_in_memory().unwrap();
        db.save_report(&draft("crash on save"), "U1", None).unwrap();
        db.save_report(&draft("minor typo"), "U2", None).unwrap();

        let stats = db.report_stats().unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.recent_7_days, 2);
        assert_eq!(stats.by_status.get("new"), Some(&2));
        assert_eq!(stats.by_priority.get("high"), Some(&1));
        assert_eq!(stats.by_priority.get("low"), Some(&1));
    }
}
