//! SQLite persistence layer.
//!
//! RULE: Only store.rs talks to the database.
//! The pipeline never reads back what it wrote; the store is an export
//! target for inspection and charting tools.

use crate::{
    error::SimResult,
    estimator::EstimationReport,
    event::EventLogEntry,
    pipeline::SimRun,
    types::RunId,
};
use rusqlite::{params, Connection};

pub struct SimStore {
    conn: Connection,
}

impl SimStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: &str) -> SimResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode only for real files; :memory: ignores it.
        if let Err(e) = conn.execute_batch("PRAGMA journal_mode=WAL;") {
            log::warn!("store: could not enable WAL on {path}: {e}");
        }
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> SimResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> SimResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_foundation.sql"))?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    /// Persist every table of a finished run in one transaction.
    pub fn save_run(&self, run_id: &str, run: &SimRun, version: &str) -> SimResult<()> {
        let tx = self.conn.unchecked_transaction()?;

        tx.execute(
            "INSERT INTO run (run_id, seed, version, media_effect, config_json)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                run_id,
                run.config.seed as i64,
                version,
                run.config.media_effect.to_string(),
                serde_json::to_string(&run.config)?,
            ],
        )?;

        {
            let mut stmt = tx.prepare("INSERT INTO week (run_id, week, week_ending) VALUES (?1, ?2, ?3)")?;
            for (week, date) in run.calendar.weeks().iter().enumerate() {
                stmt.execute(params![run_id, week as i64, date.to_string()])?;
            }
        }

        {
            let mut stmt = tx.prepare("INSERT INTO panel (run_id, state, region) VALUES (?1, ?2, ?3)")?;
            for state in run.panel.states() {
                if let Some(region) = run.panel.region_of(state) {
                    stmt.execute(params![run_id, state, region])?;
                }
            }
        }

        {
            let mut stmt = tx.prepare(
                "INSERT INTO sales_record (run_id, state, region, week, national_shock,
                     regional_shock, state_shock, shock_sales, media_contribution, sales)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )?;
            for r in &run.sales {
                stmt.execute(params![
                    run_id,
                    r.state,
                    r.region,
                    r.week as i64,
                    r.national_shock,
                    r.regional_shock,
                    r.state_shock,
                    r.shock_sales,
                    r.media_contribution,
                    r.sales,
                ])?;
            }
        }

        {
            let mut stmt = tx.prepare(
                "INSERT INTO media_record (run_id, state, week, channel, spend)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for m in &run.media {
                stmt.execute(params![run_id, m.state, m.week as i64, m.channel.label(), m.spend])?;
            }
        }

        {
            let mut stmt = tx.prepare(
                "INSERT INTO regional_rollup (run_id, region, week, sales) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for row in run.regional_rollup() {
                stmt.execute(params![run_id, row.region, row.week as i64, row.sales])?;
            }
        }

        {
            let mut stmt = tx.prepare(
                "INSERT INTO event_log (run_id, seq, event_type, payload) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (seq, event) in run.events.iter().enumerate() {
                stmt.execute(params![
                    run_id,
                    seq as i64,
                    event.type_name(),
                    serde_json::to_string(event)?,
                ])?;
            }
        }

        tx.commit()?;
        log::debug!("store: saved run {run_id}");
        Ok(())
    }

    pub fn save_estimates(&self, run_id: &str, report: &EstimationReport) -> SimResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO coefficient_estimate (run_id, term, estimate, std_error, t_stat, truth)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for c in &report.coefficients {
                let truth = report
                    .comparison
                    .iter()
                    .find(|cmp| cmp.channel.label() == c.term)
                    .map(|cmp| cmp.truth);
                stmt.execute(params![run_id, c.term, c.estimate, c.std_error, c.t_stat, truth])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    // ── Queries ────────────────────────────────────────────────

    pub fn run_ids(&self) -> SimResult<Vec<RunId>> {
        let mut stmt = self.conn.prepare("SELECT run_id FROM run ORDER BY run_id")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }

    pub fn sales_count(&self, run_id: &str) -> SimResult<i64> {
        self.count("SELECT COUNT(*) FROM sales_record WHERE run_id = ?1", run_id)
    }

    pub fn media_count(&self, run_id: &str) -> SimResult<i64> {
        self.count("SELECT COUNT(*) FROM media_record WHERE run_id = ?1", run_id)
    }

    pub fn week_count(&self, run_id: &str) -> SimResult<i64> {
        self.count("SELECT COUNT(*) FROM week WHERE run_id = ?1", run_id)
    }

    /// Summed sales per week for one region, in week order.
    pub fn rollup_for_region(&self, run_id: &str, region: &str) -> SimResult<Vec<(i64, f64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT week, sales FROM regional_rollup
             WHERE run_id = ?1 AND region = ?2 ORDER BY week ASC",
        )?;
        let rows = stmt
            .query_map(params![run_id, region], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// (term, estimate) pairs; estimates SQLite stored as NULL come back as None.
    pub fn coefficient_estimates(&self, run_id: &str) -> SimResult<Vec<(String, Option<f64>)>> {
        let mut stmt = self.conn.prepare(
            "SELECT term, estimate FROM coefficient_estimate WHERE run_id = ?1 ORDER BY rowid ASC",
        )?;
        let rows = stmt
            .query_map(params![run_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn events(&self, run_id: &str) -> SimResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, seq, event_type, payload
             FROM event_log WHERE run_id = ?1
             ORDER BY seq ASC",
        )?;
        let entries = stmt
            .query_map(params![run_id], |row| {
                Ok(EventLogEntry {
                    id: Some(row.get(0)?),
                    run_id: row.get(1)?,
                    seq: row.get::<_, i64>(2)? as u64,
                    event_type: row.get(3)?,
                    payload: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    fn count(&self, sql: &str, run_id: &str) -> SimResult<i64> {
        let n = self.conn.query_row(sql, params![run_id], |row| row.get(0))?;
        Ok(n)
    }
}
