//! SQLite persistence for simulator runs.
//!
//! RULE: Only store.rs talks to the database.
//! The dispatcher never touches storage; the simulator and tools feed
//! events in after each step.

use crate::{
    call::Call,
    error::{DispatchError, DispatchResult},
    event::{DispatchEvent, EventLogEntry},
    types::{CallId, RunId, Tick},
};
use rusqlite::{params, Connection};

pub struct CallStore {
    conn: Connection,
}

impl CallStore {
    /// Open (or create) the run database at `path`. URIs are accepted,
    /// so shared-memory databases work too.
    pub fn open(path: &str) -> DispatchResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> DispatchResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> DispatchResult<()> {
        self.conn
            .execute_batch(include_str!("../migrations/001_dispatch.sql"))?;
        Ok(())
    }

    /// A fresh random run id.
    pub fn new_run_id() -> RunId {
        format!("run-{}", uuid::Uuid::new_v4())
    }

    // ── Run ────────────────────────────────────────────────────

    pub fn insert_run(&self, run_id: &str, seed: u64, version: &str) -> DispatchResult<()> {
        self.conn.execute(
            "INSERT INTO run (run_id, seed, version, started_at) VALUES (?1, ?2, ?3, ?4)",
            params![run_id, seed as i64, version, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, run_id: &str, tick: Tick, event: &DispatchEvent) -> DispatchResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (run_id, tick, call_id, event_type, payload)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                run_id,
                tick as i64,
                event.call_id().0 as i64,
                event.type_name(),
                serde_json::to_string(event)?,
            ],
        )?;
        Ok(())
    }

    pub fn events_for_tick(&self, run_id: &str, tick: Tick) -> DispatchResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, tick, call_id, event_type, payload
             FROM event_log WHERE run_id = ?1 AND tick = ?2 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![run_id, tick as i64], |row| {
            Ok(EventLogEntry {
                id: row.get(0)?,
                run_id: row.get(1)?,
                tick: row.get::<_, i64>(2)? as u64,
                call_id: CallId(row.get::<_, i64>(3)? as u64),
                event_type: row.get(4)?,
                payload: row.get(5)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Every event for one call, decoded, in emission order.
    pub fn call_history(&self, run_id: &str, call_id: CallId) -> DispatchResult<Vec<DispatchEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT payload FROM event_log WHERE run_id = ?1 AND call_id = ?2 ORDER BY id",
        )?;
        let payloads = stmt
            .query_map(params![run_id, call_id.0 as i64], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        payloads
            .iter()
            .map(|p| serde_json::from_str(p).map_err(DispatchError::from))
            .collect()
    }

    pub fn event_count(&self, run_id: &str, event_type: &str) -> DispatchResult<i64> {
        let n = self.conn.query_row(
            "SELECT COUNT(*) FROM event_log WHERE run_id = ?1 AND event_type = ?2",
            params![run_id, event_type],
            |row| row.get(0),
        )?;
        Ok(n)
    }

    // ── Completed calls ────────────────────────────────────────

    pub fn insert_completed_call(&self, run_id: &str, tick: Tick, call: &Call) -> DispatchResult<()> {
        self.conn.execute(
            "INSERT INTO completed_call (run_id, call_id, tick_completed, final_tier, escalations)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                run_id,
                call.id().0 as i64,
                tick as i64,
                call.required_tier().name(),
                call.escalations() as i64,
            ],
        )?;
        Ok(())
    }

    pub fn completed_call_count(&self, run_id: &str) -> DispatchResult<i64> {
        let n = self.conn.query_row(
            "SELECT COUNT(*) FROM completed_call WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(n)
    }

    /// Completed calls grouped by the tier they finished at.
    pub fn completed_by_tier(&self, run_id: &str) -> DispatchResult<Vec<(String, i64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT final_tier, COUNT(*) FROM completed_call
             WHERE run_id = ?1 GROUP BY final_tier ORDER BY final_tier",
        )?;
        let rows = stmt.query_map(params![run_id], |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
