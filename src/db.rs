// 🗄️ Storage Layer - SQLite schema + row access
//
// Constraints live in the schema: UNIQUE national_id, UNIQUE (member_id, month),
// and ON DELETE CASCADE from member to contribution. Functions here return raw
// rusqlite results; classification happens in the ledger.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::entities::{Contribution, Member, MemberPatch, NewContribution, NewMember};
use crate::error::{LedgerError, LedgerResult};

/// Path value that selects an in-memory store
pub const IN_MEMORY: &str = ":memory:";

pub fn setup_database(conn: &Connection) -> rusqlite::Result<()> {
    // Cascade deletes depend on this; SQLite defaults it to OFF per connection
    conn.pragma_update(None, "foreign_keys", "ON")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS member (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            national_id TEXT NOT NULL UNIQUE,
            date_joined TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS contribution (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            member_id INTEGER NOT NULL REFERENCES member(id) ON DELETE CASCADE,
            amount REAL NOT NULL,
            month TEXT NOT NULL,
            CONSTRAINT uq_member_month UNIQUE (member_id, month)
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_contribution_member ON contribution(member_id)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// DATABASE HANDLE
// ============================================================================

/// Process-wide store. One connection behind a mutex; each request holds it
/// for the length of a single transaction.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the store at `path` and initialize the schema
    pub fn open(path: &str) -> Result<Self> {
        if path == IN_MEMORY {
            return Self::open_in_memory();
        }

        let conn = Connection::open(Path::new(path))
            .with_context(|| format!("Failed to open database at {}", path))?;
        // WAL for crash recovery on file-backed stores
        conn.pragma_update(None, "journal_mode", "WAL")?;
        setup_database(&conn).context("Failed to initialize schema")?;
        info!(path, "database ready");

        Ok(Database { conn: Mutex::new(conn) })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        setup_database(&conn).context("Failed to initialize schema")?;
        debug!("in-memory database ready");

        Ok(Database { conn: Mutex::new(conn) })
    }

    fn lock(&self) -> LedgerResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| LedgerError::Internal("Database connection lock poisoned".to_string()))
    }

    /// Run `f` inside one transaction. Commits on Ok, rolls back on Err, so no
    /// partial write is ever visible.
    pub fn with_transaction<T, F>(&self, f: F) -> LedgerResult<T>
    where
        F: FnOnce(&rusqlite::Transaction<'_>) -> LedgerResult<T>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        match f(&tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    warn!(error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        }
    }

    /// Explicit teardown at shutdown
    pub fn close(self) -> Result<()> {
        let conn = self
            .conn
            .into_inner()
            .map_err(|_| anyhow::anyhow!("Database connection lock poisoned"))?;
        conn.close().map_err(|(_, err)| err)?;
        info!("database closed");
        Ok(())
    }
}

// ============================================================================
// MEMBERS
// ============================================================================

fn member_from_row(row: &Row<'_>) -> rusqlite::Result<Member> {
    Ok(Member {
        id: row.get(0)?,
        name: row.get(1)?,
        national_id: row.get(2)?,
        date_joined: row.get(3)?,
    })
}

pub fn insert_member(conn: &Connection, member: &NewMember) -> rusqlite::Result<Member> {
    conn.execute(
        "INSERT INTO member (name, national_id, date_joined) VALUES (?1, ?2, ?3)",
        params![member.name, member.national_id, member.date_joined],
    )?;

    Ok(Member {
        id: conn.last_insert_rowid(),
        name: member.name.clone(),
        national_id: member.national_id.clone(),
        date_joined: member.date_joined,
    })
}

pub fn get_member(conn: &Connection, id: i64) -> rusqlite::Result<Option<Member>> {
    conn.query_row(
        "SELECT id, name, national_id, date_joined FROM member WHERE id = ?1",
        [id],
        member_from_row,
    )
    .optional()
}

/// Page of members ordered by id
pub fn list_members(conn: &Connection, skip: i64, limit: i64) -> rusqlite::Result<Vec<Member>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, national_id, date_joined
         FROM member
         ORDER BY id
         LIMIT ?1 OFFSET ?2",
    )?;

    let members = stmt
        .query_map(params![limit, skip], member_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(members)
}

/// Apply `patch` to the stored member. Returns None when the member is absent.
pub fn update_member(
    conn: &Connection,
    id: i64,
    patch: MemberPatch,
) -> rusqlite::Result<Option<Member>> {
    let Some(mut member) = get_member(conn, id)? else {
        return Ok(None);
    };

    if patch.is_empty() {
        return Ok(Some(member));
    }

    member.apply(patch);
    conn.execute(
        "UPDATE member SET name = ?1, national_id = ?2, date_joined = ?3 WHERE id = ?4",
        params![member.name, member.national_id, member.date_joined, member.id],
    )?;

    Ok(Some(member))
}

/// Delete a member and, through the cascade, all of their contributions.
/// Returns false when no member had that id.
pub fn delete_member(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let deleted = conn.execute("DELETE FROM member WHERE id = ?1", [id])?;
    Ok(deleted > 0)
}

#[cfg(test)]
pub fn count_members(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM member", [], |row| row.get(0))
}

// ============================================================================
// CONTRIBUTIONS
// ============================================================================

fn contribution_from_row(row: &Row<'_>) -> rusqlite::Result<Contribution> {
    Ok(Contribution {
        id: row.get(0)?,
        member_id: row.get(1)?,
        amount: row.get(2)?,
        month: row.get(3)?,
    })
}

pub fn insert_contribution(
    conn: &Connection,
    contribution: &NewContribution,
) -> rusqlite::Result<Contribution> {
    conn.execute(
        "INSERT INTO contribution (member_id, amount, month) VALUES (?1, ?2, ?3)",
        params![contribution.member_id, contribution.amount, contribution.month],
    )?;

    Ok(Contribution {
        id: conn.last_insert_rowid(),
        member_id: contribution.member_id,
        amount: contribution.amount,
        month: contribution.month.clone(),
    })
}

pub fn get_contribution(conn: &Connection, id: i64) -> rusqlite::Result<Option<Contribution>> {
    conn.query_row(
        "SELECT id, member_id, amount, month FROM contribution WHERE id = ?1",
        [id],
        contribution_from_row,
    )
    .optional()
}

/// Contributions of one member, ordered by id
pub fn get_contributions_for_member(
    conn: &Connection,
    member_id: i64,
) -> rusqlite::Result<Vec<Contribution>> {
    let mut stmt = conn.prepare(
        "SELECT id, member_id, amount, month
         FROM contribution
         WHERE member_id = ?1
         ORDER BY id",
    )?;

    let contributions = stmt
        .query_map([member_id], contribution_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(contributions)
}
