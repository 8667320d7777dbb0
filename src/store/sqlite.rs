//! SQLite-backed proposal store.
//!
//! Tallies and vote weights are stored as decimal TEXT so arbitrary-precision
//! values survive the round trip. `add_vote` writes the ballot as its first
//! statement so the transaction holds the write lock before reading tallies.

use super::traits::*;
use crate::crypto::Address;
use crate::governance::types::{
    Proposal, ProposalAction, ProposalDraft, ProposalId, ProposalType, Tallies, Tally, VoteRecord,
};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;

const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS proposals (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        proposer TEXT NOT NULL,
        proposal_type TEXT NOT NULL,
        actions TEXT NOT NULL,
        start_time INTEGER NOT NULL,
        end_time INTEGER NOT NULL,
        for_votes TEXT NOT NULL DEFAULT '0',
        against_votes TEXT NOT NULL DEFAULT '0',
        executed INTEGER NOT NULL DEFAULT 0,
        canceled INTEGER NOT NULL DEFAULT 0,
        created_at INTEGER NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS votes (
        proposal_id INTEGER NOT NULL REFERENCES proposals(id),
        voter TEXT NOT NULL,
        support INTEGER NOT NULL,
        weight TEXT NOT NULL,
        timestamp INTEGER NOT NULL,
        PRIMARY KEY (proposal_id, voter)
    )"#,
];

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::BackendUnavailable(err.to_string())
    }
}

/// Persistent `ProposalStore` on a single SQLite file.
#[derive(Debug, Clone)]
pub struct SqliteProposalStore {
    pool: SqlitePool,
}

impl SqliteProposalStore {
    /// Open (creating if missing) the database at `path` and apply the schema.
    pub async fn open(path: &Path) -> StoreResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;
        Self::from_pool(pool).await
    }

    /// Wrap an existing pool and apply the schema.
    pub async fn from_pool(pool: SqlitePool) -> StoreResult<Self> {
        for statement in SCHEMA {
            sqlx::query(*statement).execute(&pool).await?;
        }
        Ok(Self { pool })
    }

    /// Set the executed flag (operator tooling and tests).
    pub async fn mark_executed(&self, id: ProposalId) -> StoreResult<bool> {
        let result =
            sqlx::query("UPDATE proposals SET executed = 1 WHERE id = ? AND canceled = 0")
                .bind(to_sql_int(id)?)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Set the canceled flag (operator tooling and tests).
    pub async fn mark_canceled(&self, id: ProposalId) -> StoreResult<bool> {
        let result =
            sqlx::query("UPDATE proposals SET canceled = 1 WHERE id = ? AND executed = 0")
                .bind(to_sql_int(id)?)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() == 1)
    }
}

fn to_sql_int(value: u64) -> StoreResult<i64> {
    i64::try_from(value)
        .map_err(|_| StoreError::BackendUnavailable(format!("{} exceeds SQLite INTEGER", value)))
}

fn from_sql_int(value: i64) -> StoreResult<u64> {
    u64::try_from(value)
        .map_err(|_| StoreError::BackendUnavailable(format!("negative value {} in store", value)))
}

fn corrupt(what: &str, detail: impl std::fmt::Display) -> StoreError {
    StoreError::BackendUnavailable(format!("corrupt {} in store: {}", what, detail))
}

fn parse_tally(text: &str) -> StoreResult<Tally> {
    Tally::from_str(text).map_err(|e| corrupt("tally", e))
}

fn proposal_from_row(row: &SqliteRow) -> StoreResult<Proposal> {
    let proposer: String = row.try_get("proposer")?;
    let proposal_type: String = row.try_get("proposal_type")?;
    let actions: String = row.try_get("actions")?;
    let for_votes: String = row.try_get("for_votes")?;
    let against_votes: String = row.try_get("against_votes")?;

    Ok(Proposal {
        id: from_sql_int(row.try_get("id")?)?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        proposer: proposer
            .parse::<Address>()
            .map_err(|e| corrupt("proposer", e))?,
        start_time: from_sql_int(row.try_get("start_time")?)?,
        end_time: from_sql_int(row.try_get("end_time")?)?,
        for_votes: parse_tally(&for_votes)?,
        against_votes: parse_tally(&against_votes)?,
        executed: row.try_get("executed")?,
        canceled: row.try_get("canceled")?,
        proposal_type: ProposalType::from_str(&proposal_type)
            .map_err(|e| corrupt("proposal_type", e))?,
        actions: serde_json::from_str::<Vec<ProposalAction>>(&actions)
            .map_err(|e| corrupt("actions", e))?,
        created_at: from_sql_int(row.try_get("created_at")?)?,
    })
}

#[async_trait]
impl ProposalStore for SqliteProposalStore {
    async fn get_by_id(&self, id: ProposalId) -> StoreResult<Option<Proposal>> {
        let row = sqlx::query("SELECT * FROM proposals WHERE id = ?")
            .bind(to_sql_int(id)?)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(proposal_from_row).transpose()
    }

    async fn list(&self) -> StoreResult<Vec<Proposal>> {
        let rows = sqlx::query("SELECT * FROM proposals ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(proposal_from_row).collect()
    }

    async fn append(&self, draft: ProposalDraft) -> StoreResult<ProposalId> {
        let actions = serde_json::to_string(&draft.actions)
            .map_err(|e| StoreError::BackendUnavailable(e.to_string()))?;
        let result = sqlx::query(
            "INSERT INTO proposals \
             (title, description, proposer, proposal_type, actions, start_time, end_time, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.proposer.to_string())
        .bind(draft.proposal_type.as_str())
        .bind(actions)
        .bind(to_sql_int(draft.start_time)?)
        .bind(to_sql_int(draft.end_time)?)
        .bind(to_sql_int(draft.created_at)?)
        .execute(&self.pool)
        .await?;
        from_sql_int(result.last_insert_rowid())
    }

    async fn add_vote(
        &self,
        id: ProposalId,
        voter: &Address,
        vote: VoteRecord,
    ) -> StoreResult<Tallies> {
        let sql_id = to_sql_int(id)?;
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            "INSERT INTO votes (proposal_id, voter, support, weight, timestamp) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(sql_id)
        .bind(voter.to_string())
        .bind(vote.support)
        .bind(vote.weight.to_str_radix(10))
        .bind(to_sql_int(vote.timestamp)?)
        .execute(&mut *tx)
        .await;
        match inserted {
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                return Err(StoreError::AlreadyVoted);
            }
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
                return Err(StoreError::NotFound(id));
            }
            other => {
                other?;
            }
        }

        // Dropping `tx` on the early return rolls the ballot back.
        let row = sqlx::query("SELECT for_votes, against_votes FROM proposals WHERE id = ?")
            .bind(sql_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::NotFound(id))?;
        let for_text: String = row.try_get("for_votes")?;
        let against_text: String = row.try_get("against_votes")?;
        let mut tallies = Tallies {
            for_votes: parse_tally(&for_text)?,
            against_votes: parse_tally(&against_text)?,
        };
        if vote.support {
            tallies.for_votes += &vote.weight;
        } else {
            tallies.against_votes += &vote.weight;
        }

        sqlx::query("UPDATE proposals SET for_votes = ?, against_votes = ? WHERE id = ?")
            .bind(tallies.for_votes.to_str_radix(10))
            .bind(tallies.against_votes.to_str_radix(10))
            .bind(sql_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(tallies)
    }

    async fn has_voted(&self, id: ProposalId, voter: &Address) -> StoreResult<bool> {
        let row = sqlx::query("SELECT 1 FROM votes WHERE proposal_id = ? AND voter = ?")
            .bind(to_sql_int(id)?)
            .bind(voter.to_string())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }
}
