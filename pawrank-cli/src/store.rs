/// SQLite-backed vote store.
///
/// Holds the three tables the ranking core reads through `VoteStore`
/// (items, voters, votes) and the write path used by the voting commands.
use pawrank_core::{ItemId, Outcome, RankError, Timestamp, Vote, VoteStore, VoterId, VoterProfile};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store lock poisoned")]
    Poisoned,
    #[error(transparent)]
    Rejected(#[from] RankError),
}

impl From<StoreError> for RankError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Rejected(inner) => inner,
            other => RankError::store(other),
        }
    }
}

type StoredVoteRow = (ItemId, ItemId, String, VoterId, Timestamp);

#[derive(Clone)]
pub struct SqliteVoteStore {
    path: PathBuf,
    conn: Arc<Mutex<Connection>>,
}

impl SqliteVoteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(&path)?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;\
             PRAGMA synchronous=NORMAL;\
             PRAGMA foreign_keys=ON;\
             CREATE TABLE IF NOT EXISTS items (\
               id INTEGER PRIMARY KEY AUTOINCREMENT,\
               name TEXT,\
               created_at INTEGER NOT NULL\
             );\
             CREATE TABLE IF NOT EXISTS voters (\
               id INTEGER PRIMARY KEY AUTOINCREMENT,\
               gender_identity TEXT,\
               age INTEGER,\
               education TEXT,\
               location TEXT,\
               dog_ownership INTEGER,\
               affiliation TEXT,\
               created_at INTEGER NOT NULL\
             );\
             CREATE TABLE IF NOT EXISTS votes (\
               id INTEGER PRIMARY KEY AUTOINCREMENT,\
               item1_id INTEGER NOT NULL REFERENCES items(id),\
               item2_id INTEGER NOT NULL REFERENCES items(id),\
               result TEXT NOT NULL,\
               voter_id INTEGER NOT NULL REFERENCES voters(id),\
               submitted_at INTEGER NOT NULL\
             );\
             CREATE INDEX IF NOT EXISTS votes_by_voter ON votes (voter_id, id);",
        )?;

        Ok(Self {
            path,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var("PAWRANK_DATABASE") {
            return PathBuf::from(path);
        }
        PathBuf::from("pawrank.sqlite")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn with_conn<F, R>(&self, f: F) -> Result<R, StoreError>
    where
        F: FnOnce(&Connection) -> Result<R, StoreError>,
    {
        let guard = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        f(&guard)
    }

    pub fn add_item(&self, name: Option<&str>) -> Result<ItemId, StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO items (name, created_at) VALUES (?1, ?2)",
                params![name, now_epoch()],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Store a new voter. `profile.id` is ignored; the assigned id is returned.
    pub fn register_voter(&self, profile: &VoterProfile) -> Result<VoterId, StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO voters (gender_identity, age, education, location, dog_ownership, affiliation, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    profile.gender_identity,
                    profile.age,
                    profile.education,
                    profile.location,
                    profile.dog_ownership,
                    profile.affiliation,
                    now_epoch(),
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Record one vote. `winner` is the id of the preferred item, `None` for a tie.
    pub fn submit_vote(
        &self,
        voter: VoterId,
        item1: ItemId,
        item2: ItemId,
        winner: Option<ItemId>,
    ) -> Result<Vote, StoreError> {
        let outcome = Outcome::from_winner(item1, item2, winner)?;
        self.with_conn(|conn| {
            for item in [item1, item2] {
                if !row_exists(conn, "SELECT 1 FROM items WHERE id = ?1", item)? {
                    return Err(RankError::UnknownItem(item).into());
                }
            }
            if !row_exists(conn, "SELECT 1 FROM voters WHERE id = ?1", voter)? {
                return Err(RankError::UnknownVoter(voter).into());
            }

            let submitted_at = now_epoch();
            conn.execute(
                "INSERT INTO votes (item1_id, item2_id, result, voter_id, submitted_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![item1, item2, outcome.as_str(), voter, submitted_at],
            )?;
            Ok(Vote { item1, item2, outcome, voter, submitted_at })
        })
    }

    /// Display names of every item that has one.
    pub fn item_names(&self) -> Result<BTreeMap<ItemId, String>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, name FROM items WHERE name IS NOT NULL")?;
            let rows = stmt.query_map([], |row| Ok((row.get::<_, ItemId>(0)?, row.get::<_, String>(1)?)))?;
            Ok(rows.collect::<Result<_, _>>()?)
        })
    }

    /// Every item in id order, with its display name when it has one.
    pub fn list_items(&self) -> Result<Vec<(ItemId, Option<String>)>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, name FROM items ORDER BY id")?;
            let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
            Ok(rows.collect::<Result<_, _>>()?)
        })
    }

    fn query_votes(&self, voter: Option<VoterId>) -> Result<Vec<Vote>, StoreError> {
        let rows: Vec<StoredVoteRow> = self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT item1_id, item2_id, result, voter_id, submitted_at FROM votes \
                 WHERE ?1 IS NULL OR voter_id = ?1 \
                 ORDER BY id",
            )?;
            let rows = stmt.query_map(params![voter], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
            })?;
            Ok(rows.collect::<Result<_, _>>()?)
        })?;

        rows.into_iter()
            .map(|(item1, item2, result, voter, submitted_at)| -> Result<Vote, StoreError> {
                let outcome = result.parse::<Outcome>()?;
                Ok(Vote { item1, item2, outcome, voter, submitted_at })
            })
            .collect()
    }
}

fn row_exists(conn: &Connection, sql: &str, id: i64) -> Result<bool, StoreError> {
    Ok(conn.query_row(sql, params![id], |_| Ok(())).optional()?.is_some())
}

impl VoteStore for SqliteVoteStore {
    fn fetch_votes(&self) -> pawrank_core::Result<Vec<Vote>> {
        Ok(self.query_votes(None)?)
    }

    fn fetch_votes_by_voter(&self, voter: VoterId) -> pawrank_core::Result<Vec<Vote>> {
        Ok(self.query_votes(Some(voter))?)
    }

    fn fetch_voter(&self, voter: VoterId) -> pawrank_core::Result<Option<VoterProfile>> {
        let profile = self.with_conn(|conn| {
            let profile = conn
                .query_row(
                    "SELECT id, gender_identity, age, education, location, dog_ownership, affiliation \
                     FROM voters WHERE id = ?1",
                    params![voter],
                    |row| {
                        Ok(VoterProfile {
                            id: row.get(0)?,
                            gender_identity: row.get(1)?,
                            age: row.get(2)?,
                            education: row.get(3)?,
                            location: row.get(4)?,
                            dog_ownership: row.get(5)?,
                            affiliation: row.get(6)?,
                        })
                    },
                )
                .optional()?;
            Ok(profile)
        })?;
        Ok(profile)
    }

    fn fetch_voter_ids(&self) -> pawrank_core::Result<Vec<VoterId>> {
        Ok(self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id FROM voters ORDER BY id")?;
            let ids = stmt.query_map([], |row| row.get(0))?;
            Ok(ids.collect::<Result<_, _>>()?)
        })?)
    }

    fn fetch_all_item_ids(&self) -> pawrank_core::Result<Vec<ItemId>> {
        Ok(self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id FROM items ORDER BY id")?;
            let ids = stmt.query_map([], |row| row.get(0))?;
            Ok(ids.collect::<Result<_, _>>()?)
        })?)
    }
}

fn now_epoch() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as Timestamp)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_temp() -> (TempDir, SqliteVoteStore) {
        let dir = TempDir::new().unwrap();
        let store = SqliteVoteStore::open(dir.path().join("votes.sqlite")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_write_then_read_back() {
        let (_dir, store) = open_temp();
        let a = store.add_item(Some("Biscuit")).unwrap();
        let b = store.add_item(None).unwrap();
        let voter = store
            .register_voter(&VoterProfile {
                location: Some("boston".into()),
                age: Some(31),
                dog_ownership: Some(true),
                ..VoterProfile::default()
            })
            .unwrap();

        store.submit_vote(voter, a, b, Some(b)).unwrap();
        store.submit_vote(voter, b, a, None).unwrap();

        let votes = store.fetch_votes().unwrap();
        assert_eq!(votes.len(), 2);
        assert_eq!(votes[0].outcome, Outcome::Win2);
        assert_eq!(votes[1].outcome, Outcome::Tie);
        assert_eq!(store.fetch_all_item_ids().unwrap(), vec![a, b]);
        assert_eq!(store.item_names().unwrap().get(&a).map(String::as_str), Some("Biscuit"));

        let profile = store.fetch_voter(voter).unwrap().unwrap();
        assert_eq!(profile.age, Some(31));
        assert_eq!(profile.location.as_deref(), Some("boston"));
        assert_eq!(profile.dog_ownership, Some(true));
        assert!(store.fetch_voter(voter + 100).unwrap().is_none());
    }

    #[test]
    fn test_read_queries_accept_multiline_sql() {
        let (_dir, store) = open_temp();
        let a = store.add_item(None).unwrap();
        let b = store.add_item(None).unwrap();
        let voter = store
            .register_voter(&VoterProfile {
                gender_identity: Some("female".into()),
                education: Some("bachelor".into()),
                affiliation: Some("student".into()),
                ..VoterProfile::default()
            })
            .unwrap();
        store.submit_vote(voter, a, b, Some(a)).unwrap();

        let profile = store.fetch_voter(voter).unwrap().unwrap();
        assert_eq!(profile.id, voter);
        assert_eq!(profile.education.as_deref(), Some("bachelor"));
        assert_eq!(store.fetch_votes().unwrap().len(), 1);
        assert_eq!(store.fetch_votes_by_voter(voter).unwrap().len(), 1);
        assert!(store.fetch_votes_by_voter(voter + 1).unwrap().is_empty());
    }

    #[test]
    fn test_list_items_keeps_unnamed() {
        let (_dir, store) = open_temp();
        assert!(store.list_items().unwrap().is_empty());
        let a = store.add_item(Some("Biscuit")).unwrap();
        let b = store.add_item(None).unwrap();
        assert_eq!(store.list_items().unwrap(), vec![(a, Some("Biscuit".to_string())), (b, None)]);
    }

    #[test]
    fn test_submit_vote_rejections() {
        let (_dir, store) = open_temp();
        let a = store.add_item(None).unwrap();
        let b = store.add_item(None).unwrap();
        let voter = store.register_voter(&VoterProfile::default()).unwrap();

        let err = RankError::from(store.submit_vote(voter, a, b, Some(999)).unwrap_err());
        assert!(matches!(err, RankError::InvalidVote(_)));
        let err = RankError::from(store.submit_vote(voter, a, a, None).unwrap_err());
        assert!(matches!(err, RankError::InvalidVote(_)));
        let err = RankError::from(store.submit_vote(voter, a, 999, None).unwrap_err());
        assert!(matches!(err, RankError::UnknownItem(999)));
        let err = RankError::from(store.submit_vote(voter + 1, a, b, None).unwrap_err());
        assert!(matches!(err, RankError::UnknownVoter(_)));
        assert!(store.fetch_votes().unwrap().is_empty());
    }

    #[test]
    fn test_votes_by_voter_in_store_order() {
        let (_dir, store) = open_temp();
        let items: Vec<ItemId> = (0..3).map(|_| store.add_item(None).unwrap()).collect();
        let v1 = store.register_voter(&VoterProfile::default()).unwrap();
        let v2 = store.register_voter(&VoterProfile::default()).unwrap();
        store.submit_vote(v1, items[0], items[1], Some(items[0])).unwrap();
        store.submit_vote(v2, items[1], items[2], Some(items[2])).unwrap();
        store.submit_vote(v1, items[2], items[0], None).unwrap();

        let mine = store.fetch_votes_by_voter(v1).unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine[0].involves_pair(items[0], items[1]));
        assert!(mine[1].involves_pair(items[0], items[2]));
        assert_eq!(store.fetch_voter_ids().unwrap(), vec![v1, v2]);
    }

    #[test]
    fn test_malformed_outcome_surfaces_as_error() {
        let (_dir, store) = open_temp();
        let a = store.add_item(None).unwrap();
        let b = store.add_item(None).unwrap();
        let voter = store.register_voter(&VoterProfile::default()).unwrap();
        store
            .with_conn(|conn| {
                conn.execute(
                    "INSERT INTO votes (item1_id, item2_id, result, voter_id, submitted_at) VALUES (?1, ?2, 'draw', ?3, 0)",
                    params![a, b, voter],
                )?;
                Ok(())
            })
            .unwrap();
        assert!(matches!(store.fetch_votes(), Err(RankError::MalformedOutcome(ref s)) if s == "draw"));
    }
}
