//! Database operations for VoIQ vocabulary storage

use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::error::{BotError, Result};

/// Tables that must exist before the bot starts serving chats
pub const REQUIRED_TABLES: [&str; 3] = ["users", "base_words", "user_words"];

/// Chat platform identity of the person behind an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    pub external_id: i64,
    pub username: Option<String>,
    pub display_name: String,
}

/// A word together with its translation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordPair {
    pub word: String,
    pub translation: String,
}

impl WordPair {
    pub fn new(word: impl Into<String>, translation: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            translation: translation.into(),
        }
    }
}

/// Storage operations the quiz engine and controller rely on
pub trait VocabularyStore {
    /// Create or refresh the user record, returning the internal user id
    fn ensure_user(&self, user: &UserInfo) -> Result<i64>;

    fn random_user_word(&self, user_id: i64, exclude: Option<&str>) -> Result<Option<WordPair>>;

    fn random_base_word(&self, exclude: Option<&str>) -> Result<Option<WordPair>>;

    /// Up to `limit` distinct base translations other than `translation`, in random order
    fn random_distractors(&self, translation: &str, limit: usize) -> Result<Vec<String>>;

    fn count_user_words(&self, user_id: i64) -> Result<i64>;

    /// Insert or overwrite a personal word; both sides are trimmed
    fn upsert_user_word(&self, user_id: i64, word: &str, translation: &str) -> Result<()>;

    /// Returns whether a row was removed
    fn delete_user_word(&self, user_id: i64, word: &str) -> Result<bool>;

    /// Personal words ordered by word, ascending
    fn list_user_words(&self, user_id: i64) -> Result<Vec<WordPair>>;
}

/// Create the schema if it does not exist yet
pub fn init_database(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            external_id INTEGER NOT NULL UNIQUE,
            username TEXT,
            display_name TEXT NOT NULL,
            last_seen_at TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS base_words (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            word TEXT NOT NULL,
            translation TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS user_words (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id),
            word TEXT NOT NULL,
            translation TEXT NOT NULL,
            UNIQUE (user_id, word)
        );",
    )?;
    Ok(())
}

/// Fail if any table the bot needs is missing
pub fn verify_schema(conn: &Connection) -> Result<()> {
    for table in REQUIRED_TABLES {
        let exists: bool = conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
            params![table],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(BotError::Schema(format!("table '{}' does not exist", table)));
        }
    }
    Ok(())
}

/// SQLite-backed vocabulary store
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open a database file without touching its schema
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    /// Fresh in-memory database with the schema already created
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        init_database(&conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn init_schema(&self) -> Result<()> {
        init_database(&self.conn)
    }

    pub fn verify_schema(&self) -> Result<()> {
        verify_schema(&self.conn)
    }

    pub fn count_base_words(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM base_words", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Load base vocabulary pairs, skipping blank and already present ones
    pub fn insert_base_words(&self, pairs: &[WordPair]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let mut count = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO base_words (word, translation)
                 SELECT ?1, ?2
                 WHERE NOT EXISTS (SELECT 1 FROM base_words WHERE word = ?1 AND translation = ?2)",
            )?;
            for pair in pairs {
                let word = pair.word.trim();
                let translation = pair.translation.trim();
                if word.is_empty() || translation.is_empty() {
                    continue;
                }
                count += stmt.execute(params![word, translation])?;
            }
        }
        tx.commit()?;
        Ok(count)
    }

    fn query_pair(&self, sql: &str, params: impl rusqlite::Params) -> Result<Option<WordPair>> {
        let pair = self
            .conn
            .query_row(sql, params, |row| {
                Ok(WordPair {
                    word: row.get(0)?,
                    translation: row.get(1)?,
                })
            })
            .optional()?;
        Ok(pair)
    }
}

impl VocabularyStore for SqliteStore {
    fn ensure_user(&self, user: &UserInfo) -> Result<i64> {
        let id = self.conn.query_row(
            "INSERT INTO users (external_id, username, display_name, last_seen_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (external_id)
             DO UPDATE SET username = excluded.username,
                           display_name = excluded.display_name,
                           last_seen_at = excluded.last_seen_at
             RETURNING id",
            params![
                user.external_id,
                user.username,
                user.display_name,
                Utc::now().to_rfc3339()
            ],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    fn random_user_word(&self, user_id: i64, exclude: Option<&str>) -> Result<Option<WordPair>> {
        self.query_pair(
            "SELECT word, translation FROM user_words
             WHERE user_id = ?1 AND (?2 IS NULL OR word <> ?2)
             ORDER BY RANDOM()
             LIMIT 1",
            params![user_id, exclude],
        )
    }

    fn random_base_word(&self, exclude: Option<&str>) -> Result<Option<WordPair>> {
        self.query_pair(
            "SELECT word, translation FROM base_words
             WHERE ?1 IS NULL OR word <> ?1
             ORDER BY RANDOM()
             LIMIT 1",
            params![exclude],
        )
    }

    fn random_distractors(&self, translation: &str, limit: usize) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT translation FROM (
                 SELECT DISTINCT translation FROM base_words WHERE translation <> ?1
             )
             ORDER BY RANDOM()
             LIMIT ?2",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![translation, limit], |row| row.get(0))?;
        let translations = rows.collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(translations)
    }

    fn count_user_words(&self, user_id: i64) -> Result<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM user_words WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn upsert_user_word(&self, user_id: i64, word: &str, translation: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO user_words (user_id, word, translation)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (user_id, word)
             DO UPDATE SET translation = excluded.translation",
            params![user_id, word.trim(), translation.trim()],
        )?;
        Ok(())
    }

    fn delete_user_word(&self, user_id: i64, word: &str) -> Result<bool> {
        let deleted = self.conn.execute(
            "DELETE FROM user_words WHERE user_id = ?1 AND word = ?2",
            params![user_id, word.trim()],
        )?;
        Ok(deleted > 0)
    }

    fn list_user_words(&self, user_id: i64) -> Result<Vec<WordPair>> {
        let mut stmt = self.conn.prepare(
            "SELECT word, translation FROM user_words
             WHERE user_id = ?1
             ORDER BY word ASC",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok(WordPair {
                word: row.get(0)?,
                translation: row.get(1)?,
            })
        })?;
        let words = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(words)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(external_id: i64) -> UserInfo {
        UserInfo {
            external_id,
            username: Some("learner".to_string()),
            display_name: "Learner".to_string(),
        }
    }

    fn store_with_user() -> (SqliteStore, i64) {
        let store = SqliteStore::open_in_memory().unwrap();
        let id = store.ensure_user(&user(42)).unwrap();
        (store, id)
    }

    #[test]
    fn ensure_user_is_idempotent_and_refreshes_names() {
        let store = SqliteStore::open_in_memory().unwrap();
        let first = store.ensure_user(&user(7)).unwrap();
        let renamed = UserInfo {
            display_name: "Renamed".to_string(),
            ..user(7)
        };
        let second = store.ensure_user(&renamed).unwrap();
        assert_eq!(first, second);

        let name: String = store
            .connection()
            .query_row("SELECT display_name FROM users WHERE id = ?1", [first], |r| r.get(0))
            .unwrap();
        assert_eq!(name, "Renamed");

        let other = store.ensure_user(&user(8)).unwrap();
        assert_ne!(first, other);
    }

    #[test]
    fn upsert_trims_and_overwrites_translation() {
        let (store, id) = store_with_user();
        store.upsert_user_word(id, " cat ", " кот ").unwrap();
        assert_eq!(store.list_user_words(id).unwrap(), vec![WordPair::new("cat", "кот")]);

        store.upsert_user_word(id, "cat", "кошка").unwrap();
        assert_eq!(store.list_user_words(id).unwrap(), vec![WordPair::new("cat", "кошка")]);
        assert_eq!(store.count_user_words(id).unwrap(), 1);
    }

    #[test]
    fn delete_reports_whether_a_row_was_removed() {
        let (store, id) = store_with_user();
        assert!(!store.delete_user_word(id, "cat").unwrap());

        store.upsert_user_word(id, "cat", "кот").unwrap();
        assert!(store.delete_user_word(id, "cat").unwrap());
        assert!(store.list_user_words(id).unwrap().is_empty());
    }

    #[test]
    fn list_is_ordered_by_word_and_scoped_to_user() {
        let (store, id) = store_with_user();
        let other = store.ensure_user(&user(99)).unwrap();
        store.upsert_user_word(id, "яблоко", "apple").unwrap();
        store.upsert_user_word(id, "дом", "house").unwrap();
        store.upsert_user_word(other, "кот", "cat").unwrap();

        let words: Vec<String> = store
            .list_user_words(id)
            .unwrap()
            .into_iter()
            .map(|p| p.word)
            .collect();
        assert_eq!(words, vec!["дом", "яблоко"]);
        assert_eq!(store.count_user_words(other).unwrap(), 1);
    }

    #[test]
    fn random_words_respect_exclusion() {
        let (store, id) = store_with_user();
        store
            .insert_base_words(&[WordPair::new("собака", "dog"), WordPair::new("кошка", "cat")])
            .unwrap();
        store.upsert_user_word(id, "дом", "house").unwrap();

        for _ in 0..20 {
            let pair = store.random_base_word(Some("собака")).unwrap().unwrap();
            assert_eq!(pair.word, "кошка");
        }
        assert!(store.random_user_word(id, Some("дом")).unwrap().is_none());
        assert_eq!(
            store.random_user_word(id, None).unwrap(),
            Some(WordPair::new("дом", "house"))
        );
    }

    #[test]
    fn distractors_are_distinct_and_exclude_the_answer() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .insert_base_words(&[
                WordPair::new("собака", "dog"),
                WordPair::new("пёс", "dog"),
                WordPair::new("кошка", "cat"),
                WordPair::new("кот", "cat"),
                WordPair::new("дом", "house"),
            ])
            .unwrap();

        let mut distractors = store.random_distractors("dog", 3).unwrap();
        distractors.sort();
        assert_eq!(distractors, vec!["cat", "house"]);
        assert_eq!(store.random_distractors("dog", 1).unwrap().len(), 1);
    }

    #[test]
    fn insert_base_words_skips_blank_and_duplicate_pairs() {
        let store = SqliteStore::open_in_memory().unwrap();
        let inserted = store
            .insert_base_words(&[
                WordPair::new(" собака ", "dog"),
                WordPair::new("собака", "dog"),
                WordPair::new("", "empty"),
                WordPair::new("пусто", "  "),
            ])
            .unwrap();
        assert_eq!(inserted, 1);
        assert_eq!(store.count_base_words().unwrap(), 1);
    }

    #[test]
    fn verify_schema_detects_missing_tables() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(matches!(verify_schema(&conn), Err(BotError::Schema(_))));

        init_database(&conn).unwrap();
        verify_schema(&conn).unwrap();

        conn.execute_batch("DROP TABLE user_words").unwrap();
        let err = verify_schema(&conn).unwrap_err();
        assert!(err.to_string().contains("user_words"));
    }
}
