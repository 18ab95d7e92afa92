use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};

use super::table::create_table;
use crate::translation::web_translator::TranslationCache;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS history (
    id INTEGER PRIMARY KEY,
    created_at TEXT NOT NULL DEFAULT current_timestamp,
    updated_at TEXT NOT NULL DEFAULT current_timestamp,
    recognized TEXT NOT NULL,
    language TEXT NOT NULL DEFAULT '',
    translation TEXT,
    UNIQUE(recognized, language)
)";

const COLUMNS: &str = "id, created_at, updated_at, recognized, language, translation";

/// One processed text, keyed by recognized text and target language.
#[derive(Debug, Default, PartialEq, Serialize, Deserialize, Clone)]
pub struct HistoryData {
    pub id: i32,
    pub created_at: String,
    pub updated_at: String,
    pub recognized: String,
    pub language: String,
    pub translation: Option<String>,
}

impl TryFrom<&Row<'_>> for HistoryData {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> rusqlite::Result<Self> {
        rusqlite::Result::Ok(Self {
            id: row.get("id")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
            recognized: row.get("recognized")?,
            language: row.get("language")?,
            translation: row.get("translation")?,
        })
    }
}

fn with_history<T>(f: impl FnOnce(&Connection) -> rusqlite::Result<T>) -> Result<T> {
    let conn = create_table(SCHEMA)?;
    Ok(f(&conn)?)
}

/// Records recognized text awaiting translation into `language`.
pub fn store_recognized(recognized: &str, language: &str) -> Result<()> {
    with_history(|conn| {
        conn.execute(
            "INSERT INTO history (recognized, language) VALUES (?1, ?2)
             ON CONFLICT(recognized, language) DO UPDATE SET updated_at = current_timestamp",
            params![recognized, language],
        )
    })?;
    Ok(())
}

pub fn store_translation(recognized: &str, language: &str, translation: &str) -> Result<()> {
    with_history(|conn| {
        conn.execute(
            "INSERT INTO history (recognized, language, translation) VALUES (?1, ?2, ?3)
             ON CONFLICT(recognized, language)
             DO UPDATE SET translation = excluded.translation, updated_at = current_timestamp",
            params![recognized, language, translation],
        )
    })?;
    Ok(())
}

pub fn find_entry(recognized: &str, language: &str) -> Result<Option<HistoryData>> {
    with_history(|conn| {
        conn.query_row(
            &format!("SELECT {COLUMNS} FROM history WHERE recognized = ?1 AND language = ?2"),
            params![recognized, language],
            |row| HistoryData::try_from(row),
        )
        .optional()
    })
}

/// Translation stored earlier for the same text and language.
pub fn cached_translation(recognized: &str, language: &str) -> Result<Option<String>> {
    let entry = find_entry(recognized, language)?;
    Ok(entry.and_then(|x| x.translation).filter(|x| !x.is_empty()))
}

/// Answers translation requests from the history table.
pub struct HistoryCache;

impl TranslationCache for HistoryCache {
    fn lookup(&self, text: &str, language: &str) -> Result<Option<String>> {
        cached_translation(text, language)
    }
}

/// Every entry, most recently touched first.
pub fn load_full_history() -> Result<Vec<HistoryData>> {
    with_history(|conn| {
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM history ORDER BY updated_at DESC, id DESC"
        ))?;
        stmt.query_map([], |row| HistoryData::try_from(row))?
            .collect()
    })
}

pub fn clear_history() -> Result<()> {
    with_history(|conn| conn.execute("DELETE FROM history", []))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{thread, time::Duration};

    use serial_test::serial;

    use super::*;
    use crate::database::table::drop_table;

    fn texts() -> Vec<(String, Option<String>)> {
        load_full_history()
            .unwrap()
            .into_iter()
            .map(|x| (x.recognized, x.translation))
            .collect()
    }

    #[test]
    #[serial]
    fn translation_moves_entry_to_top() {
        drop_table("history").unwrap();

        store_recognized("first", "rus").unwrap();
        store_recognized("second", "rus").unwrap();
        assert_eq!(
            texts(),
            vec![("second".to_string(), None), ("first".to_string(), None)]
        );

        // timestamps have a one second resolution
        thread::sleep(Duration::from_millis(1100));
        store_translation("first", "rus", "первый").unwrap();

        assert_eq!(
            texts(),
            vec![
                ("first".to_string(), Some("первый".to_string())),
                ("second".to_string(), None)
            ]
        );
    }

    #[test]
    #[serial]
    fn translation_is_cached_per_language() {
        drop_table("history").unwrap();

        store_translation("hello", "rus", "привет").unwrap();
        store_recognized("hello", "deu").unwrap();

        assert_eq!(
            cached_translation("hello", "rus").unwrap().as_deref(),
            Some("привет")
        );
        assert_eq!(cached_translation("hello", "deu").unwrap(), None);
        assert_eq!(cached_translation("unknown", "rus").unwrap(), None);
        assert_eq!(
            HistoryCache.lookup("hello", "rus").unwrap().as_deref(),
            Some("привет")
        );
        assert_eq!(texts().len(), 2);
    }

    #[test]
    #[serial]
    fn clear_removes_everything() {
        drop_table("history").unwrap();

        store_recognized("text", "").unwrap();
        assert!(find_entry("text", "").unwrap().is_some());

        clear_history().unwrap();
        assert!(texts().is_empty());
        assert!(find_entry("text", "").unwrap().is_none());
    }
}
