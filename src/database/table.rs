use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use rusqlite::Connection;

#[cfg(not(test))]
const DATABASE_FILE: &str = "screen_translator.db";
#[cfg(test)]
const DATABASE_FILE: &str = "screen_translator_test.db";

fn database_path() -> Result<PathBuf> {
    let dir = std::env::current_dir()
        .context("Current directory is not available")?
        .join("output");
    fs::create_dir_all(&dir).with_context(|| format!("Can not create {}", dir.display()))?;
    Ok(dir.join(DATABASE_FILE))
}

fn open_database() -> Result<Connection> {
    let path = database_path()?;
    Connection::open(&path).with_context(|| format!("Can not open database {}", path.display()))
}

/// Opens the database making sure the table described by `schema` exists.
pub fn create_table(schema: &str) -> Result<Connection> {
    let conn = open_database()?;
    conn.execute_batch(schema)
        .context("Can not create table")?;
    Ok(conn)
}

#[cfg(test)]
pub fn drop_table(name: &str) -> Result<()> {
    open_database()?.execute_batch(&format!("DROP TABLE IF EXISTS {name}"))?;
    Ok(())
}
