//! SQLite store for recording metadata and equalizer snapshots
//!
//! Each recording row carries display metadata plus an optional
//! transcript. Equalizer settings are persisted as flat band-key -> gain
//! rows keyed by recording id; the loaded snapshot is the baseline the
//! UI diffs its working copy against.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection};
use thiserror::Error;
use tracing::debug;

use atx_audio::{Band, EqualizerSettings};

/// Errors from store operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One recording in the library
#[derive(Debug, Clone)]
pub struct Recording {
    /// Stable identifier (the UI keys working/saved equalizer copies
    /// on this)
    pub id: String,
    /// User-visible title (renameable)
    pub title: String,
    /// Path to the audio file
    pub path: PathBuf,
    pub duration_secs: f64,
    /// Unix timestamp of creation
    pub created_at: u64,
    /// Transcript text, once transcription has run
    pub transcript: Option<String>,
}

impl Recording {
    /// New recording stamped with the current time
    pub fn new(id: impl Into<String>, title: impl Into<String>, path: PathBuf, duration_secs: f64) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            path,
            duration_secs,
            created_at: unix_now(),
            transcript: None,
        }
    }
}

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Recording library backed by SQLite
pub struct RecordingStore {
    conn: Connection,
}

impl RecordingStore {
    /// SQL schema for recordings and their equalizer snapshots
    const SCHEMA: &'static str = r#"
        CREATE TABLE IF NOT EXISTS recordings (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            path TEXT NOT NULL,
            duration_secs REAL NOT NULL,
            created_at INTEGER NOT NULL,
            transcript TEXT
        );
        CREATE TABLE IF NOT EXISTS equalizer (
            recording_id TEXT NOT NULL,
            band TEXT NOT NULL,
            gain_db REAL NOT NULL,
            UNIQUE(recording_id, band)
        );
        CREATE INDEX IF NOT EXISTS idx_created ON recordings(created_at);
        CREATE INDEX IF NOT EXISTS idx_eq_recording ON equalizer(recording_id);
    "#;

    /// Open or create the library database at the given path
    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;
        conn.execute_batch(Self::SCHEMA)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(Self::SCHEMA)?;
        Ok(Self { conn })
    }

    /// Insert or update a recording
    pub fn insert(&self, recording: &Recording) -> Result<(), StoreError> {
        self.conn.execute(
            r#"INSERT OR REPLACE INTO recordings
               (id, title, path, duration_secs, created_at, transcript)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
            params![
                recording.id,
                recording.title,
                recording.path.to_string_lossy().to_string(),
                recording.duration_secs,
                recording.created_at,
                recording.transcript,
            ],
        )?;
        Ok(())
    }

    /// Fetch one recording by id
    pub fn get(&self, id: &str) -> Option<Recording> {
        self.conn
            .query_row(
                "SELECT id, title, path, duration_secs, created_at, transcript
                 FROM recordings WHERE id = ?1",
                [id],
                Self::row_to_recording,
            )
            .ok()
    }

    /// All recordings, newest first
    pub fn list(&self) -> Result<Vec<Recording>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, path, duration_secs, created_at, transcript
             FROM recordings ORDER BY created_at DESC",
        )?;

        let recordings = stmt
            .query_map([], Self::row_to_recording)?
            .filter_map(|r| r.ok())
            .collect();

        Ok(recordings)
    }

    /// Rename a recording; returns false if the id is unknown
    pub fn rename(&self, id: &str, title: &str) -> Result<bool, StoreError> {
        let affected = self
            .conn
            .execute("UPDATE recordings SET title = ?2 WHERE id = ?1", params![id, title])?;
        Ok(affected > 0)
    }

    /// Attach transcript text to a recording
    pub fn set_transcript(&self, id: &str, transcript: &str) -> Result<bool, StoreError> {
        let affected = self.conn.execute(
            "UPDATE recordings SET transcript = ?2 WHERE id = ?1",
            params![id, transcript],
        )?;
        Ok(affected > 0)
    }

    /// Remove a recording and its equalizer snapshot
    pub fn remove(&self, id: &str) -> Result<bool, StoreError> {
        self.conn
            .execute("DELETE FROM equalizer WHERE recording_id = ?1", [id])?;
        let affected = self
            .conn
            .execute("DELETE FROM recordings WHERE id = ?1", [id])?;
        Ok(affected > 0)
    }

    /// Number of recordings in the library
    pub fn count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM recordings", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Persist an equalizer snapshot for a recording, replacing any
    /// previous one atomically.
    pub fn save_equalizer(
        &mut self,
        recording_id: &str,
        settings: &EqualizerSettings,
    ) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM equalizer WHERE recording_id = ?1", [recording_id])?;
        for band in Band::ALL {
            tx.execute(
                "INSERT INTO equalizer (recording_id, band, gain_db) VALUES (?1, ?2, ?3)",
                params![recording_id, band.key(), settings.gain(band)],
            )?;
        }
        tx.commit()?;
        debug!(recording_id, "equalizer snapshot saved");
        Ok(())
    }

    /// Load the persisted equalizer snapshot for a recording.
    ///
    /// Returns None when no snapshot exists. Unknown band keys are
    /// ignored and gains are clamped on the way in, so a hand-edited or
    /// corrupted row can never produce out-of-range state.
    pub fn load_equalizer(
        &self,
        recording_id: &str,
    ) -> Result<Option<EqualizerSettings>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT band, gain_db FROM equalizer WHERE recording_id = ?1")?;

        let rows: Vec<(String, f64)> = stmt
            .query_map([recording_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .filter_map(|r| r.ok())
            .collect();

        if rows.is_empty() {
            return Ok(None);
        }

        let mut settings = EqualizerSettings::flat();
        for (key, gain) in rows {
            if let Some(band) = Band::from_key(&key) {
                settings.set_gain(band, gain as f32);
            }
        }
        Ok(Some(settings))
    }

    fn row_to_recording(row: &rusqlite::Row<'_>) -> rusqlite::Result<Recording> {
        Ok(Recording {
            id: row.get(0)?,
            title: row.get(1)?,
            path: PathBuf::from(row.get::<_, String>(2)?),
            duration_secs: row.get(3)?,
            created_at: row.get(4)?,
            transcript: row.get(5)?,
        })
    }
}
