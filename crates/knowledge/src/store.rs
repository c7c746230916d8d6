//! SQLite persistence for a domain index.
//!
//! The store is only touched at build and open time. Queries run against
//! the in-memory [`MemoryIndex`](crate::index::MemoryIndex) loaded from it.

use crate::types::{EmbeddedChunk, KnowledgeChunk, KnowledgeSource};
use greenguide_core::{AppError, AppResult};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};

pub struct IndexStore {
    conn: Connection,
    path: PathBuf,
}

impl IndexStore {
    /// Open (creating if needed) the SQLite index at `db_path`.
    pub fn open(db_path: &Path) -> AppResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Knowledge(format!("Failed to create index directory: {}", e))
            })?;
        }

        let conn = Connection::open(db_path)
            .map_err(|e| AppError::Knowledge(format!("Failed to open SQLite index: {}", e)))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS sources (
                id TEXT PRIMARY KEY,
                path TEXT NOT NULL,
                content_type TEXT NOT NULL,
                size_bytes INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS chunks (
                id TEXT PRIMARY KEY,
                source_id TEXT NOT NULL,
                position INTEGER NOT NULL,
                text TEXT NOT NULL,
                embedding BLOB NOT NULL,
                FOREIGN KEY (source_id) REFERENCES sources(id)
            );

            CREATE INDEX IF NOT EXISTS idx_chunks_source ON chunks(source_id);
            "#,
        )
        .map_err(|e| AppError::Knowledge(format!("Failed to create tables: {}", e)))?;

        tracing::debug!("Opened SQLite index at {:?}", db_path);
        Ok(Self {
            conn,
            path: db_path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the whole index contents in a single transaction.
    pub fn replace_all(
        &mut self,
        sources: &[KnowledgeSource],
        chunks: &[EmbeddedChunk],
    ) -> AppResult<()> {
        let tx = self
            .conn
            .transaction()
            .map_err(|e| AppError::Knowledge(format!("Failed to begin transaction: {}", e)))?;

        tx.execute("DELETE FROM chunks", [])
            .map_err(|e| AppError::Knowledge(format!("Failed to delete chunks: {}", e)))?;
        tx.execute("DELETE FROM sources", [])
            .map_err(|e| AppError::Knowledge(format!("Failed to delete sources: {}", e)))?;

        for source in sources {
            tx.execute(
                "INSERT OR REPLACE INTO sources (id, path, content_type, size_bytes)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    source.id,
                    source.path,
                    source.content_type,
                    source.size_bytes as i64
                ],
            )
            .map_err(|e| AppError::Knowledge(format!("Failed to insert source: {}", e)))?;
        }

        for entry in chunks {
            let chunk = &entry.chunk;
            tx.execute(
                "INSERT OR REPLACE INTO chunks (id, source_id, position, text, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    chunk.id,
                    chunk.source_id,
                    chunk.position as i64,
                    chunk.text,
                    embedding_to_bytes(&entry.embedding),
                ],
            )
            .map_err(|e| AppError::Knowledge(format!("Failed to insert chunk: {}", e)))?;
        }

        tx.commit()
            .map_err(|e| AppError::Knowledge(format!("Failed to commit index: {}", e)))?;

        tracing::debug!(
            sources = sources.len(),
            chunks = chunks.len(),
            "Wrote index contents"
        );
        Ok(())
    }

    /// Load every chunk with its embedding, ordered by source path and position.
    pub fn load_chunks(&self) -> AppResult<Vec<EmbeddedChunk>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT c.id, c.source_id, s.path, c.position, c.text, c.embedding
                 FROM chunks c JOIN sources s ON s.id = c.source_id
                 ORDER BY s.path, c.position",
            )
            .map_err(|e| AppError::Knowledge(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map([], |row| {
                let embedding_bytes: Vec<u8> = row.get(5)?;
                Ok((
                    KnowledgeChunk {
                        id: row.get(0)?,
                        source_id: row.get(1)?,
                        source_path: row.get(2)?,
                        position: row.get::<_, i64>(3)? as u32,
                        text: row.get(4)?,
                    },
                    embedding_bytes,
                ))
            })
            .map_err(|e| AppError::Knowledge(format!("Failed to query chunks: {}", e)))?;

        let mut chunks = Vec::new();
        for row in rows {
            let (chunk, bytes) =
                row.map_err(|e| AppError::Knowledge(format!("Failed to read chunk: {}", e)))?;
            chunks.push(EmbeddedChunk {
                embedding: bytes_to_embedding(&bytes)?,
                chunk,
            });
        }

        Ok(chunks)
    }

    /// Returns (sources_count, chunks_count).
    pub fn counts(&self) -> AppResult<(u32, u32)> {
        let count = |table: &str| -> AppResult<u32> {
            self.conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                    row.get::<_, i64>(0)
                })
                .map(|v| v as u32)
                .map_err(|e| AppError::Knowledge(format!("Failed to count {}: {}", table, e)))
        };

        Ok((count("sources")?, count("chunks")?))
    }
}

/// Convert embedding vector to little-endian bytes for storage.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Convert stored bytes back to an embedding vector.
fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Knowledge(
            "Invalid embedding bytes length".to_string(),
        ));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}
