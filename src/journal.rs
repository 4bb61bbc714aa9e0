use crate::commands::CommandRow;
use anyhow::Result;
use std::path::PathBuf;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;

/// Append-only journal of accepted commands. The server replays it on
/// startup by driving each line back through the normal engine paths, so
/// rebuilt state passes the same checks live traffic does.
pub struct Journal {
    path: PathBuf,
    writer: Mutex<File>,
}

impl Journal {
    pub async fn new(path: PathBuf) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        Ok(Self {
            path,
            writer: Mutex::new(file),
        })
    }

    /// Append one accepted command.
    pub async fn append(&self, row: &CommandRow) -> Result<()> {
        let mut writer = self.writer.lock().await;

        // TODO: batch flushes once the server sees enough traffic for it
        writer.write_all(row.to_line().as_bytes()).await?;
        writer.flush().await?;

        Ok(())
    }

    /// Read back every journaled command, oldest first. Unparseable lines
    /// are skipped rather than aborting the rebuild.
    pub async fn replay(&self) -> Result<Vec<CommandRow>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path).await?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines();

        let mut rows = Vec::new();

        while let Some(line) = lines.next_line().await? {
            if line.is_empty() || line.starts_with("op") {
                continue;
            }
            if let Ok(row) = CommandRow::parse_line(&line) {
                rows.push(row);
            }
        }

        Ok(rows)
    }
}
