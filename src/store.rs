// store.rs

use chrono::Utc;
use std::fs;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::plot::{Plot, PlotDraft, PlotId};

/// Errors raised by a plot store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Backing store for persisted plots.
pub trait PlotStore {
    fn list_plots(&self) -> Result<Vec<Plot>, StoreError>;
    fn create_plot(&mut self, draft: PlotDraft) -> Result<Plot, StoreError>;
}

/// Stores every plot as one JSON array in a single file.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Opens the store, creating the parent directory if needed. The file
    /// itself is only written on the first `create_plot`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(JsonFileStore { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Vec<Plot>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let file = fs::File::open(&self.path)?;
        let plots = serde_json::from_reader(BufReader::new(file))?;
        Ok(plots)
    }

    fn write_all(&self, plots: &[Plot]) -> Result<(), StoreError> {
        let tmp_path = self.path.with_extension("json.tmp");
        {
            let file = fs::File::create(&tmp_path)?;
            serde_json::to_writer_pretty(BufWriter::new(file), plots)?;
        }
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl PlotStore for JsonFileStore {
    fn list_plots(&self) -> Result<Vec<Plot>, StoreError> {
        self.read_all()
    }

    fn create_plot(&mut self, draft: PlotDraft) -> Result<Plot, StoreError> {
        let mut plots = self.read_all()?;
        let next_id = plots.iter().map(|p| p.id.0).max().unwrap_or(0) + 1;
        let plot = Plot {
            id: PlotId(next_id),
            name: draft.name,
            description: draft.description,
            culture_type: draft.culture_type,
            surface: draft.surface,
            geometry: draft.geometry,
            created_at: Utc::now(),
        };
        plots.push(plot.clone());
        self.write_all(&plots)?;
        log::info!("Stored plot {} in {}", plot.id, self.path.display());
        Ok(plot)
    }
}

/// In-memory store with failure injection, used by tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
    pub plots: Vec<Plot>,
    pub fail_creates: bool,
    pub create_calls: usize,
}

#[cfg(test)]
impl PlotStore for MemoryStore {
    fn list_plots(&self) -> Result<Vec<Plot>, StoreError> {
        Ok(self.plots.clone())
    }

    fn create_plot(&mut self, draft: PlotDraft) -> Result<Plot, StoreError> {
        self.create_calls += 1;
        if self.fail_creates {
            return Err(StoreError::Io(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "store unavailable",
            )));
        }
        let plot = Plot {
            id: PlotId(self.plots.len() as u64 + 1),
            name: draft.name,
            description: draft.description,
            culture_type: draft.culture_type,
            surface: draft.surface,
            geometry: draft.geometry,
            created_at: Utc::now(),
        };
        self.plots.push(plot.clone());
        Ok(plot)
    }
}
