//! Binary model checkpoints
//!
//! A checkpoint is the ordered list of layer shapes, weights, biases and
//! activations, encoded with `bincode`. Velocities are not stored.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{NetworkError, Result};
use crate::utils::Activation;

/// Bumped whenever the layout of [`ModelCheckpoint`] changes.
pub const CHECKPOINT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelCheckpoint {
    pub format_version: u32,
    pub layers: Vec<LayerCheckpoint>,
}

/// One layer: `row_count × col_count` weights (row-major) and `col_count` biases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerCheckpoint {
    pub row_count: u32,
    pub col_count: u32,
    pub activation: Activation,
    pub weights: Vec<f64>,
    pub biases: Vec<f64>,
}

impl ModelCheckpoint {
    pub fn new(layers: Vec<LayerCheckpoint>) -> Self {
        Self {
            format_version: CHECKPOINT_FORMAT_VERSION,
            layers,
        }
    }

    /// Check the version, each layer's element counts and that every
    /// layer's output width matches the next layer's input width.
    pub fn validate(&self) -> Result<()> {
        if self.format_version != CHECKPOINT_FORMAT_VERSION {
            return Err(NetworkError::invalid_checkpoint(format!(
                "unsupported format version {} (expected {})",
                self.format_version, CHECKPOINT_FORMAT_VERSION
            )));
        }
        if self.layers.is_empty() {
            return Err(NetworkError::invalid_checkpoint("no layers"));
        }
        for (i, layer) in self.layers.iter().enumerate() {
            let expected = layer.row_count as usize * layer.col_count as usize;
            if layer.weights.len() != expected {
                return Err(NetworkError::dimension_mismatch(format!(
                    "layer {} has {} weights, expected {} ({}x{})",
                    i,
                    layer.weights.len(),
                    expected,
                    layer.row_count,
                    layer.col_count
                )));
            }
            if layer.biases.len() != layer.col_count as usize {
                return Err(NetworkError::dimension_mismatch(format!(
                    "layer {} has {} biases, expected {}",
                    i,
                    layer.biases.len(),
                    layer.col_count
                )));
            }
        }
        for (i, pair) in self.layers.windows(2).enumerate() {
            if pair[0].col_count != pair[1].row_count {
                return Err(NetworkError::dimension_mismatch(format!(
                    "layer {} has column count {}, while layer {} has row count {}",
                    i,
                    pair[0].col_count,
                    i + 1,
                    pair[1].row_count
                )));
            }
        }
        Ok(())
    }
}

/// Write `checkpoint` to `path`, replacing any existing file.
pub fn write_checkpoint(path: impl AsRef<Path>, checkpoint: &ModelCheckpoint) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    bincode::serialize_into(&mut writer, checkpoint)?;
    writer.flush()?;
    tracing::debug!(
        path = %path.as_ref().display(),
        layers = checkpoint.layers.len(),
        "wrote checkpoint"
    );
    Ok(())
}

/// Read and validate a checkpoint from `path`.
pub fn read_checkpoint(path: impl AsRef<Path>) -> Result<ModelCheckpoint> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    let checkpoint: ModelCheckpoint = bincode::deserialize_from(reader)?;
    checkpoint.validate()?;
    Ok(checkpoint)
}
