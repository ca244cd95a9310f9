//! Error types for texture compression.

use thiserror::Error;

use crate::codec::partition::PartitionError;
use crate::codec::CodecStatus;

/// Errors that can occur while preparing a context or compressing a texture.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    /// The engine rejected the block geometry / quality combination.
    #[error("Configuration failed for {block_width}x{block_height} blocks at quality {quality}: {status}")]
    Configuration {
        block_width: u32,
        block_height: u32,
        quality: f32,
        status: CodecStatus,
    },

    /// The engine could not allocate a context.
    #[error("Context allocation failed for {job_count} jobs: {status}")]
    Allocation { job_count: usize, status: CodecStatus },

    /// The worker pool for the context could not be started.
    #[error("Failed to start {job_count} worker threads: {reason}")]
    WorkerPool { job_count: usize, reason: String },

    /// A compression job reported a failure.
    #[error("Compression job {job} failed: {status}")]
    Job { job: usize, status: CodecStatus },

    /// Resetting the context after compression failed.
    #[error("Failed to reset context: {0}")]
    Reset(CodecStatus),

    /// The input image does not describe a valid RGBA8 slice.
    #[error("Invalid image {width}×{height}: {reason}")]
    InvalidImage {
        width: u32,
        height: u32,
        reason: String,
    },

    /// The output buffer cannot hold the compressed payload.
    #[error("Output too small: need {required} bytes, capacity is {capacity}")]
    OutputTooSmall { required: usize, capacity: usize },

    /// The engine produced an unusable output partition.
    #[error("Invalid output partition: {0}")]
    InvalidPartition(#[from] PartitionError),
}

impl EncodeError {
    /// The engine status behind this error, if it came from the engine.
    pub fn status(&self) -> Option<CodecStatus> {
        match self {
            EncodeError::Configuration { status, .. }
            | EncodeError::Allocation { status, .. }
            | EncodeError::Job { status, .. } => Some(*status),
            EncodeError::Reset(status) => Some(*status),
            _ => None,
        }
    }
}
