//! astcpack - multi-threaded ASTC texture compression
//!
//! This library compresses raw RGBA8 images into ASTC block payloads by
//! driving a block-compression engine across a pool of worker threads.
//!
//! # Architecture
//!
//! ```text
//! compress_texture / convert_texture        (ffi: shared session)
//!                │
//!                ▼
//!         EncoderSession                    (dispatch: jobs, join, reset)
//!                │
//!                ▼
//!         ContextManager                    (context: reuse or rebuild)
//!                │
//!                ▼
//!     BlockCodec ── AstcCodec                (codec: engine seam)
//! ```
//!
//! # Example
//!
//! ```
//! use astcpack::{AstcCodec, EncoderSession, EncoderSettings, JobCount};
//! use astcpack::footprint::BlockFootprint;
//!
//! let mut session = EncoderSession::with_settings(
//!     AstcCodec::new(),
//!     EncoderSettings::new().with_jobs(JobCount::Fixed(4)),
//! );
//!
//! let footprint = BlockFootprint::B6x6;
//! let (bw, bh) = footprint.dims();
//! let rgba = vec![128u8; 64 * 64 * 4];
//! let mut payload = vec![0u8; footprint.payload_size(64, 64)];
//! let len = payload.len();
//!
//! session.compress(64, 64, len, bw, bh, &rgba, &mut payload).unwrap();
//! assert_eq!(session.metrics().compressions, 1);
//! ```

pub mod codec;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod ffi;
pub mod footprint;
pub mod logging;
pub mod telemetry;

pub use codec::{AstcCodec, BlockCodec, CodecStatus};
pub use config::{EncoderSettings, JobCount};
pub use dispatch::{CompressionReport, EncoderSession};
pub use error::EncodeError;
pub use ffi::compress_texture;
