//! Engine status codes.

use std::fmt;

/// Non-success status reported by a block-compression engine.
///
/// Each variant maps to a fixed human-readable message, which is what the
/// dispatcher puts into its diagnostics when an engine call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecStatus {
    /// The engine could not allocate memory.
    OutOfMemory,
    /// A parameter was out of range or inconsistent.
    BadParam,
    /// The block dimensions are not supported.
    BadBlockSize,
    /// The color profile is not supported.
    BadProfile,
    /// The quality value is not supported.
    BadQuality,
    /// The configuration flags are not supported.
    BadFlags,
    /// The swizzle is not valid.
    BadSwizzle,
    /// The context is not usable for the requested operation.
    BadContext,
    /// The operation is not implemented by this engine.
    NotImplemented,
    /// The engine failed internally.
    Internal,
}

impl CodecStatus {
    /// Human-readable description of the status.
    pub fn message(&self) -> &'static str {
        match self {
            CodecStatus::OutOfMemory => "out of memory",
            CodecStatus::BadParam => "invalid parameter",
            CodecStatus::BadBlockSize => "unsupported block size",
            CodecStatus::BadProfile => "unsupported color profile",
            CodecStatus::BadQuality => "unsupported quality",
            CodecStatus::BadFlags => "unsupported flags",
            CodecStatus::BadSwizzle => "invalid swizzle",
            CodecStatus::BadContext => "invalid context",
            CodecStatus::NotImplemented => "not implemented",
            CodecStatus::Internal => "internal engine error",
        }
    }
}

impl fmt::Display for CodecStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for CodecStatus {}
