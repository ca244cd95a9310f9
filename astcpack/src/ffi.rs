//! Process-wide entry points for hosts that link the library directly.
//!
//! Native hosts call [`convert_texture`] through the C ABI; Rust callers
//! that want the same shared-session behavior use [`compress_texture`].
//! Both drive one lazily-created [`EncoderSession`] behind a mutex, so calls
//! from several threads are serialized and a context is never rebuilt while
//! another call is compressing with it.
//!
//! Failures are logged and flattened to `0` / `false`; no error value or
//! panic crosses the boundary.

use std::ffi::{c_int, c_uint};
use std::panic::{self, AssertUnwindSafe};
use std::slice;

use parking_lot::Mutex;

use crate::codec::{AstcCodec, BlockCodec, ImageDescriptor};
use crate::dispatch::EncoderSession;
use crate::telemetry::MetricsSnapshot;

static SESSION: Mutex<Option<EncoderSession<AstcCodec>>> = Mutex::new(None);

/// Compress an RGBA8 texture using the shared process-wide session.
///
/// Returns true on success. On failure the contents of `output` are
/// unspecified. An engine panic is logged and the shared session is
/// discarded, so the next call builds a fresh one.
pub fn compress_texture(
    width: u32,
    height: u32,
    payload_len: usize,
    block_width: u32,
    block_height: u32,
    input: &[u8],
    output: &mut [u8],
) -> bool {
    compress_shared(
        &SESSION,
        || EncoderSession::new(AstcCodec::new()),
        width,
        height,
        payload_len,
        block_width,
        block_height,
        input,
        output,
    )
}

/// Compress through the session in `slot`, creating it with `create` on
/// first use and dropping it if the engine panics.
#[allow(clippy::too_many_arguments)]
fn compress_shared<C: BlockCodec>(
    slot: &Mutex<Option<EncoderSession<C>>>,
    create: impl FnOnce() -> EncoderSession<C>,
    width: u32,
    height: u32,
    payload_len: usize,
    block_width: u32,
    block_height: u32,
    input: &[u8],
    output: &mut [u8],
) -> bool {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut guard = slot.lock();
        let session = guard.get_or_insert_with(create);
        session.compress(
            width,
            height,
            payload_len,
            block_width,
            block_height,
            input,
            output,
        )
    }));

    match result {
        Ok(Ok(report)) => {
            tracing::debug!(
                width,
                height,
                jobs = report.job_count,
                elapsed_ms = report.elapsed.as_millis() as u64,
                "Texture compressed"
            );
            true
        }
        Ok(Err(e)) => {
            tracing::error!(width, height, block_width, block_height, error = %e, "Texture compression failed");
            false
        }
        Err(_) => {
            tracing::error!(
                width,
                height,
                block_width,
                block_height,
                "Texture compression panicked, discarding shared session"
            );
            *slot.lock() = None;
            false
        }
    }
}

/// Free the shared session's context. Returns true if one was alive.
pub fn release_texture_context() -> bool {
    SESSION
        .lock()
        .as_mut()
        .map(|session| session.release_context())
        .unwrap_or(false)
}

/// Counters of the shared session, if it has been created.
pub fn shared_metrics() -> Option<MetricsSnapshot> {
    SESSION.lock().as_ref().map(|session| session.metrics())
}

/// C entry point: compress a `w`×`h` RGBA8 texture into `out_tex`.
///
/// Returns 1 on success and 0 on any failure.
///
/// # Safety
///
/// `in_tex` must point to at least `w * h * 4` readable bytes and `out_tex`
/// to at least `payload_len` writable bytes, neither overlapping the other,
/// for the duration of the call.
#[no_mangle]
pub unsafe extern "C" fn convert_texture(
    w: c_int,
    h: c_int,
    payload_len: c_int,
    blk_w: c_uint,
    blk_h: c_uint,
    in_tex: *const u8,
    out_tex: *mut u8,
) -> c_int {
    if in_tex.is_null() || out_tex.is_null() {
        tracing::error!("convert_texture called with a null buffer");
        return 0;
    }
    if w <= 0 || h <= 0 || payload_len < 0 {
        tracing::error!(w, h, payload_len, "convert_texture called with a negative size");
        return 0;
    }

    let (width, height) = (w as u32, h as u32);
    let input_len = width as usize * height as usize * ImageDescriptor::BYTES_PER_TEXEL;
    let input = slice::from_raw_parts(in_tex, input_len);
    let output = slice::from_raw_parts_mut(out_tex, payload_len as usize);

    let ok = compress_texture(
        width,
        height,
        payload_len as usize,
        blk_w,
        blk_h,
        input,
        output,
    );
    c_int::from(ok)
}

/// C entry point: free the shared context. Returns 1 if one was alive.
#[no_mangle]
pub extern "C" fn release_encoder_context() -> c_int {
    c_int::from(release_texture_context())
}
