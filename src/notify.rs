//! Listener notification framing.
//!
//! Every message on the serial link is one line:
//!
//! ```text
//! ┌─────┬──────────────────────────────────────────┬──────┐
//! │ '!' │ JSON object: "TIME" + one message key    │ '\n' │
//! └─────┴──────────────────────────────────────────┴──────┘
//! ```
//!
//! Message keys sent by the bridge:
//!
//! - `DATA`: one per completed cycle, every acquired channel with a
//!   validity flag (`value` is `null` for invalid channels).
//! - `SENSORS_MANIFEST`: on every entry to INITIAL, the enabled channels.
//!
//! The listener drops lines that do not start with `!` or end with a
//! newline, so a frame is always written in a single call.

use serde::Serialize;

use crate::app::ports::OutputChannel;
use crate::error::CommsError;
use crate::pins;
use crate::sensors::{Channel, SamplingMask, TransformedReading, CHANNEL_COUNT};

/// First byte of every frame.
pub const FRAME_START: u8 = b'!';
/// Last byte of every frame.
pub const FRAME_END: u8 = b'\n';

// ── Wire structures ───────────────────────────────────────────

#[derive(Serialize)]
struct DataMessage<'a> {
    #[serde(rename = "TIME")]
    time: u64,
    #[serde(rename = "DATA")]
    data: DataBody<'a>,
}

#[derive(Serialize)]
struct DataBody<'a> {
    period: u32,
    readings: &'a [ReadingEntry],
}

#[derive(Serialize)]
struct ReadingEntry {
    #[serde(rename = "type")]
    kind: Channel,
    value: Option<f32>,
    unit: &'static str,
    valid: bool,
}

#[derive(Serialize)]
struct ManifestMessage<'a> {
    #[serde(rename = "TIME")]
    time: u64,
    #[serde(rename = "SENSORS_MANIFEST")]
    sensors: &'a [ManifestEntry],
}

#[derive(Serialize)]
struct ManifestEntry {
    name: &'static str,
    /// Always empty; the bridge serves no per-sensor endpoint.
    url: &'static str,
    connection: &'static str,
}

// ── Encoding ──────────────────────────────────────────────────

/// Wrap a message into a `!…\n` frame.
pub fn encode_frame<T: Serialize>(message: &T) -> Result<Vec<u8>, CommsError> {
    let body = serde_json::to_vec(message).map_err(|_| CommsError::EncodeFailed)?;
    let mut frame = Vec::with_capacity(body.len() + 2);
    frame.push(FRAME_START);
    frame.extend_from_slice(&body);
    frame.push(FRAME_END);
    Ok(frame)
}

/// Validate a received line the way the listener does and return its
/// JSON body.  `None` for anything that is not a complete frame.
pub fn parse_frame(line: &[u8]) -> Option<serde_json::Value> {
    let inner = line.strip_prefix(&[FRAME_START])?.strip_suffix(&[FRAME_END])?;
    serde_json::from_slice(inner).ok()
}

fn data_frame(time_ms: u64, period_ms: u32, readings: &[TransformedReading]) -> Result<Vec<u8>, CommsError> {
    let mut entries: heapless::Vec<ReadingEntry, CHANNEL_COUNT> = heapless::Vec::new();
    for r in readings {
        entries
            .push(ReadingEntry {
                kind: r.channel,
                value: r.value.ok(),
                unit: r.channel.unit(),
                valid: r.is_valid(),
            })
            .map_err(|_| CommsError::EncodeFailed)?;
    }
    encode_frame(&DataMessage {
        time: time_ms,
        data: DataBody {
            period: period_ms,
            readings: &entries,
        },
    })
}

// ── Emitters ──────────────────────────────────────────────────

/// Write the DATA notification for one cycle.
///
/// Returns `Ok(false)` without touching the channel when there is nothing
/// to report (zero sampling mask).
pub fn emit(
    out: &mut impl OutputChannel,
    time_ms: u64,
    period_ms: u32,
    readings: &[TransformedReading],
) -> Result<bool, CommsError> {
    if readings.is_empty() {
        return Ok(false);
    }
    let frame = data_frame(time_ms, period_ms, readings)?;
    out.write_frame(&frame)?;
    Ok(true)
}

/// Announce the enabled channels.
pub fn emit_manifest(out: &mut impl OutputChannel, mask: SamplingMask) -> Result<(), CommsError> {
    let mut entries: heapless::Vec<ManifestEntry, CHANNEL_COUNT> = heapless::Vec::new();
    for channel in mask.channels() {
        let _ = entries.push(ManifestEntry {
            name: channel.name(),
            url: "",
            connection: pins::connection(channel),
        });
    }
    let frame = encode_frame(&ManifestMessage {
        time: 0,
        sensors: &entries,
    })?;
    out.write_frame(&frame)
}
