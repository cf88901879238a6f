//! Save blob codec.
//!
//! The blob is a single line of whitespace-separated tokens:
//!
//! ```text
//! <header> <s0> <s1> ... <sN-1> [a=<attempts>] [d<key>=<value>]...
//! ```
//!
//! Boss states are written as their integer value in slot order. Counters
//! follow as tagged `name=value` tokens. Decoding scans forward: tokens it
//! does not recognise after the boss states are skipped, so blobs written by
//! a newer layout still load. Anything that breaks the fixed prefix fails the
//! whole decode.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use tracing::debug;

use crate::error::BlobError;
use crate::state::EncounterState;

/// Decoded contents of a save blob.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SaveData {
    pub states: Vec<EncounterState>,
    pub attempts: Option<u32>,
    pub data: BTreeMap<u32, u32>,
}

const ATTEMPTS_TAG: &str = "a";
const DATA_PREFIX: char = 'd';

pub fn encode(header: &str, save: &SaveData) -> String {
    let mut out = String::from(header);
    for state in &save.states {
        // writing into a String cannot fail
        let _ = write!(out, " {}", state.as_u8());
    }
    if let Some(attempts) = save.attempts {
        let _ = write!(out, " {ATTEMPTS_TAG}={attempts}");
    }
    for (key, value) in &save.data {
        let _ = write!(out, " {DATA_PREFIX}{key}={value}");
    }
    out
}

/// Parses a blob written for an instance with `slot_count` boss slots.
///
/// States that must not survive a reload (`InProgress`) and values outside
/// the known range come back as `NotStarted`.
pub fn decode(header: &str, slot_count: usize, blob: &str) -> Result<SaveData, BlobError> {
    let mut tokens = blob.split_whitespace();

    let found = tokens.next().ok_or(BlobError::Empty)?;
    if found != header {
        return Err(BlobError::HeaderMismatch {
            expected: header.to_string(),
            found: found.to_string(),
        });
    }

    let mut save = SaveData {
        states: Vec::with_capacity(slot_count),
        ..SaveData::default()
    };

    for index in 0..slot_count {
        let token = tokens.next().ok_or(BlobError::Truncated {
            expected: slot_count,
            found: index,
        })?;
        save.states.push(restored_state(index, parse_state(index, token)?));
    }

    for token in tokens {
        let Some((tag, value)) = token.split_once('=') else {
            debug!(target: "encounter::blob", token, "skipping unknown save token");
            continue;
        };

        if tag == ATTEMPTS_TAG {
            save.attempts = Some(parse_counter(token, value)?);
        } else if let Some(key) = tag.strip_prefix(DATA_PREFIX)
            && let Ok(key) = key.parse::<u32>()
        {
            save.data.insert(key, parse_counter(token, value)?);
        } else {
            debug!(target: "encounter::blob", token, "skipping unknown save counter");
        }
    }

    Ok(save)
}

/// Reads a state token as an unsigned integer. Digit strings too long for
/// `u64` are still numbers, just out of range.
fn parse_state(index: usize, token: &str) -> Result<u64, BlobError> {
    match token.parse::<u64>() {
        Ok(raw) => Ok(raw),
        Err(_) if token.bytes().all(|b| b.is_ascii_digit()) => Ok(u64::MAX),
        Err(_) => Err(BlobError::InvalidState {
            index,
            token: token.to_string(),
        }),
    }
}

fn restored_state(index: usize, raw: u64) -> EncounterState {
    match u8::try_from(raw).ok().and_then(EncounterState::from_repr) {
        Some(EncounterState::InProgress) => {
            debug!(target: "encounter::blob", slot = index, "in-progress encounter reset on load");
            EncounterState::NotStarted
        }
        Some(state) => state,
        None => {
            debug!(target: "encounter::blob", slot = index, raw, "unknown boss state reset on load");
            EncounterState::NotStarted
        }
    }
}

fn parse_counter(token: &str, value: &str) -> Result<u32, BlobError> {
    value.parse().map_err(|_| BlobError::MalformedCounter {
        token: token.to_string(),
    })
}
