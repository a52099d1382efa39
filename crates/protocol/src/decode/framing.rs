//! Line framing profiles
//!
//! Each profile knows where the identifier, timestamp and payload sit in a raw
//! line. A filter instance uses exactly one profile for every line it reads.

use std::borrow::Cow;

/// Default record tag for positioning fixes
pub const DEFAULT_RECORD_TAG: &str = "VFR";

/// Default accepted solution types for positioning fixes
pub const DEFAULT_SOLUTION_TYPES: &[&str] = &["SOLN_USBL", "SOLN_GPS0"];

/// Queue marker in vehicle modem traffic
const QUEUE_MARKER: &str = "SDQ";

/// Header separator between the listener timestamp and the message
const HEADER_SEPARATOR: char = '|';

/// A framed line: identifier, header timestamp and unparsed payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame<'a> {
    pub identifier: Cow<'a, str>,
    pub timestamp: &'a str,
    pub payload: &'a str,
}

/// Header checks for positioning fixes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositioningFraming {
    /// Text the first body token must contain
    pub record_tag: String,
    /// The sixth body token must contain one of these
    pub solution_types: Vec<String>,
}

impl Default for PositioningFraming {
    fn default() -> Self {
        Self {
            record_tag: DEFAULT_RECORD_TAG.to_string(),
            solution_types: DEFAULT_SOLUTION_TYPES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Framing profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Profile {
    /// `timestamp|...|SDQ <queue>:<payload>`
    Vehicle,
    /// `timestamp|<tag> <date> <time> <?> <asset> <solution> <payload...>`
    Positioning(PositioningFraming),
    /// `identifier<sep>timestamp<sep>payload`
    Delimited { separator: char },
}

impl Profile {
    /// Profile name as used in configuration and cursor file names
    pub fn name(&self) -> &'static str {
        match self {
            Self::Vehicle => "vehicle",
            Self::Positioning(_) => "positioning",
            Self::Delimited { .. } => "delimited",
        }
    }

    /// Split a line into its frame, or `None` if the header does not match
    pub fn frame<'a>(&self, text: &'a str) -> Option<Frame<'a>> {
        match self {
            Self::Vehicle => frame_vehicle(text),
            Self::Positioning(framing) => frame_positioning(text, framing),
            Self::Delimited { separator } => frame_delimited(text, *separator),
        }
    }
}

fn frame_vehicle(text: &str) -> Option<Frame<'_>> {
    let (timestamp, message) = text.split_once(HEADER_SEPARATOR)?;

    let marker = message.find(QUEUE_MARKER)?;
    let rest = &message[marker + QUEUE_MARKER.len()..];
    let (queue, payload) = rest.split_once(':')?;

    // "SDQ 034" and "SDQ 34" are the same queue
    let queue: u32 = queue.trim().parse().ok()?;

    Some(Frame {
        identifier: Cow::Owned(queue.to_string()),
        timestamp,
        payload,
    })
}

fn frame_positioning<'a>(text: &'a str, framing: &PositioningFraming) -> Option<Frame<'a>> {
    let (timestamp, message) = text.split_once(HEADER_SEPARATOR)?;
    let body = match message.split_once(HEADER_SEPARATOR) {
        Some((body, _)) => body,
        None => message,
    };

    let tokens: Vec<&str> = body.split_whitespace().take(7).collect();
    if tokens.len() < 6 {
        return None;
    }
    if !tokens[0].contains(framing.record_tag.as_str()) {
        return None;
    }
    if !framing
        .solution_types
        .iter()
        .any(|solution| tokens[5].contains(solution.as_str()))
    {
        return None;
    }

    // Payload keeps the original spacing from the seventh token on
    let payload = match tokens.get(6) {
        Some(first) => &body[offset_in(body, first)..],
        None => "",
    };

    Some(Frame {
        identifier: Cow::Borrowed(tokens[3]),
        timestamp,
        payload,
    })
}

fn frame_delimited(text: &str, separator: char) -> Option<Frame<'_>> {
    let mut parts = text.splitn(3, separator);
    let identifier = parts.next()?.trim();
    let timestamp = parts.next()?;
    let payload = parts.next().unwrap_or("");

    if identifier.is_empty() {
        return None;
    }

    Some(Frame {
        identifier: Cow::Borrowed(identifier),
        timestamp,
        payload,
    })
}

/// Byte offset of `part` inside `whole`; `part` must be a subslice of `whole`
fn offset_in(whole: &str, part: &str) -> usize {
    part.as_ptr() as usize - whole.as_ptr() as usize
}
