//! Event wire model and parsing.
//!
//! Wire form is one LF-terminated line per event, fields separated by `|`:
//! `<seq>|F|<from>|<to>`, `<seq>|U|<from>|<to>`, `<seq>|B`,
//! `<seq>|P|<from>|<to>`, `<seq>|S|<from>`.

use std::fmt;

use bytes::Bytes;

use crate::RelayError;

/// User identifier. Opaque beyond equality and hashing.
pub type UserId = u64;

/// Event kind, carrying the routing fields that kind requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// `from` starts following `to`; `to` is notified.
    Follow { from: UserId, to: UserId },
    /// `from` stops following `to`; nobody is notified.
    Unfollow { from: UserId, to: UserId },
    /// Delivered to every currently connected client.
    Broadcast,
    /// Delivered to `to` only.
    Private { from: UserId, to: UserId },
    /// Delivered to the current followers of `from`.
    StatusUpdate { from: UserId },
}

impl EventKind {
    /// Wire code for this kind.
    pub fn code(&self) -> &'static str {
        match self {
            EventKind::Follow { .. } => "F",
            EventKind::Unfollow { .. } => "U",
            EventKind::Broadcast => "B",
            EventKind::Private { .. } => "P",
            EventKind::StatusUpdate { .. } => "S",
        }
    }
}

/// A parsed producer event.
///
/// Immutable after construction. The original wire line is retained and
/// forwarded verbatim (plus LF) to every recipient.
#[derive(Debug, Clone)]
pub struct Event {
    sequence: u64,
    kind: EventKind,
    line: Bytes,
}

impl Event {
    /// Parse one producer line (without the trailing newline).
    ///
    /// # Errors
    /// Unknown kind, wrong field count for the kind, non-integer fields,
    /// or a zero sequence.
    pub fn parse(line: &str) -> Result<Self, RelayError> {
        let fields: Vec<&str> = line.split('|').collect();
        if fields.len() < 2 {
            return Err(RelayError::event_parse(line, "expected <seq>|<kind>[|...]"));
        }

        let sequence: u64 = fields[0]
            .parse()
            .map_err(|_| RelayError::event_parse(line, "sequence is not an unsigned integer"))?;
        if sequence == 0 {
            return Err(RelayError::event_parse(line, "sequence must be >= 1"));
        }

        let kind = match (fields[1], fields.len()) {
            ("F", 4) => EventKind::Follow {
                from: parse_user(fields[2], line)?,
                to: parse_user(fields[3], line)?,
            },
            ("U", 4) => EventKind::Unfollow {
                from: parse_user(fields[2], line)?,
                to: parse_user(fields[3], line)?,
            },
            ("B", 2) => EventKind::Broadcast,
            ("P", 4) => EventKind::Private {
                from: parse_user(fields[2], line)?,
                to: parse_user(fields[3], line)?,
            },
            ("S", 3) => EventKind::StatusUpdate {
                from: parse_user(fields[2], line)?,
            },
            ("F" | "U" | "B" | "P" | "S", n) => {
                return Err(RelayError::event_parse(
                    line,
                    format!("kind {} does not take {} fields", fields[1], n),
                ));
            }
            (other, _) => {
                return Err(RelayError::event_parse(
                    line,
                    format!("unknown event kind {other:?}"),
                ));
            }
        };

        Ok(Self {
            sequence,
            kind,
            line: Bytes::copy_from_slice(line.as_bytes()),
        })
    }

    /// Producer-assigned sequence number (>= 1).
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Event kind with its routing fields.
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Sender user id, for the kinds that carry one.
    pub fn from_user(&self) -> Option<UserId> {
        match self.kind {
            EventKind::Follow { from, .. }
            | EventKind::Unfollow { from, .. }
            | EventKind::Private { from, .. }
            | EventKind::StatusUpdate { from } => Some(from),
            EventKind::Broadcast => None,
        }
    }

    /// Target user id, for the kinds that carry one.
    pub fn to_user(&self) -> Option<UserId> {
        match self.kind {
            EventKind::Follow { to, .. }
            | EventKind::Unfollow { to, .. }
            | EventKind::Private { to, .. } => Some(to),
            EventKind::Broadcast | EventKind::StatusUpdate { .. } => None,
        }
    }

    /// Original wire line, without the trailing newline.
    pub fn wire_line(&self) -> &Bytes {
        &self.line
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.line))
    }
}

fn parse_user(field: &str, line: &str) -> Result<UserId, RelayError> {
    field
        .parse()
        .map_err(|_| RelayError::event_parse(line, "user id is not an unsigned integer"))
}
