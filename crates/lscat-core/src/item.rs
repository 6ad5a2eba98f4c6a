#![forbid(unsafe_code)]

//! Item identifiers.
//!
//! Every downloaded item is named `NNN_<label>.<ext>` by the download side:
//! a zero-padded decimal prefix, at least three digits wide, carrying the
//! item's logical display position, followed by a free-form label. [`ItemId`] keeps the raw
//! name and the parsed [`SequenceNumber`] side by side so the prefix is only
//! ever parsed once.

use std::fmt;
use std::str::FromStr;

/// Width of the zero-padded sequence prefix.
pub const SEQUENCE_WIDTH: usize = 3;

/// Logical display position of an item within its batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SequenceNumber(usize);

impl SequenceNumber {
    #[inline]
    pub const fn new(value: usize) -> Self {
        Self(value)
    }

    #[inline]
    pub const fn get(self) -> usize {
        self.0
    }
}

impl From<usize> for SequenceNumber {
    fn from(value: usize) -> Self {
        Self(value)
    }
}

impl fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0width$}", self.0, width = SEQUENCE_WIDTH)
    }
}

/// Role of an item in a grouped batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    /// Anchors a group; sequence numbers `0..header_count`.
    Header,
    /// Follows a header; sequence numbers `header_count..`.
    Child,
}

impl ItemKind {
    /// Classify a sequence number against the batch's header count.
    #[inline]
    pub const fn classify(seq: SequenceNumber, header_count: usize) -> Self {
        if seq.get() < header_count {
            Self::Header
        } else {
            Self::Child
        }
    }
}

/// Identifier of one downloaded item.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemId {
    raw: String,
    seq: SequenceNumber,
    prefix_len: usize,
}

impl ItemId {
    /// Parse an identifier, extracting its sequence prefix.
    ///
    /// The prefix is the whole leading run of digits, at least
    /// [`SEQUENCE_WIDTH`] long, so positions past `999` keep every digit.
    pub fn parse(raw: impl Into<String>) -> Result<Self, ParseError> {
        let raw = raw.into();
        let digits = raw.bytes().take_while(u8::is_ascii_digit).count();
        if digits < SEQUENCE_WIDTH {
            return Err(if raw.len() < SEQUENCE_WIDTH {
                ParseError::TooShort { id: raw }
            } else {
                ParseError::NotDigits { id: raw }
            });
        }
        let Ok(seq) = raw[..digits].parse::<usize>() else {
            return Err(ParseError::TooLarge { id: raw });
        };
        Ok(Self {
            raw,
            seq: SequenceNumber(seq),
            prefix_len: digits,
        })
    }

    /// Compose the canonical file name for an item: `NNN_<label>.<ext>`.
    ///
    /// Path separators are stripped from the label so the name always refers
    /// to a single file inside the batch directory.
    #[must_use]
    pub fn compose(seq: SequenceNumber, label: &str, ext: &str) -> Self {
        let label: String = label.chars().filter(|&c| c != '/').collect();
        let prefix = seq.to_string();
        Self {
            prefix_len: prefix.len(),
            raw: format!("{prefix}_{label}.{ext}"),
            seq,
        }
    }

    #[inline]
    pub fn seq(&self) -> SequenceNumber {
        self.seq
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Human-readable label between the prefix and the extension.
    ///
    /// `"004_title.jpg"` yields `"title"`; a bare prefix yields `""`.
    pub fn label(&self) -> &str {
        let rest = &self.raw[self.prefix_len..];
        let rest = rest.strip_prefix('_').unwrap_or(rest);
        match rest.rsplit_once('.') {
            Some((stem, _ext)) => stem,
            None => rest,
        }
    }

    /// Classify this item against the batch's header count.
    #[inline]
    pub fn kind(&self, header_count: usize) -> ItemKind {
        ItemKind::classify(self.seq, header_count)
    }

    pub fn into_string(self) -> String {
        self.raw
    }
}

impl FromStr for ItemId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for ItemId {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// The sequence prefix could not be parsed from an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Shorter than the fixed prefix width.
    TooShort { id: String },
    /// The prefix contains a non-digit.
    NotDigits { id: String },
    /// The prefix does not fit a sequence number.
    TooLarge { id: String },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort { id } => write!(
                f,
                "item id {id:?} is shorter than its {SEQUENCE_WIDTH}-digit sequence prefix"
            ),
            Self::NotDigits { id } => {
                write!(f, "item id {id:?} does not start with a {SEQUENCE_WIDTH}-digit sequence prefix")
            }
            Self::TooLarge { id } => write!(f, "item id {id:?} has an out-of-range sequence prefix"),
        }
    }
}

impl std::error::Error for ParseError {}
