//! Write concern: the acknowledgement a write command asks the server for.
//!
//! One write concern is attached to every command sent for a single bulk
//! call. It is rendered into the command as the `writeConcern` field.

use serde::{Deserialize, Serialize};

use crate::{doc, Bson, Document};

/// The `w` component of a write concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "AcknowledgmentRepr", into = "AcknowledgmentRepr")]
pub enum Acknowledgment {
    /// Acknowledged by a majority of voting members
    Majority,
    /// Acknowledged by this many nodes (`0` = unacknowledged)
    Nodes(u32),
    /// Acknowledged by members matching a custom tag set
    Tag(String),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum AcknowledgmentRepr {
    Nodes(u32),
    Tag(String),
}

impl From<AcknowledgmentRepr> for Acknowledgment {
    fn from(repr: AcknowledgmentRepr) -> Self {
        match repr {
            AcknowledgmentRepr::Nodes(n) => Acknowledgment::Nodes(n),
            AcknowledgmentRepr::Tag(t) if t == "majority" => Acknowledgment::Majority,
            AcknowledgmentRepr::Tag(t) => Acknowledgment::Tag(t),
        }
    }
}

impl From<Acknowledgment> for AcknowledgmentRepr {
    fn from(ack: Acknowledgment) -> Self {
        match ack {
            Acknowledgment::Majority => AcknowledgmentRepr::Tag("majority".to_string()),
            Acknowledgment::Nodes(n) => AcknowledgmentRepr::Nodes(n),
            Acknowledgment::Tag(t) => AcknowledgmentRepr::Tag(t),
        }
    }
}

impl From<&Acknowledgment> for Bson {
    fn from(ack: &Acknowledgment) -> Self {
        match ack {
            Acknowledgment::Majority => Bson::String("majority".to_string()),
            Acknowledgment::Nodes(n) => Bson::Int32(i32::try_from(*n).unwrap_or(i32::MAX)),
            Acknowledgment::Tag(t) => Bson::String(t.clone()),
        }
    }
}

/// Acknowledgement requirement for write commands.
///
/// All fields are optional; an empty write concern defers to the server's
/// default and is omitted from commands entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteConcern {
    /// Acknowledgement level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub w: Option<Acknowledgment>,

    /// How long the server may wait for acknowledgement, in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wtimeout_ms: Option<u64>,

    /// Require the write to reach the on-disk journal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal: Option<bool>,
}

impl WriteConcern {
    /// Majority acknowledgement with no timeout.
    pub fn majority() -> Self {
        WriteConcern {
            w: Some(Acknowledgment::Majority),
            ..Default::default()
        }
    }

    /// Acknowledgement by `n` nodes.
    pub fn nodes(n: u32) -> Self {
        WriteConcern {
            w: Some(Acknowledgment::Nodes(n)),
            ..Default::default()
        }
    }

    /// Set the acknowledgement timeout.
    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.wtimeout_ms = Some(ms);
        self
    }

    /// Set the journal requirement.
    pub fn with_journal(mut self, journal: bool) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Whether no field is set (server default applies).
    pub fn is_server_default(&self) -> bool {
        self.w.is_none() && self.wtimeout_ms.is_none() && self.journal.is_none()
    }

    /// Whether the server will report the outcome of writes.
    pub fn is_acknowledged(&self) -> bool {
        !matches!(self.w, Some(Acknowledgment::Nodes(0))) || self.journal == Some(true)
    }

    /// Render as the `writeConcern` command field.
    pub fn to_document(&self) -> Document {
        let mut d = doc! {};
        if let Some(w) = &self.w {
            d.insert("w", Bson::from(w));
        }
        if let Some(ms) = self.wtimeout_ms {
            d.insert("wtimeout", i64::try_from(ms).unwrap_or(i64::MAX));
        }
        if let Some(j) = self.journal {
            d.insert("j", j);
        }
        d
    }
}
