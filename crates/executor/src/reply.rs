//! Parsing of write command replies.
//!
//! A reply is turned into a [`BatchReply`]: counts, upserted ids and write
//! errors, all still indexed by position inside the batch. Translation to
//! original indices happens in the merger.
//!
//! Reply shapes by command:
//!
//! | Command | Fields read |
//! |---------|-------------|
//! | insert | `n` |
//! | update | `n`, `nModified`, `upserted: [{index, _id}]` |
//! | delete | `n` |
//! | findandmodify | `lastErrorObject: {n, updatedExisting, upserted}`, `value` |
//!
//! Every shape may also carry `writeErrors: [{index, code, errmsg}]` and
//! `writeConcernError: {code, errmsg}`. A reply with `ok: 0` is a failure of
//! the whole command.

use writepath_core::{Bson, Document};

use crate::merger::WriteConcernError;
use crate::planner::CommandKind;
use crate::{Error, Result};

/// Counts reported by one command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteCounts {
    /// `n` of an insert
    pub inserted: u64,
    /// `n` of an update, less its upserts
    pub matched: u64,
    /// `nModified`
    pub modified: u64,
    /// `n` of a delete
    pub deleted: u64,
    /// Entries in `upserted`
    pub upserted: u64,
}

/// A write error as reported inside one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchWriteError {
    /// Position of the failing segment in its batch
    pub index: usize,
    /// Server error code
    pub code: i32,
    /// Server error message
    pub errmsg: String,
}

/// An upserted id as reported inside one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchUpsert {
    /// Position of the upserting segment in its batch
    pub index: usize,
    /// `_id` of the created document
    pub id: Bson,
}

/// Outcome of one batch, with batch-local indexes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReply {
    /// Counts for this command
    pub counts: WriteCounts,
    /// Upserts in batch order
    pub upserted: Vec<BatchUpsert>,
    /// Write errors in batch order
    pub write_errors: Vec<BatchWriteError>,
    /// At most one per command
    pub write_concern_error: Option<WriteConcernError>,
    /// Document returned by find-and-modify
    pub value: Option<Document>,
}

impl BatchReply {
    /// Whether this batch reported any write or write-concern error.
    pub fn has_errors(&self) -> bool {
        !self.write_errors.is_empty() || self.write_concern_error.is_some()
    }

    /// Parse the reply to a command of `kind` that carried `batch_len` segments.
    ///
    /// # Errors
    ///
    /// - `CommandFailed` if the reply has `ok: 0`
    /// - `InvalidReply` if the reply is malformed or an index is out of range
    pub fn parse(kind: CommandKind, batch_len: usize, reply: &Document) -> Result<Self> {
        match reply.get("ok") {
            Some(ok) if is_truthy(ok) => {}
            Some(_) => {
                return Err(Error::CommandFailed {
                    code: get_i32(reply, "code").unwrap_or(0),
                    message: reply.get_str("errmsg").ok().unwrap_or("command failed").to_string(),
                    partial: None,
                })
            }
            None => return Err(invalid("reply has no ok field")),
        }

        let mut parsed = BatchReply {
            write_errors: parse_write_errors(reply, batch_len)?,
            write_concern_error: parse_write_concern_error(reply)?,
            ..Default::default()
        };

        let n = get_count(reply, "n")?.unwrap_or(0);
        match kind {
            CommandKind::Insert => parsed.counts.inserted = n,
            CommandKind::Delete => parsed.counts.deleted = n,
            CommandKind::Update => {
                parsed.upserted = parse_upserted(reply, batch_len)?;
                let upserted = parsed.upserted.len() as u64;
                parsed.counts.upserted = upserted;
                parsed.counts.matched = n.saturating_sub(upserted);
                parsed.counts.modified = get_count(reply, "nModified")?.unwrap_or(0);
            }
            CommandKind::FindAndModify => parse_find_and_modify(reply, &mut parsed)?,
        }
        Ok(parsed)
    }
}

fn parse_find_and_modify(reply: &Document, parsed: &mut BatchReply) -> Result<()> {
    parsed.value = match reply.get("value") {
        None | Some(Bson::Null) => None,
        Some(Bson::Document(d)) => Some(d.clone()),
        Some(other) => {
            return Err(invalid(format!("findandmodify value is {:?}", other.element_type())))
        }
    };

    let Some(leo) = reply.get_document("lastErrorObject").ok() else {
        return Ok(());
    };
    let n = get_count(leo, "n")?.unwrap_or(0);
    if let Some(id) = leo.get("upserted") {
        parsed.upserted.push(BatchUpsert {
            index: 0,
            id: id.clone(),
        });
        parsed.counts.upserted = 1;
    } else {
        match leo.get_bool("updatedExisting").ok() {
            Some(_) => {
                parsed.counts.matched = n;
                parsed.counts.modified = n;
            }
            // only removals omit updatedExisting
            None => parsed.counts.deleted = n,
        }
    }
    Ok(())
}

fn parse_write_errors(reply: &Document, batch_len: usize) -> Result<Vec<BatchWriteError>> {
    let Some(items) = reply.get("writeErrors") else {
        return Ok(Vec::new());
    };
    let items = items.as_array().ok_or_else(|| invalid("writeErrors is not an array"))?;
    items
        .iter()
        .map(|item| {
            let entry = item.as_document().ok_or_else(|| invalid("write error entry is not a document"))?;
            Ok(BatchWriteError {
                index: get_index(entry, batch_len)?,
                code: get_i32(entry, "code").unwrap_or(0),
                errmsg: entry.get_str("errmsg").ok().unwrap_or_default().to_string(),
            })
        })
        .collect()
}

fn parse_upserted(reply: &Document, batch_len: usize) -> Result<Vec<BatchUpsert>> {
    let Some(items) = reply.get_array("upserted").ok() else {
        return Ok(Vec::new());
    };
    items
        .iter()
        .map(|item| {
            let entry = item.as_document().ok_or_else(|| invalid("upserted entry is not a document"))?;
            Ok(BatchUpsert {
                index: get_index(entry, batch_len)?,
                id: entry.get("_id").cloned().unwrap_or(Bson::Null),
            })
        })
        .collect()
}

fn parse_write_concern_error(reply: &Document) -> Result<Option<WriteConcernError>> {
    match reply.get("writeConcernError") {
        None => Ok(None),
        Some(Bson::Document(wce)) => Ok(Some(WriteConcernError {
            code: get_i32(wce, "code").unwrap_or(0),
            errmsg: wce.get_str("errmsg").ok().unwrap_or_default().to_string(),
        })),
        Some(other) => Err(invalid(format!("writeConcernError is {:?}", other.element_type()))),
    }
}

fn get_index(entry: &Document, batch_len: usize) -> Result<usize> {
    let index = entry
        .get("index")
        .and_then(as_count)
        .ok_or_else(|| invalid("entry has no numeric index"))? as usize;
    if index >= batch_len {
        return Err(invalid(format!("index {} out of range for batch of {}", index, batch_len)));
    }
    Ok(index)
}

fn get_count(doc: &Document, key: &str) -> Result<Option<u64>> {
    match doc.get(key) {
        None => Ok(None),
        Some(v) => as_count(v).map(Some).ok_or_else(|| invalid(format!("{} is not a count", key))),
    }
}

fn as_count(value: &Bson) -> Option<u64> {
    match value {
        Bson::Int32(i) => u64::try_from(*i).ok(),
        Bson::Int64(i) => u64::try_from(*i).ok(),
        Bson::Double(f) if *f >= 0.0 && f.fract() == 0.0 => Some(*f as u64),
        _ => None,
    }
}

fn get_i32(doc: &Document, key: &str) -> Option<i32> {
    match doc.get(key)? {
        Bson::Int32(i) => Some(*i),
        Bson::Int64(i) => i32::try_from(*i).ok(),
        Bson::Double(f) if f.fract() == 0.0 => Some(*f as i32),
        _ => None,
    }
}

fn is_truthy(v: &Bson) -> bool {
    match v {
        Bson::Boolean(b) => *b,
        Bson::Int32(i) => *i != 0,
        Bson::Int64(i) => *i != 0,
        Bson::Double(f) => *f != 0.0,
        _ => false,
    }
}

fn invalid(reason: impl Into<String>) -> Error {
    Error::InvalidReply {
        reason: reason.into(),
        partial: None,
    }
}
