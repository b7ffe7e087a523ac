//! Batch planning: grouping and splitting write models into commands.
//!
//! A server write command carries one kind of operation and is bounded by
//! the handshake limits. Planning walks the caller's list once:
//!
//! 1. Consecutive models sharing a [`CommandKind`] form a run.
//! 2. Each run is cut greedily into batches: a segment joins the open batch
//!    while the batch holds fewer than `max_batch_count` segments and the
//!    command grown by that segment stays within `max_message_size`.
//! 3. A segment whose command exceeds `max_message_size` even when it is
//!    sent alone fails the whole plan with `DocumentTooLarge` before
//!    anything is sent.
//!
//! Sizes are those of the whole command: the envelope (command name,
//! collection, `ordered`, `writeConcern`, the empty payload array) plus
//! each segment and the array key the codec spends on it.
//!
//! Every segment remembers its model's original index. Planning is
//! deterministic: the same models and limits always yield the same batches.

use tracing::{debug, warn};
use writepath_core::{Document, DocumentCodec, WireLimits};

use crate::builder::{CommandBuilder, CommandOptions};
use crate::command::WriteModel;
use crate::{Error, Result};

/// Wire command a batch is sent as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// `insert` with a `documents` array
    Insert,
    /// `update` with an `updates` array
    Update,
    /// `delete` with a `deletes` array
    Delete,
    /// `findandmodify`, one operation per command
    FindAndModify,
}

impl CommandKind {
    /// First key of the command document.
    pub fn command_name(&self) -> &'static str {
        match self {
            CommandKind::Insert => "insert",
            CommandKind::Update => "update",
            CommandKind::Delete => "delete",
            CommandKind::FindAndModify => "findandmodify",
        }
    }

    /// Array field carrying the segments, if the command has one.
    pub fn payload_field(&self) -> Option<&'static str> {
        match self {
            CommandKind::Insert => Some("documents"),
            CommandKind::Update => Some("updates"),
            CommandKind::Delete => Some("deletes"),
            CommandKind::FindAndModify => None,
        }
    }

    /// Most segments one command of this kind may carry.
    pub fn max_segments(&self, limits: &WireLimits) -> usize {
        match self {
            CommandKind::FindAndModify => 1,
            _ => limits.max_batch_count,
        }
    }
}

/// A planned group of segments sent as one command.
///
/// Immutable once planned and consumed exactly once by the coordinator.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    kind: CommandKind,
    segments: Vec<Document>,
    indexes: Vec<usize>,
    encoded_size: usize,
}

impl Batch {
    fn new(kind: CommandKind, envelope: usize) -> Self {
        Self {
            kind,
            segments: Vec::new(),
            indexes: Vec::new(),
            encoded_size: envelope,
        }
    }

    fn push(&mut self, index: usize, segment: Document, size: usize) {
        self.segments.push(segment);
        self.indexes.push(index);
        self.encoded_size += size;
    }

    /// Command kind of every segment in the batch.
    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether the batch has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segments in send order.
    pub fn segments(&self) -> &[Document] {
        &self.segments
    }

    /// Original index of each segment, by position in the batch.
    pub fn indexes(&self) -> &[usize] {
        &self.indexes
    }

    /// Original index of the segment at `position`.
    pub fn original_index(&self, position: usize) -> Option<usize> {
        self.indexes.get(position).copied()
    }

    /// Encoded size of the command this batch is sent as.
    pub fn encoded_size(&self) -> usize {
        self.encoded_size
    }

    /// Split into kind, segments and index map for sending.
    pub(crate) fn into_parts(self) -> (CommandKind, Vec<Document>, Vec<usize>) {
        (self.kind, self.segments, self.indexes)
    }
}

/// Plans batches for one collection under fixed limits.
pub struct BatchPlanner<'a> {
    builder: &'a CommandBuilder,
    codec: &'a dyn DocumentCodec,
    options: &'a CommandOptions,
    limits: WireLimits,
}

impl<'a> BatchPlanner<'a> {
    /// Planner using `builder` to shape segments and `codec` to size the
    /// commands `options` will produce.
    pub fn new(
        builder: &'a CommandBuilder,
        codec: &'a dyn DocumentCodec,
        options: &'a CommandOptions,
        limits: WireLimits,
    ) -> Self {
        Self {
            builder,
            codec,
            options,
            limits,
        }
    }

    /// Partition `models` into batches.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if the limits are unusable
    /// - `DocumentTooLarge` if one segment's command exceeds `max_message_size`
    /// - `Serialization` if the codec cannot size a segment
    pub fn plan(&self, models: Vec<WriteModel>) -> Result<Vec<Batch>> {
        self.limits.validate().map_err(|e| Error::InvalidInput {
            reason: e.to_string(),
        })?;

        let total = models.len();
        let mut batches: Vec<Batch> = Vec::new();
        let mut current: Option<Batch> = None;
        let mut envelope: Option<(CommandKind, usize)> = None;

        for (index, model) in models.into_iter().enumerate() {
            let kind = model.kind();
            let segment = self.builder.segment(model);
            let size = self.size_of(&segment)?;
            let empty = match envelope {
                Some((k, bytes)) if k == kind => bytes,
                _ => {
                    let bytes = self.envelope(kind)?;
                    envelope = Some((kind, bytes));
                    bytes
                }
            };

            let alone = empty + self.element_overhead(kind, 0) + size;
            if self.limits.validate_segment_size(alone).is_err() {
                warn!(
                    target: "writepath::plan",
                    index,
                    size = alone,
                    max = self.limits.max_message_size,
                    "Operation exceeds maximum message size"
                );
                return Err(Error::DocumentTooLarge {
                    index,
                    size: alone,
                    max: self.limits.max_message_size,
                });
            }

            let fits = current.as_ref().is_some_and(|batch| {
                batch.kind == kind
                    && batch.len() < kind.max_segments(&self.limits)
                    && batch.encoded_size + self.element_overhead(kind, batch.len()) + size
                        <= self.limits.max_message_size
            });
            if !fits {
                if let Some(full) = current.take() {
                    batches.push(full);
                }
                current = Some(Batch::new(kind, empty));
            }
            if let Some(batch) = current.as_mut() {
                let grown = self.element_overhead(kind, batch.len()) + size;
                batch.push(index, segment, grown);
            }
        }
        if let Some(last) = current {
            batches.push(last);
        }

        debug!(
            target: "writepath::plan",
            operations = total,
            batches = batches.len(),
            "Planned bulk write"
        );
        Ok(batches)
    }

    /// Size of a command of `kind` before any segment is added.
    fn envelope(&self, kind: CommandKind) -> Result<usize> {
        match kind.payload_field() {
            Some(_) => self.size_of(&self.builder.command(kind, Vec::new(), self.options)),
            // the segment is the command; count what wrapping adds to it
            None => {
                let wrapped = self.builder.command(kind, vec![Document::new()], self.options);
                Ok(self
                    .size_of(&wrapped)?
                    .saturating_sub(self.size_of(&Document::new())?))
            }
        }
    }

    fn element_overhead(&self, kind: CommandKind, position: usize) -> usize {
        match kind.payload_field() {
            Some(_) => self.codec.element_overhead(position),
            None => 0,
        }
    }

    fn size_of(&self, doc: &Document) -> Result<usize> {
        self.codec.encoded_size(doc).map_err(|e| Error::Serialization {
            reason: e.to_string(),
        })
    }
}
