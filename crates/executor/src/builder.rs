//! Translation of write operations into wire command shapes.
//!
//! Pure functions: nothing here performs I/O. The builder produces
//! *segments* (the per-operation entries of a command's array payload) and
//! wraps planned batches into complete command documents.
//!
//! | Operation | Segment |
//! |-----------|---------|
//! | InsertOne | the document itself |
//! | UpdateOne / ReplaceOne | `{q, u, multi: false, upsert}` |
//! | UpdateMany | `{q, u, multi: true, upsert}` |
//! | DeleteOne / DeleteMany | `{q, limit: 1 \| 0}` |
//! | FindOneAnd* | a whole `findandmodify` command |

use writepath_core::{doc, Document, WriteConcern};

use crate::command::{FindAndModifyOptions, ReturnDocument, WriteModel};
use crate::planner::CommandKind;

/// What a find-and-modify does to the located document.
#[derive(Debug, Clone, PartialEq)]
pub enum FindAndModifyAction {
    /// Apply an update specification or replacement document
    Update(Document),
    /// Delete the document
    Remove,
}

/// Per-command settings applied when wrapping a batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandOptions {
    /// Sent as `ordered` on insert, update and delete
    pub ordered: bool,
    /// Omitted from the command when it is the server default
    pub write_concern: WriteConcern,
    /// Sent as `bypassDocumentValidation` when set
    pub bypass_document_validation: Option<bool>,
}

/// Builds segments and commands for one collection.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    collection: String,
}

impl CommandBuilder {
    /// Builder for commands against `collection`.
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
        }
    }

    /// Collection name commands are addressed to.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// `{q: selector, limit}`; `limit` is 1 for delete-one, 0 for delete-many.
    pub fn delete(&self, selector: Document, limit: i64) -> Document {
        doc! { "q": selector, "limit": limit }
    }

    /// `{q: selector, u: update, multi, upsert}`
    pub fn update(&self, selector: Document, update: Document, multi: bool, upsert: bool) -> Document {
        doc! { "q": selector, "u": update, "multi": multi, "upsert": upsert }
    }

    /// A complete `findandmodify` command.
    ///
    /// `fields`, `sort`, `new` and `upsert` are only present when configured;
    /// `new` is `true` for [`ReturnDocument::After`] and `false` for
    /// [`ReturnDocument::Before`].
    pub fn find_and_modify(
        &self,
        selector: Document,
        action: FindAndModifyAction,
        options: FindAndModifyOptions,
    ) -> Document {
        let mut cmd = doc! {
            "findandmodify": self.collection.as_str(),
            "query": selector,
        };
        let removing = action == FindAndModifyAction::Remove;
        match action {
            FindAndModifyAction::Update(update) => {
                cmd.insert("update", update);
            }
            FindAndModifyAction::Remove => {
                cmd.insert("remove", true);
            }
        }
        if let Some(projection) = options.projection {
            cmd.insert("fields", projection);
        }
        if let Some(sort) = options.sort {
            cmd.insert("sort", sort);
        }
        if !removing {
            if let Some(rd) = options.return_document {
                cmd.insert("new", rd == ReturnDocument::After);
            }
            if options.upsert {
                cmd.insert("upsert", true);
            }
        }
        cmd
    }

    /// The segment one write model contributes to its batch.
    pub fn segment(&self, model: WriteModel) -> Document {
        match model {
            WriteModel::InsertOne { document } => document,
            WriteModel::UpdateOne {
                filter,
                update,
                upsert,
            } => self.update(filter, update, false, upsert),
            WriteModel::UpdateMany {
                filter,
                update,
                upsert,
            } => self.update(filter, update, true, upsert),
            WriteModel::ReplaceOne {
                filter,
                replacement,
                upsert,
            } => self.update(filter, replacement, false, upsert),
            WriteModel::DeleteOne { filter } => self.delete(filter, 1),
            WriteModel::DeleteMany { filter } => self.delete(filter, 0),
            WriteModel::FindOneAndUpdate {
                filter,
                update,
                options,
            } => self.find_and_modify(filter, FindAndModifyAction::Update(update), options),
            WriteModel::FindOneAndReplace {
                filter,
                replacement,
                options,
            } => self.find_and_modify(filter, FindAndModifyAction::Update(replacement), options),
            WriteModel::FindOneAndDelete { filter, options } => {
                self.find_and_modify(filter, FindAndModifyAction::Remove, options)
            }
        }
    }

    /// Wrap a batch's segments into the command sent to the server.
    ///
    /// Array commands take the form `{<name>: coll, <payload>: [...], ordered,
    /// writeConcern?, bypassDocumentValidation?}`. A find-and-modify batch
    /// holds exactly one segment, which already is the command; only the
    /// write concern is added.
    pub fn command(&self, kind: CommandKind, segments: Vec<Document>, options: &CommandOptions) -> Document {
        let mut cmd = match kind.payload_field() {
            Some(payload) => {
                let mut cmd = doc! {
                    kind.command_name(): self.collection.as_str(),
                    payload: segments,
                    "ordered": options.ordered,
                };
                if kind != CommandKind::Delete {
                    if let Some(bypass) = options.bypass_document_validation {
                        cmd.insert("bypassDocumentValidation", bypass);
                    }
                }
                cmd
            }
            None => segments.into_iter().next().unwrap_or_default(),
        };
        if !options.write_concern.is_server_default() {
            cmd.insert("writeConcern", options.write_concern.to_document());
        }
        cmd
    }
}
