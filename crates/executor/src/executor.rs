//! The Executor - single entry point to the write path.
//!
//! The Executor is a stateless dispatcher: it turns commands into write
//! models, plans them into batches, hands the batches to an
//! [`ExecutionCoordinator`] on a freshly acquired context and classifies
//! the merged result.

use tracing::debug;
use writepath_core::{BsonSizeCodec, DocumentCodec, WireLimits, WriteConcern, WriteConfig};

use crate::builder::{CommandBuilder, CommandOptions};
use crate::classify::classify;
use crate::command::{BulkWriteOptions, FindAndModifyOptions, ReturnDocument, WriteModel};
use crate::coordinator::ExecutionCoordinator;
use crate::merger::ExecutionOutcome;
use crate::planner::BatchPlanner;
use crate::selector::PrimarySelector;
use crate::target::{Collection, WriteTarget};
use crate::{Command, Error, Output, Result};

/// The command executor - single entry point to the write path.
///
/// The Executor holds its collaborators but no per-call state: every call
/// acquires its own execution context, so one executor may serve concurrent
/// calls from several threads.
///
/// # Example
///
/// ```ignore
/// use writepath_executor::{Collection, Command, Executor, WriteModel};
///
/// let executor = Executor::new(selector).with_limits(handshake_limits);
/// let users = Collection::new("app", "users");
///
/// let out = executor.execute(
///     &users.find(doc! {}),
///     Command::BulkWrite {
///         models: vec![WriteModel::InsertOne { document: doc! { "_id": 1i64 } }],
///         options: Default::default(),
///     },
/// )?;
/// ```
pub struct Executor<S, C = BsonSizeCodec> {
    selector: S,
    codec: C,
    handshake: WireLimits,
    config: WriteConfig,
}

impl<S: PrimarySelector> Executor<S> {
    /// Create an executor with BSON sizing, default limits and default config.
    pub fn new(selector: S) -> Self {
        Self {
            selector,
            codec: BsonSizeCodec,
            handshake: WireLimits::default(),
            config: WriteConfig::default(),
        }
    }
}

impl<S: PrimarySelector, C: DocumentCodec> Executor<S, C> {
    /// Measure documents with `codec` instead.
    pub fn with_codec<D: DocumentCodec>(self, codec: D) -> Executor<S, D> {
        Executor {
            selector: self.selector,
            codec,
            handshake: self.handshake,
            config: self.config,
        }
    }

    /// Use the limits the server advertised in its handshake.
    pub fn with_limits(mut self, handshake: WireLimits) -> Self {
        self.handshake = handshake;
        self
    }

    /// Apply client-side configuration.
    pub fn with_config(mut self, config: WriteConfig) -> Self {
        self.config = config;
        self
    }

    /// Effective limits: the handshake limits tightened by the config.
    pub fn limits(&self) -> WireLimits {
        self.config.limits(self.handshake)
    }

    /// Client-side configuration in effect.
    pub fn config(&self) -> &WriteConfig {
        &self.config
    }

    /// The primary selector.
    pub fn selector(&self) -> &S {
        &self.selector
    }

    /// Execute a single command against `target`.
    ///
    /// `BulkWrite` only uses the target's collection; the elemental commands
    /// also take their selector, sort and projection from it.
    pub fn execute<T: WriteTarget + ?Sized>(&self, target: &T, cmd: Command) -> Result<Output> {
        let collection = target.collection();
        debug!(
            target: "writepath::write",
            command = cmd.name(),
            namespace = %collection.namespace(),
            "Executing write"
        );

        let filter = target.selector().clone();
        let (model, returns_document) = match cmd {
            Command::BulkWrite { models, options } => {
                let outcome = self.run(collection, models, &options)?;
                return Ok(Output::WriteResult(classify(outcome.result)?));
            }
            Command::RemoveOne => (WriteModel::DeleteOne { filter }, false),
            Command::RemoveMany => (WriteModel::DeleteMany { filter }, false),
            Command::ReplaceOne { replacement } => (
                WriteModel::ReplaceOne {
                    filter,
                    replacement,
                    upsert: false,
                },
                false,
            ),
            Command::UpdateOne { update } => (
                WriteModel::UpdateOne {
                    filter,
                    update,
                    upsert: false,
                },
                false,
            ),
            Command::UpdateMany { update } => (
                WriteModel::UpdateMany {
                    filter,
                    update,
                    upsert: false,
                },
                false,
            ),
            Command::FindOneAndDelete => (
                WriteModel::FindOneAndDelete {
                    filter,
                    options: find_and_modify_options(target, None, false),
                },
                true,
            ),
            Command::FindOneAndReplace {
                replacement,
                return_document,
                upsert,
            } => (
                WriteModel::FindOneAndReplace {
                    filter,
                    replacement,
                    options: find_and_modify_options(target, return_document, upsert),
                },
                true,
            ),
            Command::FindOneAndUpdate {
                update,
                return_document,
                upsert,
            } => (
                WriteModel::FindOneAndUpdate {
                    filter,
                    update,
                    options: find_and_modify_options(target, return_document, upsert),
                },
                true,
            ),
        };

        let mut outcome = self.run(collection, vec![model], &BulkWriteOptions::default())?;
        let result = classify(std::mem::take(&mut outcome.result))?;
        if returns_document {
            let document = outcome.documents.pop().and_then(|(_, document)| document);
            Ok(Output::Document(document))
        } else {
            Ok(Output::WriteResult(result))
        }
    }

    /// Execute several commands against `target`, in order.
    ///
    /// Each command runs independently; a failure does not stop the ones
    /// after it. Results line up with `cmds`.
    pub fn execute_many<T: WriteTarget + ?Sized>(
        &self,
        target: &T,
        cmds: Vec<Command>,
    ) -> Vec<Result<Output>> {
        cmds.into_iter().map(|cmd| self.execute(target, cmd)).collect()
    }

    /// Plan, then send. Planning failures surface before a context is
    /// acquired, so nothing reaches the server. Unset `ordered` falls back
    /// to the configured default.
    fn run(
        &self,
        collection: &Collection,
        models: Vec<WriteModel>,
        options: &BulkWriteOptions,
    ) -> Result<ExecutionOutcome> {
        let builder = CommandBuilder::new(collection.name());
        let command_options = CommandOptions {
            ordered: options.ordered.unwrap_or(self.config.ordered),
            write_concern: self.write_concern(collection, options),
            bypass_document_validation: options.bypass_document_validation,
        };
        let batches = BatchPlanner::new(&builder, &self.codec, &command_options, self.limits())
            .plan(models)?;
        if batches.is_empty() {
            return Ok(ExecutionOutcome::default());
        }

        let mut context = self
            .selector
            .acquire_context()
            .map_err(|e| Error::Transport {
                reason: e.reason,
                partial: None,
            })?;
        ExecutionCoordinator::new(&mut context, &builder, collection.database(), &command_options)
            .run(batches)
    }

    /// Call option, then the collection's, then the configured default.
    fn write_concern(&self, collection: &Collection, options: &BulkWriteOptions) -> WriteConcern {
        if let Some(wc) = &options.write_concern {
            return wc.clone();
        }
        if !collection.write_concern().is_server_default() {
            return collection.write_concern().clone();
        }
        self.config.write_concern.clone()
    }
}

fn find_and_modify_options<T: WriteTarget + ?Sized>(
    target: &T,
    return_document: Option<ReturnDocument>,
    upsert: bool,
) -> FindAndModifyOptions {
    FindAndModifyOptions {
        sort: target.sort().cloned(),
        projection: target.projection().cloned(),
        return_document,
        upsert,
    }
}
