//! An in-memory primary for tests.
//!
//! [`InMemoryPrimary`] implements [`PrimarySelector`] over a map of
//! collections held in process. It answers `insert`, `update`, `delete` and
//! `findandmodify` the way a server would for the subset of query and update
//! language the write path needs:
//!
//! - filters: field equality plus `$gt`, `$gte`, `$lt`, `$lte`, `$ne`, `$in`
//! - updates: `$set`, `$unset`, `$inc`, or a replacement document
//! - `_id` uniqueness, reported as write error code 11000
//! - `ordered` honoured inside one command
//!
//! Every command is recorded. Failures can be injected: a transport error
//! on the n-th command, a failed context acquisition, or a write-concern
//! error attached to every reply.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use writepath_core::{doc, Bson, Document};

use crate::selector::{ExecutionContext, PrimarySelector, TransportError};

/// Duplicate key.
pub const DUPLICATE_KEY: i32 = 11000;
/// Malformed update specification.
pub const FAILED_TO_PARSE: i32 = 9;
/// Unknown command name.
pub const COMMAND_NOT_FOUND: i32 = 59;

/// A command as the primary received it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCommand {
    /// Database the command ran against
    pub database: String,
    /// The command document
    pub command: Document,
}

impl RecordedCommand {
    /// First key of the command.
    pub fn name(&self) -> &str {
        self.command.keys().next().map(String::as_str).unwrap_or_default()
    }

    /// Number of entries in the command's payload array (1 for findandmodify).
    pub fn operations(&self) -> usize {
        ["documents", "updates", "deletes"]
            .iter()
            .find_map(|field| self.command.get_array(field).ok())
            .map_or(1, |items| items.len())
    }
}

#[derive(Default)]
struct ServerState {
    collections: BTreeMap<String, Vec<Document>>,
    commands: Vec<RecordedCommand>,
    contexts_acquired: usize,
    fail_command: Option<usize>,
    fail_acquire: bool,
    write_concern_error: Option<(i32, String)>,
    next_id: i64,
}

/// In-memory primary. Clones share the same state.
#[derive(Clone, Default)]
pub struct InMemoryPrimary {
    state: Arc<Mutex<ServerState>>,
}

impl InMemoryPrimary {
    /// Empty primary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert documents directly, bypassing the command path.
    pub fn seed(&self, database: &str, collection: &str, documents: Vec<Document>) {
        let mut state = self.state.lock();
        state
            .collections
            .entry(namespace(database, collection))
            .or_default()
            .extend(documents);
    }

    /// Documents currently stored, in insertion order.
    pub fn documents(&self, database: &str, collection: &str) -> Vec<Document> {
        let state = self.state.lock();
        state
            .collections
            .get(&namespace(database, collection))
            .cloned()
            .unwrap_or_default()
    }

    /// Number of stored documents.
    pub fn count(&self, database: &str, collection: &str) -> usize {
        let state = self.state.lock();
        state
            .collections
            .get(&namespace(database, collection))
            .map_or(0, Vec::len)
    }

    /// Every command received, in order. Failed round trips are included.
    pub fn commands(&self) -> Vec<RecordedCommand> {
        self.state.lock().commands.clone()
    }

    /// Names of every command received, in order.
    pub fn command_names(&self) -> Vec<String> {
        let state = self.state.lock();
        state.commands.iter().map(|c| c.name().to_string()).collect()
    }

    /// Number of contexts handed out.
    pub fn contexts_acquired(&self) -> usize {
        self.state.lock().contexts_acquired
    }

    /// Fail the round trip of the `n`-th command (0-based) without applying it.
    pub fn fail_command(&self, n: usize) {
        self.state.lock().fail_command = Some(n);
    }

    /// Make context acquisition fail, as if no primary were reachable.
    pub fn fail_acquire(&self, fail: bool) {
        self.state.lock().fail_acquire = fail;
    }

    /// Attach a write-concern error to every write reply.
    pub fn inject_write_concern_error(&self, code: i32, errmsg: impl Into<String>) {
        self.state.lock().write_concern_error = Some((code, errmsg.into()));
    }
}

impl PrimarySelector for InMemoryPrimary {
    type Context = InMemoryContext;

    fn acquire_context(&self) -> Result<InMemoryContext, TransportError> {
        let mut state = self.state.lock();
        if state.fail_acquire {
            return Err(TransportError::new("no primary available"));
        }
        state.contexts_acquired += 1;
        Ok(InMemoryContext {
            state: Arc::clone(&self.state),
        })
    }
}

/// Context handed out by [`InMemoryPrimary`].
pub struct InMemoryContext {
    state: Arc<Mutex<ServerState>>,
}

impl ExecutionContext for InMemoryContext {
    fn run_command(&mut self, database: &str, command: Document) -> Result<Document, TransportError> {
        let mut state = self.state.lock();
        let sequence = state.commands.len();
        state.commands.push(RecordedCommand {
            database: database.to_string(),
            command: command.clone(),
        });
        if state.fail_command == Some(sequence) {
            return Err(TransportError::new("connection reset by peer"));
        }

        let name = command.keys().next().map(String::as_str).unwrap_or_default().to_string();
        let mut reply = match name.as_str() {
            "insert" => state.insert(database, command),
            "update" => state.update(database, command),
            "delete" => state.delete(database, command),
            "findandmodify" => state.find_and_modify(database, command),
            _ => {
                return Ok(doc! {
                    "ok": 0.0,
                    "errmsg": format!("no such command: '{}'", name),
                    "code": COMMAND_NOT_FOUND,
                })
            }
        };
        if reply.contains_key("ok") {
            return Ok(reply);
        }
        if let Some((code, errmsg)) = &state.write_concern_error {
            reply.insert(
                "writeConcernError",
                doc! { "code": *code, "errmsg": errmsg.as_str() },
            );
        }
        reply.insert("ok", 1.0);
        Ok(reply)
    }
}

impl ServerState {
    fn collection(&mut self, database: &str, command: &Document, name: &str) -> &mut Vec<Document> {
        let collection = command.get_str(name).ok().unwrap_or_default();
        self.collections
            .entry(namespace(database, collection))
            .or_default()
    }

    fn generate_id(&mut self) -> Bson {
        self.next_id += 1;
        Bson::String(format!("generated-{}", self.next_id))
    }

    fn insert(&mut self, database: &str, mut command: Document) -> Document {
        let ordered = command.get_bool("ordered").ok().unwrap_or(true);
        let documents = match command.remove("documents") {
            Some(Bson::Array(items)) => items,
            _ => Vec::new(),
        };

        let mut n = 0i64;
        let mut errors = Vec::new();
        for (index, item) in documents.into_iter().enumerate() {
            let Bson::Document(mut document) = item else {
                errors.push(write_error(index, FAILED_TO_PARSE, "document is not an object"));
                if ordered {
                    break;
                }
                continue;
            };
            let id = match document.get("_id") {
                Some(id) => id.clone(),
                None => {
                    let id = self.generate_id();
                    document = with_leading_id(id.clone(), document);
                    id
                }
            };
            let ns = namespace(database, command.get_str("insert").ok().unwrap_or_default());
            let stored = self.collections.entry(ns.clone()).or_default();
            if stored.iter().any(|d| d.get("_id").is_some_and(|v| values_equal(v, &id))) {
                errors.push(write_error(
                    index,
                    DUPLICATE_KEY,
                    &format!("E11000 duplicate key error collection: {} index: _id_", ns),
                ));
                if ordered {
                    break;
                }
                continue;
            }
            stored.push(document);
            n += 1;
        }
        with_write_errors(doc! { "n": n }, errors)
    }

    fn update(&mut self, database: &str, mut command: Document) -> Document {
        let ordered = command.get_bool("ordered").ok().unwrap_or(true);
        let updates = match command.remove("updates") {
            Some(Bson::Array(items)) => items,
            _ => Vec::new(),
        };

        let mut n = 0i64;
        let mut modified = 0i64;
        let mut upserted = Vec::new();
        let mut errors = Vec::new();
        for (index, item) in updates.into_iter().enumerate() {
            let spec = item.as_document().cloned().unwrap_or_default();
            let filter = spec.get_document("q").ok().cloned().unwrap_or_default();
            let update = spec.get_document("u").ok().cloned().unwrap_or_default();
            let multi = spec.get_bool("multi").ok().unwrap_or(false);
            let upsert = spec.get_bool("upsert").ok().unwrap_or(false);

            let outcome = self.apply_update(database, &command, &filter, &update, multi, upsert);
            match outcome {
                Ok(UpdateOutcome::Matched { matched, changed }) => {
                    n += matched;
                    modified += changed;
                }
                Ok(UpdateOutcome::Upserted(id)) => {
                    n += 1;
                    upserted.push(Bson::Document(doc! { "index": index as i64, "_id": id }));
                }
                Err((code, errmsg)) => {
                    errors.push(write_error(index, code, &errmsg));
                    if ordered {
                        break;
                    }
                }
            }
        }

        let mut reply = doc! { "n": n, "nModified": modified };
        if !upserted.is_empty() {
            reply.insert("upserted", Bson::Array(upserted));
        }
        with_write_errors(reply, errors)
    }

    fn apply_update(
        &mut self,
        database: &str,
        command: &Document,
        filter: &Document,
        update: &Document,
        multi: bool,
        upsert: bool,
    ) -> Result<UpdateOutcome, (i32, String)> {
        validate_update(update)?;
        let stored = self.collection(database, command, "update");
        let targets: Vec<usize> = stored
            .iter()
            .enumerate()
            .filter(|(_, d)| matches(d, filter))
            .map(|(i, _)| i)
            .take(if multi { usize::MAX } else { 1 })
            .collect();

        if targets.is_empty() {
            if !upsert {
                return Ok(UpdateOutcome::Matched {
                    matched: 0,
                    changed: 0,
                });
            }
            let document = self.upsert_document(filter, update);
            let id = document.get("_id").cloned().unwrap_or(Bson::Null);
            self.collection(database, command, "update").push(document);
            return Ok(UpdateOutcome::Upserted(id));
        }

        let mut changed = 0;
        for position in &targets {
            let before = stored[*position].clone();
            let after = apply(&before, update);
            if after != before {
                stored[*position] = after;
                changed += 1;
            }
        }
        Ok(UpdateOutcome::Matched {
            matched: targets.len() as i64,
            changed,
        })
    }

    fn upsert_document(&mut self, filter: &Document, update: &Document) -> Document {
        let seed: Document = filter
            .iter()
            .filter(|(k, v)| !k.starts_with('$') && !is_operator_document(v))
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        let mut document = apply(&seed, update);
        if !document.contains_key("_id") {
            let id = match seed.get("_id") {
                Some(id) => id.clone(),
                None => self.generate_id(),
            };
            document = with_leading_id(id, document);
        }
        document
    }

    fn delete(&mut self, database: &str, mut command: Document) -> Document {
        let deletes = match command.remove("deletes") {
            Some(Bson::Array(items)) => items,
            _ => Vec::new(),
        };
        let stored = self.collection(database, &command, "delete");
        let mut n = 0i64;
        for item in deletes {
            let spec = item.as_document().cloned().unwrap_or_default();
            let filter = spec.get_document("q").ok().cloned().unwrap_or_default();
            let limit = spec.get("limit").and_then(integer).map_or(0, |l| l.max(0) as u64);
            let mut removed = 0u64;
            stored.retain(|d| {
                if (limit == 0 || removed < limit) && matches(d, &filter) {
                    removed += 1;
                    false
                } else {
                    true
                }
            });
            n += removed as i64;
        }
        doc! { "n": n }
    }

    fn find_and_modify(&mut self, database: &str, command: Document) -> Document {
        let filter = command.get_document("query").ok().cloned().unwrap_or_default();
        let remove = command.get_bool("remove").ok().unwrap_or(false);
        let return_new = command.get_bool("new").ok().unwrap_or(false);
        let upsert = command.get_bool("upsert").ok().unwrap_or(false);
        let fields = command.get_document("fields").ok().cloned();
        let sort = command.get_document("sort").ok().cloned();
        let update = command.get_document("update").ok().cloned().unwrap_or_default();
        if !remove {
            if let Err((code, errmsg)) = validate_update(&update) {
                return doc! { "ok": 0.0, "errmsg": errmsg, "code": code };
            }
        }

        let stored = self.collection(database, &command, "findandmodify");
        let mut candidates: Vec<usize> = (0..stored.len())
            .filter(|i| matches(&stored[*i], &filter))
            .collect();
        if let Some(sort) = &sort {
            candidates.sort_by(|a, b| compare_by(&stored[*a], &stored[*b], sort));
        }
        let project = |d: &Document| match &fields {
            Some(fields) => Bson::Document(projection(d, fields)),
            None => Bson::Document(d.clone()),
        };

        match (candidates.first().copied(), remove) {
            (Some(position), true) => {
                let removed = stored.remove(position);
                doc! { "lastErrorObject": doc! { "n": 1i64 }, "value": project(&removed) }
            }
            (None, true) => doc! { "lastErrorObject": doc! { "n": 0i64 }, "value": Bson::Null },
            (Some(position), false) => {
                let before = stored[position].clone();
                let after = apply(&before, &update);
                stored[position] = after.clone();
                let value = if return_new { project(&after) } else { project(&before) };
                doc! {
                    "lastErrorObject": doc! { "n": 1i64, "updatedExisting": true },
                    "value": value,
                }
            }
            (None, false) if upsert => {
                let document = self.upsert_document(&filter, &update);
                let id = document.get("_id").cloned().unwrap_or(Bson::Null);
                let value = if return_new { project(&document) } else { Bson::Null };
                self.collection(database, &command, "findandmodify").push(document);
                doc! {
                    "lastErrorObject": doc! { "n": 1i64, "updatedExisting": false, "upserted": id },
                    "value": value,
                }
            }
            (None, false) => doc! {
                "lastErrorObject": doc! { "n": 0i64, "updatedExisting": false },
                "value": Bson::Null,
            },
        }
    }
}

enum UpdateOutcome {
    Matched { matched: i64, changed: i64 },
    Upserted(Bson),
}

fn namespace(database: &str, collection: &str) -> String {
    format!("{}.{}", database, collection)
}

fn write_error(index: usize, code: i32, errmsg: &str) -> Bson {
    Bson::Document(doc! { "index": index as i64, "code": code, "errmsg": errmsg })
}

fn with_write_errors(mut reply: Document, errors: Vec<Bson>) -> Document {
    if !errors.is_empty() {
        reply.insert("writeErrors", Bson::Array(errors));
    }
    reply
}

fn with_leading_id(id: Bson, document: Document) -> Document {
    let mut with_id = doc! { "_id": id };
    for (key, value) in document {
        with_id.insert(key, value);
    }
    with_id
}

fn is_operator_document(value: &Bson) -> bool {
    value
        .as_document()
        .and_then(|d| d.keys().next())
        .is_some_and(|k| k.starts_with('$'))
}

fn validate_update(update: &Document) -> Result<(), (i32, String)> {
    let operators = update.keys().filter(|k| k.starts_with('$')).count();
    if operators != 0 && operators != update.len() {
        return Err((FAILED_TO_PARSE, "cannot mix update operators and fields".into()));
    }
    for key in update.keys().filter(|k| k.starts_with('$')) {
        if !matches!(key.as_str(), "$set" | "$unset" | "$inc") {
            return Err((FAILED_TO_PARSE, format!("Unknown modifier: {}", key)));
        }
    }
    Ok(())
}

/// Apply an operator update or a replacement. `_id` always survives.
fn apply(document: &Document, update: &Document) -> Document {
    let is_operator = update.keys().next().map(String::as_str).is_some_and(|k| k.starts_with('$'));
    if !is_operator {
        let mut replaced = Document::new();
        if let Some(id) = document.get("_id") {
            replaced.insert("_id", id.clone());
        }
        for (k, v) in update.iter().filter(|(k, _)| *k != "_id") {
            replaced.insert(k, v.clone());
        }
        return replaced;
    }

    let mut result = document.clone();
    for (op, fields) in update.iter() {
        let Some(fields) = fields.as_document() else {
            continue;
        };
        for (field, value) in fields.iter() {
            match op.as_str() {
                "$set" => {
                    result.insert(field, value.clone());
                }
                "$unset" => {
                    result.remove(field);
                }
                "$inc" => {
                    let current = result.get(field).cloned().unwrap_or(Bson::Int32(0));
                    let sum = match (&current, value) {
                        (Bson::Int32(a), Bson::Int32(b)) => a
                            .checked_add(*b)
                            .map_or(Bson::Int64(i64::from(*a) + i64::from(*b)), Bson::Int32),
                        (a, b) => match (integer(a), integer(b)) {
                            (Some(a), Some(b)) => Bson::Int64(a.saturating_add(b)),
                            _ => Bson::Double(number(a).unwrap_or(0.0) + number(b).unwrap_or(0.0)),
                        },
                    };
                    result.insert(field, sum);
                }
                _ => {}
            }
        }
    }
    result
}

fn matches(document: &Document, filter: &Document) -> bool {
    filter.iter().all(|(field, condition)| {
        let actual = document.get(field);
        match condition.as_document() {
            Some(ops) if is_operator_document(condition) => ops.iter().all(|(op, operand)| {
                let ordering = actual.and_then(|a| compare(a, operand));
                match op.as_str() {
                    "$gt" => ordering == Some(Ordering::Greater),
                    "$gte" => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
                    "$lt" => ordering == Some(Ordering::Less),
                    "$lte" => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
                    "$ne" => !actual.is_some_and(|a| values_equal(a, operand)),
                    "$in" => operand
                        .as_array()
                        .is_some_and(|items| actual.is_some_and(|a| items.iter().any(|i| values_equal(a, i)))),
                    _ => false,
                }
            }),
            _ => actual.is_some_and(|a| values_equal(a, condition)),
        }
    })
}

fn values_equal(a: &Bson, b: &Bson) -> bool {
    compare(a, b) == Some(Ordering::Equal) || a == b
}

fn compare(a: &Bson, b: &Bson) -> Option<Ordering> {
    match (a, b) {
        (Bson::String(x), Bson::String(y)) => Some(x.cmp(y)),
        (Bson::Boolean(x), Bson::Boolean(y)) => Some(x.cmp(y)),
        (x, y) => match (integer(x), integer(y)) {
            (Some(x), Some(y)) => Some(x.cmp(&y)),
            _ => number(x).zip(number(y)).and_then(|(x, y)| x.partial_cmp(&y)),
        },
    }
}

fn integer(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(i) => Some(i64::from(*i)),
        Bson::Int64(i) => Some(*i),
        _ => None,
    }
}

fn number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Double(f) => Some(*f),
        other => integer(other).map(|i| i as f64),
    }
}

fn compare_by(a: &Document, b: &Document, sort: &Document) -> Ordering {
    for (field, direction) in sort.iter() {
        let ordering = match (a.get(field), b.get(field)) {
            (Some(x), Some(y)) => compare(x, y).unwrap_or(Ordering::Equal),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        let ordering = if number(direction).is_some_and(|d| d < 0.0) {
            ordering.reverse()
        } else {
            ordering
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

fn projection(document: &Document, fields: &Document) -> Document {
    let including = fields
        .iter()
        .any(|(k, v)| k != "_id" && number(v).map_or(v.as_bool() == Some(true), |f| f != 0.0));
    let excluded = |k: &str| {
        fields
            .get(k)
            .is_some_and(|v| number(v) == Some(0.0) || v.as_bool() == Some(false))
    };
    document
        .iter()
        .filter(|(k, _)| {
            if excluded(k) {
                false
            } else if including {
                *k == "_id" || fields.contains_key(k)
            } else {
                true
            }
        })
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}
