//! Write targets: what an elemental write applies to.
//!
//! The executor never depends on a concrete query-view type. Anything that
//! can name a collection and describe which documents it selects implements
//! [`WriteTarget`]; [`CollectionView`] is the implementation shipped here.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use writepath_core::{Document, WriteConcern};

/// A collection as the write path sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    database: String,
    name: String,
    #[serde(default)]
    write_concern: WriteConcern,
}

impl Collection {
    /// Refer to `database.name` with the server's default write concern.
    pub fn new(database: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            name: name.into(),
            write_concern: WriteConcern::default(),
        }
    }

    /// Set the collection's default write concern.
    pub fn with_write_concern(mut self, write_concern: WriteConcern) -> Self {
        self.write_concern = write_concern;
        self
    }

    /// Database the collection lives in.
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `database.name`
    pub fn namespace(&self) -> String {
        format!("{}.{}", self.database, self.name)
    }

    /// Write concern used when a call does not set its own.
    pub fn write_concern(&self) -> &WriteConcern {
        &self.write_concern
    }

    /// A view selecting the documents matching `selector`.
    pub fn find(&self, selector: Document) -> CollectionView {
        CollectionView::new(self.clone(), selector)
    }
}

fn select_all() -> &'static Document {
    static SELECT_ALL: OnceLock<Document> = OnceLock::new();
    SELECT_ALL.get_or_init(Document::new)
}

/// Read-only description of the documents an elemental write applies to.
pub trait WriteTarget {
    /// Collection the documents live in.
    fn collection(&self) -> &Collection;

    /// Filter selecting the documents.
    fn selector(&self) -> &Document;

    /// Fields returned by find-and-modify, if limited.
    fn projection(&self) -> Option<&Document>;

    /// Order deciding which document find-and-modify picks.
    fn sort(&self) -> Option<&Document>;
}

/// A selection over one collection.
///
/// # Example
///
/// ```ignore
/// let view = users.find(doc! { "status": "idle" }).with_sort(doc! { "age": -1i64 });
/// executor.find_one_and_delete(&view)?;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionView {
    collection: Collection,
    selector: Document,
    projection: Option<Document>,
    sort: Option<Document>,
}

impl CollectionView {
    /// A view over `collection` selecting `selector`.
    pub fn new(collection: Collection, selector: Document) -> Self {
        Self {
            collection,
            selector,
            projection: None,
            sort: None,
        }
    }

    /// Limit the fields of returned documents.
    pub fn with_projection(mut self, projection: Document) -> Self {
        self.projection = Some(projection);
        self
    }

    /// Order matches; find-and-modify acts on the first.
    pub fn with_sort(mut self, sort: Document) -> Self {
        self.sort = Some(sort);
        self
    }
}

impl WriteTarget for CollectionView {
    fn collection(&self) -> &Collection {
        &self.collection
    }

    fn selector(&self) -> &Document {
        &self.selector
    }

    fn projection(&self) -> Option<&Document> {
        self.projection.as_ref()
    }

    fn sort(&self) -> Option<&Document> {
        self.sort.as_ref()
    }
}

/// A bare collection selects every document in it.
impl WriteTarget for Collection {
    fn collection(&self) -> &Collection {
        self
    }

    fn selector(&self) -> &Document {
        select_all()
    }

    fn projection(&self) -> Option<&Document> {
        None
    }

    fn sort(&self) -> Option<&Document> {
        None
    }
}
