//! Client-side query engine.
//!
//! The store offers no server-side predicate evaluation, so queries run
//! entirely in the engine: enumerate every candidate via prefix listing,
//! filter, sort, window, project. A [`Query`] is a pure builder value -
//! no I/O happens until a terminal call (`all`, `first`, `count`,
//! `exists`, `get`, `paginate`).
//!
//! Filter specs use a `field__op` suffix syntax, e.g.
//! `filter("price__gte", json!(20))`. Sorting uses a leading `-` for
//! descending order: `order_by("-price")`. Malformed specs fail at build
//! time, before any store access.

mod filter;

pub use filter::{Operator, Predicate};

use crate::error::{CoreError, CoreResult};
use crate::service::DataService;
use filter::compare_for_sort;
use serde_json::Value;
use shelfdb_codec::Document;
use std::ops::ControlFlow;
use tracing::debug;

/// A sort specification: field name and direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    /// The field to sort by.
    pub field: String,
    /// Whether to sort descending.
    pub descending: bool,
}

impl SortSpec {
    /// Parses `"field"` (ascending) or `"-field"` (descending).
    #[must_use]
    pub fn parse(spec: &str) -> Self {
        match spec.strip_prefix('-') {
            Some(field) => Self {
                field: field.to_string(),
                descending: true,
            },
            None => Self {
                field: spec.to_string(),
                descending: false,
            },
        }
    }
}

/// One page of paginated results with its metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// The documents on this page.
    pub items: Vec<Document>,
    /// Total matches across all pages, before windowing.
    pub total_count: usize,
    /// The 1-indexed page number.
    pub page: usize,
    /// The requested page size.
    pub page_size: usize,
    /// Whether a later page exists.
    pub has_next: bool,
    /// Whether an earlier page exists.
    pub has_prev: bool,
}

/// An accumulating query over one entity type.
///
/// Filters are conjunctive (every `filter` must hold); excludes are
/// negated (no `exclude` may hold). The builder is a plain value with no
/// side effects, so query construction is testable without storage.
#[derive(Debug, Clone)]
pub struct Query {
    service: DataService,
    filters: Vec<Predicate>,
    excludes: Vec<Predicate>,
    sort: Option<SortSpec>,
    projection: Vec<String>,
    offset: usize,
    limit: Option<usize>,
}

impl Query {
    /// Creates an empty query over the service's entity type.
    #[must_use]
    pub fn new(service: DataService) -> Self {
        Self {
            service,
            filters: Vec::new(),
            excludes: Vec::new(),
            sort: None,
            projection: Vec::new(),
            offset: 0,
            limit: None,
        }
    }

    /// Adds a filter predicate; all filters must match.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidQuery`] for an unrecognized operator
    /// suffix or a malformed predicate value.
    pub fn filter(mut self, spec: &str, value: Value) -> CoreResult<Self> {
        self.filters.push(Predicate::parse(spec, value)?);
        Ok(self)
    }

    /// Adds an exclusion predicate; matching documents are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidQuery`] for a malformed spec.
    pub fn exclude(mut self, spec: &str, value: Value) -> CoreResult<Self> {
        self.excludes.push(Predicate::parse(spec, value)?);
        Ok(self)
    }

    /// Sets the sort field: `"field"` ascending, `"-field"` descending.
    ///
    /// Replaces any previous sort.
    #[must_use]
    pub fn order_by(mut self, spec: &str) -> Self {
        self.sort = Some(SortSpec::parse(spec));
        self
    }

    /// Restricts result attributes to the given fields.
    ///
    /// Identity fields are always retained. An empty projection means all
    /// fields.
    #[must_use]
    pub fn only<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Skips the first `n` post-filter matches.
    #[must_use]
    pub const fn offset(mut self, n: usize) -> Self {
        self.offset = n;
        self
    }

    /// Caps the number of returned documents.
    #[must_use]
    pub const fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Enumerates and filters every candidate, in listing order.
    async fn matching(&self) -> CoreResult<Vec<Document>> {
        let mut docs = self.service.scan_all().await?;
        docs.retain(|doc| {
            self.filters.iter().all(|p| p.matches(doc))
                && !self.excludes.iter().any(|p| p.matches(doc))
        });
        Ok(docs)
    }

    /// Sorts, windows, and projects an already-filtered set.
    fn finish(&self, mut docs: Vec<Document>) -> Vec<Document> {
        if let Some(sort) = &self.sort {
            // Stable sort: ties keep listing order in both directions
            docs.sort_by(|a, b| {
                let ord = compare_for_sort(
                    a.field(&sort.field).as_ref(),
                    b.field(&sort.field).as_ref(),
                );
                if sort.descending {
                    ord.reverse()
                } else {
                    ord
                }
            });
        }

        let mut docs: Vec<Document> = match self.limit {
            Some(limit) => docs.into_iter().skip(self.offset).take(limit).collect(),
            None => docs.into_iter().skip(self.offset).collect(),
        };

        if !self.projection.is_empty() {
            for doc in &mut docs {
                let keep: Vec<String> = doc
                    .attrs()
                    .keys()
                    .filter(|k| !self.projection.iter().any(|p| p == *k))
                    .cloned()
                    .collect();
                for name in keep {
                    doc.remove_attr(&name);
                }
            }
        }
        docs
    }

    /// Executes the query and returns every matching document.
    pub async fn all(self) -> CoreResult<Vec<Document>> {
        let matched = self.matching().await?;
        debug!(
            entity_type = self.service.entity_type().name(),
            matched = matched.len(),
            "query executed"
        );
        Ok(self.finish(matched))
    }

    /// Executes with `limit = 1` and returns the single item, if any.
    pub async fn first(self) -> CoreResult<Option<Document>> {
        Ok(self.limit(1).all().await?.into_iter().next())
    }

    /// Runs the filter pipeline and returns the match cardinality.
    ///
    /// Sort, window, and projection are ignored.
    pub async fn count(&self) -> CoreResult<usize> {
        Ok(self.matching().await?.len())
    }

    /// Returns `true` if any document matches, short-circuiting on the
    /// first hit.
    pub async fn exists(&self) -> CoreResult<bool> {
        let mut found = false;
        self.service
            .for_each(|doc| {
                if self.filters.iter().all(|p| p.matches(&doc))
                    && !self.excludes.iter().any(|p| p.matches(&doc))
                {
                    found = true;
                    return ControlFlow::Break(());
                }
                ControlFlow::Continue(())
            })
            .await?;
        Ok(found)
    }

    /// Requires exactly one match.
    ///
    /// Returns `Ok(None)` on zero matches and
    /// [`CoreError::MultipleResults`] on more than one.
    pub async fn get(self) -> CoreResult<Option<Document>> {
        let matched = self.matching().await?;
        match matched.len() {
            0 => Ok(None),
            1 => {
                let mut items = self.finish(matched);
                Ok(Some(items.remove(0)))
            }
            n => Err(CoreError::multiple_results(
                self.service.entity_type().name(),
                n,
            )),
        }
    }

    /// Executes one 1-indexed page and the total count over the same
    /// filters.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidQuery`] if `page` or `page_size` is
    /// zero.
    pub async fn paginate(self, page: usize, page_size: usize) -> CoreResult<Page> {
        if page == 0 {
            return Err(CoreError::invalid_query("page numbers are 1-indexed"));
        }
        if page_size == 0 {
            return Err(CoreError::invalid_query(
                "page_size must be a positive integer",
            ));
        }

        // One materialization serves both the page and the total count;
        // the results are identical to an extra count() over the same
        // filters.
        let matched = self.matching().await?;
        let total_count = matched.len();
        let offset = (page - 1) * page_size;

        let windowed = self.offset(offset).limit(page_size);
        let items = windowed.finish(matched);

        Ok(Page {
            has_next: offset + items.len() < total_count,
            has_prev: page > 1,
            items,
            total_count,
            page,
            page_size,
        })
    }
}
