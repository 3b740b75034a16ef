//! Query predicates.
//!
//! A [`Query`] names a collection, a [`Filter`] tree, an optional identity
//! to leave out of the results, and an ordering. Stores evaluate filters
//! with [`Filter::matches`] or translate them into their native language.

use std::cmp::Ordering;

use crate::document::Document;
use crate::value::{DocumentId, Value};

/// A predicate over documents.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every document.
    All,
    /// `field == value`.
    Eq(String, Value),
    /// The list in `field` contains `value`.
    Contains(String, Value),
    /// The list in `field` has exactly this many elements.
    Size(String, usize),
    /// Every inner filter matches.
    And(Vec<Filter>),
}

impl Filter {
    /// `field == value`.
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq(field.into(), value.into())
    }

    /// List membership.
    pub fn contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Contains(field.into(), value.into())
    }

    /// List cardinality.
    pub fn size(field: impl Into<String>, size: usize) -> Self {
        Self::Size(field.into(), size)
    }

    /// Conjunction with another filter, flattening nested `And`s.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match (self, other) {
            (Self::All, f) | (f, Self::All) => f,
            (Self::And(mut a), Self::And(b)) => {
                a.extend(b);
                Self::And(a)
            }
            (Self::And(mut a), f) => {
                a.push(f);
                Self::And(a)
            }
            (f, Self::And(mut b)) => {
                b.insert(0, f);
                Self::And(b)
            }
            (a, b) => Self::And(vec![a, b]),
        }
    }

    /// Evaluates the filter against a document.
    ///
    /// `id` is matched against the document's identity.
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Self::All => true,
            Self::Eq(field, value) if field == "id" => {
                doc.id().is_some_and(|id| value.as_id() == Some(id))
            }
            Self::Eq(field, value) => doc.get(field) == value,
            Self::Contains(field, value) => doc
                .get(field)
                .as_list()
                .is_some_and(|items| items.contains(value)),
            Self::Size(field, size) => match doc.get(field) {
                Value::List(items) => items.len() == *size,
                Value::Null => *size == 0,
                _ => false,
            },
            Self::And(filters) => filters.iter().all(|f| f.matches(doc)),
        }
    }
}

/// A query against one collection.
///
/// ```
/// use docforms_document::query::{Filter, Query};
///
/// let q = Query::new("item")
///     .filter(Filter::equals("text", "milk"))
///     .order_by("-created");
/// assert_eq!(q.collection, "item");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// The collection to search.
    pub collection: String,
    /// The predicate documents must satisfy.
    pub filter: Filter,
    /// An identity left out of the results.
    pub excluding: Option<DocumentId>,
    /// Sort keys; `-name` sorts descending.
    pub ordering: Vec<String>,
}

impl Query {
    /// A query matching every document in `collection`.
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filter: Filter::All,
            excluding: None,
            ordering: Vec::new(),
        }
    }

    /// Narrows the query with another filter.
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = std::mem::replace(&mut self.filter, Filter::All).and(filter);
        self
    }

    /// Leaves the document with this identity out.
    #[must_use]
    pub const fn excluding(mut self, id: DocumentId) -> Self {
        self.excluding = Some(id);
        self
    }

    /// Adds a sort key. Prefix with `-` for descending order.
    #[must_use]
    pub fn order_by(mut self, key: impl Into<String>) -> Self {
        self.ordering.push(key.into());
        self
    }

    /// Returns `true` if `doc` is in the query's result set.
    pub fn matches(&self, doc: &Document) -> bool {
        if self.excluding.is_some() && doc.id() == self.excluding {
            return false;
        }
        self.filter.matches(doc)
    }

    /// Sorts documents by the query's ordering. Stable for equal keys.
    pub fn sort(&self, docs: &mut [Document]) {
        if self.ordering.is_empty() {
            return;
        }
        docs.sort_by(|a, b| {
            for key in &self.ordering {
                let (field, descending) = key
                    .strip_prefix('-')
                    .map_or((key.as_str(), false), |f| (f, true));
                let ord = compare_values(a.get(field), b.get(field));
                let ord = if descending { ord.reverse() } else { ord };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });
    }
}

/// Orders values of the same kind; mixed kinds and containers compare equal.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Date(x), Value::Date(y)) => x.cmp(y),
        (Value::DateTime(x), Value::DateTime(y)) => x.cmp(y),
        (Value::Id(x), Value::Id(y)) => x.cmp(y),
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        },
    }
}
