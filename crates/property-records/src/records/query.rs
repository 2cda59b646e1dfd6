//! Translates listing filters into SQL predicates over the joined record tables.
//!
//! A [`PropertyFilter`] expands into a flat list of [`Predicate`]s which are always
//! conjoined, so the order they are pushed in never changes the result set. Absent
//! (or blank) filter values produce no predicate at all.

use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite};

use super::pagination::PageRequest;

/// Optional listing filters as accepted on the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PropertyFilter {
    #[serde(default)]
    pub full_address: Option<String>,
    #[serde(default)]
    pub class_description: Option<String>,
    #[serde(default)]
    pub bldg_use: Option<String>,
    #[serde(default)]
    pub estimated_market_value_min: Option<i64>,
    #[serde(default)]
    pub estimated_market_value_max: Option<i64>,
    #[serde(default)]
    pub building_sq_ft_min: Option<i64>,
    #[serde(default)]
    pub building_sq_ft_max: Option<i64>,
}

impl PropertyFilter {
    /// Expands the filter into the predicates that must all hold for a listed row.
    pub fn predicates(&self) -> Vec<Predicate> {
        let mut predicates: Vec<Predicate> = address_tokens(self.full_address.as_deref())
            .into_iter()
            .map(|token| Predicate::AddressToken(token.to_string()))
            .collect();

        for (column, value) in [
            (TextColumn::ClassDescription, &self.class_description),
            (TextColumn::BuildingUse, &self.bldg_use),
        ] {
            if let Some(needle) = value.as_deref().filter(|v| !v.trim().is_empty()) {
                predicates.push(Predicate::Contains {
                    column,
                    needle: needle.to_string(),
                });
            }
        }

        for (column, min, max) in [
            (
                NumericColumn::EstimatedMarketValue,
                self.estimated_market_value_min,
                self.estimated_market_value_max,
            ),
            (
                NumericColumn::BuildingSqFt,
                self.building_sq_ft_min,
                self.building_sq_ft_max,
            ),
        ] {
            if let Some(bound) = min {
                predicates.push(Predicate::AtLeast { column, bound });
            }
            if let Some(bound) = max {
                predicates.push(Predicate::AtMost { column, bound });
            }
        }

        predicates
    }
}

/// Whitespace-separated address tokens; `None`, empty, and blank input yield none.
pub fn address_tokens(address: Option<&str>) -> Vec<&str> {
    address
        .map(|value| value.split_whitespace().collect())
        .unwrap_or_default()
}

/// A single condition on a listing row.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Predicate {
    /// Case-insensitive substring match against any one of the address columns.
    AddressToken(String),
    /// Case-insensitive substring match against a text column.
    Contains { column: TextColumn, needle: String },
    /// Inclusive lower bound.
    AtLeast { column: NumericColumn, bound: i64 },
    /// Inclusive upper bound.
    AtMost { column: NumericColumn, bound: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TextColumn {
    ClassDescription,
    BuildingUse,
}

impl TextColumn {
    pub const fn sql(self) -> &'static str {
        match self {
            TextColumn::ClassDescription => "c.class_description",
            TextColumn::BuildingUse => "c.bldg_use",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NumericColumn {
    EstimatedMarketValue,
    BuildingSqFt,
}

impl NumericColumn {
    pub const fn sql(self) -> &'static str {
        match self {
            NumericColumn::EstimatedMarketValue => "a.estimated_market_value",
            NumericColumn::BuildingSqFt => "f.building_sq_ft",
        }
    }
}

pub const ADDRESS_COLUMNS: [&str; 6] = [
    "p.house_no",
    "p.dir",
    "p.street",
    "p.suffix",
    "p.apt",
    "p.city",
];

const LISTING_SELECT: &str = "SELECT p.id, p.house_no, p.dir, p.street, p.suffix, p.apt, p.city, \
     p.longitude, p.latitude, c.class_description, c.bldg_use, \
     a.estimated_market_value, f.building_sq_ft \
     FROM properties p \
     JOIN property_classifications c ON c.property_id = p.id \
     JOIN assessments a ON a.property_id = p.id \
     JOIN property_features f ON f.property_id = p.id";

const LISTING_ORDER: &str = " ORDER BY p.id, c.id, a.id, f.id";

/// Builds the listing statement: base join, conjoined predicates, stable order, and an
/// over-fetching window.
pub fn listing_query(predicates: &[Predicate], page: PageRequest) -> QueryBuilder<'static, Sqlite> {
    let mut builder = QueryBuilder::new(LISTING_SELECT);
    push_predicates(&mut builder, predicates);
    builder.push(LISTING_ORDER);
    builder.push(" LIMIT ");
    builder.push_bind(page.fetch_limit());
    builder.push(" OFFSET ");
    builder.push_bind(page.skip());
    builder
}

fn push_predicates(builder: &mut QueryBuilder<'static, Sqlite>, predicates: &[Predicate]) {
    let mut keyword = " WHERE ";
    for predicate in predicates {
        builder.push(keyword);
        keyword = " AND ";
        push_predicate(builder, predicate);
    }
}

fn push_predicate(builder: &mut QueryBuilder<'static, Sqlite>, predicate: &Predicate) {
    match predicate {
        Predicate::AddressToken(token) => {
            let pattern = contains_pattern(token);
            builder.push("(");
            for (index, column) in ADDRESS_COLUMNS.iter().enumerate() {
                if index > 0 {
                    builder.push(" OR ");
                }
                push_like(builder, column, pattern.clone());
            }
            builder.push(")");
        }
        Predicate::Contains { column, needle } => {
            push_like(builder, column.sql(), contains_pattern(needle));
        }
        Predicate::AtLeast { column, bound } => {
            builder.push(column.sql());
            builder.push(" >= ");
            builder.push_bind(*bound);
        }
        Predicate::AtMost { column, bound } => {
            builder.push(column.sql());
            builder.push(" <= ");
            builder.push_bind(*bound);
        }
    }
}

fn push_like(builder: &mut QueryBuilder<'static, Sqlite>, column: &str, pattern: String) {
    builder.push(column);
    builder.push(" LIKE ");
    builder.push_bind(pattern);
    builder.push(" ESCAPE '\\'");
}

/// `%needle%` with LIKE metacharacters in the needle escaped.
pub fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
