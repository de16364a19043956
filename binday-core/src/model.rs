//! Domain data structures for councils, lookups, and collection schedules.

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Identifier for a council known to binday.
pub struct CouncilId(pub String);

impl fmt::Display for CouncilId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
/// Metadata describing a council and the page its lookup runs against.
pub struct CouncilMeta {
    /// Unique identifier.
    pub id: CouncilId,
    /// Display name.
    pub name: String,
    /// Public lookup page shown to users after a result.
    pub lookup_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A postcode lookup, optionally narrowed by an address fragment.
pub struct LookupQuery {
    /// Postcode to search for.
    pub postcode: String,
    /// Fragment of the address used to pick one of several candidates.
    pub address: Option<String>,
}

impl LookupQuery {
    /// Construct a query, trimming input and dropping a blank address hint.
    #[must_use]
    pub fn new<P: AsRef<str>, A: AsRef<str>>(postcode: P, address: Option<A>) -> Self {
        let address = address
            .as_ref()
            .map(|hint| hint.as_ref().trim())
            .filter(|hint| !hint.is_empty())
            .map(str::to_owned);
        Self {
            postcode: postcode.as_ref().trim().to_owned(),
            address,
        }
    }

    /// Check if the query carries no postcode.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.postcode.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// One candidate from the council's address list.
pub struct Address {
    /// Option value posted back to select this address.
    pub value: String,
    /// Visible address text.
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Kinds of bin the council collects.
pub enum BinKind {
    /// General waste (black bin).
    General,
    /// Dry recycling (blue bin).
    Recycling,
    /// Garden and food waste (brown bin).
    Compost,
    /// Any other bin, named as the council names it.
    Other(String),
}

impl BinKind {
    /// Ordering used when two collections fall on the same day.
    #[must_use]
    pub fn rank(&self) -> u8 {
        match self {
            BinKind::General => 0,
            BinKind::Recycling => 1,
            BinKind::Compost => 2,
            BinKind::Other(_) => 99,
        }
    }

    /// Display name of the bin.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            BinKind::General => "General",
            BinKind::Recycling => "Recycling",
            BinKind::Compost => "Compost",
            BinKind::Other(name) => name.as_str(),
        }
    }
}

impl fmt::Display for BinKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name())
    }
}

impl Serialize for BinKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Next collection date for a single bin.
pub struct Collection {
    /// Bin being collected.
    #[serde(rename = "type")]
    pub kind: BinKind,
    /// Date of the next collection.
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Parsed contents of a council results panel.
pub struct Schedule {
    /// Short address heading, e.g. `12 Example Street`.
    pub address: String,
    /// Upcoming collections.
    pub collections: Vec<Collection>,
    /// Plain text of the results panel, one text node per line.
    pub panel_text: String,
}

impl Schedule {
    /// Sort collections by date, then by bin rank.
    #[must_use]
    pub fn sorted(mut self) -> Self {
        self.collections
            .sort_by_key(|entry| (entry.date, entry.kind.rank()));
        self
    }
}
