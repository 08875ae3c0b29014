mod aggregate;
mod content;
mod restriction;

pub use aggregate::SeriesAggregate;
pub use content::{CatalogEntry, ContentItem, MediaType, Platform};
pub use restriction::{
    CheckHistoryEntry, ReasonTag, RestrictionCandidate, RestrictionRecord, RestrictionStatus,
    StoreResult, Verdict,
};
