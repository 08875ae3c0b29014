mod classify;
mod http;
mod outcome;
mod resolver;

pub use classify::{decisive_index, Classification, ClassificationPolicy};
pub use http::{GeoProbe, HttpProbe};
pub use outcome::Outcome;
pub use resolver::{PlatformResolvers, ProbeKind, ProbeTarget, ProbeTargetResolver, DEFAULT_LANGUAGE};
