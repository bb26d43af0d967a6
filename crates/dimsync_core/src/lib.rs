//! Dimsync core: record normalization, dimension extraction and product
//! classification. Pure functions only; all IO lives in `dimsync_engine`.
mod classify;
mod dimensions;
pub mod lookup;
mod markup;
mod publish;
mod record;

pub use classify::{Classifier, ClassifierRules, Rejection};
pub use dimensions::{
    match_description, AttributeKey, DimensionResolver, DimensionResult, DimensionRules,
    ResolvedDimensions,
};
pub use markup::{collapse_whitespace, strip_markup};
pub use publish::{assemble_rows, edit_link, PublishedRow, PublishedSheet, PUBLISHED_HEADER};
pub use record::{
    normalize, normalize_all, parse_add_date, NormalizeOptions, ProductRecord, DATE_FORMAT,
};
