//! `preorder-catalog` — pre-order product records and storefront evaluation.
//!
//! Owns the metadata field codec, the typed `PreorderRecord` view, the
//! derived `PreorderStatus`, and the pure storefront evaluator.

pub mod evaluator;
pub mod meta;
pub mod record;
pub mod status;

pub use evaluator::{Evaluation, ProductKind, evaluate, PREORDER_BUTTON_LABEL};
pub use meta::EditorFields;
pub use record::PreorderRecord;
pub use status::PreorderStatus;
