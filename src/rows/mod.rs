//! Resource rows: hierarchy flattening, keyed diffing and the row store.

mod flatten;
mod reconcile;
mod store;

pub use flatten::{compute_row_spans, flatten_resources, ExpansionState, FlatResource};
pub use reconcile::{reconcile, RowAction, RowPlan};
pub use store::{CommitReport, ResourceRow, ResourceRowStore, RowHandles};
