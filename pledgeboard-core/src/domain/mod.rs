//! Domain types shared by every crate in the workspace.

pub mod bundle;
pub mod price_table;

pub use bundle::Bundle;
pub use price_table::{DividendEvent, PriceTable, PriceTableError};
