//! Multi-select pickers with per-item quantities and derived totals.
//!
//! A proposal is assembled by picking catalog entries (products, services)
//! and setting a quantity for each. [`Picker`] owns the ordered selection
//! and, after every mutation:
//!
//! 1. writes the whole list as JSON to a [`SelectionCache`] under the item
//!    type's fixed key, replacing whatever was there;
//! 2. hands the new list to its [`SelectionListener`];
//! 3. recomputes [`SelectionTotals`] and hands those over too.
//!
//! The picker is generic over the catalog entry via [`Selectable`], so
//! products and services share one implementation.

mod catalog;
mod picker;

pub use catalog::{ProductItem, ServiceItem};
pub use picker::{
    MemoryCache, Picker, Quantity, SelectedItem, Selectable, SelectionCache, SelectionError,
    SelectionListener, SelectionTotals, totals,
};
