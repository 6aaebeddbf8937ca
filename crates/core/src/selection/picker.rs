use std::collections::HashMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::Money;

/// A catalog entry that can be picked into a proposal.
pub trait Selectable: Clone + Serialize + DeserializeOwned {
    type Id: Copy + Eq + fmt::Debug;

    /// Cache key the selection is mirrored under.
    const CACHE_KEY: &'static str;

    /// Whether [`SelectionTotals::total_profit`] is reported for this type.
    const TRACKS_PROFIT: bool = false;

    fn id(&self) -> Self::Id;

    /// Price charged for one unit.
    fn unit_price(&self) -> Money;

    /// Margin earned on one unit, `None` if it cannot be represented. Only
    /// read when `TRACKS_PROFIT` is set.
    fn unit_profit(&self) -> Option<Money> {
        Some(Money::ZERO)
    }
}

/// Number of units of a selected item. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    pub const ONE: Self = Self(1);

    /// Zero falls back to one, like the quantity input's default.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        if value == 0 { Self::ONE } else { Self(value) }
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ONE
    }
}

impl From<u32> for Quantity {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl From<Quantity> for u32 {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}

/// One line of a selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub struct SelectedItem<T> {
    pub item: T,
    #[serde(default)]
    pub quantity: Quantity,
}

impl<T: Selectable> SelectedItem<T> {
    #[must_use]
    pub fn new(item: T, quantity: Quantity) -> Self {
        Self { item, quantity }
    }

    /// Unit price times quantity, `None` on overflow.
    #[must_use]
    pub fn line_price(&self) -> Option<Money> {
        self.item.unit_price().checked_times(self.quantity.get())
    }

    fn line_profit(&self) -> Option<Money> {
        self.item.unit_profit()?.checked_times(self.quantity.get())
    }
}

/// Aggregates derived from a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SelectionTotals {
    pub total_price: Money,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub total_profit: Option<Money>,
}

/// Compute totals over a selection.
///
/// # Errors
///
/// Returns `SelectionError::Overflow` if a line or a total does not fit in a
/// decimal.
pub fn totals<T: Selectable>(
    items: &[SelectedItem<T>],
) -> Result<SelectionTotals, SelectionError> {
    let total_price = items
        .iter()
        .map(SelectedItem::line_price)
        .try_fold(Money::ZERO, |sum, line| sum.checked_add(line?))
        .ok_or(SelectionError::Overflow)?;

    let total_profit = if T::TRACKS_PROFIT {
        let profit = items
            .iter()
            .map(SelectedItem::line_profit)
            .try_fold(Money::ZERO, |sum, line| sum.checked_add(line?))
            .ok_or(SelectionError::Overflow)?;
        Some(profit)
    } else {
        None
    };

    Ok(SelectionTotals {
        total_price,
        total_profit,
    })
}

/// Key-value store the selection is mirrored into.
pub trait SelectionCache {
    fn write(&mut self, key: &'static str, value: String);
}

/// Receives the selection and its totals after every change.
pub trait SelectionListener<T> {
    fn items_changed(&mut self, items: &[SelectedItem<T>]);
    fn totals_changed(&mut self, totals: SelectionTotals);
}

impl<T> SelectionListener<T> for () {
    fn items_changed(&mut self, _items: &[SelectedItem<T>]) {}
    fn totals_changed(&mut self, _totals: SelectionTotals) {}
}

/// In-process [`SelectionCache`].
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    entries: HashMap<&'static str, String>,
}

impl MemoryCache {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Remove and return an entry.
    pub fn take(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }
}

impl SelectionCache for MemoryCache {
    fn write(&mut self, key: &'static str, value: String) {
        self.entries.insert(key, value);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SelectionError {
    #[error("failed to serialize selection: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("selection total is too large")]
    Overflow,
}

/// Ordered selection of `T` with quantities.
pub struct Picker<T, C, L> {
    items: Vec<SelectedItem<T>>,
    totals: SelectionTotals,
    cache: C,
    listener: L,
}

impl<T, C, L> Picker<T, C, L>
where
    T: Selectable,
    C: SelectionCache,
    L: SelectionListener<T>,
{
    /// Seed the picker from the parent's list and publish it once.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError::Overflow` if the list's totals do not fit.
    /// Returns `SelectionError::Serialize` if the list cannot be encoded.
    pub fn new(
        initial: Vec<SelectedItem<T>>,
        cache: C,
        listener: L,
    ) -> Result<Self, SelectionError> {
        let mut picker = Self {
            items: Vec::new(),
            totals: SelectionTotals::default(),
            cache,
            listener,
        };
        picker.commit(initial)?;
        Ok(picker)
    }

    #[must_use]
    pub fn items(&self) -> &[SelectedItem<T>] {
        &self.items
    }

    #[must_use]
    pub fn contains(&self, id: T::Id) -> bool {
        self.items.iter().any(|line| line.item.id() == id)
    }

    /// Totals of the current list. Always representable: the list only
    /// changes once its totals have been computed.
    #[must_use]
    pub const fn totals(&self) -> SelectionTotals {
        self.totals
    }

    /// Remove `item` if selected, otherwise append it with quantity one.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError::Overflow` if the new totals do not fit; the
    /// selection is left as it was.
    /// Returns `SelectionError::Serialize` if the list cannot be encoded.
    pub fn toggle(&mut self, item: T) -> Result<(), SelectionError> {
        let id = item.id();
        let mut next = self.items.clone();
        if self.contains(id) {
            next.retain(|line| line.item.id() != id);
        } else {
            next.push(SelectedItem::new(item, Quantity::ONE));
        }
        self.commit(next)
    }

    /// Replace the quantity of the entry with `id`. Unknown ids change nothing.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError::Overflow` if the new totals do not fit; the
    /// selection is left as it was.
    /// Returns `SelectionError::Serialize` if the list cannot be encoded.
    pub fn set_quantity(&mut self, id: T::Id, quantity: Quantity) -> Result<(), SelectionError> {
        let mut next = self.items.clone();
        for line in next.iter_mut().filter(|line| line.item.id() == id) {
            line.quantity = quantity;
        }
        self.commit(next)
    }

    /// Drop the entry with `id`.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError::Overflow` if the remaining totals do not fit.
    /// Returns `SelectionError::Serialize` if the list cannot be encoded.
    pub fn remove(&mut self, id: T::Id) -> Result<(), SelectionError> {
        let mut next = self.items.clone();
        next.retain(|line| line.item.id() != id);
        self.commit(next)
    }

    /// Give back the cache and listener.
    pub fn into_parts(self) -> (Vec<SelectedItem<T>>, C, L) {
        (self.items, self.cache, self.listener)
    }

    /// Replace the list with `next` and publish it. Nothing is replaced or
    /// written when `next` cannot be totalled or encoded.
    fn commit(&mut self, next: Vec<SelectedItem<T>>) -> Result<(), SelectionError> {
        let totals = totals(&next)?;
        let encoded = serde_json::to_string(&next)?;

        self.items = next;
        self.totals = totals;
        self.cache.write(T::CACHE_KEY, encoded);
        self.listener.items_changed(&self.items);
        tracing::debug!(
            key = T::CACHE_KEY,
            lines = self.items.len(),
            total_price = %totals.total_price,
            "selection changed"
        );
        self.listener.totals_changed(totals);
        Ok(())
    }
}
