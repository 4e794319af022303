//! Cascading option selection over a product's variants.
//!
//! Variants encode their option values positionally (`"Black / 4K / PoE"`).
//! Choosing a value at one position narrows the values offered at every later
//! position to those that still lead to a real variant.

use crate::types::{OPTION_SEPARATOR, Product, VariantId};

/// Option values of every variant of one product, indexed by position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionMatrix {
    rows: Vec<(VariantId, Vec<String>)>,
    width: usize,
}

impl OptionMatrix {
    /// Build the matrix from a product's variants. Variants without option
    /// values are ignored.
    #[must_use]
    pub fn new(product: &Product) -> Self {
        let rows: Vec<(VariantId, Vec<String>)> = product
            .variants
            .iter()
            .map(|v| {
                let values = v
                    .option_values()
                    .into_iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>();
                (v.id.clone(), values)
            })
            .filter(|(_, values)| !values.is_empty())
            .collect();
        let width = rows.iter().map(|(_, values)| values.len()).max().unwrap_or(0);
        Self { rows, width }
    }

    /// Number of option positions.
    #[must_use]
    pub const fn option_count(&self) -> usize {
        self.width
    }

    /// Every distinct value at a position, in first-seen order.
    fn all_values_at(&self, index: usize) -> Vec<String> {
        let mut values: Vec<String> = Vec::new();
        for (_, row) in &self.rows {
            if let Some(value) = row.get(index)
                && !values.contains(value)
            {
                values.push(value.clone());
            }
        }
        values
    }

    /// Values at `index` compatible with the selections at earlier positions.
    ///
    /// Empty selections act as wildcards. When nothing is compatible, every
    /// value at the position is returned so the picker never goes blank.
    #[must_use]
    pub fn values_at(&self, index: usize, selections: &[String]) -> Vec<String> {
        let mut values: Vec<String> = Vec::new();
        for (_, row) in &self.rows {
            let compatible = selections
                .iter()
                .take(index)
                .enumerate()
                .all(|(i, chosen)| chosen.is_empty() || row.get(i) == Some(chosen));
            if !compatible {
                continue;
            }
            if let Some(value) = row.get(index)
                && !values.contains(value)
            {
                values.push(value.clone());
            }
        }

        if values.is_empty() {
            self.all_values_at(index)
        } else {
            values
        }
    }

    /// Set the value at `index` and reset every later position to its first
    /// valid value.
    #[must_use]
    pub fn select(&self, selections: &[String], index: usize, value: &str) -> Vec<String> {
        let mut next: Vec<String> = selections.to_vec();
        next.resize(self.width.max(index + 1), String::new());
        if let Some(slot) = next.get_mut(index) {
            value.clone_into(slot);
        }

        for i in (index + 1)..next.len() {
            let first = self.values_at(i, &next).into_iter().next().unwrap_or_default();
            if let Some(slot) = next.get_mut(i) {
                *slot = first;
            }
        }
        next
    }

    /// Variant whose options equal the selections exactly.
    #[must_use]
    pub fn resolve(&self, selections: &[String]) -> Option<&VariantId> {
        let wanted = selections.join(OPTION_SEPARATOR);
        self.rows
            .iter()
            .find(|(_, row)| row.join(OPTION_SEPARATOR) == wanted)
            .map(|(id, _)| id)
    }

    /// Selections of the first variant, or the first value at each position.
    #[must_use]
    pub fn initial_selections(&self) -> Vec<String> {
        if let Some((_, row)) = self.rows.first() {
            return row.clone();
        }
        (0..self.width)
            .map(|i| self.all_values_at(i).into_iter().next().unwrap_or_default())
            .collect()
    }
}
