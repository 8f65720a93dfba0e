//! Per-location stock index over any [`Identity`].
//!
//! Quantities are stored net of reservations. Locations with no row read as
//! zero; only identities that were never imported are errors.

use std::collections::{BTreeMap, HashMap};

use crate::{
    errors::{ImportError, LookupError},
    model::{Identity, LocationId, StockEntry},
};

#[derive(Debug, Clone, Default)]
struct Level {
    on_hand: u64,
    reserved: u64,
}

impl Level {
    fn available(&self) -> u64 {
        self.on_hand.saturating_sub(self.reserved)
    }
}

#[derive(Debug, Clone, Default)]
struct ItemStock {
    levels: BTreeMap<LocationId, Level>,
    total: u64,
}

/// Stock keyed by identity then location.
#[derive(Debug, Clone)]
pub struct StockIndex<Id> {
    primary: LocationId,
    items: HashMap<Id, ItemStock>,
}

impl<Id: Identity> StockIndex<Id> {
    /// An index with no known identities.
    pub fn empty(primary: LocationId) -> Self {
        Self {
            primary,
            items: HashMap::new(),
        }
    }

    /// Builds the index for `known` identities from `entries`.
    ///
    /// Rows for the same (identity, location) are summed.
    ///
    /// Errors: an entry for an identity not in `known`, or a blank location.
    pub fn build<'a>(
        primary: LocationId,
        known: impl IntoIterator<Item = Id>,
        entries: impl IntoIterator<Item = &'a StockEntry<Id>>,
        entity: &'static str,
    ) -> Result<Self, ImportError> {
        let mut items: HashMap<Id, ItemStock> = known
            .into_iter()
            .map(|id| (id, ItemStock::default()))
            .collect();

        for entry in entries {
            if entry.location.is_empty() {
                return Err(ImportError::EmptyLocation {
                    entity,
                    code: entry.code.to_string(),
                });
            }
            let item = items
                .get_mut(&entry.code)
                .ok_or_else(|| ImportError::UnknownReference {
                    entity,
                    code: entry.code.to_string(),
                })?;
            let level = item.levels.entry(entry.location.clone()).or_default();
            level.on_hand = level.on_hand.saturating_add(entry.quantity);
            level.reserved = level.reserved.saturating_add(entry.reserved);
        }

        for item in items.values_mut() {
            item.total = item
                .levels
                .values()
                .fold(0u64, |acc, l| acc.saturating_add(l.available()));
        }

        Ok(Self { primary, items })
    }

    fn item(&self, id: &Id) -> Result<&ItemStock, LookupError> {
        self.items
            .get(id)
            .ok_or_else(|| LookupError::UnknownProduct(id.to_string()))
    }

    /// Location treated as "here" when ordering locations.
    pub fn primary_location(&self) -> &LocationId {
        &self.primary
    }

    /// Net quantity at one location; zero when there is no row.
    pub fn quantity_at(&self, id: &Id, location: &LocationId) -> Result<u64, LookupError> {
        Ok(self
            .item(id)?
            .levels
            .get(location)
            .map_or(0, Level::available))
    }

    /// Units reserved at one location.
    pub fn reserved_at(&self, id: &Id, location: &LocationId) -> Result<u64, LookupError> {
        Ok(self.item(id)?.levels.get(location).map_or(0, |l| l.reserved))
    }

    /// Net quantity across every location.
    pub fn total_quantity(&self, id: &Id) -> Result<u64, LookupError> {
        Ok(self.item(id)?.total)
    }

    /// Locations holding a positive net quantity: primary first, then quantity
    /// descending, then location ascending.
    pub fn locations_with_stock(&self, id: &Id) -> Result<Vec<(LocationId, u64)>, LookupError> {
        let mut out: Vec<(LocationId, u64)> = self
            .item(id)?
            .levels
            .iter()
            .map(|(loc, level)| (loc.clone(), level.available()))
            .filter(|(_, qty)| *qty > 0)
            .collect();
        out.sort_by(|(la, qa), (lb, qb)| {
            (*lb == self.primary)
                .cmp(&(*la == self.primary))
                .then_with(|| qb.cmp(qa))
                .then_with(|| la.cmp(lb))
        });
        Ok(out)
    }

    /// Number of identities the index knows about.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when no identity is known.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
