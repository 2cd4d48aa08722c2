//! Authoritative record of every minted grid position.
//!
//! The ledger keeps all positions in mint order and, separately, the set of
//! positions holding non-zero liquidity. Membership in the active set is an
//! index map into a dense vector, so lookups and removals are O(1).

use grid_lp_domain::entities::{GridPosition, PositionId};
use grid_lp_domain::error::{GridError, Result};
use std::collections::HashMap;

/// Positions owned by one grid manager.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionLedger {
    positions: HashMap<PositionId, GridPosition>,
    /// Mint order.
    order: Vec<PositionId>,
    by_range: HashMap<(i32, i32), PositionId>,
    active: Vec<PositionId>,
    /// Slot of each active id in `active`.
    active_slots: HashMap<PositionId, usize>,
}

impl PositionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the position covering exactly `[tick_lower, tick_upper)`, active or not.
    pub fn find(&self, tick_lower: i32, tick_upper: i32) -> Option<PositionId> {
        self.by_range.get(&(tick_lower, tick_upper)).copied()
    }

    /// Adds `liquidity_delta` to position `id`, tracking it first if it is new.
    ///
    /// A known id must keep its range, and a range may only ever map to one id.
    /// Activates the position when its liquidity becomes non-zero.
    pub fn upsert(
        &mut self,
        id: PositionId,
        tick_lower: i32,
        tick_upper: i32,
        liquidity_delta: u128,
    ) -> Result<PositionId> {
        if tick_lower >= tick_upper {
            return Err(GridError::InvariantViolation(format!(
                "position {id} has inverted range [{tick_lower}, {tick_upper})"
            )));
        }

        match self.positions.get_mut(&id) {
            Some(position) => {
                if (position.tick_lower, position.tick_upper) != (tick_lower, tick_upper) {
                    return Err(GridError::InvariantViolation(format!(
                        "position {id} is tracked with range [{}, {})",
                        position.tick_lower, position.tick_upper
                    )));
                }
                position.liquidity = position
                    .liquidity
                    .checked_add(liquidity_delta)
                    .ok_or(GridError::InvalidAmount("position liquidity overflow"))?;
            }
            None => {
                if let Some(existing) = self.find(tick_lower, tick_upper) {
                    return Err(GridError::InvariantViolation(format!(
                        "range [{tick_lower}, {tick_upper}) already held by position {existing}"
                    )));
                }
                self.positions.insert(
                    id,
                    GridPosition::new(id, tick_lower, tick_upper, liquidity_delta),
                );
                self.order.push(id);
                self.by_range.insert((tick_lower, tick_upper), id);
            }
        }

        if self.liquidity(id) > 0 {
            self.activate(id)?;
        }
        self.check_position(id)?;
        Ok(id)
    }

    /// Removes `liquidity_delta` from position `id`; returns what remains.
    ///
    /// Deactivates the position when it reaches zero.
    pub fn decrease(&mut self, id: PositionId, liquidity_delta: u128) -> Result<u128> {
        let position = self
            .positions
            .get_mut(&id)
            .ok_or(GridError::PositionNotFound(id))?;
        let held = position.liquidity;
        let remaining = held.checked_sub(liquidity_delta).ok_or_else(|| {
            GridError::InvariantViolation(format!(
                "position {id} holds {held} liquidity, cannot remove {liquidity_delta}"
            ))
        })?;
        position.liquidity = remaining;

        if remaining == 0 {
            self.deactivate(id)?;
        }
        self.check_position(id)?;
        Ok(remaining)
    }

    /// Adds `id` to the active set. No-op if it is already there.
    pub fn activate(&mut self, id: PositionId) -> Result<()> {
        if !self.positions.contains_key(&id) {
            return Err(GridError::PositionNotFound(id));
        }
        if self.active_slots.contains_key(&id) {
            return Ok(());
        }
        self.active_slots.insert(id, self.active.len());
        self.active.push(id);
        Ok(())
    }

    /// Removes `id` from the active set by swap-remove. No-op if absent.
    pub fn deactivate(&mut self, id: PositionId) -> Result<()> {
        if !self.positions.contains_key(&id) {
            return Err(GridError::PositionNotFound(id));
        }
        let Some(slot) = self.active_slots.remove(&id) else {
            return Ok(());
        };
        self.active.swap_remove(slot);
        if let Some(moved) = self.active.get(slot) {
            self.active_slots.insert(*moved, slot);
        }
        Ok(())
    }

    pub fn is_active(&self, id: PositionId) -> bool {
        self.active_slots.contains_key(&id)
    }

    pub fn get(&self, id: PositionId) -> Option<&GridPosition> {
        self.positions.get(&id)
    }

    pub fn position(&self, id: PositionId) -> Result<&GridPosition> {
        self.get(id).ok_or(GridError::PositionNotFound(id))
    }

    /// Position at `index` in mint order.
    pub fn position_at(&self, index: usize) -> Option<&GridPosition> {
        self.order.get(index).and_then(|id| self.positions.get(id))
    }

    /// All positions in mint order.
    pub fn all(&self) -> impl Iterator<Item = &GridPosition> {
        self.order.iter().filter_map(|id| self.positions.get(id))
    }

    /// Ids of active positions. Order is unspecified.
    pub fn active(&self) -> &[PositionId] {
        &self.active
    }

    pub fn active_positions(&self) -> impl Iterator<Item = &GridPosition> {
        self.active.iter().filter_map(|id| self.positions.get(id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    /// Forgets every position.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn liquidity(&self, id: PositionId) -> u128 {
        self.positions.get(&id).map_or(0, |p| p.liquidity)
    }

    /// `is_active(id) <=> liquidity(id) > 0` for one position.
    pub fn check_position(&self, id: PositionId) -> Result<()> {
        let liquidity = self.position(id)?.liquidity;
        if self.is_active(id) != (liquidity > 0) {
            return Err(GridError::InvariantViolation(format!(
                "position {id} has liquidity {liquidity} but active={}",
                self.is_active(id)
            )));
        }
        Ok(())
    }

    /// Checks the membership invariant and the internal indexes for every position.
    pub fn check_invariant(&self) -> Result<()> {
        for id in &self.order {
            self.check_position(*id)?;
        }
        for (slot, id) in self.active.iter().enumerate() {
            if self.active_slots.get(id) != Some(&slot) {
                return Err(GridError::InvariantViolation(format!(
                    "active slot of position {id} is stale"
                )));
            }
        }
        if self.active_slots.len() != self.active.len()
            || self.by_range.len() != self.positions.len()
            || self.order.len() != self.positions.len()
        {
            return Err(GridError::InvariantViolation(
                "ledger indexes out of sync".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_mints_then_increases() {
        let mut ledger = PositionLedger::new();
        ledger.upsert(PositionId(1), 100, 200, 50).unwrap();
        assert_eq!(ledger.find(100, 200), Some(PositionId(1)));
        assert!(ledger.is_active(PositionId(1)));

        ledger.upsert(PositionId(1), 100, 200, 25).unwrap();
        assert_eq!(ledger.position(PositionId(1)).unwrap().liquidity, 75);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_zero_liquidity_mint_stays_inactive() {
        let mut ledger = PositionLedger::new();
        ledger.upsert(PositionId(1), 100, 200, 0).unwrap();
        assert!(!ledger.is_active(PositionId(1)));
        ledger.check_invariant().unwrap();
    }

    #[test]
    fn test_range_conflicts_rejected() {
        let mut ledger = PositionLedger::new();
        ledger.upsert(PositionId(1), 100, 200, 50).unwrap();
        assert!(matches!(
            ledger.upsert(PositionId(2), 100, 200, 10),
            Err(GridError::InvariantViolation(_))
        ));
        assert!(matches!(
            ledger.upsert(PositionId(1), 100, 300, 10),
            Err(GridError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_decrease_to_zero_deactivates() {
        let mut ledger = PositionLedger::new();
        ledger.upsert(PositionId(1), 100, 200, 50).unwrap();
        assert_eq!(ledger.decrease(PositionId(1), 20).unwrap(), 30);
        assert!(ledger.is_active(PositionId(1)));
        assert_eq!(ledger.decrease(PositionId(1), 30).unwrap(), 0);
        assert!(!ledger.is_active(PositionId(1)));

        // Still tracked and reusable for the same range.
        assert_eq!(ledger.find(100, 200), Some(PositionId(1)));
        ledger.upsert(PositionId(1), 100, 200, 5).unwrap();
        assert!(ledger.is_active(PositionId(1)));
    }

    #[test]
    fn test_over_decrease_rejected() {
        let mut ledger = PositionLedger::new();
        ledger.upsert(PositionId(1), 100, 200, 10).unwrap();
        assert!(matches!(
            ledger.decrease(PositionId(1), 11),
            Err(GridError::InvariantViolation(_))
        ));
        assert_eq!(
            ledger.decrease(PositionId(9), 1),
            Err(GridError::PositionNotFound(PositionId(9)))
        );
    }

    #[test]
    fn test_swap_remove_keeps_slots_consistent() {
        let mut ledger = PositionLedger::new();
        for i in 0..5 {
            ledger
                .upsert(PositionId(i), i as i32 * 10, i as i32 * 10 + 10, 1)
                .unwrap();
        }
        ledger.decrease(PositionId(1), 1).unwrap();
        ledger.decrease(PositionId(3), 1).unwrap();
        ledger.check_invariant().unwrap();

        let mut active = ledger.active().to_vec();
        active.sort();
        assert_eq!(active, vec![PositionId(0), PositionId(2), PositionId(4)]);
    }

    #[test]
    fn test_manual_deactivation_breaks_invariant() {
        let mut ledger = PositionLedger::new();
        ledger.upsert(PositionId(1), 100, 200, 10).unwrap();
        ledger.deactivate(PositionId(1)).unwrap();
        assert!(matches!(
            ledger.check_invariant(),
            Err(GridError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_mint_order_and_clear() {
        let mut ledger = PositionLedger::new();
        ledger.upsert(PositionId(7), 0, 10, 1).unwrap();
        ledger.upsert(PositionId(3), 10, 20, 1).unwrap();
        assert_eq!(ledger.position_at(0).unwrap().id, PositionId(7));
        assert_eq!(ledger.position_at(1).unwrap().id, PositionId(3));
        assert!(ledger.position_at(2).is_none());

        ledger.clear();
        assert!(ledger.is_empty());
        assert_eq!(ledger.active_len(), 0);
    }
}
