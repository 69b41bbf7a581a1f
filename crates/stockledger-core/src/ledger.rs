//! # Stock Mutation Engine
//!
//! The single authority on how each transaction type moves stock between
//! the three pools.
//!
//! ## Pool-Delta Table
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Type                 available   borrowed   under_maintenance          │
//! │  ───────────────────  ─────────   ────────   ─────────────────          │
//! │  IN                      +q           0              0                  │
//! │  OUT                     -q           0              0                  │
//! │  BORROW                  -q          +q              0                  │
//! │  RETURN                  +q          -q              0                  │
//! │  MAINTENANCE             -q           0             +q                  │
//! │  MAINTENANCE_RETURN      +q           0             -q                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `apply` is linear in the quantity: a negative quantity runs a row
//! backwards, and `apply(+q)` followed by `apply(-q)` is the identity.
//! Adding a transaction type means adding a row here, not a new branch.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::{Pool, StockBalance, TransactionType};
use crate::MAX_POOL_LEVEL;

// =============================================================================
// Pool Delta
// =============================================================================

/// Signed per-pool change for one unit of a movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolDelta {
    pub available: i64,
    pub borrowed: i64,
    pub under_maintenance: i64,
}

impl PoolDelta {
    pub const ZERO: PoolDelta = PoolDelta::new(0, 0, 0);

    pub const fn new(available: i64, borrowed: i64, under_maintenance: i64) -> Self {
        PoolDelta {
            available,
            borrowed,
            under_maintenance,
        }
    }

    /// This row multiplied by a signed quantity, or `None` on overflow.
    #[inline]
    pub fn checked_scaled(self, quantity: i64) -> Option<Self> {
        Some(PoolDelta {
            available: self.available.checked_mul(quantity)?,
            borrowed: self.borrowed.checked_mul(quantity)?,
            under_maintenance: self.under_maintenance.checked_mul(quantity)?,
        })
    }

    /// Change for one pool.
    #[inline]
    pub const fn get(self, pool: Pool) -> i64 {
        match pool {
            Pool::Available => self.available,
            Pool::Borrowed => self.borrowed,
            Pool::UnderMaintenance => self.under_maintenance,
        }
    }

    /// The pool a positive movement draws from, if any.
    ///
    /// Every row decrements at most one pool; IN decrements none.
    pub fn drawn_pool(self) -> Option<Pool> {
        POOLS.into_iter().find(|pool| self.get(*pool) < 0)
    }
}

const POOLS: [Pool; 3] = [Pool::Available, Pool::Borrowed, Pool::UnderMaintenance];

/// Pool-delta rows indexed by [`TransactionType::ALL`] order.
pub const POOL_DELTAS: [PoolDelta; 6] = [
    PoolDelta::new(1, 0, 0),   // IN
    PoolDelta::new(-1, 0, 0),  // OUT
    PoolDelta::new(-1, 1, 0),  // BORROW
    PoolDelta::new(1, -1, 0),  // RETURN
    PoolDelta::new(-1, 0, 1),  // MAINTENANCE
    PoolDelta::new(1, 0, -1),  // MAINTENANCE_RETURN
];

impl TransactionType {
    /// Unit pool-delta row for this type.
    #[inline]
    pub const fn pool_delta(self) -> PoolDelta {
        POOL_DELTAS[self.index()]
    }
}

// =============================================================================
// Apply
// =============================================================================

/// Applies `quantity` units of `ty` to `balance`.
///
/// `quantity` may be negative (reconciliation). Fails with
/// [`CoreError::StockUnderflow`] instead of producing a negative counter
/// and with [`CoreError::StockOverflow`] past [`MAX_POOL_LEVEL`]; the input
/// balance is never modified.
pub fn apply(balance: &StockBalance, ty: TransactionType, quantity: i64) -> CoreResult<StockBalance> {
    let row = ty.pool_delta();
    let mut next = [0i64; 3];

    for (slot, pool) in next.iter_mut().zip(POOLS) {
        let current = balance.get(pool);
        let change = row.get(pool).saturating_mul(quantity);
        let moved = row
            .get(pool)
            .checked_mul(quantity)
            .and_then(|change| current.checked_add(change));

        *slot = match moved {
            Some(value) if value < 0 => {
                return Err(CoreError::StockUnderflow { pool, current, change })
            }
            Some(value) if value <= MAX_POOL_LEVEL => value,
            None if change < 0 => {
                return Err(CoreError::StockUnderflow { pool, current, change })
            }
            _ => return Err(CoreError::StockOverflow { pool, current, change }),
        };
    }

    let [available, borrowed, under_maintenance] = next;
    Ok(StockBalance {
        item_id: balance.item_id.clone(),
        warehouse_id: balance.warehouse_id.clone(),
        available,
        borrowed,
        under_maintenance,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn balance(available: i64, borrowed: i64, under_maintenance: i64) -> StockBalance {
        StockBalance {
            item_id: "item".to_string(),
            warehouse_id: "wh".to_string(),
            available,
            borrowed,
            under_maintenance,
        }
    }

    #[test]
    fn test_table_rows() {
        assert_eq!(TransactionType::In.pool_delta(), PoolDelta::new(1, 0, 0));
        assert_eq!(TransactionType::Out.pool_delta(), PoolDelta::new(-1, 0, 0));
        assert_eq!(TransactionType::Borrow.pool_delta(), PoolDelta::new(-1, 1, 0));
        assert_eq!(TransactionType::Return.pool_delta(), PoolDelta::new(1, -1, 0));
        assert_eq!(
            TransactionType::Maintenance.pool_delta(),
            PoolDelta::new(-1, 0, 1)
        );
        assert_eq!(
            TransactionType::MaintenanceReturn.pool_delta(),
            PoolDelta::new(1, 0, -1)
        );
    }

    #[test]
    fn test_drawn_pool() {
        assert_eq!(TransactionType::In.pool_delta().drawn_pool(), None);
        assert_eq!(
            TransactionType::Out.pool_delta().drawn_pool(),
            Some(Pool::Available)
        );
        assert_eq!(
            TransactionType::Return.pool_delta().drawn_pool(),
            Some(Pool::Borrowed)
        );
        assert_eq!(
            TransactionType::MaintenanceReturn.pool_delta().drawn_pool(),
            Some(Pool::UnderMaintenance)
        );
    }

    #[test]
    fn test_borrow_then_return() {
        let start = balance(10, 0, 0);
        let borrowed = apply(&start, TransactionType::Borrow, 4).unwrap();
        assert_eq!(borrowed, balance(6, 4, 0));

        let returned = apply(&borrowed, TransactionType::Return, 4).unwrap();
        assert_eq!(returned, start);
    }

    #[test]
    fn test_negative_quantity_reverses() {
        let start = balance(8, 0, 0);
        // Shrinking an OUT line from 8 to 3 gives 5 units back.
        let after = apply(&start, TransactionType::Out, -5).unwrap();
        assert_eq!(after.available, 13);
    }

    #[test]
    fn test_underflow_is_rejected() {
        let err = apply(&balance(2, 0, 0), TransactionType::Out, 3).unwrap_err();
        assert!(matches!(
            err,
            CoreError::StockUnderflow {
                pool: Pool::Available,
                current: 2,
                change: -3
            }
        ));

        // Reversing an IN whose stock already left.
        let err = apply(&balance(1, 0, 0), TransactionType::In, -5).unwrap_err();
        assert!(matches!(err, CoreError::StockUnderflow { .. }));
    }

    #[test]
    fn test_overflow_is_rejected() {
        let err = apply(&balance(MAX_POOL_LEVEL, 0, 0), TransactionType::In, 1).unwrap_err();
        assert!(matches!(
            err,
            CoreError::StockOverflow {
                pool: Pool::Available,
                current: MAX_POOL_LEVEL,
                change: 1
            }
        ));

        // Extreme quantities report instead of wrapping or panicking.
        let err = apply(&balance(5, 0, 0), TransactionType::In, i64::MAX).unwrap_err();
        assert!(matches!(err, CoreError::StockOverflow { .. }));
        let err = apply(&balance(5, 0, 0), TransactionType::Out, i64::MIN).unwrap_err();
        assert!(matches!(err, CoreError::StockOverflow { .. }));
        let err = apply(&balance(5, 0, 0), TransactionType::Out, i64::MAX).unwrap_err();
        assert!(matches!(err, CoreError::StockUnderflow { .. }));
        let err = apply(&balance(5, 5, 0), TransactionType::Return, i64::MIN).unwrap_err();
        assert!(matches!(err, CoreError::StockUnderflow { .. } | CoreError::StockOverflow { .. }));
    }

    #[test]
    fn test_checked_scaled() {
        assert_eq!(
            TransactionType::Borrow.pool_delta().checked_scaled(3),
            Some(PoolDelta::new(-3, 3, 0))
        );
        assert_eq!(TransactionType::Out.pool_delta().checked_scaled(i64::MIN), None);
    }

    fn any_type() -> impl Strategy<Value = TransactionType> {
        prop::sample::select(TransactionType::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn prop_apply_then_inverse_is_identity(
            ty in any_type(),
            q in 0i64..1_000,
            available in 1_000i64..5_000,
            borrowed in 1_000i64..5_000,
            under_maintenance in 1_000i64..5_000,
        ) {
            let start = balance(available, borrowed, under_maintenance);
            let forward = apply(&start, ty, q).unwrap();
            let back = apply(&forward, ty, -q).unwrap();
            prop_assert_eq!(back, start);
        }

        #[test]
        fn prop_apply_composes(
            ty in any_type(),
            a in -500i64..500,
            b in -500i64..500,
        ) {
            let start = balance(5_000, 5_000, 5_000);
            let stepwise = apply(&apply(&start, ty, a).unwrap(), ty, b).unwrap();
            let at_once = apply(&start, ty, a + b).unwrap();
            prop_assert_eq!(stepwise, at_once);
        }

        #[test]
        fn prop_apply_never_goes_negative(
            ty in any_type(),
            q in -50i64..50,
            available in 0i64..30,
            borrowed in 0i64..30,
            under_maintenance in 0i64..30,
        ) {
            if let Ok(after) = apply(&balance(available, borrowed, under_maintenance), ty, q) {
                prop_assert!(after.available >= 0);
                prop_assert!(after.borrowed >= 0);
                prop_assert!(after.under_maintenance >= 0);
            }
        }
    }
}
