//! # Movement Rules
//!
//! Decides whether a movement is legal for an item given its category and
//! the balance as it stands *before* the movement. Pure: no reads beyond
//! the balance handed in, no writes.
//!
//! ## Checks
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Category   item.category.admits(type)?    else InvalidTransactionType│
//! │                                                                         │
//! │  2. Sufficiency (positive quantities only), against the drawn pool:     │
//! │       OUT / BORROW / MAINTENANCE   available >= q   InsufficientStock   │
//! │       RETURN                       borrowed  >= q   OverReturn          │
//! │       MAINTENANCE_RETURN           under_m.  >= q   InsufficientMaint.. │
//! │       IN                           (none)                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A missing balance row is a zero balance, so any drawing movement against
//! it fails sufficiency.

use crate::error::{CoreError, CoreResult};
use crate::types::{Item, Pool, Role, StockBalance, TransactionType, User, Warehouse};

/// Category compatibility alone.
pub fn check_category(item: &Item, ty: TransactionType) -> CoreResult<()> {
    if item.category.admits(ty) {
        Ok(())
    } else {
        Err(CoreError::InvalidTransactionType {
            item_code: item.code.clone(),
            category: item.category,
            transaction_type: ty,
        })
    }
}

/// Full check for a new movement of `quantity` (> 0) units.
pub fn check_movement(
    item: &Item,
    ty: TransactionType,
    balance: &StockBalance,
    quantity: i64,
) -> CoreResult<()> {
    check_category(item, ty)?;

    let Some(pool) = ty.pool_delta().drawn_pool() else {
        return Ok(());
    };

    let current = balance.get(pool);
    if current >= quantity {
        return Ok(());
    }

    let item_code = item.code.clone();
    Err(match pool {
        Pool::Available => CoreError::InsufficientStock {
            item_code,
            available: current,
            requested: quantity,
        },
        Pool::Borrowed => CoreError::OverReturn {
            item_code,
            borrowed: current,
            requested: quantity,
        },
        Pool::UnderMaintenance => CoreError::InsufficientMaintenanceStock {
            item_code,
            under_maintenance: current,
            requested: quantity,
        },
    })
}

/// Check for a reconciliation delta (`new - old`).
///
/// Category is always checked. Sufficiency is only checked for increases;
/// a decrease hands stock back and is left to the mutation engine's
/// non-negativity guard.
pub fn check_delta(
    item: &Item,
    ty: TransactionType,
    balance: &StockBalance,
    delta: i64,
) -> CoreResult<()> {
    if delta > 0 {
        check_movement(item, ty, balance, delta)
    } else {
        check_category(item, ty)
    }
}

// =============================================================================
// Warehouse Resolution
// =============================================================================

/// Picks the warehouse a user acts on.
///
/// - Operators act on the warehouse they own; asking for another one is
///   denied.
/// - Elevated users act on `explicit` when given, else on their own.
/// - No fallback warehouse: anything else is `NoWarehouseAssigned`.
pub fn resolve_acting_warehouse<'a>(
    user: &User,
    bound: Option<&'a Warehouse>,
    explicit: Option<&'a Warehouse>,
) -> CoreResult<&'a Warehouse> {
    let no_warehouse = || CoreError::NoWarehouseAssigned {
        user_id: user.id.clone(),
    };

    match user.role {
        Role::Superadmin => explicit.or(bound).ok_or_else(no_warehouse),
        Role::Operator => {
            let bound = bound.ok_or_else(no_warehouse)?;
            match explicit {
                Some(requested) if requested.id != bound.id => {
                    Err(CoreError::WarehouseAccessDenied {
                        user_id: user.id.clone(),
                        warehouse_id: requested.id.clone(),
                    })
                }
                _ => Ok(bound),
            }
        }
    }
}

/// Whether `user` may administer `warehouse` directly.
pub fn check_warehouse_access(user: &User, warehouse: &Warehouse) -> CoreResult<()> {
    if user.role.is_elevated() || warehouse.owner_id.as_deref() == Some(user.id.as_str()) {
        Ok(())
    } else {
        Err(CoreError::WarehouseAccessDenied {
            user_id: user.id.clone(),
            warehouse_id: warehouse.id.clone(),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::apply;
    use crate::types::ItemCategory;
    use chrono::Utc;
    use proptest::prelude::*;

    fn item(category: ItemCategory) -> Item {
        Item {
            id: "item-1".to_string(),
            code: "PRJ-01".to_string(),
            name: "Projector".to_string(),
            category,
            unit_id: None,
            image_path: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn balance(available: i64, borrowed: i64, under_maintenance: i64) -> StockBalance {
        StockBalance {
            item_id: "item-1".to_string(),
            warehouse_id: "wh-1".to_string(),
            available,
            borrowed,
            under_maintenance,
        }
    }

    fn user(id: &str, role: Role) -> User {
        User {
            id: id.to_string(),
            name: id.to_string(),
            role,
        }
    }

    fn warehouse(id: &str, owner: Option<&str>) -> Warehouse {
        Warehouse {
            id: id.to_string(),
            name: id.to_string(),
            owner_id: owner.map(str::to_string),
        }
    }

    #[test]
    fn test_category_mismatch() {
        let consumable = item(ItemCategory::Consumable);
        let err = check_movement(&consumable, TransactionType::Borrow, &balance(10, 0, 0), 1)
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransactionType { .. }));

        let asset = item(ItemCategory::Asset);
        let err =
            check_movement(&asset, TransactionType::Out, &balance(10, 0, 0), 1).unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransactionType { .. }));
    }

    #[test]
    fn test_sufficiency_errors() {
        let asset = item(ItemCategory::Asset);
        let empty = balance(0, 0, 0);

        assert!(check_movement(&asset, TransactionType::In, &empty, 50).is_ok());
        assert!(matches!(
            check_movement(&asset, TransactionType::Borrow, &empty, 1),
            Err(CoreError::InsufficientStock { .. })
        ));
        assert!(matches!(
            check_movement(&asset, TransactionType::Return, &empty, 1),
            Err(CoreError::OverReturn { borrowed: 0, requested: 1, .. })
        ));
        assert!(matches!(
            check_movement(&asset, TransactionType::Maintenance, &empty, 1),
            Err(CoreError::InsufficientStock { .. })
        ));
        assert!(matches!(
            check_movement(&asset, TransactionType::MaintenanceReturn, &empty, 1),
            Err(CoreError::InsufficientMaintenanceStock { .. })
        ));

        let consumable = item(ItemCategory::Consumable);
        assert!(check_movement(&consumable, TransactionType::Out, &balance(3, 0, 0), 3).is_ok());
        assert!(matches!(
            check_movement(&consumable, TransactionType::Out, &balance(3, 0, 0), 4),
            Err(CoreError::InsufficientStock { available: 3, requested: 4, .. })
        ));
    }

    #[test]
    fn test_borrow_return_scenario() {
        let asset = item(ItemCategory::Asset);
        let start = balance(10, 0, 0);

        check_movement(&asset, TransactionType::Borrow, &start, 4).unwrap();
        let lent = apply(&start, TransactionType::Borrow, 4).unwrap();
        assert_eq!((lent.available, lent.borrowed), (6, 4));

        check_movement(&asset, TransactionType::Return, &lent, 4).unwrap();
        let back = apply(&lent, TransactionType::Return, 4).unwrap();
        assert_eq!((back.available, back.borrowed), (10, 0));

        assert!(matches!(
            check_movement(&asset, TransactionType::Return, &back, 1),
            Err(CoreError::OverReturn { .. })
        ));
    }

    #[test]
    fn test_delta_decrease_skips_sufficiency() {
        let consumable = item(ItemCategory::Consumable);
        assert!(check_delta(&consumable, TransactionType::Out, &balance(0, 0, 0), -5).is_ok());
        assert!(matches!(
            check_delta(&consumable, TransactionType::Out, &balance(2, 0, 0), 5),
            Err(CoreError::InsufficientStock { .. })
        ));
        // Category is still enforced on decreases.
        assert!(matches!(
            check_delta(&consumable, TransactionType::Borrow, &balance(0, 0, 0), -1),
            Err(CoreError::InvalidTransactionType { .. })
        ));
    }

    #[test]
    fn test_operator_warehouse_resolution() {
        let operator = user("op", Role::Operator);
        let own = warehouse("wh-own", Some("op"));
        let other = warehouse("wh-other", None);

        assert_eq!(
            resolve_acting_warehouse(&operator, Some(&own), None).unwrap().id,
            "wh-own"
        );
        assert_eq!(
            resolve_acting_warehouse(&operator, Some(&own), Some(&own)).unwrap().id,
            "wh-own"
        );
        assert!(matches!(
            resolve_acting_warehouse(&operator, Some(&own), Some(&other)),
            Err(CoreError::WarehouseAccessDenied { .. })
        ));
        assert!(matches!(
            resolve_acting_warehouse(&operator, None, Some(&other)),
            Err(CoreError::NoWarehouseAssigned { .. })
        ));
    }

    #[test]
    fn test_superadmin_warehouse_resolution() {
        let admin = user("admin", Role::Superadmin);
        let own = warehouse("wh-own", Some("admin"));
        let other = warehouse("wh-other", None);

        assert_eq!(
            resolve_acting_warehouse(&admin, Some(&own), Some(&other)).unwrap().id,
            "wh-other"
        );
        assert_eq!(
            resolve_acting_warehouse(&admin, Some(&own), None).unwrap().id,
            "wh-own"
        );
        assert!(matches!(
            resolve_acting_warehouse(&admin, None, None),
            Err(CoreError::NoWarehouseAssigned { .. })
        ));
    }

    #[test]
    fn test_warehouse_access() {
        let owned = warehouse("wh-1", Some("op"));
        assert!(check_warehouse_access(&user("op", Role::Operator), &owned).is_ok());
        assert!(check_warehouse_access(&user("admin", Role::Superadmin), &owned).is_ok());
        assert!(check_warehouse_access(&user("intruder", Role::Operator), &owned).is_err());
    }

    proptest! {
        /// IN batches followed by OUT batches totalling no more than what
        /// came in always pass the rules and never drive `available` negative.
        #[test]
        fn prop_in_then_out_stays_non_negative(
            ins in prop::collection::vec(1i64..50, 1..10),
            out_fractions in prop::collection::vec(0.0f64..1.0, 1..10),
        ) {
            let consumable = item(ItemCategory::Consumable);
            let mut current = balance(0, 0, 0);
            let mut remaining: i64 = 0;

            for q in ins {
                check_movement(&consumable, TransactionType::In, &current, q).unwrap();
                current = apply(&current, TransactionType::In, q).unwrap();
                remaining += q;
            }

            for fraction in out_fractions {
                let q = ((remaining as f64) * fraction).floor() as i64;
                if q == 0 {
                    continue;
                }
                check_movement(&consumable, TransactionType::Out, &current, q).unwrap();
                current = apply(&current, TransactionType::Out, q).unwrap();
                remaining -= q;
                prop_assert!(current.available >= 0);
            }

            prop_assert_eq!(current.available, remaining);
        }

        #[test]
        fn prop_maintenance_round_trip(start in 0i64..100, q in 1i64..100) {
            let asset = item(ItemCategory::Asset);
            let before = balance(start, 0, 0);
            match check_movement(&asset, TransactionType::Maintenance, &before, q) {
                Ok(()) => {
                    let sent = apply(&before, TransactionType::Maintenance, q).unwrap();
                    check_movement(&asset, TransactionType::MaintenanceReturn, &sent, q).unwrap();
                    let back = apply(&sent, TransactionType::MaintenanceReturn, q).unwrap();
                    prop_assert_eq!(back, before);
                }
                Err(err) => {
                    prop_assert!(q > start);
                    prop_assert!(
                        matches!(err, CoreError::InsufficientStock { .. }),
                        "unexpected error kind"
                    );
                }
            }
        }
    }
}
