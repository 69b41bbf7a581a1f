//! # Reconciliation Planner
//!
//! Turns a booked transaction and its replacement line set into the list
//! of signed stock moves that keeps balances in lock-step. Pure: storage
//! applies the plan inside one unit of work.
//!
//! ## Per-line Decision
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  previous line?   same type & warehouse?   moves                        │
//! │  ──────────────   ──────────────────────   ──────────────────────────   │
//! │  no               -                        Apply  +new  (new type)      │
//! │  yes              yes                      Adjust new-old (skip if 0)   │
//! │  yes              no                       Reverse -old (old type,      │
//! │                                                    old warehouse)       │
//! │                                            Apply  +new  (new type)      │
//! │                                                                         │
//! │  removed line                              Reverse -old (old type)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Line moves come first, in submission order, followed by removals in
//! booked order. An item can only be in one of the two groups.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::types::{TransactionLine, TransactionRecord, TransactionType};

/// Why a move exists; decides which rules storage runs before applying it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveKind {
    /// Net change of an unchanged line. Rules run on positive deltas.
    Adjust,
    /// Undo of a booked line. Only the non-negativity guard applies.
    Reverse,
    /// Fresh booking of a full quantity. Rules always run.
    Apply,
}

/// One signed movement against one balance row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMove {
    pub item_id: String,
    pub warehouse_id: String,
    pub transaction_type: TransactionType,
    /// Signed quantity passed to [`crate::ledger::apply`].
    pub delta: i64,
    pub kind: MoveKind,
}

impl StockMove {
    /// Whether the movement rules must approve this move first.
    pub fn needs_check(&self) -> bool {
        !matches!(self.kind, MoveKind::Reverse)
    }
}

/// A submitted line with its item already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedLine {
    pub item_id: String,
    pub quantity: i64,
}

/// Output of [`plan`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub moves: Vec<StockMove>,
    /// Ids of booked lines whose item is no longer submitted.
    pub removed_line_ids: Vec<String>,
}

/// Moves for one submitted line.
pub fn plan_line(
    previous: Option<&TransactionLine>,
    previous_type: TransactionType,
    next_type: TransactionType,
    item_id: &str,
    warehouse_id: &str,
    quantity: i64,
) -> Vec<StockMove> {
    let apply_new = || StockMove {
        item_id: item_id.to_string(),
        warehouse_id: warehouse_id.to_string(),
        transaction_type: next_type,
        delta: quantity,
        kind: MoveKind::Apply,
    };

    match previous {
        None => vec![apply_new()],
        Some(old) if old.warehouse_id == warehouse_id && previous_type == next_type => {
            let delta = quantity - old.quantity;
            if delta == 0 {
                Vec::new()
            } else {
                vec![StockMove {
                    item_id: item_id.to_string(),
                    warehouse_id: warehouse_id.to_string(),
                    transaction_type: next_type,
                    delta,
                    kind: MoveKind::Adjust,
                }]
            }
        }
        Some(old) => vec![plan_removal(old, previous_type), apply_new()],
    }
}

/// Reversal of a booked line's full quantity.
pub fn plan_removal(line: &TransactionLine, previous_type: TransactionType) -> StockMove {
    StockMove {
        item_id: line.item_id.clone(),
        warehouse_id: line.warehouse_id.clone(),
        transaction_type: previous_type,
        delta: -line.quantity,
        kind: MoveKind::Reverse,
    }
}

/// Full plan for replacing `previous`'s lines with `next`.
pub fn plan(
    previous: &TransactionRecord,
    next_type: TransactionType,
    warehouse_id: &str,
    next: &[PlannedLine],
) -> ReconcilePlan {
    let previous_type = previous.transaction.transaction_type;
    let mut result = ReconcilePlan::default();

    for line in next {
        result.moves.extend(plan_line(
            previous.line_for(&line.item_id),
            previous_type,
            next_type,
            &line.item_id,
            warehouse_id,
            line.quantity,
        ));
    }

    let submitted: HashSet<&str> = next.iter().map(|line| line.item_id.as_str()).collect();
    for old in &previous.lines {
        if !submitted.contains(old.item_id.as_str()) {
            result.moves.push(plan_removal(old, previous_type));
            result.removed_line_ids.push(old.id.clone());
        }
    }

    result
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::apply;
    use crate::types::{StockBalance, Transaction};
    use chrono::Utc;

    fn line(id: &str, item_id: &str, warehouse_id: &str, quantity: i64) -> TransactionLine {
        TransactionLine {
            id: id.to_string(),
            transaction_id: "trx".to_string(),
            item_id: item_id.to_string(),
            warehouse_id: warehouse_id.to_string(),
            quantity,
            returned_at: None,
            description: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn record(ty: TransactionType, lines: Vec<TransactionLine>) -> TransactionRecord {
        TransactionRecord {
            transaction: Transaction {
                id: "trx".to_string(),
                transaction_type: ty,
                code: "TRX-KLR-001".to_string(),
                transaction_date: Utc::now(),
                description: None,
                user_id: "user".to_string(),
                warehouse_id: "wh-1".to_string(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            lines,
        }
    }

    fn planned(item_id: &str, quantity: i64) -> PlannedLine {
        PlannedLine {
            item_id: item_id.to_string(),
            quantity,
        }
    }

    #[test]
    fn test_shrinking_out_line_gives_stock_back() {
        let booked = record(TransactionType::Out, vec![line("l1", "x", "wh-1", 8)]);
        let result = plan(&booked, TransactionType::Out, "wh-1", &[planned("x", 3)]);

        assert_eq!(result.moves.len(), 1);
        let mv = &result.moves[0];
        assert_eq!((mv.delta, mv.kind), (-5, MoveKind::Adjust));

        let after = apply(&StockBalance::empty("x", "wh-1"), mv.transaction_type, mv.delta).unwrap();
        assert_eq!(after.available, 5);
    }

    #[test]
    fn test_unchanged_line_plans_nothing() {
        let booked = record(TransactionType::In, vec![line("l1", "x", "wh-1", 4)]);
        let result = plan(&booked, TransactionType::In, "wh-1", &[planned("x", 4)]);
        assert_eq!(result, ReconcilePlan::default());
    }

    #[test]
    fn test_new_item_is_applied() {
        let booked = record(TransactionType::In, vec![line("l1", "x", "wh-1", 4)]);
        let result = plan(
            &booked,
            TransactionType::In,
            "wh-1",
            &[planned("x", 4), planned("y", 2)],
        );
        assert_eq!(result.moves.len(), 1);
        assert_eq!(result.moves[0].item_id, "y");
        assert_eq!(result.moves[0].kind, MoveKind::Apply);
        assert!(result.moves[0].needs_check());
    }

    #[test]
    fn test_removal_reverses_exactly_once() {
        let booked = record(
            TransactionType::Borrow,
            vec![line("l1", "x", "wh-1", 3), line("l2", "y", "wh-1", 2)],
        );
        let result = plan(&booked, TransactionType::Borrow, "wh-1", &[planned("y", 5)]);

        let reversals: Vec<_> = result
            .moves
            .iter()
            .filter(|mv| mv.item_id == "x")
            .collect();
        assert_eq!(reversals.len(), 1);
        assert_eq!(reversals[0].delta, -3);
        assert_eq!(reversals[0].kind, MoveKind::Reverse);
        assert!(!reversals[0].needs_check());
        assert_eq!(result.removed_line_ids, vec!["l1".to_string()]);

        // The kept line only moves by its net change.
        let kept: Vec<_> = result.moves.iter().filter(|mv| mv.item_id == "y").collect();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].delta, 3);
    }

    #[test]
    fn test_type_change_reverses_then_applies() {
        let booked = record(TransactionType::Borrow, vec![line("l1", "x", "wh-1", 4)]);
        let result = plan(&booked, TransactionType::Maintenance, "wh-1", &[planned("x", 4)]);

        assert_eq!(result.moves.len(), 2);
        assert_eq!(result.moves[0].transaction_type, TransactionType::Borrow);
        assert_eq!(result.moves[0].delta, -4);
        assert_eq!(result.moves[1].transaction_type, TransactionType::Maintenance);
        assert_eq!(result.moves[1].delta, 4);

        // available 6 / borrowed 4 after the booked BORROW.
        let start = StockBalance {
            item_id: "x".to_string(),
            warehouse_id: "wh-1".to_string(),
            available: 6,
            borrowed: 4,
            under_maintenance: 0,
        };
        let after = result.moves.iter().try_fold(start, |balance, mv| {
            apply(&balance, mv.transaction_type, mv.delta)
        });
        let after = after.unwrap();
        assert_eq!((after.available, after.borrowed, after.under_maintenance), (6, 0, 4));
    }

    #[test]
    fn test_warehouse_change_moves_between_balances() {
        let booked = record(TransactionType::In, vec![line("l1", "x", "wh-1", 7)]);
        let result = plan(&booked, TransactionType::In, "wh-2", &[planned("x", 7)]);

        assert_eq!(result.moves.len(), 2);
        assert_eq!(result.moves[0].warehouse_id, "wh-1");
        assert_eq!(result.moves[0].delta, -7);
        assert_eq!(result.moves[1].warehouse_id, "wh-2");
        assert_eq!(result.moves[1].delta, 7);
    }
}
