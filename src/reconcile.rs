//! Monthly GMV reconciliation.
//!
//! Pure pairing algorithm over line-item states. A line item that was sold and later cancelled
//! appears twice in the input, once under the order's `Finalized` row and once under its `Storno`
//! row; the algorithm reconciles the pair into net monthly contributions. Persistence of the result
//! is the backend's job ([`crate::traits::GmvStore`]).
use std::collections::HashMap;

use chrono::NaiveDate;
use log::warn;

use crate::{
    db_types::{LineItemState, OrderId, OrderStatus},
    helpers::{month_of, Money},
    traits::MirrorError,
};

/// Computes the GMV contribution per calendar month from the given line-item states.
///
/// States are grouped by the line item's identity within its order. Per group:
/// * a single state (only finalized, or a pure return with no matching sale in-window) contributes
///   `price × quantity` to its own order month;
/// * a finalized/storno pair in the same month contributes only the storno row's
///   `price × quantity` (the net effect after cancellation);
/// * a finalized/storno pair spanning two months contributes `+price × quantity` to the finalized
///   month and `−price × storno_qty` to the storno month (revenue recognised in month A, partially
///   reversed in month B).
///
/// A pairing other than {Finalized, Storno}, or more than two states for one line, is a hard
/// error: the data model assumption is broken and continuing would corrupt the aggregate.
pub fn gmv_by_month(states: &[LineItemState]) -> Result<HashMap<NaiveDate, Money>, MirrorError> {
    let mut by_line: HashMap<(OrderId, i64), Vec<&LineItemState>> = HashMap::new();
    for state in states {
        by_line.entry((state.order_id.clone(), state.line_id)).or_default().push(state);
    }
    let mut totals = HashMap::new();
    for ((order_id, line_id), group) in by_line {
        match group.as_slice() {
            [single] => add_sale(&mut totals, single),
            [a, b] => {
                let (finalized, storno) = match (a.order_status, b.order_status) {
                    (OrderStatus::Finalized, OrderStatus::Storno) => (a, b),
                    (OrderStatus::Storno, OrderStatus::Finalized) => (b, a),
                    (first, second) => {
                        return Err(MirrorError::InvalidStatusPairing { order_id, line_id, first, second });
                    },
                };
                if storno.initial_qty != finalized.quantity {
                    warn!(
                        "📊 Storno of line {line_id} in order {order_id} started from {} units but the finalized \
                         sale had {}",
                        storno.initial_qty, finalized.quantity
                    );
                }
                if month_of(finalized.order_date) == month_of(storno.order_date) {
                    // net amount after the cancellation; the storno row carries the reduced quantity
                    add_sale(&mut totals, storno);
                } else {
                    add_sale(&mut totals, finalized);
                    subtract_storno(&mut totals, storno);
                }
            },
            more => {
                return Err(MirrorError::TooManyLineItemStates { order_id, line_id, count: more.len() });
            },
        }
    }
    Ok(totals)
}

fn add_sale(totals: &mut HashMap<NaiveDate, Money>, state: &LineItemState) {
    let bucket = totals.entry(month_of(state.order_date)).or_insert(Money::ZERO);
    *bucket += state.price * state.quantity;
}

fn subtract_storno(totals: &mut HashMap<NaiveDate, Money>, storno: &LineItemState) {
    let bucket = totals.entry(month_of(storno.order_date)).or_insert(Money::ZERO);
    *bucket -= storno.price * storno.storno_qty;
}
