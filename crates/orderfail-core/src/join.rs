use std::collections::HashMap;

use crate::model::{JoinedRow, RawOffer, RawOrder};

/// Inner-join orders and offers on `order_gk`.
///
/// One output row per (order, offer) pair whose key appears on both sides;
/// an order with several offers is duplicated once per offer. Output follows
/// offer row order, so the result is reproducible for a given input. Orders
/// that never received an offer are dropped here by design. Pure transform;
/// neither input is modified.
pub fn inner_join_on_order(orders: &[RawOrder], offers: &[RawOffer]) -> Vec<JoinedRow> {
    let mut by_key: HashMap<&str, Vec<&RawOrder>> = HashMap::new();
    for order in orders {
        if let Some(key) = order.order_gk.as_deref() {
            by_key.entry(key).or_default().push(order);
        }
    }

    let mut joined = Vec::new();
    for offer in offers {
        let Some(key) = offer.order_gk.as_deref() else {
            continue;
        };
        let Some(matches) = by_key.get(key) else {
            continue;
        };
        for order in matches {
            joined.push(JoinedRow {
                order: (*order).clone(),
                offer_id: offer.offer_id.clone(),
                offer_row: offer.row,
            });
        }
    }

    joined
}
