//! Orders a candidate block's referrals into a parent-before-child
//! sequence so they can be inserted one at a time without hitting
//! orphans. Grounded on `refdb.cpp::OrderReferrals`: partition into roots
//! (referrals whose parent is already in the store) versus the rest, then
//! BFS through the forest formed by the rest. A block whose referrals
//! don't form a valid forest over the store — no roots, or leftover
//! referrals the BFS never reaches — is rejected.

use std::collections::{HashMap, VecDeque};

use crate::address::Address;
use crate::error::OrderingError;
use crate::referral::Referral;

/// Reorders `referrals` in place into a parent-before-child sequence.
/// `has_parent` should answer whether a referral's parent address is
/// already known to the store (true for the genesis referral's own
/// children, or any address already confirmed in a prior block).
pub fn order_referrals(
    referrals: &mut Vec<Referral>,
    has_parent: impl Fn(&Address) -> bool,
) -> Result<(), OrderingError> {
    if referrals.is_empty() {
        return Ok(());
    }

    let mut roots = Vec::new();
    let mut rest = Vec::new();
    for r in referrals.drain(..) {
        if has_parent(&r.parent_address) {
            roots.push(r);
        } else {
            rest.push(r);
        }
    }

    if roots.is_empty() {
        let offender = rest.first().map(|r| r.parent_address).unwrap_or(Address::NULL);
        return Err(OrderingError::UnresolvedParent(offender));
    }

    let mut children: HashMap<Address, Vec<Referral>> = HashMap::new();
    for r in rest {
        children.entry(r.parent_address).or_default().push(r);
    }

    let total = roots.len() + children.values().map(|v| v.len()).sum::<usize>();

    let mut queue: VecDeque<Referral> = roots.into_iter().collect();
    let mut ordered = Vec::with_capacity(total);

    while let Some(r) = queue.pop_front() {
        let addr = r.address();
        ordered.push(r);
        if let Some(kids) = children.remove(&addr) {
            queue.extend(kids);
        }
    }

    if ordered.len() != total {
        // Either a cycle (a referral's parent is one of its own
        // descendants within this batch, so it's never reached) or an
        // orphan whose parent never appeared in `roots`/`rest` at all.
        let stuck = children
            .into_values()
            .flatten()
            .next()
            .map(|r| r.address())
            .unwrap_or(Address::NULL);
        return Err(OrderingError::Cycle(stuck));
    }

    *referrals = ordered;
    Ok(())
}
