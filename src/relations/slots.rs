//! Structural relations: identity, canonical order and slot geometry.

use crate::relations::{NearFamily, RelationContext, RelationKind, SlotKind};
use crate::types::{is_sorted_subset, sorted_overlap, Node};

/// Push the slot itself and the composites in `composites`.
fn push_boundary(to: SlotKind, slot: Node, composites: &[Node], out: &mut Vec<Node>) {
    if to.may_have_slots() {
        out.push(slot);
    }
    if to.may_have_composites() {
        out.extend_from_slice(composites);
    }
}

/// Slots in `center - k ..= center + k`, clipped to the corpus.
fn slot_window(ctx: &RelationContext<'_>, center: i64, k: u32) -> impl Iterator<Item = Node> {
    let lo = (center - k as i64).max(1);
    let hi = (center + k as i64).min(ctx.grid.max_slot() as i64);
    (lo..=hi).map(|s| s as Node)
}

pub(super) fn fanout(
    ctx: &RelationContext<'_>,
    kind: &RelationKind,
    from: SlotKind,
    to: SlotKind,
    n: Node,
    out: &mut Vec<Node>,
) {
    let grid = ctx.grid;
    if !grid.contains(n) {
        return;
    }
    let slots = grid.slots_of(n);
    let (first, last) = (slots[0], slots[slots.len() - 1]);

    match kind {
        RelationKind::Equal => out.push(n),
        RelationKind::SameSlots => {
            if from == SlotKind::Slots && to == SlotKind::Slots {
                out.push(n);
                return;
            }
            if to.may_have_slots() && slots.len() == 1 {
                out.push(first);
            }
            if to.may_have_composites() {
                out.extend(grid.first_slots(first).iter().copied().filter(|&m| grid.slots_of(m) == slots));
            }
        }
        RelationKind::Overlap => {
            if from == SlotKind::Slots && to == SlotKind::Slots {
                out.push(n);
                return;
            }
            for &s in slots {
                if to.may_have_slots() {
                    out.push(s);
                }
                if to.may_have_composites() {
                    out.extend_from_slice(grid.embedders(s));
                }
            }
        }
        RelationKind::Embeds => {
            if grid.is_slot(n) {
                return;
            }
            if to.may_have_slots() {
                out.extend_from_slice(slots);
            }
            if to.may_have_composites() {
                out.extend_from_slice(grid.composite_embeddees(n));
            }
        }
        RelationKind::EmbeddedIn => {
            if to.may_have_composites() {
                out.extend_from_slice(grid.embedders(n));
            }
        }
        RelationKind::SameFirst => push_boundary(to, first, grid.first_slots(first), out),
        RelationKind::SameLast => push_boundary(to, last, grid.last_slots(last), out),
        RelationKind::SameBoundary => {
            if to.may_have_slots() && first == last {
                out.push(first);
            }
            if to.may_have_composites() {
                out.extend(grid.first_slots(first).iter().copied().filter(|&m| grid.last_slot(m) == Some(last)));
            }
        }
        RelationKind::AdjacentBefore => {
            let next = last + 1;
            if next <= grid.max_slot() {
                push_boundary(to, next, grid.first_slots(next), out);
            }
        }
        RelationKind::AdjacentAfter => {
            if first > 1 {
                let prev = first - 1;
                push_boundary(to, prev, grid.last_slots(prev), out);
            }
        }
        RelationKind::Near(family, k) => {
            let k = *k;
            match family {
                NearFamily::First => {
                    for s in slot_window(ctx, first as i64, k) {
                        push_boundary(to, s, grid.first_slots(s), out);
                    }
                }
                NearFamily::Last => {
                    for s in slot_window(ctx, last as i64, k) {
                        push_boundary(to, s, grid.last_slots(s), out);
                    }
                }
                NearFamily::Boundary => {
                    for s in slot_window(ctx, first as i64, k) {
                        if to.may_have_slots() && (s as i64 - last as i64).unsigned_abs() <= k as u64 {
                            out.push(s);
                        }
                        if to.may_have_composites() {
                            out.extend(grid.first_slots(s).iter().copied().filter(|&m| {
                                grid.last_slot(m)
                                    .map_or(false, |l| (l as i64 - last as i64).unsigned_abs() <= k as u64)
                            }));
                        }
                    }
                }
                NearFamily::Before => {
                    for s in slot_window(ctx, last as i64 + 1, k) {
                        push_boundary(to, s, grid.first_slots(s), out);
                    }
                }
                NearFamily::After => {
                    for s in slot_window(ctx, first as i64 - 1, k) {
                        push_boundary(to, s, grid.last_slots(s), out);
                    }
                }
            }
        }
        _ => {}
    }
}

fn within(a: Node, b: i64, k: u32) -> bool {
    (a as i64 - b).unsigned_abs() <= k as u64
}

pub(super) fn holds(ctx: &RelationContext<'_>, kind: &RelationKind, n: Node, m: Node) -> bool {
    let grid = ctx.grid;
    if !grid.contains(n) || !grid.contains(m) {
        return false;
    }
    let (sn, sm) = (grid.slots_of(n), grid.slots_of(m));
    let (fn_, ln) = (sn[0], sn[sn.len() - 1]);
    let (fm, lm) = (sm[0], sm[sm.len() - 1]);

    match kind {
        RelationKind::Equal => n == m,
        RelationKind::Unequal => n != m,
        RelationKind::CanonicalBefore => grid.rank(n) < grid.rank(m),
        RelationKind::CanonicalAfter => grid.rank(n) > grid.rank(m),
        RelationKind::SameSlots => sn == sm,
        RelationKind::Overlap => sorted_overlap(sn, sm),
        RelationKind::DifferentSlots => sn != sm,
        RelationKind::Disjoint => !sorted_overlap(sn, sm),
        RelationKind::Embeds => !grid.is_slot(n) && n != m && is_sorted_subset(sm, sn),
        RelationKind::EmbeddedIn => !grid.is_slot(m) && n != m && is_sorted_subset(sn, sm),
        RelationKind::SlotBefore => ln < fm,
        RelationKind::SlotAfter => fn_ > lm,
        RelationKind::SameFirst => fn_ == fm,
        RelationKind::SameLast => ln == lm,
        RelationKind::SameBoundary => fn_ == fm && ln == lm,
        RelationKind::AdjacentBefore => ln + 1 == fm,
        RelationKind::AdjacentAfter => lm + 1 == fn_,
        RelationKind::Near(family, k) => match family {
            NearFamily::First => within(fm, fn_ as i64, *k),
            NearFamily::Last => within(lm, ln as i64, *k),
            NearFamily::Boundary => within(fm, fn_ as i64, *k) && within(lm, ln as i64, *k),
            NearFamily::Before => within(fm, ln as i64 + 1, *k),
            NearFamily::After => within(lm + 1, fn_ as i64, *k),
        },
        RelationKind::Edge { .. } | RelationKind::Feature { .. } => false,
    }
}
