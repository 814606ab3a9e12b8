//! Fixed-point forest resolution
//!
//! Nodes never store pointers to their parents. A node's parent is whichever live node
//! currently hashes to the fingerprint the child recorded at creation time, so the whole
//! structure is recomputed from content on every pass.
//!
//! The pass works in layers. Layer 0 holds every node whose declared parent matches no
//! live fingerprint: true roots (sentinel) and orphans alike. Each following layer holds
//! the pending nodes whose declared parent is the fingerprint of a node in the previous
//! layer. When a layer comes up empty while nodes are still pending, those nodes form a
//! cycle (or hang off one) and the pass fails.

use crate::binding::BindingSink;
use crate::error::ForestError;
use crate::forest::{ForestPlan, Linkage};
use crate::store::Snapshot;
use crate::tree::hasher::fingerprint;
use crate::types::{Fingerprint, NodeKey};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Compute the binding order and parent assignment for every node in the snapshot
///
/// Pure: reads the snapshot, performs no I/O and touches no sink.
pub fn plan(snapshot: &Snapshot) -> Result<ForestPlan, ForestError> {
    let records = &snapshot.records;

    // Fingerprints are computed once per pass
    let hashes: Vec<Fingerprint> = records
        .iter()
        .map(|record| fingerprint(Some(&record.node)))
        .collect();

    let mut holders: HashMap<Fingerprint, usize> = HashMap::new();
    for (i, hash) in hashes.iter().enumerate() {
        if hash.is_sentinel() {
            warn!(
                node = %records[i].key,
                "Content fingerprint collides with the root sentinel"
            );
        }
        *holders.entry(*hash).or_insert(0) += 1;
    }

    // Children set C, grouped by the fingerprint they wait for. A node only counts as a
    // child when some *other* node holds its declared fingerprint: freshly created nodes
    // share the empty-content digest with the parent they declared. Records are
    // key-ordered, so every group is key-ordered too.
    let mut pending: HashMap<Fingerprint, Vec<usize>> = HashMap::new();
    let mut frontier = Vec::new();
    for (i, record) in records.iter().enumerate() {
        let mut others = holders.get(&record.declared_parent).copied().unwrap_or(0);
        if hashes[i] == record.declared_parent {
            others -= 1;
        }
        if others > 0 {
            pending.entry(record.declared_parent).or_default().push(i);
        } else {
            frontier.push(i);
        }
    }

    let mut order: Vec<Linkage> = frontier
        .iter()
        .map(|&i| Linkage {
            key: records[i].key.clone(),
            parent: None,
            layer: 0,
            fingerprint: hashes[i],
        })
        .collect();
    debug!(layer = 0, nodes = frontier.len(), "Bound roots and orphans");

    let mut layer = 0;
    loop {
        while !pending.is_empty() && !frontier.is_empty() {
            layer += 1;
            let mut next = Vec::new();
            for &p in &frontier {
                // The first frontier node holding a fingerprint claims all of its children
                let Some(children) = pending.remove(&hashes[p]) else {
                    continue;
                };
                // Children sharing the parent's content are not rival parents
                let sharing = children.iter().filter(|&&g| hashes[g] == hashes[p]).count();
                if holders.get(&hashes[p]).copied().unwrap_or(0) - sharing > 1 {
                    warn!(
                        parent = %records[p].key,
                        fingerprint = %hashes[p],
                        children = children.len(),
                        "Several nodes share this fingerprint; binding children to the first"
                    );
                }
                for g in children {
                    order.push(Linkage {
                        key: records[g].key.clone(),
                        parent: Some(records[p].key.clone()),
                        layer,
                        fingerprint: hashes[g],
                    });
                    next.push(g);
                }
            }
            next.sort_unstable();
            debug!(layer, nodes = next.len(), "Bound layer");
            frontier = next;
        }

        if pending.is_empty() {
            break;
        }

        // Stalled. Nodes with identical content that declare that same content (empty
        // nodes whose parent was removed, say) only hold each other up: the smallest of
        // them becomes an orphan and takes the rest of its group as children.
        let Some(released) = pending
            .values()
            .flatten()
            .copied()
            .filter(|&g| hashes[g] == records[g].declared_parent)
            .min()
        else {
            break;
        };
        let declared = records[released].declared_parent;
        if let Some(group) = pending.get_mut(&declared) {
            group.retain(|&g| g != released);
            if group.is_empty() {
                pending.remove(&declared);
            }
        }
        warn!(
            node = %records[released].key,
            fingerprint = %declared,
            "Only identical content holds this node's declared parent; binding as orphan"
        );
        order.push(Linkage {
            key: records[released].key.clone(),
            parent: None,
            layer: 0,
            fingerprint: hashes[released],
        });
        frontier = vec![released];
        layer = 0;
    }

    if !pending.is_empty() {
        let mut stuck: Vec<usize> = pending.into_values().flatten().collect();
        stuck.sort_unstable();
        let nodes: Vec<_> = stuck.into_iter().map(|i| records[i].key.clone()).collect();
        return Err(ForestError::CycleOrDanglingReference { nodes });
    }

    Ok(ForestPlan::new(order))
}

/// Run a full pass: plan, then clear the sink and bind every node parents-first
///
/// The sink is only touched once the plan succeeded, so a failed pass leaves the
/// previous bindings in place.
pub fn resolve<S: BindingSink>(snapshot: &Snapshot, sink: &mut S) -> Result<ForestPlan, ForestError> {
    let start = Instant::now();
    let plan = match plan(snapshot) {
        Ok(plan) => plan,
        Err(err) => {
            warn!(error = %err, "Forest resolution aborted");
            return Err(err);
        }
    };

    sink.clear();
    let mut handles: HashMap<&NodeKey, S::Handle> = HashMap::new();
    for linkage in plan.order() {
        let record = snapshot
            .get(&linkage.key)
            .ok_or_else(|| ForestError::Lookup(format!("Node {} vanished mid-pass", linkage.key)))?;
        let parent = linkage
            .parent
            .as_ref()
            .and_then(|key| handles.get(key).copied());
        let handle = sink.bind(record, linkage, parent);
        handles.insert(&linkage.key, handle);
    }

    info!(
        nodes = plan.len(),
        roots = plan.roots().count(),
        layers = plan.layer_count(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Forest resolved"
    );
    Ok(plan)
}
