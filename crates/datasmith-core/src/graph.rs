use std::collections::{BTreeSet, HashMap};

use crate::error::{Error, Result};
use crate::property::Property;

/// Resolve a generation order over the argument dependency graph.
///
/// Kahn's algorithm: a property becomes ready once every property it
/// references through an argument binding has been emitted. Ties among
/// simultaneously-ready properties break by registration order, so the
/// result is deterministic for a fixed property list.
pub fn resolve_order(properties: &[Property]) -> Result<Vec<String>> {
    let positions: HashMap<&str, usize> = properties
        .iter()
        .enumerate()
        .map(|(index, property)| (property.id.as_str(), index))
        .collect();

    let mut indegree: Vec<usize> = vec![0; properties.len()];
    let mut dependents: HashMap<usize, Vec<usize>> = HashMap::new();

    for (index, property) in properties.iter().enumerate() {
        for reference in property.argument_ids() {
            let Some(&dependency) = positions.get(reference) else {
                return Err(Error::UnknownProperty {
                    property: property.id.clone(),
                    reference: reference.to_string(),
                });
            };
            indegree[index] += 1;
            dependents.entry(dependency).or_default().push(index);
        }
    }

    let mut ready: BTreeSet<usize> = indegree
        .iter()
        .enumerate()
        .filter_map(|(index, degree)| (*degree == 0).then_some(index))
        .collect();

    let mut order = Vec::with_capacity(properties.len());
    while let Some(index) = ready.iter().next().copied() {
        ready.remove(&index);
        order.push(properties[index].id.clone());

        if let Some(children) = dependents.get(&index) {
            for &child in children {
                indegree[child] = indegree[child].saturating_sub(1);
                if indegree[child] == 0 {
                    ready.insert(child);
                }
            }
        }
    }

    if order.len() != properties.len() {
        let blocked: Vec<String> = properties
            .iter()
            .enumerate()
            .filter(|(index, _)| indegree[*index] > 0)
            .map(|(_, property)| property.id.clone())
            .collect();
        return Err(Error::CyclicDependency(blocked));
    }

    Ok(order)
}
