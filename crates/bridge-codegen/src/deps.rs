//! Dependency graph over the declared types.
//!
//! For every declared type we record which other types must be fully
//! defined before it. Base types and interfaces are always required
//! (`Forced`). Fields, and for delegates the signature types, only count
//! when they are used by value (`Conditional`); reference-kind types are
//! reached through pointers and a forward declaration suffices.
//!
//! Two drivers linearize the graph: [`DependencyGraph::sweep`] repeatedly
//! clears every type whose dependencies are all cleared, and
//! [`DependencyGraph::plan`] does the same with a work queue. Both produce
//! an [`EmissionPlan`].

use std::collections::VecDeque;

use bridge_common::BridgeError;
use bridge_types::{DeclId, SourceType, TypeInfoId, TypeKind, TypeRegistry};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

/// Why a dependency was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DependencyTag {
    /// Base type or interface. Always required.
    Forced,
    /// Referenced by value from a field or a delegate signature.
    Conditional,
}

#[derive(Debug, Clone)]
struct DependencyNode {
    name: String,
    kind: TypeKind,
    /// `None` once every dependency has been cleared.
    dependencies: Option<Vec<(TypeInfoId, DependencyTag)>>,
    cleared: bool,
}

/// Emission order for the declared types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmissionPlan {
    pub order: Vec<TypeInfoId>,
    /// Full names, parallel to `order`.
    pub names: Vec<String>,
    /// Set when the tail of `order` could not be ordered.
    pub cycle: Option<Vec<String>>,
}

impl EmissionPlan {
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

#[derive(Debug, Clone)]
pub struct DependencyGraph {
    nodes: FxHashMap<TypeInfoId, DependencyNode>,
    /// Declared types in detection order.
    declared: Vec<TypeInfoId>,
    enums_first: bool,
}

impl DependencyGraph {
    /// Detect the dependencies of every non-external declaration in `decls`.
    pub fn detect_all(
        registry: &mut TypeRegistry<'_>,
        decls: &[DeclId],
        enums_first: bool,
    ) -> Result<Self, BridgeError> {
        let mut graph = DependencyGraph {
            nodes: FxHashMap::default(),
            declared: Vec::new(),
            enums_first,
        };
        for &decl in decls {
            let info = registry.declared_type_info(decl)?;
            let record = registry.info(info);
            if record.external || graph.nodes.contains_key(&info) {
                continue;
            }
            let name = record.full_name.clone();
            let kind = record.kind;

            let dependencies = detect(registry, info);
            tracing::debug!(
                type_name = %name,
                count = dependencies.len(),
                "detected dependencies"
            );
            graph.nodes.insert(
                info,
                DependencyNode {
                    name,
                    kind,
                    dependencies: if dependencies.is_empty() {
                        None
                    } else {
                        Some(dependencies)
                    },
                    cleared: false,
                },
            );
            graph.declared.push(info);
        }
        Ok(graph)
    }

    pub fn len(&self) -> usize {
        self.declared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declared.is_empty()
    }

    pub fn contains(&self, info: TypeInfoId) -> bool {
        self.nodes.contains_key(&info)
    }

    pub fn declared(&self) -> &[TypeInfoId] {
        &self.declared
    }

    /// Dependencies not yet removed. Zero for types outside the graph.
    pub fn remaining_dependencies(&self, info: TypeInfoId) -> usize {
        self.dependencies(info).len()
    }

    pub fn dependencies(&self, info: TypeInfoId) -> &[(TypeInfoId, DependencyTag)] {
        self.nodes
            .get(&info)
            .and_then(|node| node.dependencies.as_deref())
            .unwrap_or(&[])
    }

    /// Whether `info` has been written. Types outside the graph are
    /// emitted elsewhere and always count as cleared.
    pub fn dependency_cleared(&self, info: TypeInfoId) -> bool {
        self.nodes.get(&info).map_or(true, |node| node.cleared)
    }

    /// Mark `info` as written. Its dependencies must all be gone.
    pub fn mark_cleared(&mut self, info: TypeInfoId) -> Result<(), BridgeError> {
        let remaining = self.remaining_dependencies(info);
        if remaining > 0 {
            let type_name = self.name(info).to_string();
            debug_assert!(
                remaining == 0,
                "`{}` cleared with {} dependencies remaining",
                type_name,
                remaining
            );
            return Err(BridgeError::DependenciesNotEmpty {
                type_name,
                remaining,
            });
        }
        self.clear(info);
        Ok(())
    }

    fn clear(&mut self, info: TypeInfoId) {
        if let Some(node) = self.nodes.get_mut(&info) {
            node.cleared = true;
        }
    }

    /// Drop every dependency that has been cleared. Returns whether
    /// anything was removed.
    pub fn remove_solved_dependencies(&mut self, info: TypeInfoId) -> bool {
        let Some(current) = self.nodes.get(&info).and_then(|n| n.dependencies.as_ref()) else {
            return false;
        };
        let kept: Vec<(TypeInfoId, DependencyTag)> = current
            .iter()
            .copied()
            .filter(|(dep, _)| !self.dependency_cleared(*dep))
            .collect();
        if kept.len() == current.len() {
            return false;
        }
        if let Some(node) = self.nodes.get_mut(&info) {
            node.dependencies = if kept.is_empty() { None } else { Some(kept) };
        }
        true
    }

    /// Clear types pass by pass until none is left or a pass makes no
    /// progress. Types left over are appended in name order.
    pub fn sweep(&mut self) -> EmissionPlan {
        let mut pending: Vec<TypeInfoId> = self
            .declared
            .iter()
            .copied()
            .filter(|id| !self.dependency_cleared(*id))
            .collect();
        let mut order = Vec::with_capacity(pending.len());
        let mut passes = 0usize;

        loop {
            for &id in &pending {
                self.remove_solved_dependencies(id);
            }
            let mut ready: Vec<TypeInfoId> = pending
                .iter()
                .copied()
                .filter(|id| self.remaining_dependencies(*id) == 0)
                .collect();
            if ready.is_empty() {
                break;
            }
            passes += 1;
            self.sort_for_emission(&mut ready);
            for &id in &ready {
                self.clear(id);
            }
            order.extend(ready);
            pending.retain(|id| !self.dependency_cleared(*id));
        }
        tracing::debug!(passes, written = order.len(), stuck = pending.len(), "sweep finished");

        self.finish(order, pending)
    }

    /// Topological order using Kahn's algorithm. Ready types are taken
    /// alphabetically, enumerations first when configured. Does not change
    /// any cleared flag.
    pub fn plan(&self) -> EmissionPlan {
        let pending: Vec<TypeInfoId> = self
            .declared
            .iter()
            .copied()
            .filter(|id| !self.dependency_cleared(*id))
            .collect();
        let n = pending.len();
        let index: FxHashMap<TypeInfoId, usize> =
            pending.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        // Only edges between pending types matter; everything else is cleared.
        let edges: Vec<Vec<usize>> = pending
            .iter()
            .map(|id| {
                self.dependencies(*id)
                    .iter()
                    .filter_map(|(dep, _)| index.get(dep).copied())
                    .collect()
            })
            .collect();
        let mut in_degree: Vec<u32> = edges.iter().map(|e| e.len() as u32).collect();
        // dependents[j] lists every pending type that waits on j.
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (i, deps) in edges.iter().enumerate() {
            for &dep in deps {
                dependents[dep].push(i);
            }
        }

        let mut ready: Vec<TypeInfoId> = (0..n)
            .filter(|&i| in_degree[i] == 0)
            .map(|i| pending[i])
            .collect();
        self.sort_for_emission(&mut ready);

        let mut queue = VecDeque::from(ready);
        let mut order = Vec::with_capacity(n);

        while let Some(id) = queue.pop_front() {
            order.push(id);
            let done = index[&id];
            let mut newly_ready = Vec::new();
            for &i in &dependents[done] {
                in_degree[i] -= 1;
                if in_degree[i] == 0 {
                    newly_ready.push(pending[i]);
                }
            }
            self.sort_for_emission(&mut newly_ready);
            queue.extend(newly_ready);
        }

        let stuck: Vec<TypeInfoId> = (0..n)
            .filter(|&i| in_degree[i] > 0)
            .map(|i| pending[i])
            .collect();
        self.finish(order, stuck)
    }

    fn finish(&self, mut order: Vec<TypeInfoId>, mut stuck: Vec<TypeInfoId>) -> EmissionPlan {
        let cycle = if stuck.is_empty() {
            None
        } else {
            let path = self.extract_cycle_path(&stuck);
            tracing::warn!(cycle = %path.join(" -> "), "types cannot be ordered");
            stuck.sort_by(|a, b| self.name(*a).cmp(self.name(*b)));
            order.extend(stuck);
            Some(path)
        };
        let names = order.iter().map(|id| self.name(*id).to_string()).collect();
        EmissionPlan {
            order,
            names,
            cycle,
        }
    }

    /// Follow dependency edges among `stuck` types until one repeats.
    fn extract_cycle_path(&self, stuck: &[TypeInfoId]) -> Vec<String> {
        let members: FxHashSet<TypeInfoId> = stuck.iter().copied().collect();
        let Some(mut current) = stuck.iter().copied().min_by(|a, b| self.name(*a).cmp(self.name(*b)))
        else {
            return Vec::new();
        };

        let mut path: Vec<String> = Vec::new();
        let mut visited = FxHashSet::default();
        loop {
            if !visited.insert(current) {
                let start = self.name(current);
                let begin = path.iter().position(|name| name == start).unwrap_or(0);
                let mut cycle = path[begin..].to_vec();
                cycle.push(start.to_string());
                return cycle;
            }
            path.push(self.name(current).to_string());

            let next = self
                .dependencies(current)
                .iter()
                .map(|(dep, _)| *dep)
                .find(|dep| members.contains(dep));
            match next {
                Some(dep) => current = dep,
                None => return path,
            }
        }
    }

    fn name(&self, info: TypeInfoId) -> &str {
        self.nodes.get(&info).map_or("", |node| node.name.as_str())
    }

    fn sort_for_emission(&self, ids: &mut [TypeInfoId]) {
        ids.sort_by(|a, b| self.emission_key(*a).cmp(&self.emission_key(*b)));
    }

    fn emission_key(&self, info: TypeInfoId) -> (bool, &str) {
        let late = self.enums_first
            && self
                .nodes
                .get(&info)
                .map_or(true, |node| node.kind != TypeKind::Enum);
        (late, self.name(info))
    }
}

// ── Detection ──────────────────────────────────────────────────────────

fn detect(registry: &mut TypeRegistry<'_>, info: TypeInfoId) -> Vec<(TypeInfoId, DependencyTag)> {
    let model = registry.model();
    let record = registry.info(info).clone();
    let decl = model.get(record.decl);
    let params = &decl.generic_params;
    let args = &record.generic_args;
    let mut deps = Vec::new();

    if let Some(base) = record.base {
        add_info(registry, info, &mut deps, base, true);
    }
    for &interface in &record.union_of_interfaces {
        add_info(registry, info, &mut deps, interface, true);
    }
    for field in &decl.fields {
        add_type(registry, info, &mut deps, &field.ty.substitute(params, args), false);
    }
    // Other kinds only need a forward mention of their signature types.
    if record.kind == TypeKind::Delegate {
        for method in &decl.methods {
            if let Some(ret) = &method.return_type {
                add_type(registry, info, &mut deps, &ret.substitute(params, args), false);
            }
            for param in &method.params {
                add_type(registry, info, &mut deps, &param.ty.substitute(params, args), false);
            }
        }
    }
    deps
}

/// Pointers, arrays and by-reference uses never need a full definition.
fn add_type(
    registry: &mut TypeRegistry<'_>,
    owner: TypeInfoId,
    deps: &mut Vec<(TypeInfoId, DependencyTag)>,
    ty: &SourceType,
    forced: bool,
) {
    let Some(tref) = ty.as_named() else {
        return;
    };
    let info = registry.type_info(tref);
    add_info(registry, owner, deps, info, forced);
}

fn add_info(
    registry: &mut TypeRegistry<'_>,
    owner: TypeInfoId,
    deps: &mut Vec<(TypeInfoId, DependencyTag)>,
    info: TypeInfoId,
    forced: bool,
) {
    let args = registry.info(info).generic_args.clone();
    for arg in &args {
        add_type(registry, owner, deps, arg, forced);
    }

    let target = registry.info(info).definition();
    if !forced && !registry.info(target).is_value_type() {
        return;
    }
    if target == owner {
        return;
    }
    let tag = if forced {
        DependencyTag::Forced
    } else {
        DependencyTag::Conditional
    };
    match deps.iter_mut().find(|(id, _)| *id == target) {
        Some(entry) => {
            if forced {
                entry.1 = DependencyTag::Forced;
            }
        }
        None => deps.push((target, tag)),
    }
}
