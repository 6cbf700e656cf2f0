//! Dependency Graph & Clearer tests.
//!
//! These tests verify that:
//! - base types and interfaces are forced dependencies
//! - only by-value fields are recorded, and self-references never are
//! - generic instantiations collapse onto their definition
//! - the sweep and the work-queue driver both converge on a valid order
//! - enumerations come first when configured, also in generated graphs
//! - long by-value chains are ordered along the chain
//! - value cycles are reported and the stuck types still emitted

use bridge_codegen::{DependencyGraph, DependencyTag, EmissionPlan, Session};
use bridge_common::{BridgeConfig, BridgeWarning, NameFixup};
use bridge_types::{DeclId, MethodDecl, SourceModel, SourceType, TypeDecl, TypeRegistry};

// ── Helpers ────────────────────────────────────────────────────────────

fn system(model: &SourceModel, dotted: &str) -> SourceType {
    model.named(dotted).unwrap()
}

fn class(model: &mut SourceModel, name: &str) -> DeclId {
    let object = system(model, "System.Object");
    model.add(TypeDecl::new("App", name).extends(object))
}

fn value(model: &mut SourceModel, name: &str) -> DeclId {
    let value = system(model, "System.ValueType");
    model.add(TypeDecl::new("App", name).extends(value))
}

fn field(model: &mut SourceModel, owner: DeclId, name: &str, ty: SourceType) {
    let decl = model.get_mut(owner).clone().field(name, ty);
    *model.get_mut(owner) = decl;
}

/// Every dependency inside the graph is emitted before its dependent.
fn assert_valid_order(graph: &DependencyGraph, fresh: &DependencyGraph, plan: &EmissionPlan) {
    assert_eq!(plan.order.len(), graph.len());
    for (position, id) in plan.order.iter().enumerate() {
        for (dep, _) in fresh.dependencies(*id) {
            if !fresh.contains(*dep) {
                continue;
            }
            let dep_position = plan.order.iter().position(|o| o == dep).unwrap();
            assert!(
                dep_position < position,
                "{} emitted before its dependency {}",
                plan.names[position],
                plan.names[dep_position]
            );
        }
    }
}

/// Shape holds a Line by value, Line holds two Points, Derived extends
/// Base and implements IFoo, Color is an enum.
fn layered() -> (SourceModel, Vec<DeclId>) {
    let mut model = SourceModel::with_system_types();
    let int = system(&model, "System.Int32");
    let enum_base = system(&model, "System.Enum");

    let point = value(&mut model, "Point");
    field(&mut model, point, "x", int.clone());
    field(&mut model, point, "y", int);
    let line = value(&mut model, "Line");
    field(&mut model, line, "a", SourceType::named(point));
    field(&mut model, line, "b", SourceType::named(point));
    let shape = class(&mut model, "Shape");
    field(&mut model, shape, "line", SourceType::named(line));

    let foo = model.add(TypeDecl::new("App", "IFoo").interface());
    let base = class(&mut model, "Base");
    let derived = model.add(
        TypeDecl::new("App", "Derived")
            .extends(SourceType::named(base))
            .implements(SourceType::named(foo)),
    );
    let color = model.add(TypeDecl::new("App", "Color").extends(enum_base));

    (model, vec![shape, line, point, derived, base, foo, color])
}

// ── Detection ──────────────────────────────────────────────────────────

#[test]
fn test_base_and_interfaces_are_forced() {
    let (model, decls) = layered();
    let mut registry = TypeRegistry::new(&model, NameFixup::default());
    let graph = DependencyGraph::detect_all(&mut registry, &decls, true).unwrap();

    let derived = registry.declared_type_info(decls[3]).unwrap();
    let base = registry.declared_type_info(decls[4]).unwrap();
    let foo = registry.declared_type_info(decls[5]).unwrap();
    assert_eq!(
        graph.dependencies(derived),
        &[(base, DependencyTag::Forced), (foo, DependencyTag::Forced)]
    );
    assert!(!graph.dependency_cleared(derived));
}

#[test]
fn test_by_value_fields_are_conditional() {
    let (model, decls) = layered();
    let mut registry = TypeRegistry::new(&model, NameFixup::default());
    let graph = DependencyGraph::detect_all(&mut registry, &decls, true).unwrap();

    let shape = registry.declared_type_info(decls[0]).unwrap();
    let line = registry.declared_type_info(decls[1]).unwrap();
    let point = registry.declared_type_info(decls[2]).unwrap();
    assert_eq!(graph.dependencies(shape), &[(line, DependencyTag::Conditional)]);
    // Two fields of the same type are one dependency.
    assert_eq!(graph.dependencies(line), &[(point, DependencyTag::Conditional)]);
}

#[test]
fn test_pointer_and_self_references_are_skipped() {
    let mut model = SourceModel::with_system_types();
    let node = value(&mut model, "Node");
    field(&mut model, node, "next", SourceType::named(node).pointer());
    let list = class(&mut model, "List");
    field(&mut model, list, "head", SourceType::named(list));
    field(&mut model, list, "items", SourceType::named(node).array());

    let mut registry = TypeRegistry::new(&model, NameFixup::default());
    let graph = DependencyGraph::detect_all(&mut registry, &[node, list], true).unwrap();
    let node = registry.declared_type_info(node).unwrap();
    let list = registry.declared_type_info(list).unwrap();
    assert_eq!(graph.remaining_dependencies(node), 0);
    assert_eq!(graph.remaining_dependencies(list), 0);
}

#[test]
fn test_generic_instantiations_collapse_onto_definition() {
    let mut model = SourceModel::with_system_types();
    let value_base = system(&model, "System.ValueType");
    let point = value(&mut model, "Point");
    let item = class(&mut model, "Item");
    let pair = model.add(
        TypeDecl::new("App", "Pair")
            .generic(&["K", "V"])
            .extends(value_base),
    );
    let holder = class(&mut model, "Holder");
    field(
        &mut model,
        holder,
        "a",
        SourceType::generic(pair, vec![SourceType::named(point), SourceType::named(item)]),
    );
    field(
        &mut model,
        holder,
        "b",
        SourceType::generic(pair, vec![SourceType::named(point), SourceType::named(point)]),
    );

    let mut registry = TypeRegistry::new(&model, NameFixup::default());
    let graph =
        DependencyGraph::detect_all(&mut registry, &[point, item, pair, holder], true).unwrap();
    let holder = registry.declared_type_info(holder).unwrap();
    let pair = registry.declared_type_info(pair).unwrap();
    let point = registry.declared_type_info(point).unwrap();
    // Item is reached by pointer and is not recorded.
    assert_eq!(
        graph.dependencies(holder),
        &[
            (point, DependencyTag::Conditional),
            (pair, DependencyTag::Conditional)
        ]
    );
}

#[test]
fn test_forced_generic_argument_wins_over_field() {
    let mut model = SourceModel::with_system_types();
    let point = value(&mut model, "Point");
    let comparer = model.add(TypeDecl::new("App", "IComparer").interface().generic(&["T"]));
    let sorter = class(&mut model, "Sorter");
    let decl = model
        .get(sorter)
        .clone()
        .implements(SourceType::generic(comparer, vec![SourceType::named(point)]))
        .field("last", SourceType::named(point));
    *model.get_mut(sorter) = decl;

    let mut registry = TypeRegistry::new(&model, NameFixup::default());
    let graph = DependencyGraph::detect_all(&mut registry, &[point, comparer, sorter], true).unwrap();
    let sorter = registry.declared_type_info(sorter).unwrap();
    let point = registry.declared_type_info(point).unwrap();
    let comparer = registry.declared_type_info(comparer).unwrap();
    assert_eq!(
        graph.dependencies(sorter),
        &[(point, DependencyTag::Forced), (comparer, DependencyTag::Forced)]
    );
}

#[test]
fn test_delegate_signatures_count_only_for_delegates() {
    let mut model = SourceModel::with_system_types();
    let delegate = system(&model, "System.MulticastDelegate");
    let point = value(&mut model, "Point");
    let item = class(&mut model, "Item");
    let invoke = MethodDecl::new("Invoke")
        .param("p", SourceType::named(point))
        .returns(SourceType::named(item));
    let callback = model.add(
        TypeDecl::new("App", "Callback")
            .extends(delegate)
            .method(invoke.clone()),
    );
    let service = class(&mut model, "Service");
    let decl = model.get(service).clone().method(invoke);
    *model.get_mut(service) = decl;

    let mut registry = TypeRegistry::new(&model, NameFixup::default());
    let graph =
        DependencyGraph::detect_all(&mut registry, &[point, item, callback, service], true).unwrap();
    let callback = registry.declared_type_info(callback).unwrap();
    let service = registry.declared_type_info(service).unwrap();
    let point = registry.declared_type_info(point).unwrap();
    assert_eq!(graph.dependencies(callback), &[(point, DependencyTag::Conditional)]);
    assert!(graph.dependencies(service).is_empty());
}

// ── Clearing ───────────────────────────────────────────────────────────

#[test]
fn test_remove_solved_dependencies() {
    let (model, decls) = layered();
    let mut registry = TypeRegistry::new(&model, NameFixup::default());
    let mut graph = DependencyGraph::detect_all(&mut registry, &decls, true).unwrap();
    let line = registry.declared_type_info(decls[1]).unwrap();
    let point = registry.declared_type_info(decls[2]).unwrap();

    // Point's only dependency is external, so it is solved at once.
    assert_eq!(graph.remaining_dependencies(point), 1);
    assert!(graph.remove_solved_dependencies(point));
    assert_eq!(graph.remaining_dependencies(point), 0);
    assert!(!graph.remove_solved_dependencies(point));

    assert!(!graph.remove_solved_dependencies(line));
    graph.mark_cleared(point).unwrap();
    assert!(graph.dependency_cleared(point));
    assert!(graph.remove_solved_dependencies(line));
    assert_eq!(graph.remaining_dependencies(line), 0);
}

#[test]
#[cfg_attr(debug_assertions, should_panic(expected = "dependencies remaining"))]
fn test_clearing_with_pending_dependencies_is_rejected() {
    let (model, decls) = layered();
    let mut registry = TypeRegistry::new(&model, NameFixup::default());
    let mut graph = DependencyGraph::detect_all(&mut registry, &decls, true).unwrap();
    let shape = registry.declared_type_info(decls[0]).unwrap();
    let err = graph.mark_cleared(shape).unwrap_err();
    assert_eq!(err.code(), "E0111");
}

#[test]
fn test_sweep_converges() {
    let (model, decls) = layered();
    let mut registry = TypeRegistry::new(&model, NameFixup::default());
    let fresh = DependencyGraph::detect_all(&mut registry, &decls, true).unwrap();
    let mut graph = fresh.clone();
    let plan = graph.sweep();

    assert_eq!(plan.cycle, None);
    assert_valid_order(&graph, &fresh, &plan);
    for id in graph.declared() {
        assert!(graph.dependency_cleared(*id));
        assert_eq!(graph.remaining_dependencies(*id), 0);
    }
    assert_eq!(
        plan.names,
        vec![
            "::App::Color",
            "::App::Base",
            "::App::IFoo",
            "::App::Point",
            "::App::Derived",
            "::App::Line",
            "::App::Shape",
        ]
    );
}

#[test]
fn test_work_queue_matches_sweep() {
    let (model, decls) = layered();
    let mut registry = TypeRegistry::new(&model, NameFixup::default());
    let graph = DependencyGraph::detect_all(&mut registry, &decls, true).unwrap();
    let plan = graph.plan();
    assert_valid_order(&graph, &graph, &plan);
    assert_eq!(plan, graph.clone().sweep());
    // Planning leaves the flags alone.
    assert!(graph.declared().iter().all(|id| !graph.dependency_cleared(*id)));
}

#[test]
fn test_enums_first_can_be_disabled() {
    let (model, decls) = layered();
    let mut registry = TypeRegistry::new(&model, NameFixup::default());
    let graph = DependencyGraph::detect_all(&mut registry, &decls, false).unwrap();
    let plan = graph.plan();
    assert_eq!(&plan.names[..4], &["::App::Base", "::App::Color", "::App::IFoo", "::App::Point"]);
}

#[test]
fn test_long_value_chain() {
    let mut model = SourceModel::with_system_types();
    let int = system(&model, "System.Int32");
    let mut decls = Vec::new();
    for i in 0..200 {
        let link = value(&mut model, &format!("V{i:03}"));
        let ty = match decls.last() {
            Some(prev) => SourceType::named(*prev),
            None => int.clone(),
        };
        field(&mut model, link, "inner", ty);
        decls.push(link);
    }
    decls.reverse();

    let mut registry = TypeRegistry::new(&model, NameFixup::default());
    let graph = DependencyGraph::detect_all(&mut registry, &decls, true).unwrap();
    let plan = graph.plan();
    assert_eq!(plan.cycle, None);
    assert_valid_order(&graph, &graph, &plan);
    let expected: Vec<String> = (0..200).map(|i| format!("::App::V{i:03}")).collect();
    assert_eq!(plan.names, expected);
    assert_eq!(graph.clone().sweep(), plan);
}

/// Four layers of eight types; each holds two types of the previous layer
/// by value plus one of four enums.
fn generated_layers() -> (SourceModel, Vec<DeclId>) {
    let mut model = SourceModel::with_system_types();
    let enum_base = system(&model, "System.Enum");
    let int = system(&model, "System.Int32");
    let enums: Vec<DeclId> = (0..4)
        .map(|e| model.add(TypeDecl::new("App", &format!("E{e}")).extends(enum_base.clone())))
        .collect();

    let mut decls = enums.clone();
    let mut previous: Vec<DeclId> = Vec::new();
    for layer in 0..4 {
        let mut current = Vec::new();
        for j in 0..8 {
            let name = format!("L{layer}N{j}");
            let decl = if j % 3 == 0 {
                class(&mut model, &name)
            } else {
                value(&mut model, &name)
            };
            field(&mut model, decl, "tag", SourceType::named(enums[(layer + j) % 4]));
            if previous.is_empty() {
                field(&mut model, decl, "raw", int.clone());
            } else {
                field(&mut model, decl, "left", SourceType::named(previous[j]));
                field(&mut model, decl, "right", SourceType::named(previous[(j + 3) % 8]));
            }
            current.push(decl);
        }
        decls.extend(current.iter().copied());
        previous = current;
    }
    decls.reverse();
    (model, decls)
}

#[test]
fn test_generated_layers_emit_enums_first() {
    let (model, decls) = generated_layers();
    let mut registry = TypeRegistry::new(&model, NameFixup::default());
    let graph = DependencyGraph::detect_all(&mut registry, &decls, true).unwrap();
    assert_eq!(graph.len(), 36);

    let planned = graph.plan();
    let swept = graph.clone().sweep();
    for plan in [&planned, &swept] {
        assert_eq!(plan.cycle, None);
        assert_valid_order(&graph, &graph, plan);
        let last_enum = plan
            .names
            .iter()
            .rposition(|n| n.starts_with("::App::E"))
            .unwrap();
        let first_other = plan
            .names
            .iter()
            .position(|n| n.starts_with("::App::L"))
            .unwrap();
        assert_eq!(last_enum, 3);
        assert!(last_enum < first_other);
    }
}

// ── Cycles ─────────────────────────────────────────────────────────────

fn cyclic() -> (SourceModel, Vec<DeclId>) {
    let mut model = SourceModel::with_system_types();
    let int = system(&model, "System.Int32");
    let a = value(&mut model, "A");
    let b = value(&mut model, "B");
    let c = value(&mut model, "C");
    let d = value(&mut model, "D");
    field(&mut model, a, "b", SourceType::named(b));
    field(&mut model, b, "a", SourceType::named(a));
    field(&mut model, c, "x", int);
    field(&mut model, d, "a", SourceType::named(a));
    (model, vec![d, c, b, a])
}

#[test]
fn test_cycle_is_reported_and_emitted_last() {
    let (model, decls) = cyclic();
    let mut registry = TypeRegistry::new(&model, NameFixup::default());
    let graph = DependencyGraph::detect_all(&mut registry, &decls, true).unwrap();

    let plan = graph.plan();
    assert_eq!(plan.names, vec!["::App::C", "::App::A", "::App::B", "::App::D"]);
    assert_eq!(
        plan.cycle,
        Some(vec![
            "::App::A".to_string(),
            "::App::B".to_string(),
            "::App::A".to_string()
        ])
    );
    assert_eq!(graph.clone().sweep(), plan);
}

#[test]
fn test_session_reports_cycle_warning() {
    let (model, decls) = cyclic();
    let mut session = Session::new(&model, BridgeConfig::default());
    let plan = session.plan_emission(&decls).unwrap();
    assert!(plan.cycle.is_some());

    let diagnostics = session.diagnostics();
    assert!(!diagnostics.has_errors());
    assert!(matches!(
        diagnostics.warnings(),
        [BridgeWarning::DependencyCycle { .. }]
    ));
    assert_eq!(
        diagnostics.render(),
        vec!["warning[W0120]: dependency cycle: ::App::A -> ::App::B -> ::App::A"]
    );
}

#[test]
fn test_plan_json() {
    let (model, decls) = layered();
    let mut session = Session::new(&model, BridgeConfig::default());
    let plan = session.plan_emission(&decls[2..3]).unwrap();
    let json: serde_json::Value = serde_json::from_str(&plan.to_json()).unwrap();
    assert_eq!(json["names"][0], "::App::Point");
    assert!(json["cycle"].is_null());
}
