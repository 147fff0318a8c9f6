mod common;

use common::*;
use pretty_assertions::assert_eq;
use privscan_analysis::{
    context::ClassificationContext, first_private::refine_first_private,
    synthesize::to_descriptor, AnalysisConfig, DependenceFlags, DependenceKinds, PrivateError,
    PrivateRecognitionPass, TraitFlags, TraitSet,
};
use privscan_core::{
    AliasNodeKind, BlockId, DefUseSet, DefinitionInfo, DependenceKind, Direction, DfNodeId,
    Function, LiveSet, MemoryLocation, Operation, ValueKind,
};
use std::collections::BTreeSet;

#[test]
fn test_accumulator_dead_after_loop_is_private() {
    let mut scenario = Scenario::new();
    let (s, node, _) = scenario.object("s", 4);
    let loc = MemoryLocation::sized(s, 4);
    let store = scenario.store(loc);
    scenario.load(loc);
    scenario
        .def(loc)
        .carried(store, store, DependenceKind::Output, Direction::All);
    let function = scenario.build();

    let info = classify(&function);
    let descriptor = node_descriptor(&info, function.regions.top_level()[0], node);
    assert_eq!(
        descriptor.flags(),
        TraitFlags::PRIVATE | TraitFlags::EXPLICIT_ACCESS
    );
    assert_eq!(info.statistics().private, 1);
}

#[test]
fn test_accumulator_live_after_loop_is_last_private() {
    let mut scenario = Scenario::new();
    let (s, node, _) = scenario.object("s", 4);
    let loc = MemoryLocation::sized(s, 4);
    let store = scenario.store(loc);
    scenario
        .def(loc)
        .live_out(loc)
        .written_before_exit(loc)
        .carried(store, store, DependenceKind::Output, Direction::All);
    let region = scenario.region;
    let function = scenario.build();

    let descriptor = node_descriptor(&classify(&function), region, node);
    assert!(descriptor.is(TraitFlags::LAST_PRIVATE));
    assert!(!descriptor.is_any(TraitFlags::PRIVATE | TraitFlags::FIRST_PRIVATE));
}

#[test]
fn test_written_on_latch_path_only_is_second_to_last_private() {
    let mut scenario = Scenario::new();
    let (s, node, _) = scenario.object("s", 4);
    let loc = MemoryLocation::sized(s, 4);
    let store = scenario.store(loc);
    scenario
        .may_def(loc)
        .live_out(loc)
        .written_before_latch(loc)
        .carried(store, store, DependenceKind::Output, Direction::All);
    let region = scenario.region;
    let function = scenario.build();

    let descriptor = node_descriptor(&classify(&function), region, node);
    assert_eq!(
        descriptor.flags(),
        TraitFlags::SECOND_TO_LAST_PRIVATE | TraitFlags::FIRST_PRIVATE | TraitFlags::EXPLICIT_ACCESS
    );
}

#[test]
fn test_conditionally_written_is_dynamic_private() {
    let mut scenario = Scenario::new();
    let (s, node, _) = scenario.object("s", 4);
    let loc = MemoryLocation::sized(s, 4);
    let store = scenario.store(loc);
    scenario
        .may_def(loc)
        .live_out(loc)
        .maybe_written_before_exit(loc)
        .carried(store, store, DependenceKind::Output, Direction::All);
    let region = scenario.region;
    let function = scenario.build();

    let descriptor = node_descriptor(&classify(&function), region, node);
    assert!(descriptor.is(TraitFlags::DYNAMIC_PRIVATE | TraitFlags::FIRST_PRIVATE));
    assert!(!descriptor.is_any(TraitFlags::LAST_PRIVATE | TraitFlags::SECOND_TO_LAST_PRIVATE));
}

#[test]
fn test_element_written_then_read_in_same_iteration_is_private() {
    let mut scenario = Scenario::new();
    let (_, node, a) = scenario.object("a", 40);
    let (a_i, _) = scenario.element(node, a, "a.i", 0, 4);
    let loc = MemoryLocation::sized(a_i, 4);
    let store = scenario.store(loc);
    let load = scenario.load(loc);
    scenario
        .def(loc)
        .carried(store, load, DependenceKind::Flow, Direction::Eq)
        .carried(store, store, DependenceKind::Output, Direction::All);
    let region = scenario.region;
    let function = scenario.build();

    let info = classify(&function);
    let descriptor = node_descriptor(&info, region, node);
    assert!(descriptor.is(TraitFlags::PRIVATE));
    assert!(!descriptor.is_any(TraitFlags::FIRST_PRIVATE | TraitFlags::DEPENDENCY));
    // The element was generalized to the whole array.
    let set = info.get(region).unwrap();
    assert!(set.memory(a).is_some());
}

#[test]
fn test_element_read_before_write_is_flow_dependence() {
    let mut scenario = Scenario::new();
    let (_, node, a) = scenario.object("a", 40);
    let (a_i, a_i_em) = scenario.element(node, a, "a.i", 0, 4);
    let loc = MemoryLocation::sized(a_i, 4);
    let load = scenario.load(loc);
    let store = scenario.store(loc);
    scenario
        .exposed_use(loc)
        .def(loc)
        .carried(load, store, DependenceKind::Anti, Direction::Gt);
    let region = scenario.region;
    let function = scenario.build();

    let info = classify(&function);
    let descriptor = node_descriptor(&info, region, node);
    assert!(descriptor.is_dependency());
    assert!(!descriptor.is_private());

    // The element is reported through the whole array, together with its record.
    let set = info.get(region).unwrap();
    assert!(set.memory(a_i_em).is_none());
    let record = set.memory(a).unwrap().dependence.as_ref().unwrap();
    assert_eq!(record.kinds(), DependenceKinds::FLOW);
    assert!(record
        .kind(DependenceKinds::FLOW)
        .unwrap()
        .flags
        .contains(DependenceFlags::LOAD_STORE_CAUSE));
}

#[test]
fn test_write_through_reassigned_pointer_is_dependence() {
    let mut scenario = Scenario::new();
    let (p, p_node, _) = scenario.object("p", 8);
    let p_loc = MemoryLocation::sized(p, 8);

    let target_node = scenario
        .tree
        .add_node(scenario.tree.top(), AliasNodeKind::Estimate)
        .unwrap();
    let q = scenario
        .function
        .add_value("q", ValueKind::Load { location: p_loc });
    scenario
        .tree
        .add_estimate(target_node, vec![q], Some(4), 0, None)
        .unwrap();
    let q_loc = MemoryLocation::sized(q, 4);

    let load_p = scenario.load(p_loc);
    scenario.store(q_loc);
    let store_p = scenario.store(p_loc);
    scenario
        .exposed_use(p_loc)
        .may_def(p_loc)
        .def(q_loc)
        .carried(load_p, store_p, DependenceKind::Anti, Direction::All);
    let region = scenario.region;
    let function = scenario.build();

    let info = classify(&function);
    assert!(node_descriptor(&info, region, p_node).is_dependency());
    let target = node_descriptor(&info, region, target_node);
    assert!(target.is(TraitFlags::DEPENDENCY));
    assert!(!target.is_private());
}

#[test]
fn test_coarse_node_never_reports_private_variant() {
    let mut scenario = Scenario::new();
    let node = scenario
        .tree
        .add_node(scenario.tree.top(), AliasNodeKind::Estimate)
        .unwrap();
    let (x, _) = scenario.object_in(node, "x", 4);
    let (y, _) = scenario.object_in(node, "y", 4);
    let x_loc = MemoryLocation::sized(x, 4);
    let y_loc = MemoryLocation::sized(y, 4);
    scenario.load(x_loc);
    scenario.store(y_loc);
    scenario.exposed_use(x_loc).def(y_loc);
    let region = scenario.region;
    let function = scenario.build();

    let info = classify(&function);
    let alias_trait = info.get(region).unwrap().get(node).unwrap();
    assert_eq!(alias_trait.memories.len(), 2);
    assert!(alias_trait.memories[0].descriptor.is(TraitFlags::READONLY));
    assert!(alias_trait.memories[1].descriptor.is(TraitFlags::SHARED));
    assert_eq!(
        alias_trait.descriptor.flags(),
        TraitFlags::DEPENDENCY | TraitFlags::EXPLICIT_ACCESS
    );
}

#[test]
fn test_coarse_node_without_accesses_is_dependence() {
    let mut scenario = Scenario::new();
    let node = scenario
        .tree
        .add_node(scenario.tree.top(), AliasNodeKind::Estimate)
        .unwrap();
    for name in ["g", "h"] {
        let (object, _) = scenario.object_in(node, name, 4);
        scenario.def_use.add_address_access(object);
        scenario
            .function
            .add_instruction(BODY, Operation::PtrToInt { operand: object });
    }
    let region = scenario.region;
    let function = scenario.build();

    let info = classify(&function);
    let alias_trait = info.get(region).unwrap().get(node).unwrap();
    assert_eq!(
        alias_trait.descriptor.flags(),
        TraitFlags::DEPENDENCY | TraitFlags::ADDRESS_ACCESS
    );
    for memory in &alias_trait.memories {
        assert_eq!(
            memory.descriptor.flags(),
            TraitFlags::NO_ACCESS | TraitFlags::ADDRESS_ACCESS
        );
    }
    assert_eq!(info.statistics().address_access, 2);
}

#[test]
fn test_read_and_written_without_dependence_is_read_only() {
    let mut scenario = Scenario::new();
    let (s, node, _) = scenario.object("s", 4);
    let loc = MemoryLocation::sized(s, 4);
    scenario.load(loc);
    scenario.store(loc);
    scenario.exposed_use(loc).def(loc);
    let region = scenario.region;
    let function = scenario.build();

    let info = classify(&function);
    assert_eq!(
        node_descriptor(&info, region, node).flags(),
        TraitFlags::READONLY | TraitFlags::EXPLICIT_ACCESS
    );
    assert_eq!(info.statistics().readonly, 1);
}

#[test]
fn test_written_without_dependence_is_shared_only() {
    let mut scenario = Scenario::new();
    let (s, node, _) = scenario.object("s", 4);
    let loc = MemoryLocation::sized(s, 4);
    scenario.store(loc);
    scenario.def(loc);
    let region = scenario.region;
    let function = scenario.build();

    let info = classify(&function);
    assert_eq!(
        node_descriptor(&info, region, node).flags(),
        TraitFlags::SHARED | TraitFlags::EXPLICIT_ACCESS
    );
    assert_eq!(info.statistics().shared, 1);
    assert_eq!(info.statistics().private, 0);
}

#[test]
fn test_coarse_node_of_read_only_scalars_is_read_only() {
    let mut scenario = Scenario::new();
    let node = scenario
        .tree
        .add_node(scenario.tree.top(), AliasNodeKind::Estimate)
        .unwrap();
    let (x, _) = scenario.object_in(node, "x", 4);
    let (y, _) = scenario.object_in(node, "y", 4);
    let x_loc = MemoryLocation::sized(x, 4);
    let y_loc = MemoryLocation::sized(y, 4);
    scenario.load(x_loc);
    scenario.load(y_loc);
    scenario.exposed_use(x_loc).exposed_use(y_loc);
    let region = scenario.region;
    let function = scenario.build();

    let info = classify(&function);
    assert_eq!(
        node_descriptor(&info, region, node).flags(),
        TraitFlags::READONLY | TraitFlags::EXPLICIT_ACCESS
    );
    assert_eq!(info.statistics().readonly, 2);
}

#[test]
fn test_partially_written_array_needs_first_private() {
    let build = |both_written: bool| {
        let mut scenario = Scenario::new();
        let (_, node, a) = scenario.object("a", 16);
        let (lo, _) = scenario.element(node, a, "a.lo", 0, 8);
        let (hi, _) = scenario.element(node, a, "a.hi", 8, 8);
        let lo_loc = MemoryLocation::sized(lo, 8);
        let hi_loc = MemoryLocation::sized(hi, 8);
        let store_lo = scenario.store(lo_loc);
        let store_hi = scenario.store(hi_loc);
        scenario
            .def(lo_loc)
            .def(hi_loc)
            .live_out(lo_loc)
            .live_out(hi_loc)
            .written_before_exit(lo_loc)
            .carried(store_lo, store_lo, DependenceKind::Output, Direction::All)
            .carried(store_hi, store_hi, DependenceKind::Output, Direction::All);
        if both_written {
            scenario.written_before_exit(hi_loc);
        }
        let region = scenario.region;
        (scenario.build(), region, node)
    };

    let (function, region, node) = build(false);
    let info = classify(&function);
    let descriptor = node_descriptor(&info, region, node);
    assert!(descriptor.is(TraitFlags::LAST_PRIVATE | TraitFlags::FIRST_PRIVATE));
    assert_eq!(info.statistics().first_private, 1);

    let (function, region, node) = build(true);
    let descriptor = node_descriptor(&classify(&function), region, node);
    assert!(descriptor.is(TraitFlags::LAST_PRIVATE));
    assert!(!descriptor.is(TraitFlags::FIRST_PRIVATE));
}

#[test]
fn test_descendants_of_covered_node_are_forced_to_dependence() {
    let mut scenario = Scenario::new();
    let (buf, outer, buf_em) = scenario.object("buf", 16);
    let inner = scenario
        .tree
        .add_node(outer, AliasNodeKind::Estimate)
        .unwrap();
    let (view, _) = scenario.element(inner, buf_em, "view", 0, 4);
    let buf_loc = MemoryLocation::sized(buf, 16);
    let view_loc = MemoryLocation::sized(view, 4);
    scenario.load(buf_loc);
    scenario.store(view_loc);
    scenario.exposed_use(buf_loc).def(view_loc);
    let region = scenario.region;
    let function = scenario.build();

    let info = classify(&function);
    let forced = node_descriptor(&info, region, inner);
    assert!(forced.is(TraitFlags::DEPENDENCY));
    assert!(!forced.is_any(TraitFlags::ANY_PRIVATE | TraitFlags::READONLY | TraitFlags::SHARED));
    let covering = node_descriptor(&info, region, outer);
    assert!(covering.is(TraitFlags::EXPLICIT_ACCESS));
}

#[test]
fn test_escaping_address_is_marked() {
    let mut scenario = Scenario::new();
    let (g, node, _) = scenario.object("g", 4);
    scenario.def_use.add_address_access(g);
    scenario
        .function
        .add_instruction(BODY, Operation::PtrToInt { operand: g });
    let region = scenario.region;
    let function = scenario.build();

    let info = classify(&function);
    let descriptor = node_descriptor(&info, region, node);
    assert_eq!(
        descriptor.flags(),
        TraitFlags::NO_ACCESS | TraitFlags::ADDRESS_ACCESS
    );
    assert_eq!(info.statistics().address_access, 1);
}

#[test]
fn test_address_of_object_allocated_in_loop_is_ignored() {
    let mut scenario = Scenario::new();
    let node = scenario
        .tree
        .add_node(scenario.tree.top(), AliasNodeKind::Estimate)
        .unwrap();
    let tmp = scenario
        .function
        .add_value("tmp", ValueKind::Alloca { block: BODY });
    scenario
        .tree
        .add_estimate(node, vec![tmp], Some(4), 0, None)
        .unwrap();
    scenario.def_use.add_address_access(tmp);
    scenario
        .function
        .add_instruction(BODY, Operation::PtrToInt { operand: tmp });
    let region = scenario.region;
    let function = scenario.build();

    let info = classify(&function);
    assert!(info.get(region).unwrap().get(node).is_none());
}

#[test]
fn test_unknown_call_makes_node_dependent() {
    let mut scenario = Scenario::new();
    let (x, node, x_em) = scenario.object("x", 4);
    let x_loc = MemoryLocation::sized(x, 4);
    scenario.load(x_loc);
    let call = scenario.function.add_instruction(
        BODY,
        Operation::Call {
            callee: "update".to_string(),
            reads_only: false,
            accesses: Vec::new(),
        },
    );
    scenario.tree.add_unknown(node, call).unwrap();
    scenario.def_use.add_explicit_unknown(call);
    scenario.exposed_use(x_loc);
    let region = scenario.region;
    let function = scenario.build();

    let info = classify(&function);
    let alias_trait = info.get(region).unwrap().get(node).unwrap();
    assert!(alias_trait.descriptor.is(TraitFlags::DEPENDENCY | TraitFlags::EXPLICIT_ACCESS));
    assert!(alias_trait.unknown(call).unwrap().descriptor.is_dependency());

    let record = alias_trait.memory(x_em).unwrap().dependence.as_ref().unwrap();
    assert!(record.is(DependenceKinds::all()));
    let flow = record.kind(DependenceKinds::FLOW).unwrap();
    assert!(flow.flags.contains(
        DependenceFlags::MAY | DependenceFlags::CALL_CAUSE | DependenceFlags::UNKNOWN_DISTANCE
    ));
    assert!(flow.distances.is_empty());
}

#[test]
fn test_function_without_alias_tree_has_no_results() {
    let mut scenario = Scenario::new();
    let (s, _, _) = scenario.object("s", 4);
    scenario.store(MemoryLocation::sized(s, 4));
    let mut function = scenario.build();
    function.alias_tree = None;

    assert!(classify(&function).is_empty());
}

#[test]
fn test_function_without_loops_has_no_results() {
    let function = Function::new("straight_line");
    assert!(classify(&function).is_empty());
}

#[test]
fn test_reclassification_is_deterministic() {
    let mut scenario = Scenario::new();
    let (s, _, _) = scenario.object("s", 4);
    let (t, _, _) = scenario.object("t", 4);
    let s_loc = MemoryLocation::sized(s, 4);
    let t_loc = MemoryLocation::sized(t, 4);
    let store = scenario.store(s_loc);
    scenario.load(t_loc);
    scenario
        .def(s_loc)
        .exposed_use(t_loc)
        .live_out(s_loc)
        .carried(store, store, DependenceKind::Output, Direction::Lt);
    let function = scenario.build();

    assert_eq!(classify(&function), classify(&function));
}

#[test]
fn test_nested_loops_are_reported_outer_first() {
    let mut scenario = Scenario::new();
    let (s, _, _) = scenario.object("s", 4);
    let loc = MemoryLocation::sized(s, 4);
    scenario.load(loc);
    scenario.exposed_use(loc);
    let outer = scenario.region;
    let mut function = scenario.build();

    let inner_blocks: BTreeSet<BlockId> = [BODY].into_iter().collect();
    let inner = function
        .regions
        .add_loop("inner", Some(outer), BODY, inner_blocks, DfNodeId(2), DfNodeId(3), None)
        .unwrap();
    let mut def_use = DefUseSet::new();
    def_use.add_explicit_access(loc);
    def_use.add_use(loc);
    function.set_def_use(inner, def_use);
    function.set_live(inner, LiveSet::default());
    function.set_reach(DfNodeId(2), DefinitionInfo::default());
    function.set_reach(DfNodeId(3), DefinitionInfo::default());

    let info = classify(&function);
    let order: Vec<_> = info.iter().map(|(region, _)| region).collect();
    assert_eq!(order, vec![outer, inner]);
    assert_eq!(info.get(inner).unwrap().len(), info.get(outer).unwrap().len());
}

#[test]
fn test_missing_liveness_is_reported() {
    let scenario = Scenario::new();
    let region = scenario.region;
    let built = scenario.build();
    let mut broken = Function::new("broken");
    broken.alias_tree = built.alias_tree.clone();
    broken.regions = built.regions.clone();
    broken.set_def_use(region, DefUseSet::new());

    let result = std::panic::catch_unwind(|| PrivateRecognitionPass::new().run(&broken));
    match result {
        Ok(Err(err)) => assert_eq!(err, PrivateError::MissingLive { region }),
        Ok(Ok(_)) => panic!("classification must fail without liveness"),
        // Debug builds assert on the broken contract.
        Err(_) => {}
    }
}

#[test]
fn test_loop_independent_dependences_can_be_kept() {
    let mut scenario = Scenario::new();
    let (s, node, _) = scenario.object("s", 4);
    let loc = MemoryLocation::sized(s, 4);
    let store = scenario.store(loc);
    let load = scenario.load(loc);
    scenario
        .def(loc)
        .carried(store, load, DependenceKind::Flow, Direction::Eq);
    let region = scenario.region;
    let function = scenario.build();

    let default = node_descriptor(&classify(&function), region, node);
    assert_eq!(
        default.flags(),
        TraitFlags::SHARED | TraitFlags::EXPLICIT_ACCESS
    );

    let pass = PrivateRecognitionPass::with_config(AnalysisConfig::new().keep_loop_independent());
    let info = pass.run(&function).unwrap();
    let strict = node_descriptor(&info, region, node);
    assert_eq!(
        strict.flags(),
        TraitFlags::PRIVATE | TraitFlags::EXPLICIT_ACCESS
    );
}

#[test]
fn test_read_only_call_is_read_only() {
    let mut scenario = Scenario::new();
    let (x, node, _) = scenario.object("x", 4);
    let x_loc = MemoryLocation::sized(x, 4);
    scenario.load(x_loc);
    let call = scenario.function.add_instruction(
        BODY,
        Operation::Call {
            callee: "strlen".to_string(),
            reads_only: true,
            accesses: Vec::new(),
        },
    );
    scenario.tree.add_unknown(node, call).unwrap();
    scenario.def_use.add_explicit_unknown(call);
    scenario.exposed_use(x_loc);
    let region = scenario.region;
    let function = scenario.build();

    let info = classify(&function);
    let alias_trait = info.get(region).unwrap().get(node).unwrap();
    assert_eq!(
        alias_trait.unknown(call).unwrap().descriptor.flags(),
        TraitFlags::READONLY | TraitFlags::EXPLICIT_ACCESS
    );
    assert_eq!(
        alias_trait.descriptor.flags(),
        TraitFlags::READONLY | TraitFlags::EXPLICIT_ACCESS
    );
}

#[test]
fn test_pointer_read_only_or_untouched_keeps_target() {
    let build = |touch_pointer: bool| {
        let mut scenario = Scenario::new();
        let (p, _, _) = scenario.object("p", 8);
        let p_loc = MemoryLocation::sized(p, 8);
        let target_node = scenario
            .tree
            .add_node(scenario.tree.top(), AliasNodeKind::Estimate)
            .unwrap();
        let q = scenario
            .function
            .add_value("q", ValueKind::Load { location: p_loc });
        scenario
            .tree
            .add_estimate(target_node, vec![q], Some(4), 0, None)
            .unwrap();
        let q_loc = MemoryLocation::sized(q, 4);

        if touch_pointer {
            scenario.load(p_loc);
            scenario.exposed_use(p_loc);
        }
        let store_q = scenario.store(q_loc);
        scenario
            .def(q_loc)
            .live_out(q_loc)
            .written_before_exit(q_loc)
            .carried(store_q, store_q, DependenceKind::Output, Direction::All);
        let region = scenario.region;
        (scenario.build(), region, target_node)
    };

    for touch_pointer in [true, false] {
        let (function, region, target_node) = build(touch_pointer);
        assert_eq!(
            node_descriptor(&classify(&function), region, target_node).flags(),
            TraitFlags::LAST_PRIVATE | TraitFlags::EXPLICIT_ACCESS
        );
    }
}

#[test]
fn test_header_access_is_flagged() {
    let mut scenario = Scenario::new();
    let (s, _, s_em) = scenario.object("s", 4);
    let (t, _, t_em) = scenario.object("t", 4);
    let s_loc = MemoryLocation::sized(s, 4);
    let t_loc = MemoryLocation::sized(t, 4);
    scenario.def_use.add_explicit_access(s_loc);
    let in_header = scenario.function.add_instruction(
        HEADER,
        Operation::Store {
            location: s_loc,
            value: None,
        },
    );
    let in_body = scenario.store(t_loc);
    scenario
        .def(s_loc)
        .def(t_loc)
        .carried(in_header, in_header, DependenceKind::Output, Direction::All)
        .carried(in_body, in_body, DependenceKind::Output, Direction::All);
    let region = scenario.region;
    let function = scenario.build();

    let info = classify(&function);
    let set = info.get(region).unwrap();
    let output_flags = |em| {
        set.memory(em)
            .and_then(|memory| memory.dependence.as_ref())
            .and_then(|record| record.kind(DependenceKinds::OUTPUT))
            .map(|axis| axis.flags)
            .unwrap()
    };
    assert!(output_flags(s_em)
        .contains(DependenceFlags::LOAD_STORE_CAUSE | DependenceFlags::HEADER_ACCESS));
    assert!(output_flags(t_em).contains(DependenceFlags::LOAD_STORE_CAUSE));
    assert!(!output_flags(t_em).contains(DependenceFlags::HEADER_ACCESS));
}

#[test]
fn test_opaque_access_is_unknown_cause() {
    let mut scenario = Scenario::new();
    let (x, _, x_em) = scenario.object("x", 4);
    let x_loc = MemoryLocation::sized(x, 4);
    scenario.load(x_loc);
    scenario.function.add_instruction(
        BODY,
        Operation::Opaque {
            reads_only: false,
            accesses: vec![x_loc],
        },
    );
    scenario.exposed_use(x_loc);
    let region = scenario.region;
    let function = scenario.build();

    let info = classify(&function);
    let record = info
        .get(region)
        .and_then(|set| set.memory(x_em))
        .and_then(|memory| memory.dependence.as_ref())
        .unwrap();
    assert!(record.is(DependenceKinds::all()));
    let anti = record.kind(DependenceKinds::ANTI).unwrap();
    assert!(anti.flags.contains(
        DependenceFlags::MAY | DependenceFlags::UNKNOWN_CAUSE | DependenceFlags::UNKNOWN_DISTANCE
    ));
    assert!(!anti.flags.contains(DependenceFlags::CALL_CAUSE));
}

#[test]
fn test_second_to_last_private_uses_latch_or_exit_writes() {
    let build = |latch: bool, exit: bool| {
        let mut scenario = Scenario::new();
        let (s, _, em) = scenario.object("s", 4);
        let loc = MemoryLocation::sized(s, 4);
        scenario.store(loc);
        scenario.may_def(loc).live_out(loc);
        if latch {
            scenario.written_before_latch(loc);
        }
        if exit {
            scenario.written_before_exit(loc);
        }
        let region = scenario.region;
        (scenario.build(), region, em)
    };
    let refine = |function: &Function, region, em, value: TraitSet| {
        let tree = function.alias_tree.as_ref().unwrap();
        let mut ctx = ClassificationContext::new(function, tree, region).unwrap();
        let id = ctx.explicit_entry_or_insert(em);
        ctx.entry_mut(id).value = value;
        let mut descriptor = to_descriptor(value, 0, &mut ctx.statistics);
        let refined = refine_first_private(&mut ctx, id, &mut descriptor);
        assert_eq!(refined, descriptor.is(TraitFlags::FIRST_PRIVATE));
        assert_eq!(refined, ctx.entry(id).value.is_below(&TraitSet::FIRST_PRIVATE));
        refined
    };

    let (function, region, em) = build(true, false);
    assert!(!refine(&function, region, em, TraitSet::SECOND_TO_LAST_PRIVATE));
    // The last iteration's value needs the writes reaching the exit.
    assert!(refine(&function, region, em, TraitSet::LAST_PRIVATE));

    let (function, region, em) = build(false, true);
    assert!(!refine(&function, region, em, TraitSet::SECOND_TO_LAST_PRIVATE));

    let (function, region, em) = build(false, false);
    assert!(refine(&function, region, em, TraitSet::SECOND_TO_LAST_PRIVATE));
}

#[test]
fn test_moved_entry_is_counted_once() {
    let mut scenario = Scenario::new();
    let (_, outer, buf_em) = scenario.object("buf", 16);
    let inner = scenario
        .tree
        .add_node(outer, AliasNodeKind::Estimate)
        .unwrap();
    let (view, _) = scenario.element(inner, buf_em, "view", 0, 4);
    let loc = MemoryLocation::sized(view, 4);
    let store = scenario.store(loc);
    scenario
        .def(loc)
        .carried(store, store, DependenceKind::Output, Direction::All);
    let region = scenario.region;
    let function = scenario.build();

    let info = classify(&function);
    assert!(node_descriptor(&info, region, inner).is(TraitFlags::PRIVATE));
    // The entry now names `buf` in the enclosing node.
    assert!(node_descriptor(&info, region, outer).is(TraitFlags::PRIVATE));
    assert_eq!(info.statistics().private, 1);
}
