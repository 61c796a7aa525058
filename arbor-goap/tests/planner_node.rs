#![cfg(feature = "bt")]

use arbor_bt::{
    AlwaysFail, AlwaysSucceed, BehaviorTree, CheckConditionVariable, NodeGuid, Sequence, SetValue,
    Status, TreeBuilder,
};
use arbor_core::{Blackboard, NoWorld, TickContext};
use arbor_goap::{
    Check, GoapAction, GoapActionNode, GoapPlannerNode, Goal, PlanError, PlannerConfig,
    Predicate, WorldState,
};
use arbor_tools::SharedTraceLog;

fn at(t: u64) -> TickContext {
    TickContext::fixed(t, 1.0)
}

fn chop_wood() -> GoapAction {
    GoapAction::new("ChopWood", 1.0)
        .requires(Predicate::equals("hasAxe", true))
        .sets("hasWood", true)
}

fn get_axe() -> GoapAction {
    GoapAction::new("GetAxe", 1.0).sets("hasAxe", true)
}

fn wood_goal() -> Goal {
    Goal::default().with(Predicate::equals("hasWood", true))
}

fn woodcutter_blackboard() -> Blackboard {
    Blackboard::new()
        .with_key("hasAxe", false)
        .with_key("hasWood", false)
}

/// Planner over ChopWood and GetAxe, each performed by a `SetValue` leaf.
fn woodcutter() -> (BehaviorTree<NoWorld>, NodeGuid) {
    let mut b = TreeBuilder::<NoWorld>::new().with_blackboard(woodcutter_blackboard());
    let planner = b.add_node(GoapPlannerNode::new(wood_goal()));
    let chop = b.add_node(GoapActionNode::new(chop_wood()));
    let chop_leaf = b.add_node(SetValue::new("hasWood", true));
    let axe = b.add_node(GoapActionNode::new(get_axe()));
    let axe_leaf = b.add_node(SetValue::new("hasAxe", true));
    b.set_child(chop, chop_leaf).unwrap();
    b.set_child(axe, axe_leaf).unwrap();
    b.add_child(planner, chop).unwrap();
    b.add_child(planner, axe).unwrap();
    b.set_root(planner).unwrap();
    let guid = b.guid(planner).unwrap();
    (b.build(1).unwrap(), guid)
}

#[test]
fn executes_the_plan_one_step_per_tick() {
    let (tree, planner) = woodcutter();
    let log = SharedTraceLog::new();
    let mut tree = tree.with_trace_sink(log.clone());
    let mut world = NoWorld;

    assert_eq!(tree.update(&at(0), &mut world), Status::Running);
    let node = tree.behavior::<GoapPlannerNode>(planner).unwrap();
    let plan = node.last_plan().unwrap();
    assert_eq!(plan.names(), vec!["GetAxe", "ChopWood"]);
    assert_eq!(plan.cost, 2.0);
    assert_eq!(node.remaining(), 1);
    assert_eq!(tree.blackboard().get_value::<bool>("hasAxe"), Ok(true));
    assert_eq!(tree.blackboard().get_value::<bool>("hasWood"), Ok(false));

    assert_eq!(tree.update(&at(1), &mut world), Status::Success);
    let end = WorldState::from_blackboard(tree.blackboard());
    assert!(wood_goal().is_satisfied_by(&end));

    let log = log.log();
    assert_eq!(log.count("goap.plan.found"), 1);
    assert_eq!(log.count("goap.plan.step"), 2);
    assert_eq!(log.count("goap.plan.done"), 1);
}

#[test]
fn satisfied_goal_succeeds_without_running_actions() {
    let (mut tree, planner) = woodcutter();
    tree.blackboard_mut().set_value("hasWood", true).unwrap();
    let mut world = NoWorld;

    assert_eq!(tree.update(&at(0), &mut world), Status::Success);
    let node = tree.behavior::<GoapPlannerNode>(planner).unwrap();
    assert!(node.last_plan().unwrap().is_empty());
    assert_eq!(tree.blackboard().get_value::<bool>("hasAxe"), Ok(false));
}

#[test]
fn replans_on_each_new_run() {
    let (mut tree, planner) = woodcutter();
    let mut world = NoWorld;

    tree.update(&at(0), &mut world);
    tree.update(&at(1), &mut world);
    // The axe is kept, so the next run only chops.
    tree.blackboard_mut().set_value("hasWood", false).unwrap();
    assert_eq!(tree.update(&at(2), &mut world), Status::Success);

    let node = tree.behavior::<GoapPlannerNode>(planner).unwrap();
    assert_eq!(node.last_plan().unwrap().names(), vec!["ChopWood"]);
    assert_eq!(node.plans(), 2);
}

#[test]
fn failing_action_drops_the_rest_of_the_plan() {
    let mut b = TreeBuilder::<NoWorld>::new().with_blackboard(woodcutter_blackboard());
    let planner = b.add_node(GoapPlannerNode::new(wood_goal()));
    let chop = b.add_node(GoapActionNode::new(chop_wood()));
    let chop_leaf = b.add_node(SetValue::new("hasWood", true));
    let axe = b.add_node(GoapActionNode::new(get_axe()));
    let broken = b.add_node(AlwaysFail);
    b.set_child(chop, chop_leaf).unwrap();
    b.set_child(axe, broken).unwrap();
    b.add_child(planner, chop).unwrap();
    b.add_child(planner, axe).unwrap();
    b.set_root(planner).unwrap();
    let guid = b.guid(planner).unwrap();
    let log = SharedTraceLog::new();
    let mut tree = b.build(1).unwrap().with_trace_sink(log.clone());
    let mut world = NoWorld;

    assert_eq!(tree.update(&at(0), &mut world), Status::Failure);
    let node = tree.behavior::<GoapPlannerNode>(guid).unwrap();
    assert_eq!(node.remaining(), 0);
    assert_eq!(log.log().count("goap.plan.failed"), 1);
    assert_eq!(tree.blackboard().get_value::<bool>("hasWood"), Ok(false));
}

#[test]
fn unreachable_goal_fails_the_node() {
    let mut b = TreeBuilder::<NoWorld>::new().with_blackboard(woodcutter_blackboard());
    let planner = b.add_node(GoapPlannerNode::new(wood_goal()));
    // No way to get an axe.
    let chop = b.add_node(GoapActionNode::new(chop_wood()));
    let chop_leaf = b.add_node(SetValue::new("hasWood", true));
    b.set_child(chop, chop_leaf).unwrap();
    b.add_child(planner, chop).unwrap();
    b.set_root(planner).unwrap();
    let guid = b.guid(planner).unwrap();
    let log = SharedTraceLog::new();
    let mut tree = b.build(1).unwrap().with_trace_sink(log.clone());
    let mut world = NoWorld;

    assert_eq!(tree.update(&at(0), &mut world), Status::Failure);
    let node = tree.behavior::<GoapPlannerNode>(guid).unwrap();
    assert!(matches!(node.last_error(), Some(PlanError::NoPlan { .. })));
    assert_eq!(log.log().count("goap.plan.none"), 1);
}

#[test]
fn iteration_cap_is_configurable() {
    let mut b = TreeBuilder::<NoWorld>::new().with_blackboard(woodcutter_blackboard());
    let planner = b.add_node(GoapPlannerNode::new(wood_goal()).with_config(PlannerConfig {
        max_iterations: 1,
        dedupe_states: true,
    }));
    let chop = b.add_node(GoapActionNode::new(chop_wood()));
    let chop_leaf = b.add_node(SetValue::new("hasWood", true));
    let axe = b.add_node(GoapActionNode::new(get_axe()));
    let axe_leaf = b.add_node(SetValue::new("hasAxe", true));
    b.set_child(chop, chop_leaf).unwrap();
    b.set_child(axe, axe_leaf).unwrap();
    b.add_child(planner, chop).unwrap();
    b.add_child(planner, axe).unwrap();
    b.set_root(planner).unwrap();
    let guid = b.guid(planner).unwrap();
    let mut tree = b.build(1).unwrap();
    let mut world = NoWorld;

    assert_eq!(tree.update(&at(0), &mut world), Status::Failure);
    let node = tree.behavior::<GoapPlannerNode>(guid).unwrap();
    assert_eq!(node.last_error(), Some(&PlanError::IterationCap { cap: 1 }));
}

#[test]
fn non_action_children_are_ignored() {
    let mut b = TreeBuilder::<NoWorld>::new().with_blackboard(woodcutter_blackboard());
    let planner = b.add_node(GoapPlannerNode::new(wood_goal()));
    let stray = b.add_node(AlwaysSucceed);
    let chop = b.add_node(GoapActionNode::new(chop_wood()));
    let chop_leaf = b.add_node(SetValue::new("hasWood", true));
    let axe = b.add_node(GoapActionNode::new(get_axe()));
    let axe_leaf = b.add_node(SetValue::new("hasAxe", true));
    b.set_child(chop, chop_leaf).unwrap();
    b.set_child(axe, axe_leaf).unwrap();
    b.add_child(planner, stray).unwrap();
    b.add_child(planner, chop).unwrap();
    b.add_child(planner, axe).unwrap();
    b.set_root(planner).unwrap();
    let mut tree = b.build(1).unwrap();
    let mut world = NoWorld;

    assert_eq!(tree.update(&at(0), &mut world), Status::Running);
    assert_eq!(tree.update(&at(1), &mut world), Status::Success);
}

#[test]
fn the_same_action_can_run_twice() {
    let fill = GoapAction::new("Fill", 1.0).sets("bucket", true);
    let water_a = GoapAction::new("WaterA", 1.0)
        .requires(Predicate::equals("bucket", true))
        .sets("bucket", false)
        .sets("a", true);
    let water_b = GoapAction::new("WaterB", 1.0)
        .requires(Predicate::equals("bucket", true))
        .sets("bucket", false)
        .sets("b", true);
    let goal = Goal::default()
        .with(Predicate::equals("a", true))
        .with(Predicate::equals("b", true));

    let bb = Blackboard::new()
        .with_key("bucket", false)
        .with_key("a", false)
        .with_key("b", false);
    let mut b = TreeBuilder::<NoWorld>::new().with_blackboard(bb);
    let planner = b.add_node(GoapPlannerNode::new(goal.clone()));
    for (action, writes) in [
        (fill, vec![("bucket", true)]),
        (water_a, vec![("bucket", false), ("a", true)]),
        (water_b, vec![("bucket", false), ("b", true)]),
    ] {
        let node = b.add_node(GoapActionNode::new(action));
        let seq = b.add_node(Sequence::new());
        for (key, value) in writes {
            let leaf = b.add_node(SetValue::new(key, value));
            b.add_child(seq, leaf).unwrap();
        }
        b.set_child(node, seq).unwrap();
        b.add_child(planner, node).unwrap();
    }
    b.set_root(planner).unwrap();
    let guid = b.guid(planner).unwrap();
    let mut tree = b.build(1).unwrap();
    let mut world = NoWorld;

    let mut status = Status::None;
    for t in 0..4 {
        status = tree.update(&at(t), &mut world);
    }
    assert_eq!(status, Status::Success);
    let plan = tree.behavior::<GoapPlannerNode>(guid).unwrap().last_plan().unwrap();
    assert_eq!(plan.len(), 4);
    assert_eq!(plan.names().iter().filter(|n| **n == "Fill").count(), 2);
    assert!(goal.is_satisfied_by(&WorldState::from_blackboard(tree.blackboard())));
}

#[test]
fn action_without_child_fails() {
    let mut b = TreeBuilder::<NoWorld>::new().with_blackboard(woodcutter_blackboard());
    let planner = b.add_node(GoapPlannerNode::new(wood_goal()));
    let axe = b.add_node(GoapActionNode::new(get_axe()));
    let chop = b.add_node(GoapActionNode::new(chop_wood()));
    b.add_child(planner, axe).unwrap();
    b.add_child(planner, chop).unwrap();
    b.set_root(planner).unwrap();
    let mut tree = b.build(1).unwrap();
    let mut world = NoWorld;

    assert_eq!(tree.update(&at(0), &mut world), Status::Failure);
}

#[test]
fn clones_plan_independently() {
    let (template, planner) = woodcutter();
    let mut first = template.instantiate(1, &[]);
    let mut second = template.instantiate(2, &[arbor_core::KeyOverride::new("hasAxe", true)]);
    let mut world = NoWorld;

    first.update(&at(0), &mut world);
    second.update(&at(0), &mut world);

    let first_plan = first.behavior::<GoapPlannerNode>(planner).unwrap().last_plan().unwrap();
    let second_plan = second.behavior::<GoapPlannerNode>(planner).unwrap().last_plan().unwrap();
    assert_eq!(first_plan.names(), vec!["GetAxe", "ChopWood"]);
    assert_eq!(second_plan.names(), vec!["ChopWood"]);
    assert!(template
        .behavior::<GoapPlannerNode>(planner)
        .unwrap()
        .last_plan()
        .is_none());
}

#[test]
fn closed_gate_skips_planning() {
    let bb = woodcutter_blackboard().with_key("allowed", false);
    let mut b = TreeBuilder::<NoWorld>::new().with_blackboard(bb);
    let planner = b.add_node(GoapPlannerNode::new(wood_goal()));
    let gate = b.add_node(CheckConditionVariable::new("allowed"));
    let chop = b.add_node(GoapActionNode::new(chop_wood()));
    let chop_leaf = b.add_node(SetValue::new("hasWood", true));
    let axe = b.add_node(GoapActionNode::new(get_axe()));
    let axe_leaf = b.add_node(SetValue::new("hasAxe", true));
    b.set_child(chop, chop_leaf).unwrap();
    b.set_child(axe, axe_leaf).unwrap();
    b.add_child(planner, chop).unwrap();
    b.add_child(planner, axe).unwrap();
    b.attach_decorator(planner, gate).unwrap();
    b.set_root(planner).unwrap();
    let guid = b.guid(planner).unwrap();
    let log = SharedTraceLog::new();
    let mut tree = b.build(1).unwrap().with_trace_sink(log.clone());
    let mut world = NoWorld;

    for t in 0..3 {
        assert_eq!(tree.update(&at(t), &mut world), Status::Failure);
    }
    let node = tree.behavior::<GoapPlannerNode>(guid).unwrap();
    assert_eq!(node.plans(), 0);
    assert!(node.last_plan().is_none());
    assert_eq!(log.log().count("goap.plan.found"), 0);

    tree.blackboard_mut().set_value("allowed", true).unwrap();
    assert_eq!(tree.update(&at(3), &mut world), Status::Running);
    let node = tree.behavior::<GoapPlannerNode>(guid).unwrap();
    assert_eq!(node.plans(), 1);
}

#[test]
fn plans_differ_per_agent_through_checks() {
    // Agent 2 keeps an axe on its belt and may chop without fetching one.
    let chop_bare = GoapAction::new("ChopWithBeltAxe", 1.0)
        .requires_check(Check::new("belt axe", |ctx, _| ctx.agent == 2))
        .sets("hasWood", true);

    let mut b = TreeBuilder::<NoWorld>::new().with_blackboard(woodcutter_blackboard());
    let planner = b.add_node(GoapPlannerNode::new(wood_goal()));
    for (action, key) in [
        (chop_bare, "hasWood"),
        (chop_wood(), "hasWood"),
        (get_axe(), "hasAxe"),
    ] {
        let node = b.add_node(GoapActionNode::new(action));
        let leaf = b.add_node(SetValue::new(key, true));
        b.set_child(node, leaf).unwrap();
        b.add_child(planner, node).unwrap();
    }
    b.set_root(planner).unwrap();
    let guid = b.guid(planner).unwrap();
    let template = b.build(0).unwrap();
    let mut world = NoWorld;

    let mut plain = template.instantiate(1, &[]);
    let mut belted = template.instantiate(2, &[]);
    plain.update(&at(0), &mut world);
    assert_eq!(belted.update(&at(0), &mut world), Status::Success);

    let names = |tree: &BehaviorTree<NoWorld>| -> Vec<String> {
        tree.behavior::<GoapPlannerNode>(guid)
            .and_then(|n| n.last_plan())
            .map(|p| p.names().into_iter().map(String::from).collect())
            .unwrap_or_default()
    };
    assert_eq!(names(&plain), vec!["GetAxe", "ChopWood"]);
    assert_eq!(names(&belted), vec!["ChopWithBeltAxe"]);
}
