mod support;

use arbor_bt::{
    BtStatus, CheckConditionVariable, Cooldown, Inverter, PreconditionDecorator, Repeater,
    Sequence, Status, Succeeder, TimeLimit, TreeBuilder,
};
use arbor_core::Blackboard;
use arbor_tools::SharedTraceLog;

use support::{at, RecordingWorld, Script};

use BtStatus::{Failure, Running, Success};

fn wrap(
    decorator: impl arbor_bt::Behavior<RecordingWorld>,
    leaf: Script,
) -> (arbor_bt::BehaviorTree<RecordingWorld>, arbor_bt::NodeGuid) {
    let mut b = TreeBuilder::<RecordingWorld>::new();
    let deco = b.add_node(decorator);
    let child = b.add_node(leaf);
    b.set_child(deco, child).unwrap();
    b.set_root(deco).unwrap();
    let guid = b.guid(deco).unwrap();
    (b.build(1).unwrap(), guid)
}

#[test]
fn inverter_swaps_results() {
    let mut world = RecordingWorld::default();
    let (mut tree, _) = wrap(Inverter, Script::always("a", Success));
    assert_eq!(tree.update(&at(0), &mut world), Status::Failure);

    let (mut tree, _) = wrap(Inverter, Script::always("a", Failure));
    assert_eq!(tree.update(&at(0), &mut world), Status::Success);

    let (mut tree, _) = wrap(Inverter, Script::always("a", Running));
    assert_eq!(tree.update(&at(0), &mut world), Status::Running);
}

#[test]
fn succeeder_hides_failure_but_not_running() {
    let mut world = RecordingWorld::default();
    let (mut tree, _) = wrap(Succeeder, Script::new("a", &[Running, Failure]));
    assert_eq!(tree.update(&at(0), &mut world), Status::Running);
    assert_eq!(tree.update(&at(1), &mut world), Status::Success);
}

#[test]
fn repeater_runs_the_child_count_times() {
    let mut world = RecordingWorld::default();
    let (mut tree, guid) = wrap(Repeater::new(3), Script::always("a", Success));

    assert_eq!(tree.update(&at(0), &mut world), Status::Running);
    assert_eq!(tree.update(&at(1), &mut world), Status::Running);
    assert_eq!(
        tree.behavior::<Repeater>(guid).map(|r| r.completed()),
        Some(2)
    );
    assert_eq!(tree.update(&at(2), &mut world), Status::Success);
    assert_eq!(world.ticked, vec!["a", "a", "a"]);
    assert_eq!(world.entered.len(), 3);
}

#[test]
fn repeater_resets_its_child_between_runs() {
    let mut world = RecordingWorld::default();
    let (mut tree, _) = wrap(Repeater::forever(), Script::new("a", &[Success, Failure]));

    assert_eq!(tree.update(&at(0), &mut world), Status::Running);
    // The child is reset after each success, so the script starts over.
    assert_eq!(tree.update(&at(1), &mut world), Status::Running);
    assert_eq!(world.ticked.len(), 2);
}

#[test]
fn repeater_forever_keeps_running() {
    let mut world = RecordingWorld::default();
    let (mut tree, _) = wrap(Repeater::forever(), Script::always("a", Success));
    for t in 0..20 {
        assert_eq!(tree.update(&at(t), &mut world), Status::Running);
    }
    assert_eq!(world.ticked.len(), 20);
}

#[test]
fn repeater_stops_on_child_failure() {
    let mut world = RecordingWorld::default();
    let (mut tree, _) = wrap(Repeater::new(5), Script::always("a", Failure));
    assert_eq!(tree.update(&at(0), &mut world), Status::Failure);
}

#[test]
fn cooldown_blocks_after_success() {
    let mut world = RecordingWorld::default();
    let (mut tree, guid) = wrap(Cooldown::new(5.0), Script::always("a", Success));

    assert_eq!(tree.update(&at(0), &mut world), Status::Success);
    assert_eq!(world.ticked.len(), 1);
    let remaining = tree.behavior::<Cooldown>(guid).map(|c| c.remaining(2.0));
    assert_eq!(remaining, Some(3.0));

    for t in 1..5 {
        assert_eq!(tree.update(&at(t), &mut world), Status::Failure, "t={t}");
    }
    assert_eq!(world.ticked.len(), 1);

    assert_eq!(tree.update(&at(5), &mut world), Status::Success);
    assert_eq!(world.ticked.len(), 2);
}

#[test]
fn cooldown_does_not_start_on_failure() {
    let mut world = RecordingWorld::default();
    let (mut tree, guid) = wrap(Cooldown::new(5.0), Script::always("a", Failure));

    assert_eq!(tree.update(&at(0), &mut world), Status::Failure);
    assert_eq!(tree.update(&at(1), &mut world), Status::Failure);
    assert_eq!(world.ticked.len(), 2);
    assert!(tree.behavior::<Cooldown>(guid).unwrap().is_ready(1.0));
}

#[test]
fn cooldown_is_not_shared_with_clones() {
    let mut world = RecordingWorld::default();
    let (mut tree, _) = wrap(Cooldown::new(5.0), Script::always("a", Success));
    assert_eq!(tree.update(&at(0), &mut world), Status::Success);

    let mut copy = tree.clone_tree();
    assert_eq!(copy.update(&at(1), &mut world), Status::Success);
    assert_eq!(tree.update(&at(1), &mut world), Status::Failure);
}

#[test]
fn time_limit_aborts_a_slow_child() {
    let mut world = RecordingWorld::default();
    let (mut tree, _) = wrap(TimeLimit::new(2.0), Script::always("slow", Running));

    for t in 0..3 {
        assert_eq!(tree.update(&at(t), &mut world), Status::Running, "t={t}");
    }
    assert_eq!(tree.update(&at(3), &mut world), Status::Failure);
    assert_eq!(world.exited, vec!["slow"]);
    assert_eq!(world.ticked.len(), 3);
}

#[test]
fn time_limit_passes_a_fast_child() {
    let mut world = RecordingWorld::default();
    let (mut tree, _) = wrap(
        TimeLimit::new(2.0),
        Script::new("fast", &[Running, Success]),
    );
    assert_eq!(tree.update(&at(0), &mut world), Status::Running);
    assert_eq!(tree.update(&at(1), &mut world), Status::Success);
}

fn gated(gate: CheckConditionVariable, leaf: Script) -> arbor_bt::BehaviorTree<RecordingWorld> {
    let mut b = TreeBuilder::<RecordingWorld>::new()
        .with_blackboard(Blackboard::new().with_key("armed", false));
    let seq = b.add_node(Sequence::new());
    let gate = b.add_node(gate);
    let child = b.add_node(leaf);
    b.attach_decorator(seq, gate).unwrap();
    b.add_child(seq, child).unwrap();
    b.set_root(seq).unwrap();
    b.build(1).unwrap()
}

#[test]
fn condition_variable_gates_a_composite() {
    let mut world = RecordingWorld::default();
    let mut tree = gated(
        CheckConditionVariable::new("armed"),
        Script::always("fire", Success),
    );

    assert_eq!(tree.update(&at(0), &mut world), Status::Failure);
    assert!(world.ticked.is_empty());

    tree.blackboard_mut().set_value("armed", true).unwrap();
    assert_eq!(tree.update(&at(1), &mut world), Status::Success);
    assert_eq!(world.ticked, vec!["fire"]);
}

#[test]
fn inverted_condition_variable_passes_on_false() {
    let mut world = RecordingWorld::default();
    let mut tree = gated(
        CheckConditionVariable::inverted("armed"),
        Script::always("wait", Success),
    );
    assert_eq!(tree.update(&at(0), &mut world), Status::Success);
}

#[test]
fn failing_gate_aborts_running_descendants() {
    let mut world = RecordingWorld::default();
    let mut tree = gated(
        CheckConditionVariable::new("armed"),
        Script::always("aim", Running),
    );
    tree.blackboard_mut().set_value("armed", true).unwrap();

    assert_eq!(tree.update(&at(0), &mut world), Status::Running);
    tree.blackboard_mut().set_value("armed", false).unwrap();
    assert_eq!(tree.update(&at(1), &mut world), Status::Failure);
    assert_eq!(world.exited, vec!["aim"]);
    assert_eq!(world.ticked.len(), 1);
}

#[test]
fn closed_gate_keeps_the_composite_from_entering() {
    let mut world = RecordingWorld::default();
    let log = SharedTraceLog::new();
    let mut tree = gated(
        CheckConditionVariable::new("armed"),
        Script::always("fire", Success),
    )
    .with_trace_sink(log.clone());
    let seq = tree.node_by_name("Sequence").unwrap().guid;

    assert_eq!(tree.update(&at(0), &mut world), Status::Failure);
    assert!(world.entered.is_empty());
    assert!(!log.log().events.iter().any(|e| e.node == Some(seq.0)));
    let info = tree.find_node(seq).unwrap();
    assert_eq!(info.status, Status::Failure);
    assert!(!info.processing);
}

#[test]
fn condition_variable_wraps_a_child() {
    let mut world = RecordingWorld::default();
    let mut b = TreeBuilder::<RecordingWorld>::new()
        .with_blackboard(Blackboard::new().with_key("armed", true));
    let check = b.add_node(CheckConditionVariable::new("armed"));
    let child = b.add_node(Script::always("fire", Failure));
    b.set_child(check, child).unwrap();
    b.set_root(check).unwrap();
    let mut tree = b.build(1).unwrap();

    // Passing gate reports the child's own result.
    assert_eq!(tree.update(&at(0), &mut world), Status::Failure);
    assert_eq!(world.ticked, vec!["fire"]);
}

#[test]
fn condition_variable_with_missing_key_fails() {
    let mut world = RecordingWorld::default();
    let (mut tree, _) = wrap(
        CheckConditionVariable::new("nope"),
        Script::always("a", Success),
    );
    assert_eq!(tree.update(&at(0), &mut world), Status::Failure);
    assert!(world.ticked.is_empty());
}

#[test]
fn precondition_passes_through() {
    let mut world = RecordingWorld::default();
    let (mut tree, _) = wrap(PreconditionDecorator, Script::new("a", &[Running, Failure]));
    assert_eq!(tree.update(&at(0), &mut world), Status::Running);
    assert_eq!(tree.update(&at(1), &mut world), Status::Failure);
}

#[test]
fn childless_decorators() {
    type Make = fn(&mut TreeBuilder<RecordingWorld>) -> arbor_bt::NodeId;
    let cases: [(Make, Status); 6] = [
        (|b| b.add_node(Inverter), Status::Success),
        (|b| b.add_node(Succeeder), Status::Success),
        (|b| b.add_node(PreconditionDecorator), Status::Success),
        (|b| b.add_node(Repeater::new(2)), Status::Failure),
        (|b| b.add_node(Cooldown::new(1.0)), Status::Failure),
        (|b| b.add_node(TimeLimit::new(1.0)), Status::Failure),
    ];

    for (make, expected) in cases {
        let mut b = TreeBuilder::<RecordingWorld>::new();
        let deco = make(&mut b);
        b.set_root(deco).unwrap();
        let mut tree = b.build(1).unwrap();
        let mut world = RecordingWorld::default();
        assert_eq!(tree.update(&at(0), &mut world), expected);
    }
}
