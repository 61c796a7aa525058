//! Three woodcutters share one template tree.
//!
//! Each agent plans `GetAxe -> ChopWood` when it has no wood, then delivers
//! the log to a shared stockpile. Run with `RUST_LOG=arbor=trace` to see
//! every node event.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use arbor::bt::{CheckConditionVariable, SetValue, Task, Wait};
use arbor::prelude::*;
use arbor::tools::TracingSink;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Default)]
struct Forest {
    delivered: BTreeMap<u64, u32>,
}

impl WorldView for Forest {
    type Agent = u64;
}

impl WorldMut for Forest {}

fn template() -> Result<BehaviorTree<Forest>> {
    let blackboard = Blackboard::new()
        .with_key("hasAxe", false)
        .with_key("hasWood", false);
    let mut b = TreeBuilder::<Forest>::new().with_blackboard(blackboard);

    let select = b.add_named("work", Selector::new());

    let carrying = b.add_node(CheckConditionVariable::new("hasWood"));
    let deliver = b.add_node(
        Task::new(|ctx: &mut NodeCtx<'_, '_, Forest>| {
            if ctx.blackboard_mut().set_value("hasWood", false).is_err() {
                return BtStatus::Failure;
            }
            let agent = ctx.agent();
            *ctx.world_mut().delivered.entry(agent).or_default() += 1;
            BtStatus::Success
        })
        .labeled("Deliver"),
    );
    b.set_child(carrying, deliver)?;

    let gather = b.add_named(
        "gather",
        GoapPlannerNode::new(Goal::default().with(Predicate::equals("hasWood", true))),
    );

    let get_axe = b.add_node(GoapActionNode::new(
        GoapAction::new("GetAxe", 2.0).sets("hasAxe", true),
    ));
    let pick_up = b.add_node(SetValue::new("hasAxe", true));
    b.set_child(get_axe, pick_up)?;

    let chop = b.add_node(GoapActionNode::new(
        GoapAction::new("ChopWood", 1.0)
            .requires(Predicate::equals("hasAxe", true))
            .sets("hasWood", true),
    ));
    let swing = b.add_node(Sequence::new());
    let wait = b.add_node(Wait::new(1.0));
    let log = b.add_node(SetValue::new("hasWood", true));
    b.add_child(swing, wait)?;
    b.add_child(swing, log)?;
    b.set_child(chop, swing)?;

    b.add_child(gather, get_axe)?;
    b.add_child(gather, chop)?;
    b.add_child(select, carrying)?;
    b.add_child(select, gather)?;
    b.set_root(select)?;

    Ok(b.build(0)?)
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let template = template().context("building woodcutter template")?;
    let mut agents: Vec<BehaviorTree<Forest>> = (1..=3u64)
        .map(|agent| {
            // The third woodcutter starts with an axe in hand.
            let overrides = if agent == 3 {
                vec![KeyOverride::new("hasAxe", true)]
            } else {
                Vec::new()
            };
            template
                .instantiate(agent, &overrides)
                .with_trace_sink(TracingSink)
        })
        .collect();

    let mut forest = Forest::default();
    for t in 0..16 {
        let tick = TickContext::fixed(t, 0.5);
        for tree in &mut agents {
            let status = tree.update(&tick, &mut forest);
            tracing::debug!(tick = t, agent = tree.agent(), ?status, "updated");
        }
    }

    for (agent, logs) in &forest.delivered {
        tracing::info!(agent, logs, "delivered");
    }
    let total: u32 = forest.delivered.values().sum();
    println!("{total} logs delivered");
    Ok(())
}
