#![allow(dead_code)]

use arbor_bt::{Behavior, BtStatus, NodeCtx, NodeKind};
use arbor_core::{TickContext, WorldMut, WorldView};

#[derive(Debug, Default)]
pub struct RecordingWorld {
    pub entered: Vec<&'static str>,
    pub ticked: Vec<&'static str>,
    pub exited: Vec<&'static str>,
    pub interrupts: Vec<u64>,
}

impl WorldView for RecordingWorld {
    type Agent = u64;
}

impl WorldMut for RecordingWorld {}

/// Leaf that replays a fixed list of results, repeating the last one.
#[derive(Debug, Clone)]
pub struct Script {
    name: &'static str,
    steps: Vec<BtStatus>,
    at: usize,
}

impl Script {
    pub fn new(name: &'static str, steps: &[BtStatus]) -> Self {
        Self {
            name,
            steps: steps.to_vec(),
            at: 0,
        }
    }

    pub fn always(name: &'static str, status: BtStatus) -> Self {
        Self::new(name, &[status])
    }
}

impl Behavior<RecordingWorld> for Script {
    fn kind(&self) -> NodeKind {
        NodeKind::Leaf
    }

    fn type_name(&self) -> &'static str {
        "Script"
    }

    fn on_enter(&mut self, ctx: &mut NodeCtx<'_, '_, RecordingWorld>) {
        ctx.world_mut().entered.push(self.name);
    }

    fn on_process(&mut self, ctx: &mut NodeCtx<'_, '_, RecordingWorld>) -> BtStatus {
        ctx.world_mut().ticked.push(self.name);
        let status = self
            .steps
            .get(self.at)
            .or(self.steps.last())
            .copied()
            .unwrap_or(BtStatus::Failure);
        self.at += 1;
        status
    }

    fn on_exit(&mut self, ctx: &mut NodeCtx<'_, '_, RecordingWorld>) {
        ctx.world_mut().exited.push(self.name);
    }

    fn reset(&mut self) {
        self.at = 0;
    }

    fn clone_box(&self) -> Box<dyn Behavior<RecordingWorld>> {
        Box::new(self.clone())
    }
}

/// One tick per second: tick `t` happens at `t` seconds.
pub fn at(t: u64) -> TickContext {
    TickContext::fixed(t, 1.0)
}
