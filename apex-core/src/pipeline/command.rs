use crate::api::{Command, CommandResult};

/// A command slot `S`: the unit of state a command owns as it moves
/// through the pipeline's stages (spec.md §4.1). Each slot is claimed once
/// by the sequencer, mutated in place by each stage in turn, and finally
/// read by the result aggregator; no stage after the sequencer ever
/// allocates a new slot.
#[derive(Debug, Clone)]
pub struct CommandSlot {
    pub seq: i64,
    pub command: Command,
    pub result: Option<CommandResult>,
}

impl CommandSlot {
    pub fn new(seq: i64, command: Command) -> Self {
        Self {
            seq,
            command,
            result: None,
        }
    }

    /// A slot has been fully processed once the result aggregator stage has
    /// attached a result; earlier stages must never observe this.
    pub fn is_complete(&self) -> bool {
        self.result.is_some()
    }
}

impl Default for CommandSlot {
    fn default() -> Self {
        Self {
            seq: -1,
            command: Command::NoOp,
            result: None,
        }
    }
}
