pub mod command;
pub mod ring;
pub mod sequencer;
pub mod stages;

pub use command::CommandSlot;
pub use ring::RingBuffer;
pub use sequencer::Pipeline;
