pub mod descriptor;
pub mod file;
pub mod processor;

pub use descriptor::{JournalDescriptor, SnapshotDescriptor, SnapshotDescriptorChain};
pub use file::FileSerializationProcessor;
pub use processor::{can_load_from_snapshot, DummySerializationProcessor, SerializationProcessor, ShardSnapshot};
