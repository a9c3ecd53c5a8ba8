/// A journal descriptor covers a contiguous range of sequence numbers
/// appended to one journal file segment. `seq_last` of `-1` marks the
/// currently-open (not yet sealed) segment, matching
/// `JournalDescriptor.h`'s sentinel.
#[derive(Debug, Clone)]
pub struct JournalDescriptor {
    pub timestamp_ns: u64,
    pub seq_first: i64,
    pub seq_last: i64,
    pub path: String,
}

impl JournalDescriptor {
    pub const OPEN: i64 = -1;

    pub fn open(timestamp_ns: u64, seq_first: i64, path: String) -> Self {
        Self {
            timestamp_ns,
            seq_first,
            seq_last: Self::OPEN,
            path,
        }
    }

    pub fn is_open(&self) -> bool {
        self.seq_last == Self::OPEN
    }

    pub fn seal(&mut self, seq_last: i64) {
        self.seq_last = seq_last;
    }
}

/// A snapshot descriptor in the append-only snapshot chain. The original
/// links these with raw `prev`/`next` pointers; here the chain is a `Vec`
/// owned by `SnapshotDescriptorChain` and `prev`/`next` are indices into
/// it, so the whole structure stays safe and trivially `Send`.
#[derive(Debug, Clone)]
pub struct SnapshotDescriptor {
    pub snapshot_id: i64,
    pub seq: i64,
    pub timestamp_ns: u64,
    pub path: String,
    pub num_matching_shards: usize,
    pub num_risk_shards: usize,
    pub prev: Option<usize>,
    pub next: Option<usize>,
    pub journals: Vec<JournalDescriptor>,
}

impl SnapshotDescriptor {
    fn empty(snapshot_id: i64, timestamp_ns: u64, path: String) -> Self {
        Self {
            snapshot_id,
            seq: -1,
            timestamp_ns,
            path,
            num_matching_shards: 0,
            num_risk_shards: 0,
            prev: None,
            next: None,
            journals: Vec::new(),
        }
    }
}

/// An append-only chain of snapshot descriptors, each linking to its
/// predecessor by index. New entries are only ever pushed at the tail;
/// nothing is ever removed, matching the replay contract in spec.md §4.4
/// (a replica must be able to walk back to any earlier snapshot).
#[derive(Debug, Default)]
pub struct SnapshotDescriptorChain {
    entries: Vec<SnapshotDescriptor>,
}

impl SnapshotDescriptorChain {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends the first (empty) snapshot descriptor in the chain.
    pub fn push_empty(&mut self, snapshot_id: i64, timestamp_ns: u64, path: String) -> usize {
        let descriptor = SnapshotDescriptor::empty(snapshot_id, timestamp_ns, path);
        self.entries.push(descriptor);
        self.entries.len() - 1
    }

    /// Appends the next snapshot descriptor, linking `prev` to it.
    pub fn push_next(
        &mut self,
        snapshot_id: i64,
        seq: i64,
        timestamp_ns: u64,
        path: String,
        num_matching_shards: usize,
        num_risk_shards: usize,
    ) -> usize {
        let prev = self.entries.len().checked_sub(1);
        let mut descriptor = SnapshotDescriptor::empty(snapshot_id, timestamp_ns, path);
        descriptor.seq = seq;
        descriptor.num_matching_shards = num_matching_shards;
        descriptor.num_risk_shards = num_risk_shards;
        descriptor.prev = prev;
        self.entries.push(descriptor);
        let new_index = self.entries.len() - 1;
        if let Some(prev_index) = prev {
            self.entries[prev_index].next = Some(new_index);
        }
        new_index
    }

    pub fn get(&self, index: usize) -> Option<&SnapshotDescriptor> {
        self.entries.get(index)
    }

    pub fn latest(&self) -> Option<&SnapshotDescriptor> {
        self.entries.last()
    }

    pub fn latest_index(&self) -> Option<usize> {
        if self.entries.is_empty() {
            None
        } else {
            Some(self.entries.len() - 1)
        }
    }

    /// Attaches a journal descriptor to the snapshot at `index`.
    pub fn attach_journal(&mut self, index: usize, journal: JournalDescriptor) {
        if let Some(descriptor) = self.entries.get_mut(index) {
            descriptor.journals.push(journal);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
