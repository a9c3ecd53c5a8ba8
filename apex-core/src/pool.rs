use crate::event::EventChain;
use crossbeam::queue::ArrayQueue;

/// SharedPool is a bounded, lock-free free list of pre-sized event chains,
/// amortising allocation of the variable-length trade-event lists carried on
/// each command slot. Grounded in `SharedPool.cpp`'s `try_dequeue`/`offer`
/// discipline, translated to a safe Rust `Vec`-backed chain: `get_chain`
/// pops or allocates fresh, `put_chain` pushes back under the bound or is
/// simply dropped (the allocator reclaims it — no explicit delete pass is
/// needed in safe Rust).
pub struct SharedPool {
    chains: ArrayQueue<EventChain>,
    chain_length: usize,
}

impl SharedPool {
    /// Creates a pool bounded at `pool_max_size` chains, each pre-sized to
    /// `chain_length` events, with `pool_initial_size` chains pre-populated.
    pub fn new(pool_max_size: usize, pool_initial_size: usize, chain_length: usize) -> Self {
        assert!(
            pool_initial_size <= pool_max_size,
            "pool_initial_size must not exceed pool_max_size"
        );
        let chains = ArrayQueue::new(pool_max_size);
        for _ in 0..pool_initial_size {
            let _ = chains.push(Vec::with_capacity(chain_length));
        }
        Self {
            chains,
            chain_length,
        }
    }

    /// Creates a small pool suitable for unit tests.
    pub fn for_testing() -> Self {
        Self::new(8, 4, 256)
    }

    /// Dequeues a chain, or allocates a fresh one of `chain_length` capacity
    /// if the pool is currently empty.
    pub fn get_chain(&self) -> EventChain {
        match self.chains.pop() {
            Some(mut chain) => {
                chain.clear();
                chain
            }
            None => Vec::with_capacity(self.chain_length),
        }
    }

    /// Returns a chain to the pool if under `pool_max_size`; otherwise the
    /// chain is dropped and its buffer freed.
    pub fn put_chain(&self, mut chain: EventChain) {
        chain.clear();
        let _ = self.chains.push(chain);
    }

    /// Current number of chains resting in the pool (advisory only).
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}
