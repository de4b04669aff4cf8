use quickfit_core::{
    BLOCK_HEADER_SIZE, BlockHandle, BlockId, BlockState, BoundedProvider, QuickFitAllocator,
    QuickFitConfig, QuickFitError,
};
use std::collections::{HashMap, HashSet};

#[derive(Clone, Copy, Debug)]
struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        // xorshift64*
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    fn gen_range(&mut self, low: usize, high_inclusive: usize) -> usize {
        assert!(low <= high_inclusive);
        let span = high_inclusive - low + 1;
        low + (self.next_u64() as usize % span)
    }
}

/// Checks every free-list invariant against the allocator's own view.
fn assert_invariants<P: quickfit_core::BulkProvider>(
    alloc: &QuickFitAllocator<P>,
    live: &HashMap<BlockId, BlockHandle>,
    seed: u64,
    step: usize,
) {
    let snapshot = alloc.snapshot();
    let mut seen = HashSet::new();
    for class in &snapshot.classes {
        assert_eq!(class.blocks.len(), class.free_sizes.len());
        for (&id, &size) in class.blocks.iter().zip(&class.free_sizes) {
            assert_eq!(
                alloc.classify(size),
                Some(class.index),
                "seed={seed} step={step}: block {id:?} of size {size} on wrong list"
            );
            assert!(
                seen.insert(id),
                "seed={seed} step={step}: block {id:?} on more than one list"
            );
            assert_eq!(alloc.block_state(id), Some(BlockState::Free));
            assert!(
                !live.contains_key(&id),
                "seed={seed} step={step}: block {id:?} both free and live"
            );
        }
    }
    for id in live.keys() {
        assert_eq!(alloc.block_state(*id), Some(BlockState::Live));
    }
    // Every block ever created is either live or free.
    assert_eq!(
        seen.len() + live.len(),
        alloc.blocks_created(),
        "seed={seed} step={step}: block lost"
    );
    let stats = alloc.stats();
    assert_eq!(stats.live_blocks, live.len());
    assert_eq!(stats.free_blocks, seen.len());
}

#[test]
fn deterministic_sequences_hold_free_list_invariants() {
    const SEEDS: [u64; 4] = [1, 2, 3, 0xDEAD_BEEF];
    const STEPS: usize = 2_000;

    for seed in SEEDS {
        let config = QuickFitConfig::default().lifecycle_logging(false);
        let mut alloc = QuickFitAllocator::new(config, quickfit_core::SystemProvider::new())
            .expect("default config");
        let mut rng = XorShift64::new(seed);
        let mut live: HashMap<BlockId, BlockHandle> = HashMap::new();
        let mut requested: HashMap<BlockId, usize> = HashMap::new();

        for step in 0..STEPS {
            if live.is_empty() || rng.gen_range(0, 99) < 55 {
                let size = rng.gen_range(0, 230);
                match alloc.allocate(size) {
                    Ok(handle) => {
                        let id = handle.id();
                        // Capacity is the size the block was first created with.
                        let stored = *requested.entry(id).or_insert(size);
                        assert_eq!(alloc.usable(&handle).len(), stored);
                        assert_eq!(alloc.classify(stored), alloc.classify(size));
                        live.insert(id, handle);
                    }
                    Err(QuickFitError::SizeNotSupported { requested: denied, .. }) => {
                        assert!(denied > 200, "seed={seed} step={step}");
                    }
                    Err(other) => panic!("seed={seed} step={step}: unexpected {other}"),
                }
            } else {
                let pick = rng.gen_range(0, live.len() - 1);
                let id = *live.keys().nth(pick).expect("non-empty");
                let handle = live.remove(&id).expect("picked from map");
                alloc.release(handle).expect("classifiable stored size");
            }

            if step % 50 == 0 {
                assert_invariants(&alloc, &live, seed, step);
            }
        }
        assert_invariants(&alloc, &live, seed, STEPS);
    }
}

#[test]
fn lifo_reuse_under_interleaved_classes() {
    let mut alloc = QuickFitAllocator::with_defaults();
    let mut rng = XorShift64::new(7);
    let mut last_freed: [Option<BlockId>; 3] = [None; 3];

    for _ in 0..500 {
        let size = rng.gen_range(1, 200);
        let class = alloc.classify(size).unwrap();
        let handle = alloc.allocate(size).unwrap();
        if let Some(expected) = last_freed[class] {
            assert_eq!(handle.id(), expected, "class {class} must serve its head");
        }
        last_freed[class] = Some(handle.id());
        alloc.release(handle).unwrap();
    }
    // One block per class is enough when every allocation is released at once.
    assert_eq!(alloc.blocks_created(), 3);
}

#[test]
fn provider_budget_is_spent_only_on_fresh_blocks() {
    const SEED: u64 = 0x5EED;
    let mut rng = XorShift64::new(SEED);
    let mut alloc = QuickFitAllocator::with_provider(BoundedProvider::new(8 * 1024));
    let mut live = Vec::new();
    let mut fresh_bytes = 0usize;
    let mut exhausted = 0usize;

    for _ in 0..1_000 {
        if live.is_empty() || rng.gen_range(0, 2) > 0 {
            let size = rng.gen_range(1, 200);
            let created_before = alloc.blocks_created();
            match alloc.allocate(size) {
                Ok(handle) => {
                    if alloc.blocks_created() > created_before {
                        fresh_bytes += BLOCK_HEADER_SIZE + size;
                    }
                    live.push(handle);
                }
                Err(QuickFitError::OutOfMemory { .. }) => exhausted += 1,
                Err(other) => panic!("unexpected {other}"),
            }
        } else {
            let pick = rng.gen_range(0, live.len() - 1);
            let handle = live.swap_remove(pick);
            alloc.release(handle).unwrap();
        }
        assert_eq!(alloc.provider().used(), fresh_bytes);
    }
    assert_eq!(alloc.stats().out_of_memory as usize, exhausted);
    assert_eq!(alloc.stats().bytes_held, fresh_bytes);
}
