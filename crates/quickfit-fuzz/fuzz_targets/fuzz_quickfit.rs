#![no_main]
use libfuzzer_sys::fuzz_target;
use quickfit_core::{BoundedProvider, QuickFitAllocator, QuickFitConfig, QuickFitError};

fuzz_target!(|data: &[u8]| {
    // Each 4-byte chunk is one operation: op, size lo, size hi, fill byte.
    if data.len() < 4 {
        return;
    }

    let config = QuickFitConfig::default().lifecycle_logging(false);
    let Ok(mut alloc) = QuickFitAllocator::new(config, BoundedProvider::new(64 * 1024)) else {
        return;
    };
    let mut live = Vec::new();

    for chunk in data.chunks_exact(4) {
        let size = u16::from_le_bytes([chunk[1], chunk[2]]) as usize % 256;
        match chunk[0] % 3 {
            0 => match alloc.allocate(size) {
                Ok(handle) => {
                    alloc.usable_mut(&handle).fill(chunk[3]);
                    live.push(handle);
                }
                Err(QuickFitError::SizeNotSupported { requested, .. }) => {
                    assert!(requested > 200);
                }
                Err(QuickFitError::OutOfMemory { .. }) => {}
                Err(err) => panic!("unexpected allocate error: {err}"),
            },
            1 => {
                if !live.is_empty() {
                    let handle = live.swap_remove(size % live.len());
                    alloc.release(handle).expect("stored size always classifies");
                }
            }
            _ => {
                let snapshot = alloc.snapshot();
                for class in &snapshot.classes {
                    for &stored in &class.free_sizes {
                        assert_eq!(alloc.classify(stored), Some(class.index));
                    }
                }
                let stats = alloc.stats();
                assert_eq!(stats.live_blocks, live.len());
                assert_eq!(stats.free_blocks, snapshot.total_free());
            }
        }
    }

    for handle in live {
        let _ = alloc.release(handle);
    }
});
