//! Benchmarks for the difficulty MMR and the sampling protocol.
//!
//! Every bench target links this crate so that it runs on mimalloc. Tree
//! construction and proof batches allocate many small node vectors, which is
//! where the allocator shows up in profiles.

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

pub use mimalloc;

#[cfg(test)]
mod tests {
    use super::*;
    use std::alloc::{GlobalAlloc, Layout};

    #[test]
    fn test_node_sized_allocations() {
        // one allocation per node of a small tree level
        let layout = Layout::from_size_align(96, 8).unwrap();
        let mut allocations: Vec<*mut u8> = Vec::with_capacity(4096);

        unsafe {
            for i in 0..4096 {
                let ptr = GLOBAL.alloc(layout);
                assert!(!ptr.is_null());
                std::ptr::write(ptr, (i % 256) as u8);
                allocations.push(ptr);
            }
            for (i, ptr) in allocations.iter().enumerate() {
                assert_eq!(std::ptr::read(*ptr), (i % 256) as u8);
            }
            for ptr in allocations.into_iter().rev() {
                GLOBAL.dealloc(ptr, layout);
            }
        }
    }

    #[test]
    fn test_parallel_proof_style_allocations() {
        use std::thread;

        let handles: Vec<_> = (0..4)
            .map(|t| {
                thread::spawn(move || {
                    // proof paths are short vectors built and dropped per leaf
                    for n in 0..1000usize {
                        let path: Vec<u64> = (0..(n % 24) as u64).map(|x| x + t).collect();
                        assert_eq!(path.len(), n % 24);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
