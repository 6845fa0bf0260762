use super::*;

// ============================================================================
// Basic allocation tests
// ============================================================================

#[test]
fn test_sequential_alloc_starts_at_generation_zero() {
    let mut alloc = SlotAllocator::new();
    assert_eq!(alloc.alloc(), (0, 0));
    assert_eq!(alloc.alloc(), (1, 0));
    assert_eq!(alloc.alloc(), (2, 0));
}

#[test]
fn test_new_is_empty() {
    let alloc = SlotAllocator::default();
    assert!(alloc.is_empty());
    assert_eq!(alloc.len(), 0);
    assert_eq!(alloc.high_water_mark(), 0);
    assert!(!alloc.is_allocated(0));
    assert_eq!(alloc.generation(0), None);
}

// ============================================================================
// Free / expire tests
// ============================================================================

#[test]
fn test_free_bumps_generation_and_recycles() {
    let mut alloc = SlotAllocator::new();
    let (a, gen_a) = alloc.alloc();
    let (b, _) = alloc.alloc();

    alloc.free(a);
    assert!(!alloc.is_live(a, gen_a));

    let (c, gen_c) = alloc.alloc();
    assert_eq!(c, a);
    assert_eq!(gen_c, gen_a + 1);
    assert!(alloc.is_live(c, gen_c));
    assert_eq!(b, 1);
}

#[test]
fn test_free_list_is_lifo() {
    let mut alloc = SlotAllocator::new();
    let (a, _) = alloc.alloc(); // 0
    let _b = alloc.alloc(); // 1
    let (c, _) = alloc.alloc(); // 2
    alloc.free(a);
    alloc.free(c);

    assert_eq!(alloc.alloc().0, 2);
    assert_eq!(alloc.alloc().0, 0);
    assert_eq!(alloc.alloc().0, 3);
}

#[test]
fn test_expire_keeps_slot_allocated() {
    let mut alloc = SlotAllocator::new();
    let (index, generation) = alloc.alloc();

    let new_generation = alloc.expire(index);

    assert_eq!(new_generation, generation + 1);
    assert!(alloc.is_allocated(index));
    assert!(!alloc.is_live(index, generation));
    assert!(alloc.is_live(index, new_generation));
    assert_eq!(alloc.len(), 1);
}

#[test]
fn test_generation_wraps_to_zero() {
    let mut alloc = SlotAllocator::new();
    let (index, _) = alloc.alloc();
    alloc.generations[index as usize] = u32::MAX;

    assert_eq!(alloc.expire(index), 0);
}

#[test]
#[should_panic(expected = "freeing an unallocated slot")]
fn test_double_free_panics() {
    let mut alloc = SlotAllocator::new();
    let (index, _) = alloc.alloc();
    alloc.free(index);
    alloc.free(index);
}

// ============================================================================
// len() and high_water_mark() tests
// ============================================================================

#[test]
fn test_len_tracks_active_slots() {
    let mut alloc = SlotAllocator::new();
    alloc.alloc();
    alloc.alloc();
    assert_eq!(alloc.len(), 2);

    alloc.free(0);
    assert_eq!(alloc.len(), 1);
    alloc.expire(1);
    assert_eq!(alloc.len(), 1);

    alloc.free(1);
    assert!(alloc.is_empty());
}

#[test]
fn test_high_water_mark_never_decreases() {
    let mut alloc = SlotAllocator::new();
    alloc.alloc();
    alloc.alloc();
    alloc.free(0);
    alloc.free(1);
    assert_eq!(alloc.high_water_mark(), 2);

    alloc.alloc();
    alloc.alloc();
    assert_eq!(alloc.high_water_mark(), 2);
    alloc.alloc();
    assert_eq!(alloc.high_water_mark(), 3);
}

// ============================================================================
// Stress / pattern tests
// ============================================================================

#[test]
fn test_stale_pairs_never_validate_after_churn() {
    let mut alloc = SlotAllocator::new();
    let mut stale = Vec::new();

    for _ in 0..20 {
        let (index, generation) = alloc.alloc();
        alloc.free(index);
        stale.push((index, generation));
    }

    let (index, generation) = alloc.alloc();
    assert!(alloc.is_live(index, generation));
    for (i, g) in stale {
        assert!(!alloc.is_live(i, g));
    }
}
