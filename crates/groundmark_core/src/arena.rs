//! Fixed-capacity slot arena with generational handles
//!
//! Slots are recycled through a free list; every recycle bumps the slot's
//! generation so stale handles stop resolving instead of aliasing the next
//! occupant.

use crate::error::DecalError;

/// Slot handle (generation-indexed for safety)
///
/// Format: [32-bit index | 32-bit generation]
/// - Index: Position in the arena, also used as grid-membership key
/// - Generation: Incremented on recycle (prevents use-after-recycle)
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId {
    index: u32,
    generation: u32,
}

impl SlotId {
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn to_bits(&self) -> u64 {
        ((self.generation as u64) << 32) | (self.index as u64)
    }

    pub fn from_bits(bits: u64) -> Self {
        Self {
            index: bits as u32,
            generation: (bits >> 32) as u32,
        }
    }
}

/// Records stored in a [`SlotArena`] know how to return to their pristine state.
///
/// Implementations should keep heap buffers (vertex storage) allocated so a
/// recycled slot does not reallocate on reuse.
pub trait Recycle {
    fn recycle(&mut self);
}

struct Slot<T> {
    value: T,
    generation: u32,
    live: bool,
}

/// Arena of at most `capacity` slots. Slots are created lazily up to the
/// capacity (or eagerly with [`SlotArena::preallocated`]) and never freed.
pub struct SlotArena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    capacity: usize,
    live: usize,
}

impl<T: Default + Recycle> SlotArena<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            capacity,
            live: 0,
        }
    }

    /// Create every slot up front; no allocation happens after this.
    pub fn preallocated(capacity: usize) -> Self {
        let mut arena = Self::with_capacity(capacity);
        arena.slots.reserve_exact(capacity);
        arena.free.reserve_exact(capacity);
        for _ in 0..capacity {
            arena.slots.push(Slot {
                value: T::default(),
                generation: 0,
                live: false,
            });
        }
        // lowest index is handed out first
        arena.free.extend((0..capacity as u32).rev());
        arena
    }

    /// Claim a slot, or fail once every slot is live.
    pub fn alloc(&mut self) -> Result<SlotId, DecalError> {
        let index = match self.free.pop() {
            Some(index) => index,
            None if self.slots.len() < self.capacity => {
                self.slots.push(Slot {
                    value: T::default(),
                    generation: 0,
                    live: false,
                });
                (self.slots.len() - 1) as u32
            }
            None => {
                return Err(DecalError::CapacityExhausted {
                    capacity: self.capacity,
                })
            }
        };

        let slot = &mut self.slots[index as usize];
        debug_assert!(!slot.live, "free list handed out a live slot");
        slot.live = true;
        self.live += 1;
        Ok(SlotId::new(index, slot.generation))
    }

    /// Reset the record and return its slot to the free list.
    ///
    /// Returns `false` for stale or already recycled handles.
    pub fn recycle(&mut self, id: SlotId) -> bool {
        let Some(slot) = self.slots.get_mut(id.index as usize) else {
            return false;
        };
        if !slot.live || slot.generation != id.generation {
            return false;
        }
        slot.value.recycle();
        slot.generation = slot.generation.wrapping_add(1);
        slot.live = false;
        self.free.push(id.index);
        self.live -= 1;
        true
    }

    #[inline]
    pub fn contains(&self, id: SlotId) -> bool {
        self.slots
            .get(id.index as usize)
            .map_or(false, |s| s.live && s.generation == id.generation)
    }

    pub fn get(&self, id: SlotId) -> Option<&T> {
        let slot = self.slots.get(id.index as usize)?;
        (slot.live && slot.generation == id.generation).then_some(&slot.value)
    }

    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        let slot = self.slots.get_mut(id.index as usize)?;
        (slot.live && slot.generation == id.generation).then_some(&mut slot.value)
    }

    /// Iterate over every live record.
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.live)
            .map(|(i, s)| (SlotId::new(i as u32, s.generation), &s.value))
    }

    /// Iterate mutably over every slot ever created, live or not.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.slots.iter_mut().map(|s| &mut s.value)
    }

    /// Recycle every live slot.
    pub fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.live {
                slot.value.recycle();
                slot.generation = slot.generation.wrapping_add(1);
                slot.live = false;
                self.free.push(index as u32);
            }
        }
        self.live = 0;
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Slots that can still be handed out (recycled plus never created).
    #[inline]
    pub fn free_count(&self) -> usize {
        self.free.len() + (self.capacity - self.slots.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Record {
        value: u32,
        scratch: Vec<u8>,
    }

    impl Recycle for Record {
        fn recycle(&mut self) {
            self.value = 0;
            self.scratch.clear();
        }
    }

    #[test]
    fn alloc_until_exhausted() {
        let mut arena = SlotArena::<Record>::preallocated(2);
        let a = arena.alloc().unwrap();
        let b = arena.alloc().unwrap();
        assert_eq!((a.index(), b.index()), (0, 1));
        assert!(matches!(
            arena.alloc(),
            Err(DecalError::CapacityExhausted { capacity: 2 })
        ));
        assert_eq!(arena.free_count() + arena.len(), arena.capacity());
    }

    #[test]
    fn recycled_handle_goes_stale() {
        let mut arena = SlotArena::<Record>::with_capacity(4);
        let a = arena.alloc().unwrap();
        arena.get_mut(a).unwrap().value = 7;
        arena.get_mut(a).unwrap().scratch.extend_from_slice(&[1, 2, 3]);

        assert!(arena.recycle(a));
        assert!(!arena.recycle(a), "double recycle must be rejected");
        assert!(arena.get(a).is_none());

        let b = arena.alloc().unwrap();
        assert_eq!(b.index(), a.index());
        assert_ne!(b.generation(), a.generation());
        let record = arena.get(b).unwrap();
        assert_eq!(record.value, 0);
        assert!(record.scratch.is_empty());
        assert!(record.scratch.capacity() >= 3);
    }

    #[test]
    fn lazy_arena_counts_uncreated_slots_as_free() {
        let mut arena = SlotArena::<Record>::with_capacity(8);
        assert_eq!(arena.free_count(), 8);
        let _ = arena.alloc().unwrap();
        assert_eq!(arena.free_count(), 7);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn bits_round_trip() {
        let id = SlotId::new(42, 9);
        assert_eq!(SlotId::from_bits(id.to_bits()), id);
    }
}
