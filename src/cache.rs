//! Parking spots for [`DecoState`]s so a later plan can resume instead of replaying the whole
//! history (repetitive dives, interactive re-planning).
use crate::DecoError;
use crate::state::DecoState;

/// Ticket for a stored state. Stops working once its slot is reused or evicted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CacheHandle {
    slot: usize,
    generation: u32,
}

#[derive(Debug, Clone)]
struct Entry {
    generation: u32,
    state: DecoState,
}

/// Fixed number of independent snapshots. When full, storing replaces the oldest one.
#[derive(Debug, Clone)]
pub struct DecoCache<const SLOTS: usize = 8> {
    entries: [Option<Entry>; SLOTS],
    next_generation: u32,
}

impl<const SLOTS: usize> Default for DecoCache<SLOTS> {
    fn default() -> Self {
        DecoCache::new()
    }
}

impl<const SLOTS: usize> DecoCache<SLOTS> {
    pub const fn new() -> Self {
        const { assert!(SLOTS > 0, "a cache needs at least one slot") };
        DecoCache {
            entries: [const { None }; SLOTS],
            next_generation: 1,
        }
    }

    /// Stores a copy of `state`.
    pub fn store(&mut self, state: &DecoState) -> CacheHandle {
        let slot = self
            .entries
            .iter()
            .position(Option::is_none)
            .unwrap_or_else(|| self.oldest_slot());

        let generation = self.next_generation;
        self.next_generation = self.next_generation.wrapping_add(1).max(1);
        if let Some(expired) = &self.entries[slot] {
            debug!("cache slot {} reused, generation {} expired", slot, expired.generation);
        }
        self.entries[slot] = Some(Entry {
            generation,
            state: state.clone(),
        });
        CacheHandle { slot, generation }
    }

    fn oldest_slot(&self) -> usize {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(slot, entry)| entry.as_ref().map(|entry| (slot, entry.generation)))
            .min_by_key(|(_, generation)| *generation)
            .map_or(0, |(slot, _)| slot)
    }

    pub fn get(&self, handle: CacheHandle) -> Result<&DecoState, DecoError> {
        match self.entries.get(handle.slot) {
            Some(Some(entry)) if entry.generation == handle.generation => Ok(&entry.state),
            _ => {
                warn!("cache handle for slot {} is not valid", handle.slot);
                Err(DecoError::InvalidCacheHandle)
            }
        }
    }

    /// An independent copy of the stored state; the cached one is never touched.
    pub fn resume(&self, handle: CacheHandle) -> Result<DecoState, DecoError> {
        self.get(handle).cloned()
    }

    pub fn evict(&mut self, handle: CacheHandle) -> Result<DecoState, DecoError> {
        self.get(handle)?;
        self.entries[handle.slot]
            .take()
            .map(|entry| entry.state)
            .ok_or(DecoError::InvalidCacheHandle)
    }

    pub fn contains(&self, handle: CacheHandle) -> bool {
        matches!(self.entries.get(handle.slot), Some(Some(entry)) if entry.generation == handle.generation)
    }

    pub fn len(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub const fn capacity(&self) -> usize {
        SLOTS
    }

    pub fn clear(&mut self) {
        self.entries.iter_mut().for_each(|entry| *entry = None);
    }
}
