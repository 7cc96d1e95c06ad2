use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// The hasher builder used by [`SlimMap`] when none is supplied.
        pub type DefaultHashBuilder = foldhash::fast::RandomState;
    } else {
        /// Placeholder hasher builder when the `foldhash` feature is
        /// disabled.
        ///
        /// This type is uninhabited; construct maps through
        /// [`SlimMap::with_hasher`] or [`SlimMap::with_capacity_and_hasher`]
        /// with an explicit builder instead.
        pub enum DefaultHashBuilder {}
    }
}

/// Largest supported bucket count.
///
/// Bucket cells and chain links store slot indices as 1-based `u32` values,
/// so the doubled capacity must stay addressable within `u32`.
const MAX_CAPACITY: usize = 1 << 31;

/// A stored entry: the key, its value, and the chain link to the next slot
/// that landed in the same bucket.
///
/// `next` uses the same encoding as the bucket array: `0` terminates the
/// chain, any other value is `slot index + 1`. Slots never move within an
/// allocation, so links stay valid until the whole map grows.
#[derive(Clone)]
struct Slot<K, V> {
    key: K,
    value: V,
    next: u32,
}

/// A compact hash map storing entries in a flat slot array with separate
/// chaining through a power-of-two bucket-index array.
///
/// `SlimMap<K, V, S>` keeps every entry in one contiguous `Vec` and resolves
/// collisions by index chaining: each bucket cell holds the 1-based index of
/// its chain head (`0` meaning empty), and each slot links to the next slot
/// in its chain the same way. Entries are appended in insertion order and
/// never removed, so there are no tombstones and no per-slot metadata beyond
/// a single `u32` link.
///
/// The map exposes one core operation in two flavors:
/// [`get_or_insert_mut`](SlimMap::get_or_insert_mut) returns a mutable
/// reference to the value for a key, inserting `V::default()` first if the
/// key is absent, and [`get_or_insert`](SlimMap::get_or_insert) does the
/// same but copies the value out. There is no iteration, removal, or
/// shrinking; workloads needing those belong in a general-purpose map.
///
/// # Performance Characteristics
///
/// - **Memory**: 4 bytes per bucket cell plus `size_of::<(K, V)>()` plus a
///   4-byte link per entry, in exactly two allocations.
/// - **Operations**: one hash computation per call, then an expected O(1)
///   chain walk; growth doubles both arrays and rebuilds buckets in O(len).
///
/// A fresh map allocates nothing until its first insert.
#[derive(Clone)]
pub struct SlimMap<K, V, S = DefaultHashBuilder> {
    /// Chain heads, one per bucket: `0` is empty, otherwise `index + 1`.
    buckets: Box<[u32]>,
    slots: Vec<Slot<K, V>>,
    hash_builder: S,
}

impl<K, V, S> Debug for SlimMap<K, V, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SlimMap")
            .field("len", &self.slots.len())
            .field("capacity", &self.buckets.len())
            .finish_non_exhaustive()
    }
}

impl<K, V, S> SlimMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Creates a new map with the given hasher builder.
    ///
    /// Nothing is allocated until the first insert.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(feature = "std")]
    /// # {
    /// use std::collections::hash_map::RandomState;
    ///
    /// use slim_map::SlimMap;
    ///
    /// let map: SlimMap<i32, String, _> = SlimMap::with_hasher(RandomState::new());
    /// assert!(map.is_empty());
    /// assert_eq!(map.capacity(), 0);
    /// # }
    /// ```
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_capacity_and_hasher(0, hash_builder)
    }

    /// Creates a new map with at least the specified capacity and the given
    /// hasher builder.
    ///
    /// The requested capacity is rounded up to the next power of two so the
    /// bucket mask is valid from the first insert. A capacity of `0` yields
    /// the unallocated state.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` exceeds `2^31`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(feature = "std")]
    /// # {
    /// use std::collections::hash_map::RandomState;
    ///
    /// use slim_map::SlimMap;
    ///
    /// let map: SlimMap<i32, String, _> = SlimMap::with_capacity_and_hasher(100, RandomState::new());
    /// assert_eq!(map.capacity(), 128);
    /// # }
    /// ```
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        assert!(capacity <= MAX_CAPACITY, "capacity overflow");
        if capacity == 0 {
            return Self {
                buckets: Vec::new().into_boxed_slice(),
                slots: Vec::new(),
                hash_builder,
            };
        }

        let capacity = capacity.next_power_of_two();
        Self {
            buckets: vec![0; capacity].into_boxed_slice(),
            slots: Vec::with_capacity(capacity),
            hash_builder,
        }
    }

    /// Returns the number of entries in the map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(feature = "foldhash")]
    /// # {
    /// use slim_map::SlimMap;
    ///
    /// let mut map: SlimMap<&str, u32> = SlimMap::new();
    /// assert_eq!(map.len(), 0);
    /// map.get_or_insert_mut("a");
    /// map.get_or_insert_mut("a");
    /// assert_eq!(map.len(), 1);
    /// # }
    /// ```
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if the map contains no entries.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(feature = "foldhash")]
    /// # {
    /// use slim_map::SlimMap;
    ///
    /// let mut map: SlimMap<u64, u64> = SlimMap::new();
    /// assert!(map.is_empty());
    /// map.get_or_insert_mut(7);
    /// assert!(!map.is_empty());
    /// # }
    /// ```
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns the number of entries the map can hold before the next
    /// growth.
    ///
    /// Always zero or a power of two; zero only for a map that has not yet
    /// allocated.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(feature = "foldhash")]
    /// # {
    /// use slim_map::SlimMap;
    ///
    /// let mut map: SlimMap<u64, u64> = SlimMap::new();
    /// assert_eq!(map.capacity(), 0);
    /// map.get_or_insert_mut(1);
    /// assert_eq!(map.capacity(), 2);
    /// # }
    /// ```
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Returns a reference to the map's hasher builder.
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Returns a mutable reference to the value for `key`, inserting
    /// `V::default()` first if the key is not present.
    ///
    /// The hash is computed exactly once per call. A hit walks the key's
    /// collision chain and hands back the slot in place, with no mutation
    /// and no growth; a miss appends a new slot, growing both arrays first
    /// if the slot array is full. The returned reference borrows the map,
    /// so it cannot outlive the next call that might grow the storage.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(feature = "foldhash")]
    /// # {
    /// use slim_map::SlimMap;
    ///
    /// let mut histogram: SlimMap<&str, u64> = SlimMap::new();
    /// for word in ["to", "be", "or", "not", "to", "be"] {
    ///     *histogram.get_or_insert_mut(word) += 1;
    /// }
    ///
    /// assert_eq!(histogram.len(), 4);
    /// assert_eq!(*histogram.get_or_insert_mut("be"), 2);
    /// assert_eq!(*histogram.get_or_insert_mut("question"), 0);
    /// # }
    /// ```
    #[inline]
    pub fn get_or_insert_mut(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        let hash = self.hash_builder.hash_one(&key);
        match self.find_index(hash, &key) {
            Some(index) => &mut self.slots[index].value,
            None => self.insert_default(hash, key),
        }
    }

    /// Returns a copy of the value for `key` and whether it was newly
    /// inserted.
    ///
    /// Same search and insert logic as
    /// [`get_or_insert_mut`](SlimMap::get_or_insert_mut), but the found or
    /// newly-defaulted value is cloned out instead of borrowed. Returns
    /// `true` if the key was just inserted (the value is then
    /// `V::default()`), `false` if it already existed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(feature = "foldhash")]
    /// # {
    /// use slim_map::SlimMap;
    ///
    /// let mut map: SlimMap<u32, u32> = SlimMap::new();
    /// assert_eq!(map.get_or_insert(5), (0, true));
    ///
    /// *map.get_or_insert_mut(5) = 10;
    /// assert_eq!(map.get_or_insert(5), (10, false));
    /// assert_eq!(map.len(), 1);
    /// # }
    /// ```
    #[inline]
    pub fn get_or_insert(&mut self, key: K) -> (V, bool)
    where
        V: Clone + Default,
    {
        let hash = self.hash_builder.hash_one(&key);
        match self.find_index(hash, &key) {
            Some(index) => (self.slots[index].value.clone(), false),
            None => (self.insert_default(hash, key).clone(), true),
        }
    }

    /// Walks the collision chain for `hash` and returns the slot index
    /// holding an equal key, if any.
    #[inline(always)]
    fn find_index(&self, hash: u64, key: &K) -> Option<usize> {
        // A fresh map has no buckets to walk; the mask would be meaningless.
        let mask = self.buckets.len().checked_sub(1)?;
        let mut cursor = self.buckets[hash as usize & mask];
        while cursor != 0 {
            let index = (cursor - 1) as usize;
            let slot = &self.slots[index];
            if slot.key == *key {
                return Some(index);
            }
            cursor = slot.next;
        }
        None
    }

    /// Appends a new slot for `key` with a default value and links it as
    /// the head of its bucket chain, growing first if necessary.
    ///
    /// `hash` must be the hash of `key` under this map's hasher builder;
    /// the bucket index is derived from it after any growth so it is always
    /// computed against the current mask.
    #[inline(never)]
    fn insert_default(&mut self, hash: u64, key: K) -> &mut V
    where
        V: Default,
    {
        if self.slots.len() == self.buckets.len() {
            self.grow();
        }
        debug_assert!(self.slots.len() < self.buckets.len());

        let bucket = hash as usize & (self.buckets.len() - 1);
        let index = self.slots.len();
        self.slots.push(Slot {
            key,
            value: V::default(),
            next: self.buckets[bucket],
        });
        self.buckets[bucket] = index as u32 + 1;
        &mut self.slots[index].value
    }

    /// Doubles the capacity and rebuilds the bucket array.
    ///
    /// Slot indices are preserved; only the chain links and bucket heads
    /// are recomputed against the new mask. Walking the slots in reverse
    /// keeps each rebuilt chain in the relative order that head insertion
    /// produced before the growth.
    #[cold]
    fn grow(&mut self) {
        // An unallocated map is treated as capacity 1, so the first growth
        // lands on 2 and every capacity stays a power of two.
        let new_capacity = self
            .buckets
            .len()
            .max(1)
            .checked_mul(2)
            .filter(|&capacity| capacity <= MAX_CAPACITY)
            .expect("capacity overflow");

        let mut buckets = vec![0u32; new_capacity].into_boxed_slice();
        let mask = new_capacity - 1;
        for (index, slot) in self.slots.iter_mut().enumerate().rev() {
            let bucket = self.hash_builder.hash_one(&slot.key) as usize & mask;
            slot.next = buckets[bucket];
            buckets[bucket] = index as u32 + 1;
        }

        self.buckets = buckets;
        self.slots.reserve_exact(new_capacity - self.slots.len());
    }

    /// Structural consistency check used by the test suite.
    ///
    /// Validates power-of-two sizing, that every live slot is reachable
    /// from exactly one bucket chain, and that every chain head and link
    /// is in bounds.
    #[cfg(test)]
    fn assert_invariants(&self) {
        assert!(self.slots.len() <= self.buckets.len());
        let mask = match self.buckets.len().checked_sub(1) {
            Some(mask) => mask,
            None => return,
        };
        assert!(self.buckets.len().is_power_of_two());

        let mut seen = vec![false; self.slots.len()];
        for (bucket, head) in self.buckets.iter().enumerate() {
            let mut cursor = *head;
            while cursor != 0 {
                let index = (cursor - 1) as usize;
                assert!(index < self.slots.len(), "chain link out of bounds");
                assert!(!seen[index], "slot reachable from two chains");
                seen[index] = true;
                assert_eq!(
                    self.hash_builder.hash_one(&self.slots[index].key) as usize & mask,
                    bucket,
                    "slot chained under the wrong bucket"
                );
                cursor = self.slots[index].next;
            }
        }
        assert!(seen.iter().all(|reached| *reached), "unreachable slot");
    }
}

impl<K, V, S> SlimMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    /// Creates a new map using the default hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(feature = "foldhash")]
    /// # {
    /// use slim_map::SlimMap;
    ///
    /// let map: SlimMap<u64, String> = SlimMap::new();
    /// assert!(map.is_empty());
    /// # }
    /// ```
    pub fn new() -> Self {
        Self::with_hasher(S::default())
    }

    /// Creates a new map with at least the specified capacity using the
    /// default hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(feature = "foldhash")]
    /// # {
    /// use slim_map::SlimMap;
    ///
    /// let map: SlimMap<u64, String> = SlimMap::with_capacity(6);
    /// assert_eq!(map.capacity(), 8);
    /// # }
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, S::default())
    }
}

impl<K, V, S> Default for SlimMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::new()
    }
}
