use serde::{Deserialize, Serialize};

/// Handle into the binary registry.
///
/// Stars that are binaries hold one of these; a `None` on the star marks a
/// single. The handle stays valid until the slot is destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BinaryIndex(pub usize);

/// Internal parameters of a bound two-body subsystem.
///
/// Component masses follow the same convention as star masses (pre-multiplied
/// by the initial star count).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Binary {
    pub m1: f64,
    pub m2: f64,
    /// Semimajor axis, > 0.
    pub a: f64,
    /// Eccentricity in [0, 1).
    pub e: f64,
    /// Internal energy of the primary.
    pub e_int1: f64,
    /// Internal energy of the secondary.
    pub e_int2: f64,
}

impl Binary {
    pub fn new(m1: f64, m2: f64, a: f64, e: f64) -> Self {
        Binary {
            m1,
            m2,
            a,
            e,
            e_int1: 0.0,
            e_int2: 0.0,
        }
    }

    /// Combined mass of both components.
    pub fn total_mass(&self) -> f64 {
        self.m1 + self.m2
    }

    /// Orbital binding energy magnitude `m1 m2 / (2 a)` in code units.
    ///
    /// `n_star` is the initial star count; both component masses carry it as
    /// a stored factor and must be divided out of the product.
    pub fn binding_energy(&self, n_star: f64) -> f64 {
        (self.m1 / n_star) * (self.m2 / n_star) / (2.0 * self.a)
    }
}

/// Free-list slab of binary slots.
///
/// Slots are allocated once per binary and recycled after destruction, so
/// indices stay small and stable across the run. A destroyed slot is not
/// observable through [`BinaryRegistry::get`] until it is reused.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BinaryRegistry {
    slots: Vec<Option<Binary>>,
    free: Vec<usize>,
}

impl BinaryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a binary, reusing a freed slot when one exists.
    pub fn create(&mut self, binary: Binary) -> BinaryIndex {
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(binary);
                BinaryIndex(idx)
            }
            None => {
                self.slots.push(Some(binary));
                BinaryIndex(self.slots.len() - 1)
            }
        }
    }

    /// Destroys the binary in `idx`, returning its final parameters.
    ///
    /// The slot goes on the free list; the caller is responsible for clearing
    /// the owning star's handle.
    pub fn destroy(&mut self, idx: BinaryIndex) -> Option<Binary> {
        let slot = self.slots.get_mut(idx.0)?;
        let binary = slot.take();
        if binary.is_some() {
            self.free.push(idx.0);
        }
        binary
    }

    pub fn get(&self, idx: BinaryIndex) -> Option<&Binary> {
        self.slots.get(idx.0).and_then(|s| s.as_ref())
    }

    pub fn get_mut(&mut self, idx: BinaryIndex) -> Option<&mut Binary> {
        self.slots.get_mut(idx.0).and_then(|s| s.as_mut())
    }

    /// Number of slots ever allocated, live or not.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of currently live binaries.
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Iterates over live binaries with their handles.
    pub fn iter_live(&self) -> impl Iterator<Item = (BinaryIndex, &Binary)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|b| (BinaryIndex(i), b)))
    }
}
