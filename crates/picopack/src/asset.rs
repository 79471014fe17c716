//! Core data model: module identities and extracted assets
//!
//! An [`Asset`] is one source file's extracted representation. Identities are
//! dense integers assigned in discovery order; they are the bundle's
//! addressing scheme and never change once assigned.

use std::path::PathBuf;

use indexmap::IndexMap;
use rustc_hash::FxHasher;
use serde::Serialize;

/// Type alias for FxHasher-based IndexMap
pub type FxIndexMap<K, V> = IndexMap<K, V, std::hash::BuildHasherDefault<FxHasher>>;

/// Unique identifier for a module, dense in discovery order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ModuleId(u32);

impl ModuleId {
    /// The entry module always holds identity 0
    pub const ENTRY: Self = Self(0);

    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the underlying u32 value of the ModuleId
    #[inline]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for ModuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One source file's extracted representation
#[derive(Debug, Clone)]
pub struct Asset {
    /// Identity assigned by the allocator at extraction time
    pub id: ModuleId,
    /// Path the file was read from
    pub source_path: PathBuf,
    /// Import specifiers in encounter order, duplicates preserved
    pub dependency_specifiers: Vec<String>,
    /// Code body lowered to the `require`/`module`/`exports` handler dialect
    pub transformed_code: String,
    /// Specifier to identity mapping, filled in place by the graph builder
    /// as children resolve. Insertion order follows specifier order.
    pub dependency_map: FxIndexMap<String, ModuleId>,
}

/// Explicit identity sequence allocator.
///
/// Owned by the graph builder and threaded through each extraction. The
/// sequence is monotonic within one run: values are never reused and never
/// reset, so identities stay dense in discovery order even across the
/// deduplicating and compatibility build modes.
#[derive(Debug, Default)]
pub struct IdentityAllocator {
    next: u32,
}

impl IdentityAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw the next identity from the sequence
    pub fn allocate(&mut self) -> ModuleId {
        let id = ModuleId(self.next);
        self.next += 1;
        id
    }
}
