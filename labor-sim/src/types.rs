use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

use crate::error::{Result, SimError};

// ============================================================================
// IDs
// ============================================================================

new_key_type! {
    /// Generational key into the firm arena. Households hold one as their
    /// employer link; a key whose firm is gone resolves to nothing.
    pub struct FirmId;
}

/// Trait for converting SlotMap keys to u64 for the WASM boundary and for
/// tracing fields.
pub trait KeyToU64 {
    fn to_u64(self) -> u64;
}

impl KeyToU64 for FirmId {
    fn to_u64(self) -> u64 {
        self.0.as_ffi()
    }
}

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct HouseholdId(pub u32);

impl HouseholdId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Id for the household at `index` in the population vector.
    pub fn from_index(index: usize) -> Result<Self> {
        u32::try_from(index).map(Self).map_err(|_| {
            SimError::InvalidConfig(format!(
                "household index {index} does not fit a u32 id"
            ))
        })
    }
}

// ============================================================================
// Units
// ============================================================================

pub type Hours = f64;
pub type Wage = f64;
