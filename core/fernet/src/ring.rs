//! Fernet key ring model and rotation.
use std::collections::BTreeMap;

use anyhow::Result;
use serde::Deserialize;
use serde::Serialize;

use crate::FernetKey;
use crate::MissingStagedKey;
use crate::MIN_ACTIVE_KEYS;

/// Index of the staged key in a ring.
const STAGED: u32 = 0;

/// Ordered set of fernet keys, indexed by their position in the ring.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyRing(BTreeMap<u32, FernetKey>);

impl KeyRing {
    /// Create a new key ring with a staged and a primary key.
    pub fn initial() -> KeyRing {
        let mut keys = BTreeMap::new();
        keys.insert(STAGED, FernetKey::generate());
        keys.insert(1, FernetKey::generate());
        KeyRing(keys)
    }

    /// Check if the ring has no keys.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the keys in the ring in index order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &FernetKey)> {
        self.0.iter().map(|(index, key)| (*index, key))
    }

    /// Number of keys in the ring, including the staged key.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Index of the primary key, the highest in the ring.
    pub fn primary(&self) -> Option<u32> {
        self.0.keys().next_back().copied().filter(|index| *index != STAGED)
    }

    /// Rotate the ring and return the changes made to it.
    ///
    /// The staged key is promoted to primary, a new staged key is generated and, while the ring
    /// holds more than `max_active` keys, the oldest secondary keys are retired.
    /// Values of `max_active` below [`MIN_ACTIVE_KEYS`] are raised to it.
    pub fn rotate(&mut self, max_active: u32) -> Result<Rotation> {
        let staged = match self.0.remove(&STAGED) {
            Some(staged) => staged,
            None => anyhow::bail!(MissingStagedKey),
        };
        let promoted = self.primary().unwrap_or(STAGED) + 1;
        self.0.insert(promoted, staged);
        self.0.insert(STAGED, FernetKey::generate());

        let max_active = max_active.max(MIN_ACTIVE_KEYS) as usize;
        let mut retired = Vec::new();
        while self.0.len() > max_active {
            let oldest = self
                .0
                .keys()
                .copied()
                .find(|index| *index != STAGED && *index != promoted);
            match oldest {
                Some(index) => {
                    self.0.remove(&index);
                    retired.push(index);
                }
                None => break,
            }
        }
        Ok(Rotation { promoted, retired })
    }

    /// Access the staged key, if the ring has one.
    pub fn staged(&self) -> Option<&FernetKey> {
        self.0.get(&STAGED)
    }

    /// Access the key at the given index.
    pub fn get(&self, index: u32) -> Option<&FernetKey> {
        self.0.get(&index)
    }

    /// Insert a key at the given index, replacing any key already there.
    pub fn insert(&mut self, index: u32, key: FernetKey) {
        self.0.insert(index, key);
    }
}

/// Changes made to a key ring by a rotation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rotation {
    /// Index the staged key was promoted to.
    pub promoted: u32,

    /// Indexes of the keys removed from the ring, oldest first.
    pub retired: Vec<u32>,
}
