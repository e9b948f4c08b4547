use std::fmt;

use sha2::{Digest, Sha256};

/// Fixed-length content digest. Compared for exact equality only.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Checksum([u8; 32]);

impl Checksum {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Checksum(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// SHA-256 of `data`.
    pub fn digest(data: impl AsRef<[u8]>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data.as_ref());
        Checksum(hasher.finalize().into())
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Checksum({})", &self.to_hex()[..12])
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CombineOrder {
    /// `combine(a, b) != combine(b, a)` in general.
    Ordered,
    /// Commutative and associative; iteration order of the inputs does not matter.
    Unordered,
}

pub struct ChecksumCombiner;

impl ChecksumCombiner {
    pub fn combine(first: Checksum, second: Checksum, order: CombineOrder) -> Checksum {
        match order {
            CombineOrder::Ordered => {
                let mut hasher = Sha256::new();
                hasher.update(first.0);
                hasher.update(second.0);
                Checksum(hasher.finalize().into())
            }
            CombineOrder::Unordered => {
                let mut out = first.0;
                for (o, b) in out.iter_mut().zip(second.0) {
                    *o = o.wrapping_add(b);
                }
                Checksum(out)
            }
        }
    }

    /// Folds `parts` into `seed`; the first undefined part makes the whole result undefined.
    pub fn combine_all<I>(seed: Option<Checksum>, parts: I, order: CombineOrder) -> Option<Checksum>
    where
        I: IntoIterator<Item = Option<Checksum>>,
    {
        let mut acc = seed?;
        for part in parts {
            acc = Self::combine(acc, part?, order);
        }
        Some(acc)
    }
}
