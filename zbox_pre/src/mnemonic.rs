//! Deterministic key derivation from a mnemonic phrase.
//!
//! The phrase seeds a BLAKE2Xb extendable-output function with unknown output
//! length. Seeds longer than a BLAKE2b key use their first 64 bytes as the key and
//! feed the rest as input. The secret scalar is then drawn from that stream by
//! rejection sampling on 253-bit big-endian candidates, so the same phrase always
//! yields the same key pair.

use blake2b_simd::Params;
use curve25519_dalek::scalar::Scalar as DalekScalar;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Error, Result};
use crate::group::{Scalar, SCALAR_SIZE};

const BLOCK_SIZE: usize = 64;
const MAX_KEY_SIZE: usize = 64;
/// Output length marker for a BLAKE2X stream of unknown size.
const UNKNOWN_LENGTH: u64 = 0xFFFF_FFFF;
/// Bit length of the group order ℓ.
const ORDER_BITS: usize = 253;

/// BLAKE2Xb output stream.
#[derive(Zeroize, ZeroizeOnDrop)]
struct Blake2Xb {
    root: [u8; BLOCK_SIZE],
    block: [u8; BLOCK_SIZE],
    offset: usize,
    node: u32,
}

impl Blake2Xb {
    fn new(seed: &[u8]) -> Self {
        let (key, input) = seed.split_at(seed.len().min(MAX_KEY_SIZE));
        let hash = Params::new()
            .hash_length(BLOCK_SIZE)
            .key(key)
            .node_offset(UNKNOWN_LENGTH << 32)
            .hash(input);
        let mut root = [0u8; BLOCK_SIZE];
        root.copy_from_slice(hash.as_bytes());
        Self {
            root,
            block: [0u8; BLOCK_SIZE],
            offset: BLOCK_SIZE,
            node: 0,
        }
    }

    fn next_block(&mut self) {
        let hash = Params::new()
            .hash_length(BLOCK_SIZE)
            .fanout(0)
            .max_depth(0)
            .max_leaf_length(BLOCK_SIZE as u32)
            .node_offset((UNKNOWN_LENGTH << 32) | u64::from(self.node))
            .node_depth(0)
            .inner_hash_length(BLOCK_SIZE)
            .hash(&self.root);
        self.block.copy_from_slice(hash.as_bytes());
        self.node = self.node.wrapping_add(1);
        self.offset = 0;
    }

    fn fill(&mut self, out: &mut [u8]) {
        for byte in out.iter_mut() {
            if self.offset == BLOCK_SIZE {
                self.next_block();
            }
            *byte = self.block[self.offset];
            self.offset += 1;
        }
    }
}

/// Derives the secret scalar for `mnemonic`.
pub(crate) fn derive_secret(mnemonic: &str) -> Result<Scalar> {
    if mnemonic.trim().is_empty() {
        return Err(Error::key_init("mnemonic is empty"));
    }
    let mut stream = Blake2Xb::new(mnemonic.as_bytes());
    Ok(pick_scalar(&mut stream))
}

/// Draws `0 < v < ℓ` from the stream.
fn pick_scalar(stream: &mut Blake2Xb) -> Scalar {
    let mask = 0xffu8 >> (8 * SCALAR_SIZE - ORDER_BITS);
    let mut candidate = [0u8; SCALAR_SIZE];
    loop {
        stream.fill(&mut candidate);
        candidate[0] &= mask;
        candidate.reverse();
        let picked: Option<DalekScalar> = DalekScalar::from_canonical_bytes(candidate).into();
        candidate.zeroize();
        if let Some(scalar) = picked {
            if scalar != DalekScalar::ZERO {
                return Scalar(scalar);
            }
        }
    }
}
