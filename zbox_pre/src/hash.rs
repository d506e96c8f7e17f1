//! Hash oracles of the scheme.
//!
//! Inputs are concatenated in a fixed order without length prefixes or domain tags.
//! H1 hashes `tag ‖ sk` while H6 hashes `sk ‖ tag`; the two orders are not
//! interchangeable.

use sha2::{Digest, Sha256, Sha512};
use zeroize::Zeroizing;

use crate::group::{Point, Scalar};

/// Size of a SHA-512 checksum (C3, C4).
pub const CHECKSUM_SIZE: usize = 64;

/// H1: tag-bound point `SHA-256(tag ‖ sk)·G`.
pub(crate) fn h1(tag: &[u8], sk: &Scalar) -> Point {
    let digest = Sha256::new()
        .chain_update(tag)
        .chain_update(sk.as_bytes())
        .finalize();
    let h = Zeroizing::new(Scalar::from_digest_prefix(&digest));
    Point::mul_base(&h)
}

/// H2: `SHA-512(T)`, the AEAD key in bytes `[0..32)` and nonce in `[32..44)`.
pub(crate) fn h2(t: &Point) -> Zeroizing<[u8; CHECKSUM_SIZE]> {
    let mut out = Zeroizing::new([0u8; CHECKSUM_SIZE]);
    out.copy_from_slice(&Sha512::digest(t.to_bytes()));
    out
}

/// H3: message checksum `SHA-512(T ‖ message)`.
pub(crate) fn h3(message: &[u8], t: &Point) -> [u8; CHECKSUM_SIZE] {
    let digest = Sha512::new()
        .chain_update(t.to_bytes())
        .chain_update(message)
        .finalize();
    to_checksum(&digest)
}

/// H5: overall checksum `SHA-512(C1 ‖ C2 ‖ C3 ‖ α)`.
pub(crate) fn h5(c1: &Point, c2: &[u8], c3: &[u8], alpha: &Scalar) -> [u8; CHECKSUM_SIZE] {
    let digest = Sha512::new()
        .chain_update(c1.to_bytes())
        .chain_update(c2)
        .chain_update(c3)
        .chain_update(alpha.as_bytes())
        .finalize();
    to_checksum(&digest)
}

/// H6: tag witness α, `SHA-512(sk ‖ tag)` truncated to 32 bytes and reduced.
pub(crate) fn h6(tag: &[u8], sk: &Scalar) -> Zeroizing<Scalar> {
    let digest = Sha512::new()
        .chain_update(sk.as_bytes())
        .chain_update(tag)
        .finalize();
    Zeroizing::new(Scalar::from_digest_prefix(&digest))
}

/// H7: proxy re-randomizer β over `X ‖ D2 ‖ D3 ‖ D4 ‖ D5`.
pub(crate) fn h7(x: &Point, d2: &[u8], d3: &[u8], d4: &Point, d5: &Point) -> Scalar {
    let digest = Sha512::new()
        .chain_update(x.to_bytes())
        .chain_update(d2)
        .chain_update(d3)
        .chain_update(d4.to_bytes())
        .chain_update(d5.to_bytes())
        .finalize();
    Scalar::from_digest_prefix(&digest)
}

fn to_checksum(digest: &[u8]) -> [u8; CHECKSUM_SIZE] {
    let mut out = [0u8; CHECKSUM_SIZE];
    out.copy_from_slice(digest);
    out
}
