//! ed25519 group arithmetic.
//!
//! Thin newtypes over `curve25519_dalek` so the rest of the crate only ever sees
//! canonical 32-byte encodings. Decoding rejects anything the curve library would
//! not produce itself.

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use curve25519_dalek::{
    constants::ED25519_BASEPOINT_POINT,
    edwards::{CompressedEdwardsY, EdwardsPoint},
    scalar::Scalar as DalekScalar,
    traits::{Identity, IsIdentity},
};
use rand::{CryptoRng, RngCore};
use zeroize::Zeroize;

use crate::error::{Error, Result};

/// Size of a compressed Edwards point.
pub const POINT_SIZE: usize = 32;
/// Size of a canonical scalar.
pub const SCALAR_SIZE: usize = 32;

/// Element of the ed25519 scalar field, modulo the prime group order ℓ.
#[derive(Clone, Copy, PartialEq, Eq, Zeroize)]
pub struct Scalar(pub(crate) DalekScalar);

impl Scalar {
    /// Draws a uniform scalar in `[0, ℓ)`.
    ///
    /// 64 bytes are reduced so that the modular bias is negligible.
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self> {
        let mut wide = [0u8; 64];
        rng.try_fill_bytes(&mut wide)
            .map_err(|e| Error::RandomnessFailure(e.to_string()))?;
        let scalar = DalekScalar::from_bytes_mod_order_wide(&wide);
        wide.zeroize();
        Ok(Self(scalar))
    }

    /// Interprets 32 little-endian bytes as an integer and reduces it mod ℓ.
    pub fn from_bytes_mod_order(bytes: [u8; SCALAR_SIZE]) -> Self {
        Self(DalekScalar::from_bytes_mod_order(bytes))
    }

    /// Reduces the first 32 bytes of a hash output.
    pub(crate) fn from_digest_prefix(digest: &[u8]) -> Self {
        let mut bytes = [0u8; SCALAR_SIZE];
        bytes.copy_from_slice(&digest[..SCALAR_SIZE]);
        let scalar = Self::from_bytes_mod_order(bytes);
        bytes.zeroize();
        scalar
    }

    /// Parses a canonical encoding, rejecting values `>= ℓ`.
    pub fn from_canonical_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; SCALAR_SIZE] = bytes.try_into().map_err(|_| {
            Error::parse(format!(
                "scalar must be {SCALAR_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;
        Option::from(DalekScalar::from_canonical_bytes(bytes))
            .map(Self)
            .ok_or_else(|| Error::parse("non-canonical scalar encoding"))
    }

    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = decode_base64(encoded, SCALAR_SIZE, "scalar")?;
        Self::from_canonical_bytes(&bytes)
    }

    /// Modular inverse. `None` for zero, which has no inverse.
    pub fn invert(&self) -> Option<Self> {
        if self.is_zero() {
            return None;
        }
        Some(Self(self.0.invert()))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == DalekScalar::ZERO
    }

    pub fn to_bytes(&self) -> [u8; SCALAR_SIZE] {
        self.0.to_bytes()
    }

    pub fn as_bytes(&self) -> &[u8; SCALAR_SIZE] {
        self.0.as_bytes()
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(self.as_bytes())
    }
}

impl fmt::Debug for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Scalar(..)")
    }
}

impl Add for Scalar {
    type Output = Scalar;

    fn add(self, rhs: Scalar) -> Scalar {
        Scalar(self.0 + rhs.0)
    }
}

impl Sub for Scalar {
    type Output = Scalar;

    fn sub(self, rhs: Scalar) -> Scalar {
        Scalar(self.0 - rhs.0)
    }
}

impl Mul for Scalar {
    type Output = Scalar;

    fn mul(self, rhs: Scalar) -> Scalar {
        Scalar(self.0 * rhs.0)
    }
}

impl Neg for Scalar {
    type Output = Scalar;

    fn neg(self) -> Scalar {
        Scalar(-self.0)
    }
}

/// Point on the ed25519 curve in Edwards form.
#[derive(Clone, Copy, PartialEq, Eq, Zeroize)]
pub struct Point(pub(crate) EdwardsPoint);

impl Point {
    /// The fixed generator `G`.
    pub fn basepoint() -> Self {
        Self(ED25519_BASEPOINT_POINT)
    }

    /// The neutral element. Multiplying it by a scalar always yields itself.
    pub fn identity() -> Self {
        Self(EdwardsPoint::identity())
    }

    /// Computes `s·G`.
    pub fn mul_base(s: &Scalar) -> Self {
        Self(EdwardsPoint::mul_base(&s.0))
    }

    pub fn is_identity(&self) -> bool {
        self.0.is_identity()
    }

    /// Decodes a compressed point. Encodings that do not round-trip through
    /// compression (y ≥ p, negative zero) are rejected.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let compressed = CompressedEdwardsY::from_slice(bytes).map_err(|_| {
            Error::parse(format!(
                "point must be {POINT_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;
        let point = compressed
            .decompress()
            .ok_or_else(|| Error::parse("bytes do not encode a curve point"))?;
        if point.compress() != compressed {
            return Err(Error::parse("non-canonical point encoding"));
        }
        Ok(Self(point))
    }

    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = decode_base64(encoded, POINT_SIZE, "point")?;
        Self::from_bytes(&bytes)
    }

    pub fn to_bytes(&self) -> [u8; POINT_SIZE] {
        self.0.compress().to_bytes()
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(self.to_bytes())
    }
}

impl fmt::Debug for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Point({})", self.to_base64())
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point(self.0 + rhs.0)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point(self.0 - rhs.0)
    }
}

impl Neg for Point {
    type Output = Point;

    fn neg(self) -> Point {
        Point(-self.0)
    }
}

impl Mul<Scalar> for Point {
    type Output = Point;

    fn mul(self, rhs: Scalar) -> Point {
        Point(self.0 * rhs.0)
    }
}

/// Decodes standard padded base64 and checks the decoded length.
pub(crate) fn decode_base64(encoded: &str, len: usize, what: &str) -> Result<Vec<u8>> {
    let bytes = BASE64
        .decode(encoded)
        .map_err(|e| Error::parse(format!("invalid base64 for {what}: {e}")))?;
    if bytes.len() != len {
        return Err(Error::parse(format!(
            "{what} must decode to {len} bytes, got {}",
            bytes.len()
        )));
    }
    Ok(bytes)
}
