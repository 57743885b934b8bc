use blake2::{digest::typenum::U32, Blake2b, Digest};

pub fn blake2(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b::<U32>::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hex-encoded [`blake2`] hash, as stored alongside documents and patents.
pub fn blake2_hex(data: &[u8]) -> String {
    hex::encode(blake2(data))
}

/// Hash the provided value together with a secret, so that stored hashes
/// can't be reproduced from the value alone.
pub fn keyed_blake2_hex(secret: &[u8], data: &[u8]) -> String {
    let mut hasher = Blake2b::<U32>::new();
    hasher.update(secret);
    hasher.update(data);
    let digest: [u8; 32] = hasher.finalize().into();
    hex::encode(digest)
}
