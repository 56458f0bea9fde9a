use sha2::{Digest, Sha256};

/// Hex SHA-256 of the given bytes, used as the reference file checksum
pub fn calculate_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
