use sha2::{Digest, Sha256};

pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex::encode(digest)
}

/// Whole-content comparison by digest. Both sides are small config artifacts.
pub fn same_content(left: &[u8], right: &[u8]) -> bool {
    sha256_hex(left) == sha256_hex(right)
}
