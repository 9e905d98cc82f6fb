mod certificate;
mod checksum;
mod env_file;
mod private_key;
mod validate;

pub use certificate::check_certificate;
pub use checksum::{same_content, sha256_hex};
pub use env_file::{parse_env_file, IniEntry};
pub use private_key::check_private_key;
pub use validate::{check_content, validate, ValidationOptions};

#[cfg(test)]
mod tests;
