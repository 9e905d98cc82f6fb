use std::fmt;

use anyhow::{bail, Context, Result};
use confpull_core::FileKind;
use x509_parser::pem::Pem;

use crate::certificate::check_certificate;
use crate::env_file::parse_env_file;
use crate::private_key::check_private_key;

#[derive(Clone, Default, PartialEq, Eq)]
pub struct ValidationOptions {
    pub key_passphrase: Option<String>,
}

impl fmt::Debug for ValidationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationOptions")
            .field(
                "key_passphrase",
                &self.key_passphrase.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Decides whether `content` is well-formed for `kind`. Empty content never is.
pub fn validate(content: &[u8], kind: FileKind, options: &ValidationOptions) -> bool {
    check_content(content, kind, options).is_ok()
}

/// Same decision as [`validate`], with the reason attached on rejection.
pub fn check_content(content: &[u8], kind: FileKind, options: &ValidationOptions) -> Result<()> {
    if content.is_empty() {
        bail!("content is empty");
    }

    let checked = match kind {
        FileKind::Certificate => check_certificate(content),
        FileKind::EnvFile => std::str::from_utf8(content)
            .context("environment file is not valid UTF-8")
            .and_then(|text| parse_env_file(text).map(|_| ())),
        FileKind::PrivateKey => check_private_key(content, options.key_passphrase.as_deref()),
        FileKind::JsonConfig | FileKind::Unknown => Ok(()),
    };
    checked.with_context(|| format!("not a valid {}", kind.describe()))
}

/// PEM blocks found in `content`, stopping at the first malformed or trailing chunk.
pub(crate) fn pem_blocks(content: &[u8]) -> Vec<Pem> {
    Pem::iter_from_buffer(content)
        .map_while(|block| block.ok())
        .collect()
}
