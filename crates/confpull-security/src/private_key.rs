use anyhow::{anyhow, bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, KeyIvInit};
use md5::{Digest, Md5};
use pkcs1::RsaPrivateKey;
use pkcs8::der::Decode;
use pkcs8::{EncryptedPrivateKeyInfo, PrivateKeyInfo};
use sec1::EcPrivateKey;

use crate::validate::pem_blocks;

const LEGACY_ENCRYPTED_HEADER: &[u8] = b"Proc-Type: 4,ENCRYPTED";

/// Accepts PKCS#8 keys (decrypting `ENCRYPTED PRIVATE KEY` blocks with `passphrase`)
/// and the traditional PKCS#1 RSA / SEC1 EC PEM forms, including the OpenSSL
/// `Proc-Type: 4,ENCRYPTED` variant. Raw DER must be PKCS#8.
pub fn check_private_key(content: &[u8], passphrase: Option<&str>) -> Result<()> {
    if content
        .windows(LEGACY_ENCRYPTED_HEADER.len())
        .any(|window| window == LEGACY_ENCRYPTED_HEADER)
    {
        return check_legacy_encrypted(content, passphrase);
    }

    let blocks = pem_blocks(content);
    if blocks.is_empty() {
        return check_pkcs8_der(content);
    }

    let mut found = false;
    for block in &blocks {
        match block.label.as_str() {
            "PRIVATE KEY" => check_pkcs8_der(&block.contents)?,
            "ENCRYPTED PRIVATE KEY" => decrypt_pkcs8_der(&block.contents, passphrase)?,
            "RSA PRIVATE KEY" | "EC PRIVATE KEY" => {
                check_traditional_der(&block.label, &block.contents)?
            }
            _ => continue,
        }
        found = true;
    }

    if !found {
        bail!("no private key block found");
    }
    Ok(())
}

fn check_pkcs8_der(der: &[u8]) -> Result<()> {
    PrivateKeyInfo::try_from(der).map_err(|err| anyhow!("invalid PKCS#8 private key: {err}"))?;
    Ok(())
}

fn decrypt_pkcs8_der(der: &[u8], passphrase: Option<&str>) -> Result<()> {
    let encrypted = EncryptedPrivateKeyInfo::try_from(der)
        .map_err(|err| anyhow!("invalid encrypted PKCS#8 private key: {err}"))?;
    let Some(passphrase) = passphrase else {
        bail!("private key is encrypted but no passphrase is configured");
    };
    let document = encrypted
        .decrypt(passphrase)
        .map_err(|err| anyhow!("failed to decrypt private key: {err}"))?;
    check_pkcs8_der(document.as_bytes())
}

fn check_traditional_der(label: &str, der: &[u8]) -> Result<()> {
    match label {
        "RSA PRIVATE KEY" => RsaPrivateKey::from_der(der)
            .map(|_| ())
            .map_err(|err| anyhow!("invalid PKCS#1 RSA private key: {err}")),
        "EC PRIVATE KEY" => EcPrivateKey::from_der(der)
            .map(|_| ())
            .map_err(|err| anyhow!("invalid SEC1 EC private key: {err}")),
        other => bail!("unsupported private key type '{other}'"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LegacyCipher {
    Aes128Cbc,
    Aes192Cbc,
    Aes256Cbc,
}

impl LegacyCipher {
    fn parse(name: &str) -> Result<Self> {
        match name.trim() {
            "AES-128-CBC" => Ok(Self::Aes128Cbc),
            "AES-192-CBC" => Ok(Self::Aes192Cbc),
            "AES-256-CBC" => Ok(Self::Aes256Cbc),
            other => bail!("unsupported PEM encryption cipher '{other}'"),
        }
    }

    fn key_len(self) -> usize {
        match self {
            Self::Aes128Cbc => 16,
            Self::Aes192Cbc => 24,
            Self::Aes256Cbc => 32,
        }
    }
}

/// A traditional PEM block carrying RFC 1421 style `Proc-Type`/`DEK-Info` headers.
struct LegacyPemBlock {
    label: String,
    cipher: LegacyCipher,
    iv: Vec<u8>,
    ciphertext: Vec<u8>,
}

impl LegacyPemBlock {
    fn parse(text: &str) -> Result<Self> {
        let mut lines = text
            .lines()
            .map(str::trim)
            .skip_while(|line| !line.starts_with("-----BEGIN "));
        let label = lines
            .next()
            .and_then(|line| line.strip_prefix("-----BEGIN "))
            .and_then(|rest| rest.strip_suffix("-----"))
            .ok_or_else(|| anyhow!("no PEM block found"))?
            .to_string();

        let mut dek_info = None;
        let mut body = String::new();
        let mut closed = false;
        for line in lines {
            if line.starts_with("-----END ") {
                closed = true;
                break;
            }
            if body.is_empty() {
                if let Some((name, value)) = line.split_once(':') {
                    if name.trim() == "DEK-Info" {
                        dek_info = Some(value.trim());
                    }
                    continue;
                }
            }
            body.push_str(line);
        }
        if !closed {
            bail!("unterminated {label} block");
        }

        let dek_info = dek_info.ok_or_else(|| anyhow!("encrypted {label} has no DEK-Info header"))?;
        let (cipher, iv_hex) = dek_info
            .split_once(',')
            .ok_or_else(|| anyhow!("malformed DEK-Info header '{dek_info}'"))?;
        let cipher = LegacyCipher::parse(cipher)?;
        let iv = hex::decode(iv_hex.trim()).context("DEK-Info IV is not hex")?;
        if iv.len() != 16 {
            bail!("DEK-Info IV must be 16 bytes, found {}", iv.len());
        }
        let ciphertext = STANDARD
            .decode(body.as_bytes())
            .context("encrypted key body is not valid base64")?;

        Ok(Self {
            label,
            cipher,
            iv,
            ciphertext,
        })
    }

    fn decrypt(&self, passphrase: &str) -> Result<Vec<u8>> {
        let key = legacy_pem_key(passphrase.as_bytes(), &self.iv[..8], self.cipher.key_len());
        match self.cipher {
            LegacyCipher::Aes128Cbc => {
                decrypt_cbc::<cbc::Decryptor<aes::Aes128>>(&key, &self.iv, &self.ciphertext)
            }
            LegacyCipher::Aes192Cbc => {
                decrypt_cbc::<cbc::Decryptor<aes::Aes192>>(&key, &self.iv, &self.ciphertext)
            }
            LegacyCipher::Aes256Cbc => {
                decrypt_cbc::<cbc::Decryptor<aes::Aes256>>(&key, &self.iv, &self.ciphertext)
            }
        }
    }
}

fn check_legacy_encrypted(content: &[u8], passphrase: Option<&str>) -> Result<()> {
    let text = std::str::from_utf8(content).context("encrypted PEM key is not valid UTF-8")?;
    let block = LegacyPemBlock::parse(text)?;
    let Some(passphrase) = passphrase else {
        bail!("private key is encrypted but no passphrase is configured");
    };
    let der = block.decrypt(passphrase)?;
    check_traditional_der(&block.label, &der)
        .context("decrypted key does not parse, the passphrase is probably wrong")
}

/// OpenSSL `EVP_BytesToKey` with MD5 and a single iteration, salted with the
/// first eight IV bytes.
fn legacy_pem_key(passphrase: &[u8], salt: &[u8], key_len: usize) -> Vec<u8> {
    let mut key = Vec::with_capacity(key_len + 16);
    let mut previous: Vec<u8> = Vec::new();
    while key.len() < key_len {
        let mut hasher = Md5::new();
        hasher.update(&previous);
        hasher.update(passphrase);
        hasher.update(salt);
        previous = hasher.finalize().to_vec();
        key.extend_from_slice(&previous);
    }
    key.truncate(key_len);
    key
}

fn decrypt_cbc<D>(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>>
where
    D: KeyIvInit + BlockDecryptMut,
{
    D::new_from_slices(key, iv)
        .map_err(|_| anyhow!("invalid key or IV length for PEM cipher"))?
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| anyhow!("failed to decrypt private key: wrong passphrase or corrupt data"))
}
