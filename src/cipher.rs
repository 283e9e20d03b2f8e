//! Encryption collaborator seam.
//!
//! The store and sync client never touch cryptographic primitives
//! directly. They go through the [`Cipher`] trait, keyed by an identity
//! (a key fingerprint or similar identifier). The bundled [`GpgCipher`]
//! shells out to the `gpg` binary; tests substitute their own.

use std::io::Write;
use std::process::{Command, Stdio};

/// Opaque per-identity encrypt/decrypt.
pub trait Cipher: Send + Sync {
    /// Encrypts `plaintext` so that only `identity` can read it back.
    fn encrypt(&self, identity: &str, plaintext: &[u8]) -> Result<Vec<u8>, CipherError>;

    /// Decrypts previously encrypted material.
    ///
    /// Returns [`CipherError::NoEncryptedData`] when the input is not
    /// encrypted at all, so callers probing for document existence can
    /// tell "file exists but isn't encrypted yet" from a real failure.
    fn decrypt(&self, material: &[u8]) -> Result<Vec<u8>, CipherError>;

    /// Exports the shareable public key material for `identity`.
    fn public_key(&self, identity: &str) -> Result<String, CipherError>;
}

/// Errors from cipher operations.
#[derive(Debug)]
pub enum CipherError {
    /// Encryption failed.
    Encrypt(String),
    /// Decryption failed on data that looked encrypted.
    Decrypt(String),
    /// Key material for an identity could not be produced.
    Key(String),
    /// The input carries no encrypted data at all.
    NoEncryptedData,
}

impl std::fmt::Display for CipherError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CipherError::Encrypt(e) => write!(f, "Encryption failed: {}", e),
            CipherError::Decrypt(e) => write!(f, "Decryption failed: {}", e),
            CipherError::Key(e) => write!(f, "Key export failed: {}", e),
            CipherError::NoEncryptedData => write!(f, "No encrypted data found"),
        }
    }
}

impl std::error::Error for CipherError {}

/// Cipher adapter that invokes the `gpg` binary.
#[derive(Debug, Clone, Default)]
pub struct GpgCipher;

impl GpgCipher {
    pub fn new() -> Self {
        Self
    }

    fn run(args: &[&str], input: &[u8]) -> Result<std::process::Output, std::io::Error> {
        let mut child = Command::new("gpg")
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(stdin) = child.stdin.as_mut() {
            stdin.write_all(input)?;
        }

        child.wait_with_output()
    }
}

impl Cipher for GpgCipher {
    fn encrypt(&self, identity: &str, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        let output = Self::run(
            &[
                "--batch",
                "--yes",
                "--armor",
                "--trust-model",
                "always",
                "--encrypt",
                "--recipient",
                identity,
            ],
            plaintext,
        )
        .map_err(|e| CipherError::Encrypt(e.to_string()))?;

        if !output.status.success() {
            return Err(CipherError::Encrypt(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        Ok(output.stdout)
    }

    fn decrypt(&self, material: &[u8]) -> Result<Vec<u8>, CipherError> {
        let output = Self::run(&["--batch", "--yes", "--decrypt"], material)
            .map_err(|e| CipherError::Decrypt(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_lowercase();
            if stderr.contains("no valid openpgp data") {
                return Err(CipherError::NoEncryptedData);
            }
            return Err(CipherError::Decrypt(stderr.trim().to_string()));
        }

        Ok(output.stdout)
    }

    fn public_key(&self, identity: &str) -> Result<String, CipherError> {
        let output = Self::run(&["--batch", "--export", "--armor", identity], &[])
            .map_err(|e| CipherError::Key(e.to_string()))?;

        if !output.status.success() {
            return Err(CipherError::Key(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let armored = String::from_utf8_lossy(&output.stdout).to_string();
        if armored.trim().is_empty() {
            return Err(CipherError::Key(format!("no public key for {}", identity)));
        }

        Ok(armored)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    const PREFIX: &[u8] = b"ENC1:";

    /// Reversible stand-in cipher for tests. Prefixes the plaintext with
    /// a marker so unencrypted input is detectable.
    #[derive(Debug, Clone, Default)]
    pub struct PlainCipher;

    impl Cipher for PlainCipher {
        fn encrypt(&self, _identity: &str, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
            let mut out = PREFIX.to_vec();
            out.extend_from_slice(plaintext);
            Ok(out)
        }

        fn decrypt(&self, material: &[u8]) -> Result<Vec<u8>, CipherError> {
            match material.strip_prefix(PREFIX) {
                Some(rest) => Ok(rest.to_vec()),
                None => Err(CipherError::NoEncryptedData),
            }
        }

        fn public_key(&self, identity: &str) -> Result<String, CipherError> {
            Ok(format!("PUBKEY:{}", identity))
        }
    }

    #[test]
    fn test_plain_cipher_roundtrip() {
        let cipher = PlainCipher;
        let ct = cipher.encrypt("someone", b"hello").unwrap();
        assert_ne!(ct, b"hello");
        assert_eq!(cipher.decrypt(&ct).unwrap(), b"hello");
    }

    #[test]
    fn test_plain_cipher_detects_unencrypted_input() {
        let cipher = PlainCipher;
        assert!(matches!(
            cipher.decrypt(b"just some bytes"),
            Err(CipherError::NoEncryptedData)
        ));
    }
}
