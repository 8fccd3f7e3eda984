//! # Key Management
//!
//! secp256k1 keys for preconfirmation signers.
//!
//! A signer's public identity is its Ethereum-style address: the last 20
//! bytes of `keccak256(uncompressed_pubkey[1..])`. That keeps receipts
//! verifiable with nothing more than `ecrecover`.
//!
//! ## Security considerations
//!
//! - Secret bytes never appear in `Debug` output or log events.
//! - `PreconfirmKey` deliberately does not implement `Serialize`. Exporting a
//!   secret goes through [`PreconfirmKey::secret_hex`] and nothing else.
//! - Key files are written `0o600` on Unix.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use secp256k1::{PublicKey, SecretKey, SECP256K1};
use thiserror::Error;

use crate::config::SECRET_KEY_LENGTH;
use crate::crypto::hash::keccak256;
use crate::types::{strip_hex_prefix, Address};

/// Errors that can occur while loading or writing key material.
///
/// Messages never include the offending bytes, only their shape.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid private key hex")]
    InvalidHex,

    #[error("invalid private key length: got {got}, expected 32")]
    InvalidLength { got: usize },

    #[error("private key is not a valid secp256k1 scalar")]
    InvalidScalar,

    #[error("empty key path")]
    EmptyPath,

    #[error("cannot read key file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("cannot write key file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A secp256k1 signing key together with its derived address.
pub struct PreconfirmKey {
    secret: SecretKey,
    address: Address,
}

impl PreconfirmKey {
    /// Generates a fresh key from the thread-local CSPRNG.
    pub fn generate() -> Self {
        let secret = SecretKey::new(&mut rand::thread_rng());
        Self::from_secret(secret)
    }

    /// Wraps an existing secp256k1 secret.
    pub fn from_secret(secret: SecretKey) -> Self {
        let public = PublicKey::from_secret_key(SECP256K1, &secret);
        Self {
            secret,
            address: address_from_pubkey(&public),
        }
    }

    /// Builds a key from exactly 32 raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() != SECRET_KEY_LENGTH {
            return Err(KeyError::InvalidLength { got: bytes.len() });
        }
        let secret = SecretKey::from_slice(bytes).map_err(|_| KeyError::InvalidScalar)?;
        Ok(Self::from_secret(secret))
    }

    /// Parses a hex secret. Surrounding whitespace and a `0x` prefix are
    /// tolerated; anything else that is not exactly 32 bytes is rejected.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let trimmed = strip_hex_prefix(hex_str.trim());
        let bytes = hex::decode(trimmed).map_err(|_| KeyError::InvalidHex)?;
        Self::from_bytes(&bytes)
    }

    /// Reads a file containing a single hex secret.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, KeyError> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(KeyError::EmptyPath);
        }
        let contents = std::fs::read_to_string(path).map_err(|source| KeyError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_hex(&contents)
    }

    /// The signer's public address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// The compressed public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_secret_key(SECP256K1, &self.secret)
    }

    /// Borrow the underlying secret. Only the signing path should need this.
    pub(crate) fn secret(&self) -> &SecretKey {
        &self.secret
    }

    /// Exports the secret as lowercase hex without prefix.
    ///
    /// Used by key generation. Don't log the result.
    pub fn secret_hex(&self) -> String {
        hex::encode(self.secret.secret_bytes())
    }
}

impl fmt::Debug for PreconfirmKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreconfirmKey")
            .field("address", &self.address)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Derives the Ethereum-style address of a public key.
pub fn address_from_pubkey(public: &PublicKey) -> Address {
    let uncompressed = public.serialize_uncompressed();
    let hash = keccak256(&uncompressed[1..]);
    let mut out = [0u8; 20];
    out.copy_from_slice(&hash[12..]);
    Address::new(out)
}

/// Writes `secret_hex` to `path` as `<hex>\n`.
///
/// Parent directories are created as needed. An existing file is left alone
/// unless `overwrite` is set. The hex is validated before anything touches
/// the filesystem.
pub fn write_key_file(path: &Path, secret_hex: &str, overwrite: bool) -> Result<(), KeyError> {
    if path.as_os_str().is_empty() {
        return Err(KeyError::EmptyPath);
    }
    let normalized = strip_hex_prefix(secret_hex.trim()).to_string();
    // Reject garbage before creating anything on disk.
    PreconfirmKey::from_hex(&normalized)?;

    if !overwrite && path.exists() {
        return Err(KeyError::AlreadyExists(path.to_path_buf()));
    }

    let write_err = |source| KeyError::WriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(write_err)?;
    }

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path).map_err(write_err)?;
    file.write_all(format!("{}\n", normalized).as_bytes())
        .map_err(write_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known devnet key (hardhat account #0).
    const HARDHAT_0_SECRET: &str =
        "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const HARDHAT_0_ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

    #[test]
    fn derives_known_address() {
        let key = PreconfirmKey::from_hex(HARDHAT_0_SECRET).unwrap();
        assert_eq!(key.address().to_hex(), HARDHAT_0_ADDRESS);
    }

    #[test]
    fn hex_parsing_tolerates_prefix_and_whitespace() {
        let key = PreconfirmKey::from_hex(&format!("  0x{}\n", HARDHAT_0_SECRET)).unwrap();
        assert_eq!(key.address().to_hex(), HARDHAT_0_ADDRESS);
    }

    #[test]
    fn rejects_bad_hex() {
        assert!(matches!(
            PreconfirmKey::from_hex("not-hex"),
            Err(KeyError::InvalidHex)
        ));
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(matches!(
            PreconfirmKey::from_hex("0x1234"),
            Err(KeyError::InvalidLength { got: 2 })
        ));
    }

    #[test]
    fn rejects_zero_scalar() {
        assert!(matches!(
            PreconfirmKey::from_hex(&"00".repeat(32)),
            Err(KeyError::InvalidScalar)
        ));
    }

    #[test]
    fn debug_output_is_redacted() {
        let key = PreconfirmKey::from_hex(HARDHAT_0_SECRET).unwrap();
        let dbg = format!("{:?}", key);
        assert!(!dbg.contains(HARDHAT_0_SECRET));
        assert!(dbg.contains("redacted"));
    }

    #[test]
    fn generated_keys_are_distinct() {
        let a = PreconfirmKey::generate();
        let b = PreconfirmKey::generate();
        assert_ne!(a.address(), b.address());
    }

    #[test]
    fn key_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config").join("ynx_preconfirm.key");

        write_key_file(&path, &format!("0x{}", HARDHAT_0_SECRET), false).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, format!("{}\n", HARDHAT_0_SECRET));

        let key = PreconfirmKey::from_file(&path).unwrap();
        assert_eq!(key.address().to_hex(), HARDHAT_0_ADDRESS);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn key_file_refuses_overwrite_without_flag() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("k.key");
        write_key_file(&path, HARDHAT_0_SECRET, false).unwrap();

        let again = write_key_file(&path, HARDHAT_0_SECRET, false);
        assert!(matches!(again, Err(KeyError::AlreadyExists(_))));

        write_key_file(&path, HARDHAT_0_SECRET, true).unwrap();
    }

    #[test]
    fn key_file_rejects_invalid_hex_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.key");
        assert!(write_key_file(&path, "nothex", false).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn missing_key_file_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let result = PreconfirmKey::from_file(dir.path().join("missing.key"));
        assert!(matches!(result, Err(KeyError::Unreadable { .. })));
    }
}
