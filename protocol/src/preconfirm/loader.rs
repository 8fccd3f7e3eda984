//! # Key Material Loader
//!
//! Operators hand the node signer keys in one of two ways, never both:
//!
//! - **inline secrets**: `YNX_PRECONFIRM_PRIVKEY_HEXES=0xaa..,0xbb..`
//! - **key files**: `YNX_PRECONFIRM_KEY_PATHS=/keys/a.key,/keys/b.key`
//!
//! The single-key variables `YNX_PRECONFIRM_PRIVKEY_HEX` and
//! `YNX_PRECONFIRM_KEY_PATH` from older deployments still work when neither
//! list is set.
//!
//! [`KeySource::resolve`] decides which variant applies, and
//! [`load_signer_set`] turns it into a validated [`SignerSet`]. Every entry
//! must load; a bad entry fails the whole set with its index attached.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::config::{ENV_KEY_PATH, ENV_KEY_PATHS, ENV_PRIVKEY_HEX, ENV_PRIVKEY_HEXES, ENV_THRESHOLD};
use crate::crypto::{KeyError, PreconfirmKey};

use super::error::ConfigError;
use super::signer_set::SignerSet;

/// Where signer secrets come from.
#[derive(Clone, PartialEq, Eq)]
pub enum KeySource {
    /// Hex-encoded 32-byte secrets.
    InlineSecrets(Vec<String>),
    /// Paths to files each holding one hex secret.
    FileRefs(Vec<PathBuf>),
}

impl std::fmt::Debug for KeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // Count only. The entries are secrets.
            Self::InlineSecrets(v) => write!(f, "InlineSecrets({} entries)", v.len()),
            Self::FileRefs(paths) => f.debug_tuple("FileRefs").field(paths).finish(),
        }
    }
}

impl KeySource {
    /// Picks the source from raw comma-separated settings.
    ///
    /// Exactly one of `inline` / `paths` must carry at least one entry.
    pub fn resolve(inline: Option<&str>, paths: Option<&str>) -> Result<Self, ConfigError> {
        let inline = inline.map(split_comma_list).filter(|v| !v.is_empty());
        let paths = paths.map(split_comma_list).filter(|v| !v.is_empty());

        match (inline, paths) {
            (Some(_), Some(_)) => Err(ConfigError::ConflictingKeySources),
            (Some(secrets), None) => Ok(Self::InlineSecrets(secrets)),
            (None, Some(paths)) => Ok(Self::FileRefs(
                paths.into_iter().map(PathBuf::from).collect(),
            )),
            (None, None) => Err(ConfigError::MissingKeyMaterial),
        }
    }

    /// Like [`resolve`](Self::resolve), falling back to the legacy
    /// single-key settings when neither list is present.
    pub fn resolve_with_legacy(
        inline: Option<&str>,
        paths: Option<&str>,
        legacy_inline: Option<&str>,
        legacy_path: Option<&str>,
    ) -> Result<Self, ConfigError> {
        match Self::resolve(inline, paths) {
            Err(ConfigError::MissingKeyMaterial) => {
                debug!("no signer lists configured, trying legacy single-key settings");
                Self::resolve(legacy_inline, legacy_path)
            }
            other => other,
        }
    }

    /// Reads the standard environment variables through `lookup`.
    ///
    /// Taking a lookup function keeps tests away from process-global state;
    /// production passes `|k| std::env::var(k).ok()`.
    pub fn from_env<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::resolve_with_legacy(
            lookup(ENV_PRIVKEY_HEXES).as_deref(),
            lookup(ENV_KEY_PATHS).as_deref(),
            lookup(ENV_PRIVKEY_HEX).as_deref(),
            lookup(ENV_KEY_PATH).as_deref(),
        )
    }

    pub fn len(&self) -> usize {
        match self {
            Self::InlineSecrets(v) => v.len(),
            Self::FileRefs(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InlineSecrets(_) => "inline",
            Self::FileRefs(_) => "files",
        }
    }

    /// Loads every key, failing on the first bad entry.
    pub fn load_keys(&self) -> Result<Vec<PreconfirmKey>, ConfigError> {
        let wrap = |index: usize| move |source: KeyError| ConfigError::Key { index, source };
        match self {
            Self::InlineSecrets(secrets) => secrets
                .iter()
                .enumerate()
                .map(|(i, s)| PreconfirmKey::from_hex(s).map_err(wrap(i)))
                .collect(),
            Self::FileRefs(paths) => paths
                .iter()
                .enumerate()
                .map(|(i, p)| PreconfirmKey::from_file(p).map_err(wrap(i)))
                .collect(),
        }
    }
}

/// Splits a comma-separated list, trimming entries and dropping blanks.
pub fn split_comma_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parses an optional threshold override.
///
/// Blank means "use the default". Anything that is not a positive integer is
/// an error; the upper bound is checked later against the signer count.
pub fn parse_threshold(raw: Option<&str>) -> Result<Option<u32>, ConfigError> {
    let Some(v) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    match v.parse::<u32>() {
        Ok(t) if t > 0 => Ok(Some(t)),
        _ => Err(ConfigError::InvalidThreshold(v.to_string())),
    }
}

/// Loads `source` and validates it against `threshold`.
pub fn load_signer_set(source: &KeySource, threshold: Option<u32>) -> Result<SignerSet, ConfigError> {
    let keys = source.load_keys()?;
    let set = SignerSet::from_keys(keys, threshold)?;
    info!(
        source = source.kind(),
        signers = set.len(),
        threshold = set.threshold(),
        "preconfirm signers loaded"
    );
    Ok(set)
}

/// Resolves the key source and threshold from environment-style settings and
/// loads the set in one go.
pub fn load_signer_set_from_env<F>(lookup: F) -> Result<SignerSet, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let source = KeySource::from_env(&lookup)?;
    let threshold = parse_threshold(lookup(ENV_THRESHOLD).as_deref())?;
    load_signer_set(&source, threshold)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::crypto::write_key_file;

    fn secrets(n: usize) -> Vec<String> {
        (0..n).map(|_| PreconfirmKey::generate().secret_hex()).collect()
    }

    fn env(pairs: &[(&str, String)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn split_drops_blanks() {
        assert_eq!(split_comma_list(" a, ,b ,,c "), vec!["a", "b", "c"]);
        assert!(split_comma_list(" , ").is_empty());
    }

    #[test]
    fn resolve_requires_exactly_one_source() {
        assert!(matches!(
            KeySource::resolve(None, None),
            Err(ConfigError::MissingKeyMaterial)
        ));
        assert!(matches!(
            KeySource::resolve(Some("aa"), Some("/k")),
            Err(ConfigError::ConflictingKeySources)
        ));
        assert!(matches!(
            KeySource::resolve(Some(" , "), None),
            Err(ConfigError::MissingKeyMaterial)
        ));
        assert_eq!(
            KeySource::resolve(None, Some("/a.key, /b.key")).unwrap(),
            KeySource::FileRefs(vec!["/a.key".into(), "/b.key".into()])
        );
    }

    #[test]
    fn legacy_settings_apply_only_when_lists_absent() {
        let s = secrets(2);
        let src = KeySource::resolve_with_legacy(None, None, Some(&s[0]), None).unwrap();
        assert_eq!(src, KeySource::InlineSecrets(vec![s[0].clone()]));

        let src = KeySource::resolve_with_legacy(Some(&s[1]), None, Some(&s[0]), None).unwrap();
        assert_eq!(src, KeySource::InlineSecrets(vec![s[1].clone()]));
    }

    #[test]
    fn inline_secrets_load_in_order() {
        let s = secrets(3);
        let expected: Vec<_> = s
            .iter()
            .map(|h| PreconfirmKey::from_hex(h).unwrap().address())
            .collect();

        let set = load_signer_set(&KeySource::InlineSecrets(s), None).unwrap();
        assert_eq!(set.addresses(), expected);
        assert_eq!(set.threshold(), 3);
    }

    #[test]
    fn bad_entry_fails_with_index() {
        let mut s = secrets(3);
        s[1] = "0x1234".into();
        let err = load_signer_set(&KeySource::InlineSecrets(s), None).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Key {
                index: 1,
                source: KeyError::InvalidLength { got: 2 }
            }
        ));
    }

    #[test]
    fn file_refs_load_and_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let s = secrets(2);
        let a = dir.path().join("a.key");
        let b = dir.path().join("b.key");
        write_key_file(&a, &s[0], false).unwrap();
        write_key_file(&b, &s[1], false).unwrap();

        let set = load_signer_set(&KeySource::FileRefs(vec![a.clone(), b]), Some(1)).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.threshold(), 1);

        let missing = dir.path().join("nope.key");
        let err = load_signer_set(&KeySource::FileRefs(vec![a, missing]), None).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Key {
                index: 1,
                source: KeyError::Unreadable { .. }
            }
        ));
    }

    #[test]
    fn threshold_parsing() {
        assert_eq!(parse_threshold(None).unwrap(), None);
        assert_eq!(parse_threshold(Some(" ")).unwrap(), None);
        assert_eq!(parse_threshold(Some("2")).unwrap(), Some(2));
        assert!(matches!(
            parse_threshold(Some("0")),
            Err(ConfigError::InvalidThreshold(_))
        ));
        assert!(matches!(
            parse_threshold(Some("-1")),
            Err(ConfigError::InvalidThreshold(_))
        ));
        assert!(matches!(
            parse_threshold(Some("two")),
            Err(ConfigError::InvalidThreshold(_))
        ));
    }

    #[test]
    fn env_loader_applies_threshold() {
        let s = secrets(3);
        let lookup = env(&[
            (ENV_PRIVKEY_HEXES, s.join(",")),
            (ENV_THRESHOLD, "2".to_string()),
        ]);
        let set = load_signer_set_from_env(lookup).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.threshold(), 2);
    }

    #[test]
    fn env_loader_rejects_threshold_above_count() {
        let s = secrets(2);
        let lookup = env(&[
            (ENV_PRIVKEY_HEXES, s.join(",")),
            (ENV_THRESHOLD, "3".to_string()),
        ]);
        assert!(matches!(
            load_signer_set_from_env(lookup),
            Err(ConfigError::ThresholdExceedsSigners {
                threshold: 3,
                signers: 2
            })
        ));
    }

    #[test]
    fn debug_never_prints_inline_secrets() {
        let s = secrets(1);
        let dbg = format!("{:?}", KeySource::InlineSecrets(s.clone()));
        assert!(!dbg.contains(&s[0]));
    }
}
