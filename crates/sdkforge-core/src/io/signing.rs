//! Artifact signing and verification.
//!
//! An artifact is signed over a DSSE-style pre-authentication encoding of its
//! content listing: every entry path with the SHA-256 of its bytes, in path
//! order. The signature is stored inside the artifact at [`SIGNATURE_FILE`].

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::Path;

use super::archive::{self, ArchiveEntries};

/// Payload type bound into every artifact signature.
pub const PAYLOAD_TYPE_ARTIFACT_V1: &str = "application/vnd.sdkforge.artifact+json;v=1";

/// Location of the signature inside a signed artifact.
pub const SIGNATURE_FILE: &str = "META-INF/SIGNATURE.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureAlgorithm {
    Ed25519,
}

/// Contents of [`SIGNATURE_FILE`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSignature {
    pub version: u8,
    pub algorithm: SignatureAlgorithm,
    pub payload_type: String,
    pub payload_digest: String,
    pub key_id: String,
    /// Base64 SPKI DER.
    pub public_key: String,
    pub signature: String,
}

/// Key used to sign the artifacts of a build.
#[derive(Clone)]
pub struct SigningConfig {
    signing_key: SigningKey,
}

impl std::fmt::Debug for SigningConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningConfig")
            .field("key_id", &self.key_id().unwrap_or_default())
            .finish_non_exhaustive()
    }
}

impl SigningConfig {
    pub fn new(signing_key: SigningKey) -> Self {
        Self { signing_key }
    }

    /// Load a PKCS#8 PEM private key.
    pub fn from_pem_file(path: &Path) -> Result<Self> {
        let pem = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read signing key: {}", path.display()))?;
        Self::from_pem(&pem)
            .with_context(|| format!("invalid signing key: {}", path.display()))
    }

    pub fn from_pem(pem: &str) -> Result<Self> {
        use pkcs8::DecodePrivateKey;
        let signing_key = SigningKey::from_pkcs8_pem(pem)
            .map_err(|e| anyhow::anyhow!("expected an Ed25519 PKCS#8 PEM key: {e}"))?;
        Ok(Self::new(signing_key))
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    pub fn key_id(&self) -> Result<String> {
        compute_key_id_from_verifying_key(&self.verifying_key())
    }
}

/// Verification failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    #[error("artifact is not signed")]
    NoSignature,

    #[error("malformed signature: {reason}")]
    MalformedSignature { reason: String },

    #[error("payload type mismatch: expected {expected}, got {got}")]
    PayloadTypeMismatch { expected: String, got: String },

    #[error("payload digest mismatch")]
    DigestMismatch,

    #[error("key_id mismatch: signature claims {claimed}, actual {actual}")]
    KeyIdMismatch { claimed: String, actual: String },

    #[error("signature invalid: {reason}")]
    SignatureInvalid { reason: String },
}

/// Context marking a failure while signing, as opposed to writing.
#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("failed to sign artifact")]
pub struct SigningFailed;

/// Successful verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedArtifact {
    pub key_id: String,
    pub entry_count: usize,
}

/// Compute key_id from SPKI-encoded public key bytes.
///
/// Returns `sha256:<lowercase-hex>`.
pub fn compute_key_id(spki_bytes: &[u8]) -> String {
    format!("sha256:{}", hex::encode(Sha256::digest(spki_bytes)))
}

pub fn compute_key_id_from_verifying_key(key: &VerifyingKey) -> Result<String> {
    Ok(compute_key_id(&key_to_spki_der(key)?))
}

fn key_to_spki_der(key: &VerifyingKey) -> Result<Vec<u8>> {
    use pkcs8::EncodePublicKey;
    let doc = key
        .to_public_key_der()
        .context("failed to encode public key as SPKI DER")?;
    Ok(doc.as_bytes().to_vec())
}

/// ```text
/// PAE(type, payload) = "DSSEv1" SP LEN(type) SP type SP LEN(payload) SP payload
/// ```
fn build_pae(payload_type: &str, payload: &[u8]) -> Vec<u8> {
    let mut pae = Vec::new();
    pae.extend_from_slice(b"DSSEv1 ");
    pae.extend_from_slice(payload_type.len().to_string().as_bytes());
    pae.push(b' ');
    pae.extend_from_slice(payload_type.as_bytes());
    pae.push(b' ');
    pae.extend_from_slice(payload.len().to_string().as_bytes());
    pae.push(b' ');
    pae.extend_from_slice(payload);
    pae
}

/// JSON listing of `{path: sha256-hex}` over every entry except the
/// signature itself.
fn content_payload(entries: &ArchiveEntries) -> Result<Vec<u8>> {
    let listing: BTreeMap<&str, String> = entries
        .iter()
        .filter(|(path, _)| path.as_str() != SIGNATURE_FILE)
        .map(|(path, content)| (path.as_str(), hex::encode(Sha256::digest(content))))
        .collect();
    Ok(serde_json::to_vec(&listing)?)
}

fn payload_digest(payload: &[u8]) -> String {
    format!("sha256:{}", hex::encode(Sha256::digest(payload)))
}

/// Sign the given artifact entries.
pub fn sign_entries(entries: &ArchiveEntries, config: &SigningConfig) -> Result<ArtifactSignature> {
    let payload = content_payload(entries)?;
    let pae = build_pae(PAYLOAD_TYPE_ARTIFACT_V1, &payload);
    let signature: Signature = config.signing_key.sign(&pae);

    let verifying_key = config.verifying_key();
    Ok(ArtifactSignature {
        version: 1,
        algorithm: SignatureAlgorithm::Ed25519,
        payload_type: PAYLOAD_TYPE_ARTIFACT_V1.to_string(),
        payload_digest: payload_digest(&payload),
        key_id: compute_key_id_from_verifying_key(&verifying_key)?,
        public_key: BASE64.encode(key_to_spki_der(&verifying_key)?),
        signature: BASE64.encode(signature.to_bytes()),
    })
}

/// Verify a serialized artifact.
///
/// Without `trusted_key` the public key embedded in the signature is used,
/// which proves integrity but not origin.
pub fn verify_artifact(
    artifact: &[u8],
    trusted_key: Option<&VerifyingKey>,
) -> Result<VerifiedArtifact, VerifyError> {
    let malformed = |reason: String| VerifyError::MalformedSignature { reason };

    let entries = archive::read_entries(Cursor::new(artifact))
        .map_err(|e| malformed(format!("{e:#}")))?;
    let sig_bytes = entries.get(SIGNATURE_FILE).ok_or(VerifyError::NoSignature)?;
    let sig: ArtifactSignature =
        serde_json::from_slice(sig_bytes).map_err(|e| malformed(e.to_string()))?;

    if sig.version != 1 {
        return Err(malformed(format!("unsupported version: {}", sig.version)));
    }
    if sig.payload_type != PAYLOAD_TYPE_ARTIFACT_V1 {
        return Err(VerifyError::PayloadTypeMismatch {
            expected: PAYLOAD_TYPE_ARTIFACT_V1.to_string(),
            got: sig.payload_type,
        });
    }

    let payload = content_payload(&entries).map_err(|e| malformed(e.to_string()))?;
    if sig.payload_digest != payload_digest(&payload) {
        return Err(VerifyError::DigestMismatch);
    }

    let key = match trusted_key {
        Some(key) => *key,
        None => {
            use pkcs8::DecodePublicKey;
            let spki = BASE64
                .decode(&sig.public_key)
                .map_err(|e| malformed(format!("invalid base64 public key: {e}")))?;
            VerifyingKey::from_public_key_der(&spki)
                .map_err(|e| malformed(format!("invalid public key: {e}")))?
        }
    };

    let signature_bytes = BASE64
        .decode(&sig.signature)
        .map_err(|e| malformed(format!("invalid base64 signature: {e}")))?;
    let signature = Signature::from_slice(&signature_bytes)
        .map_err(|e| malformed(format!("invalid signature bytes: {e}")))?;
    key.verify(&build_pae(&sig.payload_type, &payload), &signature)
        .map_err(|_| VerifyError::SignatureInvalid {
            reason: "ed25519 verification failed".to_string(),
        })?;

    let actual = compute_key_id_from_verifying_key(&key).map_err(|e| malformed(e.to_string()))?;
    if sig.key_id != actual {
        return Err(VerifyError::KeyIdMismatch {
            claimed: sig.key_id,
            actual,
        });
    }

    Ok(VerifiedArtifact {
        key_id: sig.key_id,
        entry_count: entries.len() - 1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(seed: u8) -> SigningConfig {
        SigningConfig::new(SigningKey::from_bytes(&[seed; 32]))
    }

    fn signed_artifact(entries: &ArchiveEntries, config: &SigningConfig) -> Vec<u8> {
        let sig = serde_json::to_vec(&sign_entries(entries, config).unwrap()).unwrap();
        let mut all: Vec<(&str, &[u8])> = entries
            .iter()
            .map(|(p, c)| (p.as_str(), c.as_slice()))
            .collect();
        all.push((SIGNATURE_FILE, sig.as_slice()));
        archive::pack(all).unwrap()
    }

    fn entries() -> ArchiveEntries {
        let mut entries = ArchiveEntries::new();
        entries.insert("AndroidManifest.json".into(), b"{}".to_vec());
        entries.insert("dex/classes.dex".into(), b"dex".to_vec());
        entries
    }

    #[test]
    fn sign_and_verify_roundtrip() {
        let config = config(7);
        let artifact = signed_artifact(&entries(), &config);

        let verified = verify_artifact(&artifact, Some(&config.verifying_key())).unwrap();
        assert_eq!(verified.key_id, config.key_id().unwrap());
        assert_eq!(verified.entry_count, 2);
        assert!(verified.key_id.starts_with("sha256:"));

        verify_artifact(&artifact, None).unwrap();
    }

    #[test]
    fn tampered_content_fails() {
        let config = config(7);
        let sig = serde_json::to_vec(&sign_entries(&entries(), &config).unwrap()).unwrap();
        let artifact = archive::pack([
            ("AndroidManifest.json", &b"{\"x\":1}"[..]),
            ("dex/classes.dex", &b"dex"[..]),
            (SIGNATURE_FILE, &sig[..]),
        ])
        .unwrap();
        assert_eq!(
            verify_artifact(&artifact, None).unwrap_err(),
            VerifyError::DigestMismatch
        );
    }

    #[test]
    fn wrong_key_fails() {
        let artifact = signed_artifact(&entries(), &config(7));
        let err = verify_artifact(&artifact, Some(&config(8).verifying_key())).unwrap_err();
        assert!(matches!(err, VerifyError::SignatureInvalid { .. }));
    }

    #[test]
    fn unsigned_artifact_fails() {
        let artifact = archive::pack([("AndroidManifest.json", &b"{}"[..])]).unwrap();
        assert_eq!(
            verify_artifact(&artifact, None).unwrap_err(),
            VerifyError::NoSignature
        );
    }

    #[test]
    fn signatures_are_deterministic() {
        let config = config(3);
        assert_eq!(
            sign_entries(&entries(), &config).unwrap(),
            sign_entries(&entries(), &config).unwrap()
        );
    }

    #[test]
    fn pem_roundtrip() {
        use pkcs8::{EncodePrivateKey, LineEnding};
        let key = SigningKey::from_bytes(&[5; 32]);
        let pem = key.to_pkcs8_pem(LineEnding::LF).unwrap();
        let config = SigningConfig::from_pem(&pem).unwrap();
        assert_eq!(config.verifying_key(), key.verifying_key());
        assert!(SigningConfig::from_pem("not a key").is_err());
    }
}
