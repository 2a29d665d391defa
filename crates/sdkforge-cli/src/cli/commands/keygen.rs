//! `sdkforge keygen`: ed25519 keypair for `build-sdk-apks --signing-key`.

use anyhow::{Context, Result};
use ed25519_dalek::SigningKey;
use std::fs;
use std::path::{Path, PathBuf};

use sdkforge_core::io::signing::compute_key_id_from_verifying_key;

use super::super::args::KeygenArgs;
use crate::exit_codes;

pub const PRIVATE_KEY_FILE: &str = "private_key.pem";
pub const PUBLIC_KEY_FILE: &str = "public_key.pem";

pub fn run(args: KeygenArgs) -> Result<i32> {
    let keys = generate_keypair(&args.out, args.force)?;
    println!("private key: {} (PKCS#8 PEM, mode 0600)", keys.private_path.display());
    println!("public key:  {} (SPKI PEM)", keys.public_path.display());
    println!("key_id: {}", keys.key_id);
    Ok(exit_codes::EXIT_SUCCESS)
}

pub struct GeneratedKeys {
    pub private_path: PathBuf,
    pub public_path: PathBuf,
    pub key_id: String,
}

pub fn generate_keypair(out: &Path, force: bool) -> Result<GeneratedKeys> {
    use pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};

    fs::create_dir_all(out)
        .with_context(|| format!("failed to create directory: {}", out.display()))?;

    let private_path = out.join(PRIVATE_KEY_FILE);
    let public_path = out.join(PUBLIC_KEY_FILE);
    if !force {
        if let Some(existing) = [&private_path, &public_path].into_iter().find(|p| p.exists()) {
            anyhow::bail!(
                "{} already exists (use --force to overwrite)",
                existing.display()
            );
        }
    }

    let signing_key = SigningKey::generate(&mut rand::thread_rng());
    let verifying_key = signing_key.verifying_key();
    let private_pem = signing_key
        .to_pkcs8_pem(LineEnding::LF)
        .context("failed to encode private key as PKCS#8 PEM")?;
    let public_pem = verifying_key
        .to_public_key_pem(LineEnding::LF)
        .context("failed to encode public key as SPKI PEM")?;

    fs::write(&private_path, private_pem.as_bytes())
        .with_context(|| format!("failed to write {}", private_path.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&private_path, fs::Permissions::from_mode(0o600))
            .with_context(|| format!("failed to set permissions on {}", private_path.display()))?;
    }
    fs::write(&public_path, public_pem)
        .with_context(|| format!("failed to write {}", public_path.display()))?;

    Ok(GeneratedKeys {
        private_path,
        public_path,
        key_id: compute_key_id_from_verifying_key(&verifying_key)?,
    })
}
