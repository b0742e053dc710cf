// ABOUTME: SSH public key fingerprint computation.
// ABOUTME: Parses OpenSSH public key text and formats its SHA256 fingerprint like ssh-keygen -l.

use crate::error::{OpsshError, Result};
use ssh_key::{HashAlg, PublicKey};

/// Compute the SHA256 fingerprint of an OpenSSH public key line.
///
/// Returns the `SHA256:<base64>` form printed by `ssh-keygen -l`. Any key
/// algorithm the `ssh-key` crate can parse is accepted; the comment is ignored.
///
/// # Errors
/// Returns `OpsshError::ParsePublicKey` if the text is not an OpenSSH public key.
pub fn compute_fingerprint(public_key: &str) -> Result<String> {
    let key = PublicKey::from_openssh(public_key.trim()).map_err(OpsshError::ParsePublicKey)?;
    Ok(key.fingerprint(HashAlg::Sha256).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssh_key::{Algorithm, LineEnding, PrivateKey};

    /// Generate a fresh ed25519 key for testing.
    fn generate_test_key() -> PrivateKey {
        PrivateKey::random(&mut rand::thread_rng(), Algorithm::Ed25519)
            .expect("should generate ed25519 key")
    }

    #[test]
    fn test_fingerprint_matches_ssh_key() {
        let key = generate_test_key();
        let openssh = key.public_key().to_openssh().expect("should encode key");

        let fp = compute_fingerprint(&openssh).expect("should compute fingerprint");
        assert_eq!(
            fp,
            key.public_key().fingerprint(HashAlg::Sha256).to_string()
        );
        assert!(fp.starts_with("SHA256:"));
    }

    #[test]
    fn test_fingerprint_consistency() {
        let key = generate_test_key();
        let openssh = key.public_key().to_openssh().unwrap();

        let fp1 = compute_fingerprint(&openssh).unwrap();
        let fp2 = compute_fingerprint(&format!("{openssh}\n")).unwrap();
        assert_eq!(fp1, fp2, "fingerprint should ignore surrounding whitespace");
    }

    #[test]
    fn test_fingerprint_ignores_comment() {
        let mut key = generate_test_key();
        let bare = key.public_key().to_openssh().unwrap();
        key.set_comment("someone@example.com");
        let commented = key.public_key().to_openssh().unwrap();

        assert_ne!(bare, commented);
        assert_eq!(
            compute_fingerprint(&bare).unwrap(),
            compute_fingerprint(&commented).unwrap()
        );
    }

    #[test]
    fn test_different_keys_have_different_fingerprints() {
        let a = generate_test_key().public_key().to_openssh().unwrap();
        let b = generate_test_key().public_key().to_openssh().unwrap();
        assert_ne!(compute_fingerprint(&a).unwrap(), compute_fingerprint(&b).unwrap());
    }

    #[test]
    fn test_private_key_text_is_rejected() {
        let key = generate_test_key();
        let private = key.to_openssh(LineEnding::LF).unwrap();
        assert!(matches!(
            compute_fingerprint(&private),
            Err(OpsshError::ParsePublicKey(_))
        ));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(compute_fingerprint("not a key").is_err());
    }
}
