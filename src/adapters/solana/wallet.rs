use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    transaction::VersionedTransaction,
};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::SigningCredential;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Failed to load keypair from file: {0}")]
    LoadError(String),
    #[error("Failed to sign transaction: {0}")]
    SigningError(String),
    #[error("Invalid keypair bytes: {0}")]
    InvalidKeypair(String),
    #[error("Invalid base58 secret key: {0}")]
    InvalidBase58(String),
}

/// Holds the engine's single signing keypair
pub struct WalletManager {
    keypair: Keypair,
}

impl WalletManager {
    /// Load from whichever credential the configuration supplied
    pub fn from_credential(credential: &SigningCredential) -> Result<Self, WalletError> {
        match credential {
            SigningCredential::Base58(secret) => Self::from_base58(secret),
            SigningCredential::KeypairFile(path) => Self::from_file(path),
        }
    }

    /// Load keypair from a base58 encoded 64-byte secret key
    pub fn from_base58(secret: &str) -> Result<Self, WalletError> {
        let bytes = bs58::decode(secret.trim())
            .into_vec()
            .map_err(|e| WalletError::InvalidBase58(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Load keypair from a file path (JSON array format)
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, WalletError> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|e| WalletError::LoadError(format!("Failed to read file: {}", e)))?;

        let bytes: Vec<u8> = serde_json::from_str(&contents)
            .map_err(|e| WalletError::LoadError(format!("Invalid JSON format: {}", e)))?;

        Self::from_bytes(&bytes)
    }

    /// Load keypair from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WalletError> {
        let keypair = Keypair::try_from(bytes)
            .map_err(|e| WalletError::InvalidKeypair(e.to_string()))?;

        Ok(Self { keypair })
    }

    /// Create a new random keypair (for testing)
    pub fn new_random() -> Self {
        Self {
            keypair: Keypair::new(),
        }
    }

    /// Get the public key as a string
    pub fn public_key(&self) -> String {
        self.keypair.pubkey().to_string()
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    /// Re-sign an aggregator-built transaction with the engine keypair
    pub fn sign_versioned(
        &self,
        transaction: VersionedTransaction,
    ) -> Result<VersionedTransaction, WalletError> {
        VersionedTransaction::try_new(transaction.message, &[&self.keypair])
            .map_err(|e| WalletError::SigningError(e.to_string()))
    }

    #[cfg(test)]
    fn to_bytes(&self) -> Vec<u8> {
        self.keypair.to_bytes().to_vec()
    }
}

impl Clone for WalletManager {
    fn clone(&self) -> Self {
        Self {
            keypair: self.keypair.insecure_clone(),
        }
    }
}

impl std::fmt::Debug for WalletManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletManager")
            .field("pubkey", &self.public_key())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::hash::Hash;
    use solana_sdk::message::{v0, VersionedMessage};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_new_random_wallet() {
        let wallet = WalletManager::new_random();
        let pubkey = wallet.public_key();
        assert!(pubkey.len() >= 32 && pubkey.len() <= 44);
    }

    #[test]
    fn test_from_base58_round_trip() {
        let wallet1 = WalletManager::new_random();
        let encoded = bs58::encode(wallet1.to_bytes()).into_string();

        let wallet2 = WalletManager::from_base58(&encoded).unwrap();
        assert_eq!(wallet1.public_key(), wallet2.public_key());

        let from_credential =
            WalletManager::from_credential(&SigningCredential::Base58(encoded)).unwrap();
        assert_eq!(wallet1.pubkey(), from_credential.pubkey());
    }

    #[test]
    fn test_invalid_base58_rejected() {
        let err = WalletManager::from_base58("0OIl-not-base58").unwrap_err();
        assert!(matches!(err, WalletError::InvalidBase58(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        let wallet1 = WalletManager::new_random();

        let json = serde_json::to_string(&wallet1.to_bytes()).unwrap();
        temp_file.write_all(json.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let credential = SigningCredential::KeypairFile(temp_file.path().to_path_buf());
        let wallet2 = WalletManager::from_credential(&credential).unwrap();
        assert_eq!(wallet1.public_key(), wallet2.public_key());
    }

    #[test]
    fn test_invalid_bytes() {
        assert!(WalletManager::from_bytes(&[0u8; 10]).is_err());
    }

    #[test]
    fn test_debug_hides_secret() {
        let wallet = WalletManager::new_random();
        let debug = format!("{:?}", wallet);
        assert!(debug.contains(&wallet.public_key()));
        assert!(!debug.contains(&bs58::encode(wallet.to_bytes()).into_string()));
    }

    #[test]
    fn test_sign_versioned() {
        let wallet = WalletManager::new_random();
        let message = v0::Message::try_compile(&wallet.pubkey(), &[], &[], Hash::default()).unwrap();
        let unsigned = VersionedTransaction {
            signatures: vec![Default::default()],
            message: VersionedMessage::V0(message),
        };

        let signed = wallet.sign_versioned(unsigned).unwrap();
        assert_eq!(signed.signatures.len(), 1);
        assert!(signed.verify_with_results().iter().all(|ok| *ok));
    }
}
