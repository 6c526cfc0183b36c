use ed25519_dalek::{
    Signature, Signer, SigningKey, Verifier, VerifyingKey, PUBLIC_KEY_LENGTH, SECRET_KEY_LENGTH,
};
use rand::rngs::OsRng;

use super::{CryptoProvider, KeyPair, KeyType};
use crate::encoding::{multicodec, Jwk};
use crate::error::CryptoError;

const CURVE: &str = "Ed25519";

/// Ed25519 signing keys, published as `Ed25519VerificationKey2020`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ed25519Provider;

fn verifying_key(public_key: &[u8]) -> Result<VerifyingKey, CryptoError> {
    let bytes: [u8; PUBLIC_KEY_LENGTH] =
        public_key
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength {
                expected: PUBLIC_KEY_LENGTH,
                actual: public_key.len(),
            })?;
    VerifyingKey::from_bytes(&bytes).map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))
}

fn signing_key(private_key: &[u8]) -> Result<SigningKey, CryptoError> {
    let bytes: [u8; SECRET_KEY_LENGTH] = private_key
        .try_into()
        .map_err(|_| CryptoError::InvalidPrivateKey(format!(
            "expected {} bytes, got {}",
            SECRET_KEY_LENGTH,
            private_key.len()
        )))?;
    Ok(SigningKey::from_bytes(&bytes))
}

impl CryptoProvider for Ed25519Provider {
    fn key_type(&self) -> KeyType {
        KeyType::ED25519
    }

    fn verification_method_type(&self) -> &'static str {
        "Ed25519VerificationKey2020"
    }

    fn multicodec(&self) -> u64 {
        multicodec::ED25519_PUB
    }

    fn validate_public_key(&self, public_key: &[u8]) -> Result<(), CryptoError> {
        verifying_key(public_key).map(|_| ())
    }

    fn generate_key_pair(&self) -> Result<KeyPair, CryptoError> {
        let sk = SigningKey::generate(&mut OsRng);
        Ok(KeyPair::new(
            self.key_type(),
            sk.verifying_key().to_bytes().to_vec(),
            sk.to_bytes().to_vec(),
        ))
    }

    fn sign(&self, private_key: &[u8], data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let sk = signing_key(private_key)?;
        let signature = sk
            .try_sign(data)
            .map_err(|e| CryptoError::Signing(e.to_string()))?;
        Ok(signature.to_bytes().to_vec())
    }

    fn verify(&self, public_key: &[u8], data: &[u8], signature: &[u8]) -> bool {
        let Ok(vk) = verifying_key(public_key) else {
            return false;
        };
        match Signature::from_slice(signature) {
            Ok(sig) => vk.verify(data, &sig).is_ok(),
            Err(_) => false,
        }
    }

    fn export_jwk(&self, public_key: &[u8]) -> Result<Jwk, CryptoError> {
        self.validate_public_key(public_key)?;
        Ok(Jwk::okp(CURVE, public_key).with_thumbprint_kid()?)
    }

    fn import_jwk(&self, jwk: &Jwk) -> Result<Vec<u8>, CryptoError> {
        if jwk.kty != "OKP" || jwk.crv != CURVE {
            return Err(CryptoError::JwkMismatch {
                expected: CURVE.to_string(),
                kty: jwk.kty.clone(),
                crv: jwk.crv.clone(),
            });
        }
        let public_key = jwk.x_bytes()?;
        self.validate_public_key(&public_key)?;
        Ok(public_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PUBLIC_KEY_HEX: &str = "3b6a27bcceb6a42d62a3a8d02a6f0d73653215771de243a63ac048a18b59da29";

    #[test]
    fn test_sign_verify() {
        let provider = Ed25519Provider;
        let pair = provider.generate_key_pair().unwrap();
        assert_eq!(pair.public_key.len(), PUBLIC_KEY_LENGTH);
        assert_eq!(pair.private_key().len(), SECRET_KEY_LENGTH);

        let payload = b"Lorem ipsum dolor sit amet, consectetur adipiscing elit.";
        let signature = provider.sign(pair.private_key(), payload).unwrap();

        assert!(provider.verify(&pair.public_key, payload, &signature));
        assert!(!provider.verify(&pair.public_key, b"tampered", &signature));
        assert!(!provider.verify(&pair.public_key, payload, &signature[..10]));
    }

    #[test]
    fn test_deterministic_signing_from_seed() {
        // "Sample seed bytes of thirtytwo!b"
        let seed = b"Sample seed bytes of thirtytwo!b";
        let provider = Ed25519Provider;
        let sk = SigningKey::from_bytes(seed);
        assert_eq!(
            hex::encode(sk.verifying_key().to_bytes()),
            "412328b0201b71d0144a27d028057b6fdf58d22e0f3baaebaa5388140e57bbbd"
        );

        let first = provider.sign(seed, b"payload").unwrap();
        let second = provider.sign(seed, b"payload").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_exports_are_stable() {
        let provider = Ed25519Provider;
        let public_key = hex::decode(PUBLIC_KEY_HEX).unwrap();

        assert_eq!(
            provider.export_multibase(&public_key).unwrap(),
            "z6MkiTBz1ymuepAQ4HEHYSF1H8quG5GLVVQR3djdX3mDooWp"
        );
        assert_eq!(
            provider.export_jwk(&public_key).unwrap().x,
            "O2onvM62pC1io6jQKm8Nc2UyFXcd4kOmOsBIoYtZ2ik"
        );
        assert_eq!(
            provider.export_base58(&public_key).unwrap(),
            provider.export_base58(&public_key).unwrap()
        );
    }

    #[test]
    fn test_imports_recover_raw_key() {
        let provider = Ed25519Provider;
        let public_key = hex::decode(PUBLIC_KEY_HEX).unwrap();

        let jwk = provider.export_jwk(&public_key).unwrap();
        assert_eq!(provider.import_jwk(&jwk).unwrap(), public_key);

        let b58 = provider.export_base58(&public_key).unwrap();
        assert_eq!(provider.import_base58(&b58).unwrap(), public_key);

        let mb = provider.export_multibase(&public_key).unwrap();
        assert_eq!(provider.import_multibase(&mb).unwrap(), public_key);
    }

    #[test]
    fn test_rejects_foreign_material() {
        let provider = Ed25519Provider;
        assert!(matches!(
            provider.validate_public_key(&[0u8; 31]),
            Err(CryptoError::InvalidKeyLength { expected: 32, actual: 31 })
        ));

        let jwk = Jwk::ec("secp256k1", &[1u8; 32], &[2u8; 32]);
        assert!(matches!(
            provider.import_jwk(&jwk),
            Err(CryptoError::JwkMismatch { .. })
        ));

        // secp256k1 multibase key
        assert!(matches!(
            provider.import_multibase("zQ3shokFTS3brHcDQrn82RUDfCZESWL1ZdCEJwekUDPQiYBme"),
            Err(CryptoError::MulticodecMismatch { found: 0xe7, .. })
        ));
    }
}
