use k256::ecdsa::signature::{Signer, Verifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use k256::{EncodedPoint, FieldBytes};
use rand::rngs::OsRng;

use super::{CryptoProvider, KeyPair, KeyType};
use crate::encoding::{multicodec, Jwk};
use crate::error::CryptoError;

const CURVE: &str = "secp256k1";
const COMPRESSED_KEY_LENGTH: usize = 33;
const COORDINATE_LENGTH: usize = 32;

/// secp256k1 ECDSA keys, published as `EcdsaSecp256k1VerificationKey2019`.
///
/// Raw public keys are SEC1-compressed (33 bytes). Signatures are the 64-byte
/// `r || s` form over SHA-256 of the message.
#[derive(Debug, Default, Clone, Copy)]
pub struct Secp256k1Provider;

fn verifying_key(public_key: &[u8]) -> Result<VerifyingKey, CryptoError> {
    if public_key.len() != COMPRESSED_KEY_LENGTH {
        return Err(CryptoError::InvalidKeyLength {
            expected: COMPRESSED_KEY_LENGTH,
            actual: public_key.len(),
        });
    }
    VerifyingKey::from_sec1_bytes(public_key)
        .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))
}

fn compressed(vk: &VerifyingKey) -> Vec<u8> {
    vk.to_encoded_point(true).as_bytes().to_vec()
}

impl CryptoProvider for Secp256k1Provider {
    fn key_type(&self) -> KeyType {
        KeyType::SECP256K1
    }

    fn verification_method_type(&self) -> &'static str {
        "EcdsaSecp256k1VerificationKey2019"
    }

    fn multicodec(&self) -> u64 {
        multicodec::SECP256K1_PUB
    }

    fn validate_public_key(&self, public_key: &[u8]) -> Result<(), CryptoError> {
        verifying_key(public_key).map(|_| ())
    }

    fn generate_key_pair(&self) -> Result<KeyPair, CryptoError> {
        let sk = SigningKey::random(&mut OsRng);
        Ok(KeyPair::new(
            self.key_type(),
            compressed(sk.verifying_key()),
            sk.to_bytes().to_vec(),
        ))
    }

    fn sign(&self, private_key: &[u8], data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let sk = SigningKey::from_slice(private_key)
            .map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))?;
        let signature: Signature = sk
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
        let vk = verifying_key(public_key)?;
        let point = vk.to_encoded_point(false);
        let (Some(x), Some(y)) = (point.x(), point.y()) else {
            return Err(CryptoError::InvalidPublicKey(
                "point at infinity".to_string(),
            ));
        };
        Ok(Jwk::ec(CURVE, x, y).with_thumbprint_kid()?)
    }

    fn import_jwk(&self, jwk: &Jwk) -> Result<Vec<u8>, CryptoError> {
        if jwk.kty != "EC" || jwk.crv != CURVE {
            return Err(CryptoError::JwkMismatch {
                expected: CURVE.to_string(),
                kty: jwk.kty.clone(),
                crv: jwk.crv.clone(),
            });
        }
        let x = jwk.x_bytes()?;
        let y = jwk
            .y_bytes()?
            .ok_or_else(|| CryptoError::InvalidPublicKey("missing y coordinate".to_string()))?;
        if x.len() != COORDINATE_LENGTH || y.len() != COORDINATE_LENGTH {
            return Err(CryptoError::InvalidPublicKey(format!(
                "coordinates must be {} bytes",
                COORDINATE_LENGTH
            )));
        }

        let point = EncodedPoint::from_affine_coordinates(
            FieldBytes::from_slice(&x),
            FieldBytes::from_slice(&y),
            false,
        );
        let vk = VerifyingKey::from_encoded_point(&point)
            .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
        Ok(compressed(&vk))
    }
}
