use fe_core::Result;
use fe_core::data::Vector;
use num_bigint::BigInt;
use rand::{CryptoRng, RngCore};

/// Common surface of the schemes computing `⟨x, y⟩` from an encryption of
/// `x` and a key derived for `y`.
///
/// The scheme value itself holds only public parameters; keys and
/// ciphertexts are passed explicitly so one instance serves many users.
pub trait InnerProductScheme {
    type SecretKey;
    type PublicKey;
    type DerivedKey;
    type Ciphertext;

    /// Returns a fresh master secret key and its public key.
    fn generate_keys<R: RngCore + CryptoRng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<(Self::SecretKey, Self::PublicKey)>;

    /// Functional key for `y`, revealing `⟨x, y⟩` and nothing else.
    fn derive_key(&self, y: &Vector, sk: &Self::SecretKey) -> Result<Self::DerivedKey>;

    fn encrypt<R: RngCore + CryptoRng + ?Sized>(
        &self,
        rng: &mut R,
        x: &Vector,
        pk: &Self::PublicKey,
    ) -> Result<Self::Ciphertext>;

    /// Recovers `⟨x, y⟩`; `y` must be the vector `key` was derived for.
    fn decrypt(&self, ct: &Self::Ciphertext, key: &Self::DerivedKey, y: &Vector) -> Result<BigInt>;
}
