use rand::Rng;

const TOKEN_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of generated share tokens (36^6, about 2.2 billion values)
pub const SHARE_TOKEN_LENGTH: usize = 6;

/// Trait for generating public share tokens
pub trait ShareTokenGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Random lowercase base-36 tokens
pub struct RandomShareTokenGenerator;

impl RandomShareTokenGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RandomShareTokenGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ShareTokenGenerator for RandomShareTokenGenerator {
    fn generate(&self) -> String {
        let mut rng = rand::rng();
        (0..SHARE_TOKEN_LENGTH)
            .map(|_| TOKEN_ALPHABET[rng.random_range(0..TOKEN_ALPHABET.len())] as char)
            .collect()
    }
}
