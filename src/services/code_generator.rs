use rand::{rngs::OsRng, TryRngCore};

pub const CODE_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

// Largest multiple of 36 that fits in a byte. Bytes at or above it are
// rejected so every symbol is equally likely.
const REJECTION_THRESHOLD: u8 = 252;

#[derive(Debug, thiserror::Error)]
#[error("Random source unavailable: {0}")]
pub struct GenerationError(String);

/// Generate a code of `length` symbols from `A-Z0-9` using the OS CSPRNG.
pub fn generate_code(length: usize) -> Result<String, GenerationError> {
    let mut code = String::with_capacity(length);
    let mut buf = [0u8; 32];

    while code.len() < length {
        OsRng
            .try_fill_bytes(&mut buf)
            .map_err(|e| GenerationError(e.to_string()))?;

        for &byte in buf.iter() {
            if code.len() == length {
                break;
            }
            if byte < REJECTION_THRESHOLD {
                code.push(CODE_ALPHABET[(byte % 36) as usize] as char);
            }
        }
    }

    Ok(code)
}
