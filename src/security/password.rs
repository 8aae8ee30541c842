use rand::seq::SliceRandom;
use rand::Rng;

const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";
const SYMBOLS: &[u8] = b"!@#$%^&*()-_=+[]{};:,.<>?";

const CHARACTER_CLASSES: [&[u8]; 4] = [LOWERCASE, UPPERCASE, DIGITS, SYMBOLS];

pub const DEFAULT_PASSWORD_LENGTH: usize = 12;

/// Generate a random password of `length` characters holding at least one
/// lowercase letter, uppercase letter, digit and symbol.
///
/// Lengths below four are raised to four. Draws from the thread-local RNG,
/// which is a CSPRNG seeded from the operating system.
pub fn generate_strong_password(length: usize) -> String {
    let length = length.max(CHARACTER_CLASSES.len());
    let mut rng = rand::thread_rng();

    let mut password: Vec<u8> = Vec::with_capacity(length);
    for class in CHARACTER_CLASSES {
        password.push(class[rng.gen_range(0..class.len())]);
    }

    let combined: Vec<u8> = CHARACTER_CLASSES.concat();
    while password.len() < length {
        password.push(combined[rng.gen_range(0..combined.len())]);
    }

    password.shuffle(&mut rng);
    password.into_iter().map(char::from).collect()
}
