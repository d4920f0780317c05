use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::error::ErrorMessage;

/// Upper bound on password length, in bytes.
const MAX_PASSWORD_LENGTH: usize = 64;

/// Hashes a password with Argon2id and a fresh random salt.
///
/// The result is a PHC string (`$argon2id$v=19$m=19456,t=2,p=1$<salt>$<hash>`)
/// that embeds its own parameters and salt, so it is the only thing stored
/// in `users.password_hash`. Hashing the same password twice yields two
/// different strings; both verify.
pub fn hash(password: impl Into<String>) -> Result<String, ErrorMessage> {
    let password = password.into();

    if password.is_empty() {
        return Err(ErrorMessage::EmptyPassword);
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ErrorMessage::ExceededMaxPasswordLength(MAX_PASSWORD_LENGTH));
    }

    let salt = SaltString::generate(&mut OsRng);

    let hashed_password = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| ErrorMessage::HashingError)?
        .to_string();

    Ok(hashed_password)
}

/// Checks a candidate password against a stored PHC hash in constant time.
///
/// `Ok(false)` means a wrong password; `Err` means the input or the stored
/// hash is malformed.
pub fn compare(password: &str, hashed_password: &str) -> Result<bool, ErrorMessage> {
    if password.is_empty() {
        return Err(ErrorMessage::EmptyPassword);
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ErrorMessage::ExceededMaxPasswordLength(MAX_PASSWORD_LENGTH));
    }

    let parsed_hash =
        PasswordHash::new(hashed_password).map_err(|_| ErrorMessage::InvalidHashFormat)?;

    let password_matched = Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok();

    Ok(password_matched)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_compare() {
        let hashed = hash("matkhau123").unwrap();
        assert!(hashed.starts_with("$argon2id$"));
        assert!(compare("matkhau123", &hashed).unwrap());
        assert!(!compare("sai-mat-khau", &hashed).unwrap());
    }

    #[test]
    fn salts_differ_between_hashes() {
        assert_ne!(hash("matkhau123").unwrap(), hash("matkhau123").unwrap());
    }

    #[test]
    fn rejects_empty_and_oversized_passwords() {
        assert_eq!(hash(""), Err(ErrorMessage::EmptyPassword));
        assert_eq!(
            hash("x".repeat(MAX_PASSWORD_LENGTH + 1)),
            Err(ErrorMessage::ExceededMaxPasswordLength(MAX_PASSWORD_LENGTH))
        );
    }

    #[test]
    fn malformed_stored_hash_is_an_error() {
        assert_eq!(
            compare("matkhau123", "not-a-phc-string"),
            Err(ErrorMessage::InvalidHashFormat)
        );
    }
}
