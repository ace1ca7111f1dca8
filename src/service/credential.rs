//! Credential hashing
//!
//! Credentials are stored only as Argon2id hashes. The persist pipeline
//! hashes the credential field when the merged value is present and differs
//! from what is already stored.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use serde_json::Value;

use super::errors::{EngineError, EngineResult};
use crate::schema::EntityDef;
use crate::storage::Record;

/// Hash a password using Argon2id
pub fn hash_password(password: &str) -> EngineResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| EngineError::Credential(e.to_string()))
}

/// Verify a password against its stored hash
pub fn verify_password(password: &str, hash: &str) -> EngineResult<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| EngineError::Credential(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Hashes `def`'s credential field on `record` if it changed.
///
/// `persisted` is the stored row for updates and `None` for inserts.
/// Returns whether a hash was written.
pub fn hash_credential(
    def: &EntityDef,
    record: &mut Record,
    persisted: Option<&Record>,
) -> EngineResult<bool> {
    let Some(field) = def.credential.as_deref() else {
        return Ok(false);
    };
    let Some(Value::String(plain)) = record.get(field) else {
        return Ok(false);
    };
    if plain.is_empty() {
        return Ok(false);
    }
    let stored = persisted.and_then(|p| p.get(field)).and_then(Value::as_str);
    if stored == Some(plain.as_str()) {
        return Ok(false);
    }

    let hash = hash_password(plain)?;
    record.set(field, Value::String(hash));
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldDef;
    use serde_json::json;

    fn user() -> EntityDef {
        EntityDef::new("User", "users")
            .field(FieldDef::string("username"))
            .field(FieldDef::string("password"))
            .credential("password")
    }

    #[test]
    fn test_password_hash_and_verify() {
        let hash = hash_password("secret123").unwrap();
        assert_ne!(hash, "secret123");
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("secret123", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn test_hashes_on_insert() {
        let mut record: Record = serde_json::from_value(json!({"password": "secret123"})).unwrap();
        assert!(hash_credential(&user(), &mut record, None).unwrap());
        let hash = record.get("password").unwrap().as_str().unwrap();
        assert!(verify_password("secret123", hash).unwrap());
    }

    #[test]
    fn test_unchanged_hash_is_not_rehashed() {
        let hash = hash_password("secret123").unwrap();
        let persisted: Record = serde_json::from_value(json!({"password": hash})).unwrap();
        let mut merged = persisted.clone();
        assert!(!hash_credential(&user(), &mut merged, Some(&persisted)).unwrap());
        assert_eq!(merged, persisted);
    }

    #[test]
    fn test_entity_without_credential() {
        let def = EntityDef::new("Tag", "tags").field(FieldDef::string("name"));
        let mut record: Record = serde_json::from_value(json!({"name": "rust"})).unwrap();
        assert!(!hash_credential(&def, &mut record, None).unwrap());
    }
}
