//! In-memory account store keyed by email.
//!
//! Records live for the lifetime of the process. Passwords are stored as
//! bcrypt hashes only.

use parking_lot::RwLock;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::models::UserProfile;

/// bcrypt only reads this many bytes of a password.
pub const MAX_PASSWORD_BYTES: usize = 72;

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("an account with this email already exists")]
    AlreadyExists,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("password longer than {MAX_PASSWORD_BYTES} bytes")]
    PasswordTooLong,
    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

/// Fields needed to open an account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub username: String,
    pub birthdate: String,
}

struct UserRecord {
    profile: UserProfile,
    password_hash: String,
}

pub struct AccountStore {
    users: RwLock<HashMap<String, UserRecord>>,
    bcrypt_cost: u32,
}

impl AccountStore {
    pub fn new(bcrypt_cost: u32) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            bcrypt_cost,
        }
    }

    /// Add an account unless the email is taken. Email comparison is exact.
    ///
    /// Hashing is slow, so this should run on a blocking thread.
    pub fn signup(&self, account: NewAccount) -> Result<UserProfile, AccountError> {
        if account.password.len() > MAX_PASSWORD_BYTES {
            return Err(AccountError::PasswordTooLong);
        }
        if self.users.read().contains_key(&account.email) {
            return Err(AccountError::AlreadyExists);
        }

        let password_hash = bcrypt::hash(&account.password, self.bcrypt_cost)?;
        let profile = UserProfile {
            email: account.email,
            username: account.username,
            birthdate: account.birthdate,
        };

        // Re-check under the write lock: another signup may have won the race
        // while we were hashing.
        match self.users.write().entry(profile.email.clone()) {
            Entry::Occupied(_) => Err(AccountError::AlreadyExists),
            Entry::Vacant(slot) => {
                slot.insert(UserRecord {
                    profile: profile.clone(),
                    password_hash,
                });
                Ok(profile)
            }
        }
    }

    /// Return the profile for `email` if `password` matches.
    pub fn login(&self, email: &str, password: &str) -> Result<UserProfile, AccountError> {
        // No stored password is this long, and bcrypt would compare only a prefix.
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(AccountError::InvalidCredentials);
        }
        let (profile, password_hash) = {
            let users = self.users.read();
            let record = users.get(email).ok_or(AccountError::InvalidCredentials)?;
            (record.profile.clone(), record.password_hash.clone())
        };

        if bcrypt::verify(password, &password_hash)? {
            Ok(profile)
        } else {
            Err(AccountError::InvalidCredentials)
        }
    }

    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }
}
