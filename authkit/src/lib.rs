//! Credential primitives for the identity service
//!
//! Provides the two cryptographic building blocks the token lifecycle
//! engine is built on:
//! - Password hashing (Argon2id)
//! - Signed access token generation and validation (HS256 JWT)
//!
//! This crate holds no persistence and no async code. The signing key is
//! supplied once by the caller and held immutably for the lifetime of the
//! `TokenSigner`, so instances can be shared freely across request tasks.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use authkit::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash).unwrap());
//! ```
//!
//! ## Access Tokens
//! ```
//! use authkit::TokenSigner;
//! use chrono::Duration;
//!
//! let signer = TokenSigner::new(b"secret_key_at_least_32_bytes_long!", Duration::minutes(15));
//! let token = signer.generate("alice@example.com", &["USER".to_string()]).unwrap();
//! let claims = signer.validate(&token).unwrap();
//! assert_eq!(claims.sub, "alice@example.com");
//! ```

pub mod jwt;
pub mod password;

// Re-export commonly used items
pub use jwt::Claims;
pub use jwt::JwtError;
pub use jwt::TokenSigner;
pub use password::PasswordError;
pub use password::PasswordHasher;
