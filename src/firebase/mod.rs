//! Firebase integration: service-account access tokens, ID-token verification, and the
//! Firestore plan store.

pub mod auth;
pub mod firestore;
pub mod token;

pub use auth::{AuthError, FirebaseTokenVerifier, IdentityVerifier, VerifiedUser};
pub use firestore::{FirestoreService, PlanStore, StoreError};
pub use token::{AccessTokenProvider, TokenError};
