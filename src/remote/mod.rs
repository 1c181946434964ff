//! Concrete adapters for the external collaborators: the document store,
//! the identity provider, and the CDN probe.

pub mod auth;
pub mod cdn;
pub mod firestore;

pub use auth::{AuthError, FirebaseAuth, IdentityProvider};
pub use cdn::DiscordCdn;
pub use firestore::{FirestoreStore, TokenSource};
