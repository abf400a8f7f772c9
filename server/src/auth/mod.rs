//! Authentication module for Smart Task
//!
//! Cookie-based dual-token sessions.
//! - Signed access (minutes) and refresh (days) tokens, sealed in an RSA envelope
//! - Single-use refresh tokens backed by a per-user ledger
//! - A gate that silently rotates the pair when the access token has lapsed

mod cipher;
mod errors;
mod gate;
mod jwt;
mod service;
mod session;
mod store;

pub use cipher::{generate_key_pair, KeyPairPem, PayloadCipher, DEFAULT_KEY_BITS};
pub use errors::{AuthError, CryptoError, IssueError, RejectReason, StoreError};
pub use gate::{authorize_role, Authenticator};
pub use jwt::{Claims, TokenKind, TokenSigner, TokenVerdict};
pub use service::TokenService;
pub use session::{CookieSettings, SessionIssuer};
pub use store::{fingerprint, MemoryRefreshTokenStore, PgRefreshTokenStore, RefreshTokenStore};
