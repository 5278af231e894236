// Authentication module
// Decision: Handlers depend on the AuthService trait only; external providers are opaque redirect targets

pub mod config;
pub mod external;
pub mod middleware;
pub mod routes;

pub use config::{AuthConfig, ExternalProviderConfig};
pub use external::{ChallengeError, ExternalLoginChallenge, OAuthChallenge};
pub use middleware::{AuthState, CurrentUser};
pub use routes::routes;
