// Services layer
// In-memory AuthService for dev mode and the password helpers it relies on

pub mod memory;
pub mod password;

pub use memory::InMemoryAuthService;
