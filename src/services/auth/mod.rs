pub mod credential;
pub mod gate;
pub mod hooks;
pub mod verifier;

pub use credential::{Carrier, Cookies, Credential, IncomingRequest};
pub use gate::{GateError, JwtContext, Outcome, Rejection, TokenGate};
pub use hooks::{GateHooks, NoopHooks, TracingHooks};
pub use verifier::{KeyError, TokenVerifier, VerifiedClaims, VerifyError};
