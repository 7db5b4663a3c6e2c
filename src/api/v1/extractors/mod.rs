/*!
 * Request extractors
 *
 * Public API:
 * - JwtCtx
 */
mod jwt_ctx;

pub use jwt_ctx::JwtCtx;
