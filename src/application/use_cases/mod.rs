//! Use case implementations.

mod login_use_case;
mod resolve_token_use_case;

pub use login_use_case::LoginUseCase;
pub use resolve_token_use_case::{ResolveTokenUseCase, ResolvedToken};
