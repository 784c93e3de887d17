//! Application layer with use cases, services and DTOs.

/// Data transfer objects.
pub mod dto;
/// Stateful client-side services.
pub mod services;
/// Use case implementations.
pub mod use_cases;

pub use dto::{LoginMethod, LoginRequest, LoginResponse, TokenSource};
pub use use_cases::{LoginUseCase, ResolveTokenUseCase, ResolvedToken};
