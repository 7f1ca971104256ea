//! Bearer-token authentication.
//!
//! - [`jwt`] -- access-token minting and validation.

pub mod jwt;
