#![forbid(unsafe_code)]

//! Core engine for filtering streaming token sequences: the token model,
//! the upstream source contract, and the filtering cursor.

pub mod filter;
pub mod stream;
