//! SRCL halftone
//!
//! Theme-aware ordered dithering for terminal-aesthetic web UIs, plus the
//! same-origin image proxy that keeps remote pixels readable.
//! This library exposes modules for the binary and integration tests.

pub mod api;
pub mod assets;
pub mod error;
pub mod models;
pub mod rendering;
pub mod server;
pub mod services;
