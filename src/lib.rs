//! # Pelada
//!
//! Core engine for tracking recreational futsal gatherings: sessions of
//! sequential matches between the orange and black teams, with goals,
//! assists, goalkeeper concessions, and a pausable per-match clock.
//!
//! The crate is the domain core only. A request-handling layer drives it
//! through the lifecycle operations in [`session`], [`matches`], and
//! [`clock`], and reads derived views from [`stats`]; persistence goes
//! through the [`store::Store`] trait, with [`store::SqliteStore`] as the
//! bundled implementation.
//!
//! ```rust,ignore
//! use chrono::Utc;
//! use pelada::store::{SqliteStore, Store};
//!
//! let store = SqliteStore::new("./data/pelada.db")?;
//! store.initialize()?;
//!
//! let session = pelada::session::start_session(
//!     &store,
//!     pelada::session::parse_session_date("2024-06-02")?,
//!     Utc::now(),
//! )?;
//! ```
//!
//! There is no background clock task: elapsed time is reconstructed on
//! demand from the stored timer triple and a caller-supplied "now", and
//! every mutating operation takes that "now" explicitly.

pub mod admin;
pub mod clock;
pub mod error;
pub mod events;
pub mod history;
pub mod matches;
pub mod players;
pub mod session;
pub mod stats;
pub mod store;
pub mod types;
