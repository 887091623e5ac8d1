//! # Kuebiko Architecture
//!
//! Kuebiko is a **UI-agnostic note library**. The bundled CLI is one client of
//! it; a desktop or web front end would sit in the same place.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Client (main.rs + args.rs)                                 │
//! │  - Parses arguments, prints results, owns exit codes        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Manager (manager.rs)                                       │
//! │  - Title lists, filtering, save routing                     │
//! │  - "Unsaved changes" flag and event subscriptions           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  DAO (dao/)                                                 │
//! │  - Parameter checks, title uniqueness, id assignment        │
//! │  - Note state preconditions                                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage (store/)                                           │
//! │  - NoteStorage trait: lookups and raw writes only           │
//! │  - FileNoteStore (production), MemoryNoteStore (testing)    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## No I/O Assumptions in Core
//!
//! Everything below the client takes Rust values and returns `Result`s. It
//! never prints, never exits the process and never assumes a terminal.
//! Diagnostics go through the `log` facade; the client decides where they end up.
//!
//! ## Module Overview
//!
//! - [`model`]: `Note`, `NoteId`, lazy text loading and dirty tracking
//! - [`dao`]: `NoteDao` and its configuration parameters
//! - [`store`]: `NoteStorage` and its implementations
//! - [`manager`]: `NoteManager` and its events
//! - [`config`]: Application configuration
//! - [`error`]: Error types

pub mod config;
pub mod dao;
pub mod error;
pub mod manager;
pub mod model;
pub mod store;
