// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! wl-storage: SQLite-backed persistence for the white-commit ledger

pub mod error;
pub mod schema;
pub mod store;

pub use error::StoreError;
pub use schema::STORE_SCHEMA_VERSION;
pub use store::{QualityStore, SessionFlags};
