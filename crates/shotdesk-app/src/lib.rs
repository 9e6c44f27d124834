// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod detail;
pub mod error;
pub mod filter;
pub mod ids;
pub mod model;
pub mod prefs;
pub mod query;
pub mod roster;
pub mod selection;
pub mod state;

pub use detail::*;
pub use error::*;
pub use filter::*;
pub use ids::*;
pub use model::*;
pub use prefs::*;
pub use query::*;
pub use roster::*;
pub use selection::*;
pub use state::*;
