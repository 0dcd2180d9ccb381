// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod changes;
pub mod filters;
pub mod forms;
pub mod ids;
pub mod kinds;
pub mod model;
pub mod projection;
pub mod selection;
pub mod state;

pub use changes::*;
pub use filters::*;
pub use forms::*;
pub use ids::*;
pub use kinds::*;
pub use model::*;
pub use projection::*;
pub use selection::*;
pub use state::*;
