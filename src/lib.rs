pub mod core;
pub mod figure;
pub mod render;
pub mod runtime;

use std::fmt;

#[derive(Debug)]
pub enum GradinoError {
    /// A series was constructed with no readings.
    EmptySeries,
    /// Stage duration was zero, negative, or not finite.
    InvalidDuration,
    /// Stage labels were supplied but their count differs from the readings.
    LabelCountMismatch,
}

impl fmt::Display for GradinoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySeries => write!(f, "series contains no readings"),
            Self::InvalidDuration => write!(f, "stage duration must be a positive, finite number"),
            Self::LabelCountMismatch => {
                write!(f, "stage label count does not match reading count")
            }
        }
    }
}

impl std::error::Error for GradinoError {}

pub type Result<T> = std::result::Result<T, error_stack::Report<GradinoError>>;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}

pub mod prelude {
    pub use crate::core::*;
    pub use crate::figure::*;
    pub use crate::render::*;
    pub use crate::runtime::*;
}
