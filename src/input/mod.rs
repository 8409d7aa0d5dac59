//! Input module - characteristic and measurement files

pub mod diagnostics;
pub mod parser;

pub use diagnostics::{InputError, InputSyntaxError};
pub use parser::{
    load_characteristic, load_measurements, parse_characteristic, parse_measurements_csv,
    InputKind,
};
