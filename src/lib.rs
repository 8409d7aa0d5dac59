//! SPC Toolkit: statistical process control for dimensional measurements
//!
//! Computes X-bar/R, X-bar/S and I-MR control limits, process capability
//! (Cp/Cpk/Pp/Ppk, sigma level, predicted PPM) and Gage R&R categories.
//! The engine in [`core`] is a set of pure functions; [`input`] reads
//! characteristic and measurement files and [`cli`] hosts the `spc` binary.

pub mod cli;
pub mod core;
pub mod input;
