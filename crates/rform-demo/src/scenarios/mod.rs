#![forbid(unsafe_code)]

//! Headless demo scenarios. Each drives a [`MemorySurface`] the way a
//! remote client would and returns a JSON report.
//!
//! [`MemorySurface`]: rform_sync::MemorySurface

pub mod counter;
pub mod rhythm;
