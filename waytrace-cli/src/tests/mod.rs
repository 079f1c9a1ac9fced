//! Shared test harness modules for the waytrace CLI.

use super::*;

mod analyze_unit;
mod helpers;
