//! Desktop navigation core for naming macOS Spaces and switching between them
//! reliably.
//!
//! The [`actor::navigator::Navigator`] owns all navigation state and consumes a
//! single ordered event queue. Everything that touches the operating system
//! lives behind the traits in [`sys`].

pub mod actor;
pub mod common;
pub mod model;
pub mod sys;
