//! Orchestration that spans more than one repository.

pub mod circuits;

pub use circuits::CircuitService;
