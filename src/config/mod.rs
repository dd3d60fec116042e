//! Configuration management for the timetable solver

pub mod settings;

pub use settings::{
    BuilderConfig, CliOverrides, InputConfig, NeighborStrategy, OutputConfig, OutputFormat,
    Settings, SolverConfig,
};
