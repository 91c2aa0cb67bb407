//! Frontier expansion: staged candidate generation with threshold pruning

mod controller;
mod plan;

pub use controller::{FrontierController, FrontierReport, ResponseObserver};
pub use plan::{CountRule, Expansion, Pruning, Stage, StagePlan};
