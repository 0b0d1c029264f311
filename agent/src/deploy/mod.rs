//! Deployment module

pub mod command;
pub mod fsm;
pub mod gate;
pub mod orchestrator;
