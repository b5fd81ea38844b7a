//! Data access for the ComputerChan backend

pub mod ownership;
pub mod storage;
