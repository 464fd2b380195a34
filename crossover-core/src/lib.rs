pub mod backtest;
pub mod config;
pub mod exchange;
pub mod indicators;
pub mod report;
pub mod service;
