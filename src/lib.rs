//! Momentum: a kanban-style job application tracker backed by a hosted store.

pub mod application;
pub mod columns;
pub mod config;
pub mod dialog;
pub mod error;
pub mod gateway;
pub mod kanban_board;
pub mod ui;
