// Workflows behind the main menu entries.
//
// Each workflow has an interactive `start` that asks the questions and a
// set of plain functions that do the transfers. The plain functions take
// the operator's answers as arguments, log and skip per-item failures, and
// return a summary of what happened.

pub mod clients_reports;
pub mod reports;
pub mod templates;
