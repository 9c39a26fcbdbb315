/// State management module
/// 
/// This module handles the state the UI keeps between runs:
/// - The log pane buffer (log.rs)

pub mod log;
