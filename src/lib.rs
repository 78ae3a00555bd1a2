// Tether Client Core
// Settings sync and session state engine behind the Tether mobile client

pub mod commands;
pub mod models;
pub mod services;
