pub(crate) mod bot;
pub(crate) mod commands;
pub(crate) mod errors;
pub(crate) mod interactions;
pub(crate) mod requesters;
