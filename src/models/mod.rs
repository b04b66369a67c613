pub mod cycle;
pub mod evaluation;
pub mod history;
pub mod panel;
pub mod project;
pub mod route;
pub mod session;
pub mod user;
