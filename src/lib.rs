pub mod completion;
pub mod config;
pub mod definition;
pub mod document;
pub mod flatten;
pub mod locator;
pub mod observer;
pub mod parser;
pub mod program;
pub mod schema;
pub mod server;
pub mod syntax;
pub mod type_service;
pub mod workspace;
