//! # Aplicación de Ejemplo
//! src/app/mod.rs
//!
//! Tablero de mensajes que usa el servidor solo a través de `RouteTable`.

pub mod handlers;
pub mod store;

pub use handlers::{routes, ChatHandler};
pub use store::{Message, MessageStore};
