//! # Huji Server
//! src/lib.rs
//!
//! Servidor HTTP/1.1 implementado desde cero sobre sockets TCP: un thread
//! acceptor, un pool fijo de workers y un parser propio.
//!
//! ## Arquitectura
//!
//! - `http`: parsing del request, decodificación de bodies y serialización
//! - `server`: socket de escucha, cola de conexiones, workers y sesiones
//! - `router`: tabla de rutas y normalización de paths
//! - `assets`: archivos estáticos con protección contra path traversal
//! - `config`: configuración por CLI y variables de entorno
//! - `app`: aplicación de ejemplo (chat) montada sobre el router
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use huji_server::http::{RequestInfo, Response};
//! use huji_server::router::RouteTable;
//! use huji_server::server::{Server, ServerConfig};
//!
//! let mut routes = RouteTable::new();
//! routes.register("hello", |_req: &RequestInfo| Response::html("<h1>Hello</h1>"));
//!
//! let server = Server::new(ServerConfig::default(), routes);
//! server.start().expect("Error al iniciar servidor");
//! ```

pub mod app;
pub mod assets;
pub mod config;
pub mod http;
pub mod router;
pub mod server;
