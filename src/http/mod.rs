//! # Módulo HTTP
//!
//! Implementación del subconjunto de HTTP/1.1 que usa el servidor, sin
//! librerías HTTP externas:
//!
//! - Request line y extracción de headers puntuales
//! - Query strings, formularios urlencoded y un scanner JSON plano
//! - Construcción, serialización y re-parseo de responses
//!
//! ### Formato de Request
//!
//! ```text
//! POST /chat?x=1 HTTP/1.1\r\n
//! Content-Type: application/x-www-form-urlencoded\r\n
//! Content-Length: 21\r\n
//! \r\n
//! user=Ann&message=hola
//! ```
//!
//! No hay chunked transfer-encoding ni pipelining: cada request se lee,
//! se responde y recién después se lee el siguiente de la misma conexión.

pub mod json;
pub mod parser;
pub mod request;
pub mod response;
pub mod status;

pub use request::{Method, ParseError, RequestHead, RequestInfo};
pub use response::Response;
pub use status::StatusCode;

/// Máximo body aceptado (10 MB); lo que se declare por encima recibe 413
pub const MAX_PAYLOAD_SIZE: usize = 10_485_760;
