//! # Access Log
//! src/server/access_log.rs
//!
//! Una línea por respuesta enviada:
//!
//! ```text
//! [2024-03-01 14:05:09] GET index.html -> 200 OK
//! ```
//!
//! El destino tiene su propio lock, así las líneas de distintos workers
//! nunca se mezclan. Los diagnósticos del servidor van por `tracing`,
//! no por acá.

use super::lock;
use crate::http::Response;
use chrono::{DateTime, Local};
use std::io::{self, Write};
use std::sync::Mutex;

/// Formato del timestamp de cada línea
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Log de accesos compartido por todos los workers
pub struct AccessLog {
    sink: Mutex<Box<dyn Write + Send>>,
}

impl AccessLog {
    /// Access log sobre un destino cualquiera (archivo, buffer, etc.)
    pub fn new(sink: impl Write + Send + 'static) -> Self {
        Self {
            sink: Mutex::new(Box::new(sink)),
        }
    }

    /// Access log por salida estándar
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// Descarta todas las líneas
    pub fn disabled() -> Self {
        Self::new(io::sink())
    }

    /// Registra la respuesta a un request
    pub fn record(&self, method: &str, path: &str, response: &Response) {
        let mut line = format_line(
            &Local::now(),
            method,
            path,
            response.status_code(),
            response.status_text(),
        );
        // Una sola escritura: stdout también lo usa tracing
        line.push('\n');

        let mut sink = lock(&self.sink);
        let written = sink.write_all(line.as_bytes()).and_then(|_| sink.flush());

        if let Err(e) = written {
            tracing::warn!(error = %e, "access log write failed");
        }
    }
}

/// Arma una línea del log (sin el salto de línea)
pub fn format_line(
    time: &DateTime<Local>,
    method: &str,
    path: &str,
    code: u16,
    text: &str,
) -> String {
    format!(
        "[{}] {} {} -> {} {}",
        time.format(TIMESTAMP_FORMAT),
        method,
        path,
        code,
        text
    )
}
