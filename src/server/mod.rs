//! # Módulo del Servidor
//! src/server/mod.rs
//!
//! Núcleo concurrente del servidor:
//!
//! ```text
//!  accept() ──► ConnectionQueue ──► WorkerPool (N threads) ──► session::serve
//!  (acceptor)   Mutex + Condvar      un worker por conexión     keep-alive loop
//! ```
//!
//! - `tcp`: socket de escucha, loop de accept y apagado (`Server`, `ShutdownHandle`)
//! - `queue`: cola productor/consumidor de conexiones aceptadas
//! - `pool`: workers que consumen la cola
//! - `session`: máquina de estados de una conexión
//! - `access_log`: una línea por respuesta, serializada con su propio lock

pub mod access_log;
pub mod pool;
pub mod queue;
pub mod session;
pub mod tcp;

pub use access_log::AccessLog;
pub use queue::{ConnectionQueue, ConnectionTask};
pub use session::SessionContext;
pub use tcp::{Server, ShutdownHandle};

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Conexiones pendientes que el kernel encola antes de `accept()`
pub const LISTEN_BACKLOG: i32 = 100;

/// Timeout de lectura por conexión
pub const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Tamaño de la primera lectura de un request (headers + inicio del body)
pub const MAX_READ_BUFFER: usize = 30_000;

/// Tamaño de cada lectura adicional del body
pub const CHUNK_BUFFER_SIZE: usize = 4096;

/// Configuración del núcleo del servidor
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: Ipv4Addr,
    pub port: u16,
    pub workers: usize,
    pub backlog: i32,
    pub read_timeout: Duration,
    /// Raíz de los archivos estáticos
    pub public_dir: PathBuf,
    /// Documento que se sirve para `/`
    pub default_index: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Ipv4Addr::UNSPECIFIED,
            port: 8080,
            workers: 4,
            backlog: LISTEN_BACKLOG,
            read_timeout: READ_TIMEOUT,
            public_dir: PathBuf::from("public"),
            default_index: "index.html".to_string(),
        }
    }
}

/// Errores del ciclo de vida del servidor
#[derive(Debug)]
pub enum ServerError {
    /// No se pudo crear o configurar el socket
    Socket(std::io::Error),

    /// `bind()` o `listen()` fallaron
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// No se pudo crear un worker
    Spawn(std::io::Error),

    /// El servidor ya fue detenido
    Stopped,
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerError::Socket(e) => write!(f, "Failed to create socket: {}", e),
            ServerError::Bind { addr, source } => write!(f, "Bind failed on {}: {}", addr, source),
            ServerError::Spawn(e) => write!(f, "Failed to spawn worker: {}", e),
            ServerError::Stopped => write!(f, "Server already stopped"),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServerError::Socket(e) | ServerError::Spawn(e) => Some(e),
            ServerError::Bind { source, .. } => Some(source),
            ServerError::Stopped => None,
        }
    }
}

impl From<std::io::Error> for ServerError {
    fn from(e: std::io::Error) -> Self {
        ServerError::Socket(e)
    }
}

/// Toma un lock aunque otro thread haya hecho panic con él tomado
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
