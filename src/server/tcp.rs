//! # Servidor TCP
//! src/server/tcp.rs
//!
//! Socket de escucha, loop de accept y ciclo de vida del servidor.
//!
//! El thread que llama a `start()` es el acceptor: acepta conexiones y las
//! encola para el pool de workers. `stop()` (o un `ShutdownHandle` desde
//! cualquier otro thread) lo saca del `accept()` bloqueado, despierta y
//! espera a los workers, y cierra lo que haya quedado en la cola.

use super::pool::WorkerPool;
use super::queue::{ConnectionQueue, ConnectionTask};
use super::session::SessionContext;
use super::{lock, AccessLog, ServerConfig, ServerError};
use crate::assets::StaticFiles;
use crate::router::RouteTable;
use socket2::{Domain, Protocol, Socket, Type};
use std::io::ErrorKind;
use std::net::{Ipv4Addr, Shutdown, SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Pausa tras un error de accept para no girar en falso
const ACCEPT_BACKOFF: Duration = Duration::from_millis(10);

/// Cuánto espera la conexión de loopback que despierta al acceptor
const WAKE_TIMEOUT: Duration = Duration::from_millis(250);

/// Estado compartido entre el acceptor, los workers y los handles de apagado
struct Shared {
    /// Compartido con las sesiones para cortar el keep-alive al apagar
    stopping: Arc<AtomicBool>,
    queue: Arc<ConnectionQueue>,
    listener: Mutex<Option<Arc<Socket>>>,
    local_addr: Mutex<Option<SocketAddr>>,
    pool: Mutex<Option<WorkerPool>>,
    stopped: Mutex<bool>,
    stopped_signal: Condvar,
}

impl Shared {
    fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::SeqCst)
    }

    fn stop(&self) {
        if self
            .stopping
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }
        info!("shutting down");

        // 1. Sacar al acceptor de accept()
        let listener = lock(&self.listener).take();
        if let Some(listener) = listener {
            let _ = listener.shutdown(Shutdown::Both);
            let addr = *lock(&self.local_addr);
            if let Some(addr) = addr {
                wake_acceptor(addr);
            }
        }

        // 2. Despertar a los workers bloqueados en la cola
        self.queue.close();

        // 3. Esperar a que terminen sus sesiones
        let pool = lock(&self.pool).take();
        if let Some(pool) = pool {
            pool.join();
        }

        // 4. Lo que quedó en la cola se cierra sin respuesta
        let pending = self.queue.drain();
        if !pending.is_empty() {
            info!(count = pending.len(), "closing queued connections");
        }
        for task in pending {
            task.close();
        }

        *lock(&self.stopped) = true;
        self.stopped_signal.notify_all();
        info!("server stopped");
    }

    fn wait_stopped(&self) {
        let mut stopped = lock(&self.stopped);
        while !*stopped {
            stopped = self
                .stopped_signal
                .wait(stopped)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

/// Conexión descartable a nuestro propio puerto: si `accept()` sigue
/// bloqueado después del shutdown del socket, esto lo despierta
fn wake_acceptor(addr: SocketAddr) {
    let target = if addr.ip().is_unspecified() {
        SocketAddr::from((Ipv4Addr::LOCALHOST, addr.port()))
    } else {
        addr
    };
    let _ = TcpStream::connect_timeout(&target, WAKE_TIMEOUT);
}

/// Apaga el servidor desde otro thread (señales, tests, handlers)
#[derive(Clone)]
pub struct ShutdownHandle {
    shared: Arc<Shared>,
}

impl ShutdownHandle {
    /// Igual que [`Server::stop`]
    pub fn stop(&self) {
        self.shared.stop();
    }

    pub fn is_stopping(&self) -> bool {
        self.shared.is_stopping()
    }
}

/// Servidor HTTP con pool fijo de workers
pub struct Server {
    config: ServerConfig,
    context: Arc<SessionContext>,
    shared: Arc<Shared>,
}

impl Server {
    /// Servidor con access log por salida estándar
    pub fn new(config: ServerConfig, routes: RouteTable) -> Self {
        Self::with_access_log(config, routes, AccessLog::stdout())
    }

    pub fn with_access_log(config: ServerConfig, routes: RouteTable, access_log: AccessLog) -> Self {
        let stopping = Arc::new(AtomicBool::new(false));
        let context = SessionContext::new(
            routes,
            StaticFiles::new(&config.public_dir),
            access_log,
            config.read_timeout,
            &config.default_index,
        )
        .with_stop_flag(Arc::clone(&stopping));

        Self {
            config,
            context: Arc::new(context),
            shared: Arc::new(Shared {
                stopping,
                queue: Arc::new(ConnectionQueue::new()),
                listener: Mutex::new(None),
                local_addr: Mutex::new(None),
                pool: Mutex::new(None),
                stopped: Mutex::new(false),
                stopped_signal: Condvar::new(),
            }),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Crea el socket de escucha
    ///
    /// Con puerto 0 el sistema elige uno libre; la dirección real se
    /// retorna. Llamarlo de nuevo devuelve la misma dirección.
    pub fn bind(&self) -> Result<SocketAddr, ServerError> {
        if self.shared.is_stopping() {
            return Err(ServerError::Stopped);
        }
        if let Some(addr) = self.local_addr() {
            return Ok(addr);
        }

        let addr = SocketAddr::from((self.config.host, self.config.port));
        let socket = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP))
            .map_err(ServerError::Socket)?;
        socket.set_reuse_address(true).map_err(ServerError::Socket)?;
        socket
            .bind(&addr.into())
            .map_err(|source| ServerError::Bind { addr, source })?;
        socket
            .listen(self.config.backlog)
            .map_err(|source| ServerError::Bind { addr, source })?;

        let local = socket
            .local_addr()
            .ok()
            .and_then(|a| a.as_socket())
            .unwrap_or(addr);

        *lock(&self.shared.listener) = Some(Arc::new(socket));
        *lock(&self.shared.local_addr) = Some(local);
        info!(address = %local, backlog = self.config.backlog, "listening");
        Ok(local)
    }

    /// Dirección de escucha, si ya se hizo `bind`
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *lock(&self.shared.local_addr)
    }

    pub fn handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn is_stopping(&self) -> bool {
        self.shared.is_stopping()
    }

    /// Hace `bind` si hace falta, lanza los workers y acepta conexiones
    ///
    /// Bloquea hasta que el servidor se detiene por completo.
    pub fn start(&self) -> Result<(), ServerError> {
        if self.local_addr().is_none() {
            self.bind()?;
        }

        let listener = lock(&self.shared.listener).clone();
        let Some(listener) = listener else {
            // stop() ganó la carrera entre bind y start
            self.shared.wait_stopped();
            return Ok(());
        };

        {
            let mut pool = lock(&self.shared.pool);
            if self.shared.is_stopping() {
                drop(pool);
                self.shared.wait_stopped();
                return Ok(());
            }
            let workers = WorkerPool::spawn(
                self.config.workers,
                Arc::clone(&self.shared.queue),
                Arc::clone(&self.context),
            )
            .map_err(ServerError::Spawn)?;
            *pool = Some(workers);
        }
        info!(workers = self.config.workers, "accepting connections");

        self.accept_loop(&listener);
        drop(listener);

        self.shared.wait_stopped();
        Ok(())
    }

    fn accept_loop(&self, listener: &Socket) {
        loop {
            match listener.accept() {
                Ok((socket, peer)) => {
                    let task = ConnectionTask::new(TcpStream::from(socket), peer.as_socket());

                    if self.shared.is_stopping() {
                        task.close();
                        break;
                    }
                    if let Err(task) = self.shared.queue.push(task) {
                        task.close();
                        break;
                    }
                }
                Err(e) => {
                    if self.shared.is_stopping() {
                        break;
                    }
                    if e.kind() == ErrorKind::Interrupted {
                        continue;
                    }
                    warn!(error = %e, "accept failed");
                    thread::sleep(ACCEPT_BACKOFF);
                }
            }
        }
        debug!("accept loop finished");
    }

    /// Detiene el servidor; llamadas repetidas no hacen nada
    pub fn stop(&self) {
        self.shared.stop();
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.stop();
    }
}
