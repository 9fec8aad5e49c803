//! # Cola de Conexiones
//! src/server/queue.rs
//!
//! Cola FIFO productor/consumidor entre el acceptor y los workers.
//! Un `Mutex` protege la cola y una `Condvar` despierta a los workers.
//!
//! Cada `ConnectionTask` es dueña de su socket: mientras está en la cola le
//! pertenece a la cola, al hacer `pop` pasa a exactamente un worker, y se
//! cierra una sola vez (con `close` o al hacer drop).

use super::lock;
use std::collections::VecDeque;
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::{Condvar, Mutex, PoisonError};

/// Una conexión aceptada que todavía no terminó su sesión
#[derive(Debug)]
pub struct ConnectionTask {
    stream: TcpStream,
    peer: Option<SocketAddr>,
}

impl ConnectionTask {
    pub fn new(stream: TcpStream, peer: Option<SocketAddr>) -> Self {
        Self { stream, peer }
    }

    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    pub fn stream(&self) -> &TcpStream {
        &self.stream
    }

    pub fn stream_mut(&mut self) -> &mut TcpStream {
        &mut self.stream
    }

    /// Cierra la conexión; el descriptor se libera al consumir `self`
    pub fn close(self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}

struct QueueState {
    tasks: VecDeque<ConnectionTask>,
    closed: bool,
}

/// Cola thread-safe de conexiones
pub struct ConnectionQueue {
    state: Mutex<QueueState>,
    available: Condvar,
}

impl Default for ConnectionQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionQueue {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                tasks: VecDeque::new(),
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    /// Encola una conexión y despierta a un worker
    ///
    /// Si la cola ya está cerrada la conexión se devuelve para que el
    /// llamador la cierre.
    pub fn push(&self, task: ConnectionTask) -> Result<(), ConnectionTask> {
        let mut state = lock(&self.state);
        if state.closed {
            return Err(task);
        }
        state.tasks.push_back(task);
        drop(state);

        self.available.notify_one();
        Ok(())
    }

    /// Bloquea hasta que haya una conexión o la cola se cierre
    ///
    /// Con la cola cerrada retorna `None` aunque queden conexiones: las
    /// pendientes se descartan con [`ConnectionQueue::drain`].
    pub fn pop(&self) -> Option<ConnectionTask> {
        let mut state = lock(&self.state);

        loop {
            if state.closed {
                return None;
            }
            if let Some(task) = state.tasks.pop_front() {
                return Some(task);
            }
            // Despertares espurios: el loop vuelve a revisar el estado
            state = self
                .available
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Cierra la cola y despierta a todos los workers
    pub fn close(&self) {
        lock(&self.state).closed = true;
        self.available.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.state).closed
    }

    /// Saca todas las conexiones que quedaron sin atender
    pub fn drain(&self) -> Vec<ConnectionTask> {
        lock(&self.state).tasks.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.state).tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
