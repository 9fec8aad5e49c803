//! # Pool de Workers
//! src/server/pool.rs
//!
//! N threads fijos que toman conexiones de la cola y atienden su sesión
//! completa antes de volver a pedir otra.

use super::queue::ConnectionQueue;
use super::session::{self, SessionContext};
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// Workers vivos del servidor
pub struct WorkerPool {
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Lanza `size` workers sobre la cola
    ///
    /// Si algún thread no se puede crear, la cola se cierra, los ya lanzados
    /// se esperan y se devuelve el error.
    pub fn spawn(
        size: usize,
        queue: Arc<ConnectionQueue>,
        context: Arc<SessionContext>,
    ) -> io::Result<Self> {
        let mut workers = Vec::with_capacity(size);

        for id in 0..size {
            let queue_for_worker = Arc::clone(&queue);
            let context = Arc::clone(&context);

            let spawned = thread::Builder::new()
                .name(format!("worker-{id}"))
                .spawn(move || worker_loop(id, &queue_for_worker, &context));

            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    queue.close();
                    WorkerPool { workers }.join();
                    return Err(e);
                }
            }
        }

        debug!(workers = size, "worker pool started");
        Ok(WorkerPool { workers })
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Espera a que todos los workers terminen
    ///
    /// Si se llama desde un worker (un handler que apaga el servidor), ese
    /// worker no se espera a sí mismo.
    pub fn join(self) {
        let current = thread::current().id();

        for handle in self.workers {
            if handle.thread().id() == current {
                continue;
            }
            let name = handle.thread().name().unwrap_or("worker").to_string();
            if handle.join().is_err() {
                warn!(worker = %name, "worker panicked");
            }
        }
    }
}

fn worker_loop(id: usize, queue: &ConnectionQueue, context: &SessionContext) {
    debug!(worker = id, "worker started");

    while let Some(task) = queue.pop() {
        session::serve(task, context);
    }

    debug!(worker = id, "worker finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::StaticFiles;
    use crate::http::{RequestInfo, Response};
    use crate::router::RouteTable;
    use crate::server::queue::ConnectionTask;
    use crate::server::AccessLog;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::time::Duration;

    fn context() -> Arc<SessionContext> {
        let mut routes = RouteTable::new();
        routes.register("ping", |_req: &RequestInfo| Response::html("pong"));
        Arc::new(SessionContext::new(
            routes,
            StaticFiles::new("does-not-exist"),
            AccessLog::disabled(),
            Duration::from_secs(2),
            "index.html",
        ))
    }

    #[test]
    fn test_pool_spawns_and_joins() {
        let queue = Arc::new(ConnectionQueue::new());
        let pool = WorkerPool::spawn(3, Arc::clone(&queue), context()).unwrap();
        assert_eq!(pool.size(), 3);

        queue.close();
        pool.join();
    }

    #[test]
    fn test_worker_serves_queued_connection() {
        let queue = Arc::new(ConnectionQueue::new());
        let pool = WorkerPool::spawn(1, Arc::clone(&queue), context()).unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let mut client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (server_side, peer) = listener.accept().unwrap();
        queue.push(ConnectionTask::new(server_side, Some(peer))).unwrap();

        client
            .write_all(b"GET /ping HTTP/1.1\r\nConnection: close\r\n\r\n")
            .unwrap();
        let mut raw = Vec::new();
        client.read_to_end(&mut raw).unwrap();

        let response = Response::from_bytes(&raw).unwrap();
        assert_eq!(response.status_code(), 200);
        assert_eq!(response.body(), b"pong");

        queue.close();
        pool.join();
    }
}
