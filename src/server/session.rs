//! # Sesión de una Conexión
//! src/server/session.rs
//!
//! Máquina de estados que atiende una conexión de principio a fin:
//!
//! ```text
//! AwaitRequest ──► AwaitBody ──► Dispatch ──► Respond ──┬─► AwaitRequest (keep-alive)
//!      │               (413 / 400) ───────────►  ▲      └─► Close
//!      └─ timeout, EOF, sin "\r\n\r\n" ──► Close
//! ```
//!
//! Los requests de una misma conexión se atienden de a uno: el siguiente
//! recién se lee después de escribir la respuesta anterior.

use super::{AccessLog, ConnectionTask, CHUNK_BUFFER_SIZE, MAX_READ_BUFFER};
use crate::assets::StaticFiles;
use crate::http::json::scan_json_body;
use crate::http::parser::{extract_header_value, find_header_end, parse_form_body, parse_url};
use crate::http::{Method, RequestHead, RequestInfo, Response, StatusCode, MAX_PAYLOAD_SIZE};
use crate::router::{normalize_path, RouteTable};
use std::io::{ErrorKind, Read, Write};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

/// Todo lo que un worker necesita para atender conexiones
///
/// Se arma una sola vez antes de arrancar y los workers lo comparten por
/// `Arc`; nada acá se modifica mientras el servidor corre, salvo el flag
/// de apagado que comparte con el servidor.
pub struct SessionContext {
    routes: RouteTable,
    assets: StaticFiles,
    access_log: AccessLog,
    read_timeout: Duration,
    assets_dir: String,
    default_index: String,
    stopping: Arc<AtomicBool>,
}

impl SessionContext {
    pub fn new(
        routes: RouteTable,
        assets: StaticFiles,
        access_log: AccessLog,
        read_timeout: Duration,
        default_index: &str,
    ) -> Self {
        let assets_dir = assets.dir_name();
        Self {
            routes,
            assets,
            access_log,
            read_timeout,
            assets_dir,
            default_index: default_index.to_string(),
            stopping: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Comparte el flag de apagado del servidor: con el flag en `true` cada
    /// sesión termina después de su respuesta en curso
    pub fn with_stop_flag(mut self, stopping: Arc<AtomicBool>) -> Self {
        self.stopping = stopping;
        self
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::SeqCst)
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }
}

/// Request cuyos headers ya se leyeron y al que le falta (quizás) el body
struct PendingRequest {
    info: RequestInfo,
    /// Bytes de la primera lectura: headers, delimitador e inicio del body
    data: Vec<u8>,
    header_end: usize,
    content_length: usize,
}

enum SessionState {
    AwaitRequest,
    AwaitBody(PendingRequest),
    Dispatch(RequestInfo),
    Respond(RequestInfo, Response),
    Close,
}

/// Atiende una conexión hasta que se cierre
pub fn serve(task: ConnectionTask, context: &SessionContext) {
    let peer = task
        .peer()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let span = tracing::debug_span!("session", %peer);
    let _entered = span.enter();

    let mut session = Session { task, context };
    session.run();
    session.task.close();
}

struct Session<'a> {
    task: ConnectionTask,
    context: &'a SessionContext,
}

impl Session<'_> {
    fn run(&mut self) {
        if let Err(e) = self
            .task
            .stream()
            .set_read_timeout(Some(self.context.read_timeout))
        {
            debug!(error = %e, "could not arm read timeout");
            return;
        }

        let mut state = SessionState::AwaitRequest;
        loop {
            state = match state {
                SessionState::AwaitRequest => self.read_request(),
                SessionState::AwaitBody(pending) => self.read_body(pending),
                SessionState::Dispatch(info) => {
                    let response = self.dispatch(&info);
                    SessionState::Respond(info, response)
                }
                SessionState::Respond(info, response) => self.respond(info, response),
                SessionState::Close => break,
            };
        }
    }

    /// Primera lectura: request line y headers completos
    fn read_request(&mut self) -> SessionState {
        let mut data = vec![0u8; MAX_READ_BUFFER];
        let read = match self.task.stream_mut().read(&mut data) {
            Ok(0) => {
                debug!("client closed connection");
                return SessionState::Close;
            }
            Ok(n) => n,
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                debug!("read timeout");
                return SessionState::Close;
            }
            Err(e) => {
                debug!(error = %e, "read failed");
                return SessionState::Close;
            }
        };
        data.truncate(read);

        let Some(header_end) = find_header_end(&data) else {
            debug!(bytes = read, "no header delimiter in first read, closing");
            return SessionState::Close;
        };

        let head = match RequestHead::parse(&data[..header_end]) {
            Ok(head) => head,
            Err(e) => {
                debug!(error = %e, "malformed request line");
                let info = RequestInfo {
                    method: Method::Other("-".to_string()),
                    path: "-".to_string(),
                    keep_alive: false,
                    ..RequestInfo::default()
                };
                return SessionState::Respond(
                    info,
                    Response::text(StatusCode::BadRequest, "Malformed request line."),
                );
            }
        };

        let mut info = parse_url(head.target);
        info.method = head.method.clone();

        let connection = extract_header_value(&data, header_end, "Connection").to_ascii_lowercase();
        if connection.contains("close") || (head.is_http10() && !connection.contains("keep-alive")) {
            info.keep_alive = false;
        }

        let declared = extract_header_value(&data, header_end, "Content-Length");
        let content_length = if declared.is_empty() {
            0
        } else {
            match declared.parse::<usize>() {
                Ok(length) => length,
                Err(_) => {
                    debug!(value = %declared, "invalid Content-Length");
                    return SessionState::Respond(
                        info,
                        Response::text(StatusCode::BadRequest, "Invalid Content-Length."),
                    );
                }
            }
        };

        if content_length > MAX_PAYLOAD_SIZE {
            debug!(content_length, "payload over limit");
            return SessionState::Respond(
                info,
                Response::text(StatusCode::PayloadTooLarge, "Payload exceeds limits."),
            );
        }

        SessionState::AwaitBody(PendingRequest {
            info,
            data,
            header_end,
            content_length,
        })
    }

    /// Completa el body hasta `Content-Length` y lo decodifica
    fn read_body(&mut self, pending: PendingRequest) -> SessionState {
        let PendingRequest {
            mut info,
            mut data,
            header_end,
            content_length,
        } = pending;

        // `data` queda solo con los headers
        let mut body = data.split_off(header_end + 4);
        let mut chunk = [0u8; CHUNK_BUFFER_SIZE];

        while body.len() < content_length {
            let wanted = (content_length - body.len()).min(CHUNK_BUFFER_SIZE);
            match self.task.stream_mut().read(&mut chunk[..wanted]) {
                Ok(0) => break,
                Ok(n) => body.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    debug!(error = %e, received = body.len(), expected = content_length, "body read cut short");
                    break;
                }
            }
        }
        body.truncate(content_length);
        info.body = body;

        if info.method == Method::POST {
            let content_type =
                extract_header_value(&data, header_end, "Content-Type").to_ascii_lowercase();
            if content_type.contains("application/x-www-form-urlencoded") {
                parse_form_body(&info.body, &mut info.params);
            } else if content_type.contains("application/json") {
                scan_json_body(&info.body, &mut info.params);
            }
        }

        info.path = normalize_path(
            &info.path,
            &self.context.assets_dir,
            &self.context.default_index,
        );
        SessionState::Dispatch(info)
    }

    /// Ruta registrada o, si no hay, archivo estático
    fn dispatch(&self, info: &RequestInfo) -> Response {
        let Some(handler) = self.context.routes.lookup(info.path()) else {
            return self.context.assets.resolve(info.path());
        };

        match panic::catch_unwind(AssertUnwindSafe(|| handler.handle(info))) {
            Ok(response) => response,
            Err(_) => {
                error!(path = %info.path(), "handler panicked");
                Response::text(StatusCode::InternalServerError, "Internal Server Error")
            }
        }
    }

    /// Escribe la respuesta y decide si la conexión sigue
    fn respond(&mut self, info: RequestInfo, mut response: Response) -> SessionState {
        let keep_alive =
            info.keep_alive() && response.status_code() < 400 && !self.context.is_stopping();
        response.set_keep_alive(keep_alive);

        let bytes = response.to_bytes();
        let stream = self.task.stream_mut();
        let sent = stream.write_all(&bytes).and_then(|_| stream.flush());

        self.context
            .access_log
            .record(info.method().as_str(), info.path(), &response);

        match sent {
            Err(e) => {
                debug!(error = %e, "write failed");
                SessionState::Close
            }
            Ok(()) if response.keep_alive() => SessionState::AwaitRequest,
            Ok(()) => SessionState::Close,
        }
    }
}
