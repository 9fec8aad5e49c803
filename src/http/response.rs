//! # Construcción y Serialización de Respuestas HTTP
//! src/http/response.rs
//!
//! ## Formato de una respuesta
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Content-Type: text/html\r\n
//! Content-Length: 13\r\n
//! Connection: keep-alive\r\n
//! Location: /chat\r\n          <- headers adicionales, orden no garantizado
//! \r\n
//! <h1>Hola</h1>
//! ```
//!
//! `Content-Type`, `Content-Length` y `Connection` siempre se generan a
//! partir de los campos de la respuesta; `Content-Length` se calcula con la
//! longitud real del body en el momento de serializar.
//!
//! ## Ejemplo de uso
//!
//! ```
//! use huji_server::http::{Response, StatusCode};
//!
//! let response = Response::new(StatusCode::Ok)
//!     .with_content_type("application/json")
//!     .with_body(r#"{"ok": true}"#);
//!
//! let bytes = response.to_bytes();
//! assert!(bytes.starts_with(b"HTTP/1.1 200 OK\r\n"));
//! ```

use super::parser::{extract_header_value, find_header_end, HEADER_DELIMITER};
use super::request::ParseError;
use super::StatusCode;
use std::collections::HashMap;

/// Headers que el serializador escribe siempre y que no se aceptan como adicionales
const RESERVED_HEADERS: [&str; 3] = ["Content-Type", "Content-Length", "Connection"];

/// Respuesta HTTP completa
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status_code: u16,
    status_text: String,
    content_type: String,
    body: Vec<u8>,

    /// Headers adicionales; la clave es única y un insert sobrescribe
    headers: HashMap<String, String>,

    keep_alive: bool,
}

impl Default for Response {
    /// 200 OK, `text/html`, body vacío, keep-alive
    fn default() -> Self {
        Self::new(StatusCode::Ok)
    }
}

impl Response {
    /// Crea una respuesta vacía con el código de estado especificado
    pub fn new(status: StatusCode) -> Self {
        Self {
            status_code: status.as_u16(),
            status_text: status.reason_phrase().to_string(),
            content_type: "text/html".to_string(),
            body: Vec::new(),
            headers: HashMap::new(),
            keep_alive: true,
        }
    }

    /// Respuesta 200 con body HTML
    pub fn html(body: &str) -> Self {
        Self::new(StatusCode::Ok).with_body(body)
    }

    /// Respuesta `text/plain` con el estado indicado
    pub fn text(status: StatusCode, body: &str) -> Self {
        Self::new(status)
            .with_content_type("text/plain")
            .with_body(body)
    }

    /// 303 See Other hacia `location` (patrón Post/Redirect/Get)
    pub fn redirect(location: &str) -> Self {
        Self::new(StatusCode::SeeOther).with_header("Location", location)
    }

    /// Usa un código que no está en [`StatusCode`]
    ///
    /// # Ejemplo
    /// ```
    /// use huji_server::http::Response;
    ///
    /// let response = Response::default().with_status(418, "I'm a teapot");
    /// assert_eq!(response.status_code(), 418);
    /// ```
    pub fn with_status(mut self, code: u16, text: &str) -> Self {
        self.status_code = code;
        self.status_text = text.to_string();
        self
    }

    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_type = content_type.to_string();
        self
    }

    /// Agrega un header adicional
    ///
    /// Si el header ya existe, se sobrescribe.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.add_header(name, value);
        self
    }

    /// Versión mutable de [`Response::with_header`]
    pub fn add_header(&mut self, name: &str, value: &str) {
        self.headers.insert(name.to_string(), value.to_string());
    }

    /// Establece el cuerpo desde un string
    pub fn with_body(mut self, body: &str) -> Self {
        self.body = body.as_bytes().to_vec();
        self
    }

    /// Establece el cuerpo desde bytes (imágenes, archivos binarios)
    pub fn with_body_bytes(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn with_keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    pub fn set_keep_alive(&mut self, keep_alive: bool) {
        self.keep_alive = keep_alive;
    }

    /// Convierte la respuesta a bytes listos para enviar por el socket
    ///
    /// - Status line: `HTTP/1.1 200 OK\r\n`
    /// - Headers estándar en orden fijo: Content-Type, Content-Length, Connection
    /// - Headers adicionales (los reservados se omiten)
    /// - Línea vacía y body crudo
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut head = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: {}\r\n",
            self.status_code,
            self.status_text,
            self.content_type,
            self.body.len(),
            if self.keep_alive { "keep-alive" } else { "close" },
        );

        for (name, value) in &self.headers {
            if is_reserved(name) {
                continue;
            }
            head.push_str(name);
            head.push_str(": ");
            head.push_str(value);
            head.push_str("\r\n");
        }
        head.push_str("\r\n");

        let mut result = Vec::with_capacity(head.len() + self.body.len());
        result.extend_from_slice(head.as_bytes());
        result.extend_from_slice(&self.body);
        result
    }

    /// Reconstruye una respuesta a partir de bytes serializados
    ///
    /// El body se delimita con `Content-Length`; bytes de más se ignoran y
    /// bytes de menos dan `ParseError::IncompleteBody`.
    pub fn from_bytes(data: &[u8]) -> Result<Self, ParseError> {
        let header_end = find_header_end(data).ok_or(ParseError::MissingHeaderDelimiter)?;
        let head = std::str::from_utf8(&data[..header_end])
            .map_err(|_| ParseError::InvalidStatusLine)?;
        let mut lines = head.split("\r\n");

        let status_line = lines.next().ok_or(ParseError::InvalidStatusLine)?;
        let mut parts = status_line.splitn(3, ' ');
        let version = parts.next().unwrap_or_default();
        if !version.starts_with("HTTP/") {
            return Err(ParseError::InvalidStatusLine);
        }
        let status_code = parts
            .next()
            .and_then(|code| code.parse::<u16>().ok())
            .ok_or(ParseError::InvalidStatusLine)?;
        let status_text = parts.next().unwrap_or_default().to_string();

        let mut headers = HashMap::new();
        for line in lines {
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| ParseError::InvalidHeader(line.to_string()))?;
            if !is_reserved(name.trim()) {
                headers.insert(name.trim().to_string(), value.trim().to_string());
            }
        }

        let length_header = extract_header_value(data, header_end, "Content-Length");
        let content_length = if length_header.is_empty() {
            0
        } else {
            length_header
                .parse::<usize>()
                .map_err(|_| ParseError::InvalidContentLength(length_header.clone()))?
        };

        let body_start = header_end + HEADER_DELIMITER.len();
        let available = data.len() - body_start;
        if available < content_length {
            return Err(ParseError::IncompleteBody {
                expected: content_length,
                received: available,
            });
        }

        let connection = extract_header_value(data, header_end, "Connection");

        Ok(Self {
            status_code,
            status_text,
            content_type: extract_header_value(data, header_end, "Content-Type"),
            body: data[body_start..body_start + content_length].to_vec(),
            headers,
            keep_alive: !connection.eq_ignore_ascii_case("close"),
        })
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Headers adicionales
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(|s| s.as_str())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }
}

fn is_reserved(name: &str) -> bool {
    RESERVED_HEADERS
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_response() {
        let response = Response::default();

        assert_eq!(response.status_code(), 200);
        assert_eq!(response.status_text(), "OK");
        assert_eq!(response.content_type(), "text/html");
        assert!(response.keep_alive());
        assert!(response.headers().is_empty());
        assert!(response.body().is_empty());
    }

    #[test]
    fn test_text_response() {
        let response = Response::text(StatusCode::PayloadTooLarge, "Payload exceeds limits.");

        assert_eq!(response.status_code(), 413);
        assert_eq!(response.status_text(), "Payload Too Large");
        assert_eq!(response.content_type(), "text/plain");
    }

    #[test]
    fn test_redirect() {
        let response = Response::redirect("/chat");

        assert_eq!(response.status_code(), 303);
        assert_eq!(response.header("Location"), Some("/chat"));
    }

    #[test]
    fn test_header_overwrite() {
        let response = Response::default()
            .with_header("X-Custom", "a")
            .with_header("X-Custom", "b");

        assert_eq!(response.header("X-Custom"), Some("b"));
        assert_eq!(response.headers().len(), 1);
    }

    // ==================== Serialización ====================

    #[test]
    fn test_to_bytes_exact() {
        let response = Response::text(StatusCode::Ok, "Test").with_keep_alive(false);
        let text = String::from_utf8(response.to_bytes()).unwrap();

        assert_eq!(
            text,
            "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 4\r\nConnection: close\r\n\r\nTest"
        );
    }

    #[test]
    fn test_to_bytes_extra_headers_after_standard_ones() {
        let response = Response::redirect("/chat").with_header("X-One", "1");
        let text = String::from_utf8(response.to_bytes()).unwrap();

        let connection = text.find("Connection: keep-alive\r\n").unwrap();
        assert!(text.find("Location: /chat\r\n").unwrap() > connection);
        assert!(text.find("X-One: 1\r\n").unwrap() > connection);
        assert!(text.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_reserved_headers_are_not_duplicated() {
        let response = Response::html("abc")
            .with_header("content-length", "999")
            .with_header("Connection", "upgrade");
        let text = String::from_utf8(response.to_bytes()).unwrap();

        assert_eq!(text.matches("Content-Length").count(), 1);
        assert!(text.contains("Content-Length: 3\r\n"));
        assert!(!text.contains("999"));
        assert!(!text.contains("upgrade"));
    }

    #[test]
    fn test_content_length_uses_byte_length() {
        let response = Response::html("ñandú");
        let text = String::from_utf8(response.to_bytes()).unwrap();

        assert!(text.contains("Content-Length: 7\r\n"));
    }

    #[test]
    fn test_binary_body() {
        let data = vec![0x89, 0x50, 0x4E, 0x47, 0x00, 0xFF];
        let response = Response::default()
            .with_content_type("image/png")
            .with_body_bytes(data.clone());
        let bytes = response.to_bytes();

        assert!(bytes.ends_with(&data));
    }

    // ==================== Round-trip ====================

    #[test]
    fn test_round_trip() {
        let original = Response::redirect("/chat")
            .with_header("X-Trace", "abc")
            .with_body("moved")
            .with_keep_alive(false);

        let parsed = Response::from_bytes(&original.to_bytes()).unwrap();

        assert_eq!(parsed, original);
    }

    #[test]
    fn test_round_trip_binary_and_custom_status() {
        let original = Response::default()
            .with_status(418, "I'm a teapot")
            .with_content_type("application/octet-stream")
            .with_body_bytes(vec![0, 13, 10, 13, 10, 255]);

        let parsed = Response::from_bytes(&original.to_bytes()).unwrap();

        assert_eq!(parsed, original);
    }

    #[test]
    fn test_from_bytes_ignores_trailing_data() {
        let mut bytes = Response::html("one").to_bytes();
        bytes.extend_from_slice(b"HTTP/1.1 200 OK\r\n");

        let parsed = Response::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.body(), b"one");
    }

    #[test]
    fn test_from_bytes_incomplete_body() {
        let bytes = Response::html("complete body").to_bytes();
        let result = Response::from_bytes(&bytes[..bytes.len() - 3]);

        assert_eq!(
            result,
            Err(ParseError::IncompleteBody { expected: 13, received: 10 })
        );
    }

    #[test]
    fn test_from_bytes_invalid_status_line() {
        let result = Response::from_bytes(b"HTTP/1.1 abc OK\r\n\r\n");
        assert_eq!(result, Err(ParseError::InvalidStatusLine));

        let result = Response::from_bytes(b"GET / HTTP/1.1\r\n\r\n");
        assert_eq!(result, Err(ParseError::InvalidStatusLine));
    }
}
