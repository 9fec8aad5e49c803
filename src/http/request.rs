//! # Requests HTTP
//! src/http/request.rs
//!
//! Tipos que produce el parser a partir de los bytes recibidos:
//!
//! 1. **Request Line**: `METHOD /path?query HTTP/1.1` → [`RequestHead`]
//! 2. **Headers**: no se materializan; se extraen bajo demanda con
//!    [`extract_header_value`](super::parser::extract_header_value)
//! 3. **Body**: bytes crudos, más los parámetros que se decodifiquen de él
//!
//! El resultado final es un [`RequestInfo`], que es lo que reciben los handlers.

use std::collections::HashMap;

/// Errores que pueden ocurrir durante el parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// No se encontró `\r\n\r\n` en los datos leídos
    MissingHeaderDelimiter,

    /// Formato inválido de la request line
    InvalidRequestLine,

    /// Content-Length no numérico
    InvalidContentLength(String),

    /// Status line de una response ilegible
    InvalidStatusLine,

    /// Header sin ':'
    InvalidHeader(String),

    /// El body tiene menos bytes de los que anuncia Content-Length
    IncompleteBody { expected: usize, received: usize },
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::MissingHeaderDelimiter => write!(f, "Missing header delimiter"),
            ParseError::InvalidRequestLine => write!(f, "Invalid request line format"),
            ParseError::InvalidContentLength(v) => write!(f, "Invalid Content-Length: {}", v),
            ParseError::InvalidStatusLine => write!(f, "Invalid status line format"),
            ParseError::InvalidHeader(h) => write!(f, "Invalid header: {}", h),
            ParseError::IncompleteBody { expected, received } => {
                write!(f, "Incomplete body: expected {} bytes, got {}", expected, received)
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Método HTTP del request
///
/// Los métodos desconocidos se conservan tal cual en `Other`, el núcleo no
/// los rechaza: decidir qué hacer con ellos es trabajo del handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    GET,
    HEAD,
    POST,
    PUT,
    DELETE,
    OPTIONS,
    PATCH,
    Other(String),
}

impl Method {
    /// Convierte el token de la request line en un método
    pub fn from_token(token: &str) -> Self {
        match token {
            "GET" => Method::GET,
            "HEAD" => Method::HEAD,
            "POST" => Method::POST,
            "PUT" => Method::PUT,
            "DELETE" => Method::DELETE,
            "OPTIONS" => Method::OPTIONS,
            "PATCH" => Method::PATCH,
            other => Method::Other(other.to_string()),
        }
    }

    /// Convierte el método a string
    pub fn as_str(&self) -> &str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::OPTIONS => "OPTIONS",
            Method::PATCH => "PATCH",
            Method::Other(token) => token.as_str(),
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Primera línea del request, separada por espacios
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead<'a> {
    pub method: Method,
    pub target: &'a str,
    pub version: &'a str,
}

impl<'a> RequestHead<'a> {
    /// Parsea la request line al inicio de `head`
    ///
    /// Formato: `GET /path?query HTTP/1.1`. La versión puede faltar; el
    /// método y el target no.
    ///
    /// # Ejemplo
    /// ```
    /// use huji_server::http::{Method, RequestHead};
    ///
    /// let head = RequestHead::parse(b"POST /chat HTTP/1.1\r\nHost: x").unwrap();
    /// assert_eq!(head.method, Method::POST);
    /// assert_eq!(head.target, "/chat");
    /// ```
    pub fn parse(head: &'a [u8]) -> Result<Self, ParseError> {
        let line_end = head
            .windows(2)
            .position(|w| w == b"\r\n")
            .unwrap_or(head.len());
        let line = std::str::from_utf8(&head[..line_end])
            .map_err(|_| ParseError::InvalidRequestLine)?;

        let (method, rest) = line.split_once(' ').ok_or(ParseError::InvalidRequestLine)?;
        if method.is_empty() || !method.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(ParseError::InvalidRequestLine);
        }

        let (target, version) = rest.split_once(' ').unwrap_or((rest, ""));
        if target.is_empty() {
            return Err(ParseError::InvalidRequestLine);
        }

        Ok(RequestHead {
            method: Method::from_token(method),
            target,
            version: version.trim(),
        })
    }

    /// HTTP/1.0 no mantiene la conexión salvo que se pida explícitamente
    pub fn is_http10(&self) -> bool {
        self.version.eq_ignore_ascii_case("HTTP/1.0")
    }
}

/// Datos de un request ya parseado, tal como los ve un handler
#[derive(Debug, Clone)]
pub struct RequestInfo {
    /// Path normalizado, sin '/' inicial
    pub(crate) path: String,

    /// Query string cruda (sin el '?')
    pub(crate) query: String,

    /// Parámetros de la query y del body; el último valor gana
    pub(crate) params: HashMap<String, String>,

    pub(crate) method: Method,

    /// Body crudo
    pub(crate) body: Vec<u8>,

    pub(crate) keep_alive: bool,
}

impl Default for RequestInfo {
    fn default() -> Self {
        Self {
            path: String::new(),
            query: String::new(),
            params: HashMap::new(),
            method: Method::GET,
            body: Vec::new(),
            keep_alive: true,
        }
    }
}

impl RequestInfo {
    /// Construye un request a partir del método y el target de la request line
    ///
    /// # Ejemplo
    /// ```
    /// use huji_server::http::{Method, RequestInfo};
    ///
    /// let req = RequestInfo::new(Method::GET, "/greet?name=Ann");
    /// assert_eq!(req.path(), "greet");
    /// assert_eq!(req.param("name"), Some("Ann"));
    /// ```
    pub fn new(method: Method, target: &str) -> Self {
        let mut info = super::parser::parse_url(target);
        info.method = method;
        info
    }

    /// Reemplaza el body crudo
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Agrega (o sobrescribe) un parámetro
    pub fn with_param(mut self, name: &str, value: &str) -> Self {
        self.params.insert(name.to_string(), value.to_string());
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// Obtiene un parámetro específico
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(|s| s.as_str())
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body como String, si es UTF-8 válido
    pub fn body_string(&self) -> Option<String> {
        String::from_utf8(self.body.clone()).ok()
    }

    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    pub(crate) fn params_mut(&mut self) -> &mut HashMap<String, String> {
        &mut self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Request Line ====================

    #[test]
    fn test_parse_simple_get() {
        let head = RequestHead::parse(b"GET / HTTP/1.1\r\n\r\n").unwrap();

        assert_eq!(head.method, Method::GET);
        assert_eq!(head.target, "/");
        assert_eq!(head.version, "HTTP/1.1");
        assert!(!head.is_http10());
    }

    #[test]
    fn test_parse_target_with_query() {
        let head = RequestHead::parse(b"GET /greet?name=Ann HTTP/1.0\r\nHost: a\r\n").unwrap();

        assert_eq!(head.target, "/greet?name=Ann");
        assert!(head.is_http10());
    }

    #[test]
    fn test_parse_missing_version() {
        let head = RequestHead::parse(b"GET /status").unwrap();

        assert_eq!(head.target, "/status");
        assert_eq!(head.version, "");
    }

    #[test]
    fn test_unknown_method_is_kept() {
        let head = RequestHead::parse(b"BREW /pot HTTP/1.1\r\n").unwrap();

        assert_eq!(head.method, Method::Other("BREW".to_string()));
        assert_eq!(head.method.as_str(), "BREW");
    }

    #[test]
    fn test_invalid_request_line_no_spaces() {
        let result = RequestHead::parse(b"GET\r\n\r\n");
        assert_eq!(result, Err(ParseError::InvalidRequestLine));
    }

    #[test]
    fn test_invalid_request_line_empty_target() {
        let result = RequestHead::parse(b"GET  HTTP/1.1\r\n");
        assert_eq!(result, Err(ParseError::InvalidRequestLine));
    }

    #[test]
    fn test_invalid_request_line_garbage() {
        let result = RequestHead::parse(b"\x00\x01 \x02\x03\r\n");
        assert_eq!(result, Err(ParseError::InvalidRequestLine));
    }

    // ==================== RequestInfo ====================

    #[test]
    fn test_request_info_defaults() {
        let req = RequestInfo::default();

        assert_eq!(req.method(), &Method::GET);
        assert!(req.keep_alive());
        assert!(req.params().is_empty());
    }

    #[test]
    fn test_request_info_builders() {
        let req = RequestInfo::new(Method::POST, "/chat")
            .with_body("user=Ann")
            .with_param("user", "Ann");

        assert_eq!(req.path(), "chat");
        assert_eq!(req.body(), b"user=Ann");
        assert_eq!(req.body_string().as_deref(), Some("user=Ann"));
        assert_eq!(req.param("user"), Some("Ann"));
    }

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::IncompleteBody { expected: 10, received: 3 };
        assert_eq!(err.to_string(), "Incomplete body: expected 10 bytes, got 3");
    }
}
