//! # Códigos de Estado HTTP
//! src/http/status.rs
//!
//! Códigos que el núcleo del servidor produce por sí mismo. Los handlers
//! pueden usar cualquier otro código con `Response::with_status`.
//!
//! - **2xx**: Éxito (200 OK)
//! - **3xx**: Redirección (303 para el patrón Post/Redirect/Get)
//! - **4xx**: Error del cliente (400, 403, 404, 413)
//! - **5xx**: Error del servidor (500)

/// Códigos de estado conocidos por el servidor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK - La petición fue exitosa
    Ok = 200,

    /// 303 See Other - Redirigir después de un POST
    SeeOther = 303,

    /// 400 Bad Request - Request line o Content-Length ilegibles
    BadRequest = 400,

    /// 403 Forbidden - Intento de directory traversal
    Forbidden = 403,

    /// 404 Not Found - Archivo estático inexistente
    NotFound = 404,

    /// 413 Payload Too Large - Body declarado mayor a MAX_PAYLOAD_SIZE
    PayloadTooLarge = 413,

    /// 500 Internal Server Error - El handler falló
    InternalServerError = 500,
}

impl StatusCode {
    /// Convierte el código a su valor numérico
    ///
    /// # Ejemplo
    /// ```
    /// use huji_server::http::StatusCode;
    /// assert_eq!(StatusCode::PayloadTooLarge.as_u16(), 413);
    /// ```
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Retorna el texto de razón (reason phrase) asociado al código
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::SeeOther => "See Other",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
            StatusCode::PayloadTooLarge => "Payload Too Large",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }

    /// Verifica si el código indica error (4xx o 5xx)
    pub fn is_error(&self) -> bool {
        self.as_u16() >= 400
    }
}

impl std::fmt::Display for StatusCode {
    /// Formato: "200 OK"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}
