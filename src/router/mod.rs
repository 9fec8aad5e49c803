//! # Tabla de Rutas
//! src/router/mod.rs
//!
//! Mapea paths normalizados a handlers.
//!
//! ```text
//! RequestInfo → RouteTable ─(hit)──► Handler → Response
//!                          └(miss)─► StaticFiles
//! ```
//!
//! La tabla se llena antes de arrancar el servidor y después solo se lee,
//! por eso los workers la comparten sin lock.

use crate::http::{RequestInfo, Response};
use std::collections::HashMap;

/// Capacidad de responder un request
///
/// Cualquier closure `Fn(&RequestInfo) -> Response` que sea `Send + Sync`
/// ya es un handler.
pub trait Handler: Send + Sync {
    fn handle(&self, request: &RequestInfo) -> Response;
}

impl<F> Handler for F
where
    F: Fn(&RequestInfo) -> Response + Send + Sync,
{
    fn handle(&self, request: &RequestInfo) -> Response {
        self(request)
    }
}

/// Router que mapea paths exactos a handlers
#[derive(Default)]
pub struct RouteTable {
    routes: HashMap<String, Box<dyn Handler>>,
}

impl RouteTable {
    /// Crea una tabla vacía
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra una ruta con su handler
    ///
    /// La `/` inicial se quita: `"/chat"` y `"chat"` son la misma ruta.
    /// Registrar dos veces el mismo path reemplaza el handler anterior.
    ///
    /// # Ejemplo
    /// ```
    /// use huji_server::router::RouteTable;
    /// use huji_server::http::{RequestInfo, Response};
    ///
    /// let mut routes = RouteTable::new();
    /// routes.register("/hello", |_req: &RequestInfo| Response::html("<h1>Hello</h1>"));
    /// assert!(routes.contains("hello"));
    /// ```
    pub fn register(&mut self, path: &str, handler: impl Handler + 'static) {
        let key = path.strip_prefix('/').unwrap_or(path);
        self.routes.insert(key.to_string(), Box::new(handler));
    }

    /// Busca el handler de un path ya normalizado
    pub fn lookup(&self, path: &str) -> Option<&dyn Handler> {
        self.routes.get(path).map(|handler| handler.as_ref())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.routes.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Normaliza el path de un request para que sirva de clave de ruteo
///
/// - vacío, `/`, `<assets>` o `<assets>/` → `default_index`
/// - un prefijo `<assets>/` se quita, así `public/style.css` y `style.css`
///   llegan a la misma clave
///
/// # Ejemplo
/// ```
/// use huji_server::router::normalize_path;
///
/// assert_eq!(normalize_path("", "public", "index.html"), "index.html");
/// assert_eq!(normalize_path("public/index.html", "public", "index.html"), "index.html");
/// assert_eq!(normalize_path("chat", "public", "index.html"), "chat");
/// ```
pub fn normalize_path(path: &str, assets_dir: &str, default_index: &str) -> String {
    let path = path.strip_prefix('/').unwrap_or(path);

    if path.is_empty() || path == assets_dir || path.strip_suffix('/') == Some(assets_dir) {
        return default_index.to_string();
    }

    match path
        .strip_prefix(assets_dir)
        .and_then(|rest| rest.strip_prefix('/'))
    {
        Some(rest) if !rest.is_empty() => rest.to_string(),
        _ => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{Method, StatusCode};

    fn ok_handler(_req: &RequestInfo) -> Response {
        Response::html("ok")
    }

    #[test]
    fn test_router_creation() {
        let routes = RouteTable::new();
        assert!(routes.is_empty());
        assert_eq!(routes.len(), 0);
    }

    #[test]
    fn test_register_strips_leading_slash() {
        let mut routes = RouteTable::new();
        routes.register("/status", ok_handler);
        routes.register("greet", ok_handler);

        assert!(routes.contains("status"));
        assert!(routes.contains("greet"));
        assert!(!routes.contains("/status"));
        assert_eq!(routes.len(), 2);
    }

    #[test]
    fn test_lookup_invokes_handler() {
        let mut routes = RouteTable::new();
        routes.register("echo", |req: &RequestInfo| {
            Response::html(req.param("name").unwrap_or("nobody"))
        });

        let req = RequestInfo::new(Method::GET, "/echo?name=Ann");
        let response = routes.lookup(req.path()).unwrap().handle(&req);

        assert_eq!(response.body(), b"Ann");
    }

    #[test]
    fn test_lookup_miss() {
        let routes = RouteTable::new();
        assert!(routes.lookup("missing").is_none());
    }

    #[test]
    fn test_register_twice_replaces() {
        let mut routes = RouteTable::new();
        routes.register("x", ok_handler);
        routes.register("/x", |_req: &RequestInfo| Response::text(StatusCode::NotFound, "gone"));

        let response = routes.lookup("x").unwrap().handle(&RequestInfo::default());
        assert_eq!(response.status_code(), 404);
        assert_eq!(routes.len(), 1);
    }

    #[test]
    fn test_closure_captures_state() {
        let greeting = String::from("hola");
        let mut routes = RouteTable::new();
        routes.register("hi", move |_req: &RequestInfo| Response::html(&greeting));

        let response = routes.lookup("hi").unwrap().handle(&RequestInfo::default());
        assert_eq!(response.body(), b"hola");
    }

    // ==================== Normalización ====================

    #[test]
    fn test_normalize_root_variants() {
        for path in ["", "/", "public", "public/", "/public/"] {
            assert_eq!(normalize_path(path, "public", "index.html"), "index.html", "{path}");
        }
    }

    #[test]
    fn test_normalize_strips_assets_prefix() {
        assert_eq!(normalize_path("public/css/style.css", "public", "index.html"), "css/style.css");
        assert_eq!(normalize_path("index.html", "public", "index.html"), "index.html");
    }

    #[test]
    fn test_normalize_keeps_similar_prefixes() {
        assert_eq!(normalize_path("publications", "public", "index.html"), "publications");
        assert_eq!(normalize_path("chat", "public", "index.html"), "chat");
    }
}
