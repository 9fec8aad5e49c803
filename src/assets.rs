//! # Archivos Estáticos
//! src/assets.rs
//!
//! Fallback del ruteo: sirve archivos de un directorio raíz fijo.
//! Sin caché, sin GET condicional, sin rangos.

use crate::http::{Response, StatusCode};
use std::fs;
use std::path::{Path, PathBuf};

/// Tabla extensión → MIME type
const MIME_TYPES: [(&str, &str); 6] = [
    ("html", "text/html"),
    ("css", "text/css"),
    ("js", "application/javascript"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
];

/// MIME type según la extensión del archivo; `text/plain` si no se conoce
///
/// # Ejemplo
/// ```
/// use huji_server::assets::mime_type;
///
/// assert_eq!(mime_type("css/site.css"), "text/css");
/// assert_eq!(mime_type("README"), "text/plain");
/// ```
pub fn mime_type(path: &str) -> &'static str {
    let extension = match Path::new(path).extension().and_then(|ext| ext.to_str()) {
        Some(ext) => ext,
        None => return "text/plain",
    };

    MIME_TYPES
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, mime)| *mime)
        .unwrap_or("text/plain")
}

/// Resolver de archivos bajo un directorio raíz
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Nombre del directorio raíz (ej: "public"), usado al normalizar paths
    pub fn dir_name(&self) -> String {
        self.root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Resuelve un path ya normalizado
    ///
    /// - cualquier `..` en el path → 403, aunque no escape de la raíz
    /// - archivo legible → 200 con el contenido completo y su MIME type
    /// - si no se puede abrir → 404
    pub fn resolve(&self, path: &str) -> Response {
        if path.contains("..") {
            return Response::new(StatusCode::Forbidden)
                .with_body("<h1>403 Forbidden: Directory traversal detected</h1>");
        }

        let full_path = self.root.join(path.trim_start_matches('/'));
        match fs::read(&full_path) {
            Ok(content) => Response::new(StatusCode::Ok)
                .with_content_type(mime_type(path))
                .with_body_bytes(content),
            Err(e) => {
                tracing::debug!(path = %full_path.display(), error = %e, "static file not served");
                Response::new(StatusCode::NotFound).with_body("<h1>404: File Not Found</h1>")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn sandbox() -> (tempfile::TempDir, StaticFiles) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<h1>Home</h1>").unwrap();
        fs::write(dir.path().join("style.css"), "body { color: red; }").unwrap();
        fs::write(dir.path().join("logo.png"), [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A]).unwrap();
        fs::create_dir(dir.path().join("js")).unwrap();
        fs::write(dir.path().join("js").join("app.js"), "console.log(1);").unwrap();
        let files = StaticFiles::new(dir.path());
        (dir, files)
    }

    // ==================== MIME ====================

    #[test]
    fn test_mime_table() {
        assert_eq!(mime_type("index.html"), "text/html");
        assert_eq!(mime_type("style.css"), "text/css");
        assert_eq!(mime_type("app.js"), "application/javascript");
        assert_eq!(mime_type("logo.png"), "image/png");
        assert_eq!(mime_type("photo.jpg"), "image/jpeg");
        assert_eq!(mime_type("photo.jpeg"), "image/jpeg");
    }

    #[test]
    fn test_mime_fallback() {
        assert_eq!(mime_type("notes.txt"), "text/plain");
        assert_eq!(mime_type("archive.tar.gz"), "text/plain");
        assert_eq!(mime_type("Makefile"), "text/plain");
    }

    // ==================== Resolve ====================

    #[test]
    fn test_resolve_existing_file() {
        let (_dir, files) = sandbox();
        let response = files.resolve("index.html");

        assert_eq!(response.status_code(), 200);
        assert_eq!(response.content_type(), "text/html");
        assert_eq!(response.body(), b"<h1>Home</h1>");
    }

    #[test]
    fn test_resolve_binary_content_length_matches() {
        let (_dir, files) = sandbox();
        let response = files.resolve("logo.png");
        let text = String::from_utf8_lossy(&response.to_bytes()).into_owned();

        assert_eq!(response.content_type(), "image/png");
        assert!(text.contains("Content-Length: 6\r\n"));
    }

    #[test]
    fn test_resolve_nested_file() {
        let (_dir, files) = sandbox();
        let response = files.resolve("js/app.js");

        assert_eq!(response.status_code(), 200);
        assert_eq!(response.content_type(), "application/javascript");
    }

    #[test]
    fn test_resolve_missing_file() {
        let (_dir, files) = sandbox();
        let response = files.resolve("missing.html");

        assert_eq!(response.status_code(), 404);
        assert_eq!(response.status_text(), "Not Found");
    }

    #[test]
    fn test_resolve_directory_is_not_found() {
        let (_dir, files) = sandbox();
        assert_eq!(files.resolve("js").status_code(), 404);
    }

    #[test]
    fn test_traversal_is_forbidden() {
        let (_dir, files) = sandbox();

        for path in ["../etc/passwd", "js/../index.html", "a..b.html", ".."] {
            assert_eq!(files.resolve(path).status_code(), 403, "{path}");
        }
    }

    #[test]
    fn test_dir_name() {
        let files = StaticFiles::new("./site/public");
        assert_eq!(files.dir_name(), "public");
    }
}
