//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración por argumentos CLI y variables de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./huji_server --port 8080 --workers 8 --public-dir ./public
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! HTTP_PORT=8080 WORKERS=8 CHAT_DB=/var/lib/chat.jsonl ./huji_server
//! ```
//!
//! ### Archivo `server.conf`
//! ```text
//! port=9090
//! threads=8
//! ```
//!
//! El archivo es opcional y solo pisa los valores por defecto: un flag o una
//! variable de entorno siempre gana.

use crate::server::ServerConfig;
use clap::parser::ValueSource;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser};
use std::fs;
use std::io;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Configuración del proceso
#[derive(Debug, Clone, Parser)]
#[command(name = "huji_server")]
#[command(about = "Servidor HTTP/1.1 con pool de workers y keep-alive")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Puerto en el que escucha el servidor
    #[arg(short, long, default_value = "8080", env = "HTTP_PORT")]
    pub port: u16,

    /// Dirección IPv4 en la que escucha
    #[arg(long, default_value = "0.0.0.0", env = "HTTP_HOST")]
    pub host: String,

    // === Concurrencia ===

    /// Número de workers que atienden conexiones
    #[arg(short, long, default_value = "4", env = "WORKERS")]
    pub workers: usize,

    /// Conexiones pendientes antes de accept()
    #[arg(long, default_value = "100", env = "BACKLOG")]
    pub backlog: i32,

    /// Timeout de lectura por conexión, en segundos
    #[arg(long = "read-timeout-secs", default_value = "5", env = "READ_TIMEOUT_SECS")]
    pub read_timeout_secs: u64,

    // === Archivos ===

    /// Directorio de archivos estáticos
    #[arg(long = "public-dir", default_value = "public", env = "PUBLIC_DIR")]
    pub public_dir: PathBuf,

    /// Archivo de persistencia del chat (JSON lines)
    #[arg(long = "db-path", default_value = "chat_db.jsonl", env = "CHAT_DB")]
    pub db_path: PathBuf,

    /// Archivo opcional con líneas `port=` y `threads=`
    #[arg(long = "config", default_value = "server.conf", env = "SERVER_CONF")]
    pub config_file: PathBuf,
}

/// Valores leídos de `server.conf`
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FileOverrides {
    pub port: Option<u16>,
    pub threads: Option<usize>,
}

/// Parsea el contenido de `server.conf`
///
/// Cada línea es `clave=valor`. Solo se reconocen `port` y `threads`; las
/// líneas sin `=`, las vacías, los comentarios con `#` y las claves
/// desconocidas se ignoran. Si una clave se repite gana la última.
pub fn parse_conf_file(contents: &str) -> Result<FileOverrides, String> {
    let mut overrides = FileOverrides::default();

    for (number, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim();

        match key.trim() {
            "port" => {
                let port = value
                    .parse()
                    .map_err(|_| format!("line {}: invalid port '{}'", number + 1, value))?;
                overrides.port = Some(port);
            }
            "threads" => {
                let threads = value
                    .parse()
                    .map_err(|_| format!("line {}: invalid threads '{}'", number + 1, value))?;
                overrides.threads = Some(threads);
            }
            _ => {}
        }
    }

    Ok(overrides)
}

impl Config {
    /// Parsea argumentos CLI y variables de entorno, y después `server.conf`
    pub fn load() -> Result<Self, String> {
        Self::from_matches(&Self::command().get_matches())
    }

    /// Igual que `load` pero a partir de matches ya parseados
    pub fn from_matches(matches: &ArgMatches) -> Result<Self, String> {
        let mut config = Self::from_arg_matches(matches).map_err(|e| e.to_string())?;

        match read_conf_file(&config.config_file)? {
            Some(overrides) => {
                config.apply_file(&overrides, matches);
                info!(
                    file = %config.config_file.display(),
                    port = config.port,
                    workers = config.workers,
                    "loaded config file"
                );
            }
            None => info!(
                file = %config.config_file.display(),
                "no config file found, using defaults"
            ),
        }

        Ok(config)
    }

    /// Aplica lo leído del archivo a los campos que quedaron en su default
    fn apply_file(&mut self, overrides: &FileOverrides, matches: &ArgMatches) {
        if let Some(port) = overrides.port {
            if is_default(matches, "port") {
                self.port = port;
            }
        }
        if let Some(threads) = overrides.threads {
            if is_default(matches, "workers") {
                self.workers = threads;
            }
        }
    }

    /// Dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use huji_server::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "0.0.0.0:8080");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Valida la configuración
    pub fn validate(&self) -> Result<(), String> {
        if self.host.parse::<Ipv4Addr>().is_err() {
            return Err(format!("Host must be an IPv4 address, got '{}'", self.host));
        }
        if self.workers == 0 {
            return Err("Workers must be >= 1".to_string());
        }
        if self.backlog <= 0 {
            return Err("Backlog must be >= 1".to_string());
        }
        if self.read_timeout_secs == 0 {
            return Err("Read timeout must be > 0".to_string());
        }
        if self.public_dir.as_os_str().is_empty() {
            return Err("Public dir must not be empty".to_string());
        }

        Ok(())
    }

    /// Configuración del núcleo del servidor
    pub fn server_config(&self) -> Result<ServerConfig, String> {
        self.validate()?;
        let host = self
            .host
            .parse::<Ipv4Addr>()
            .map_err(|e| format!("Invalid host '{}': {}", self.host, e))?;

        Ok(ServerConfig {
            host,
            port: self.port,
            workers: self.workers,
            backlog: self.backlog,
            read_timeout: Duration::from_secs(self.read_timeout_secs),
            public_dir: self.public_dir.clone(),
            ..ServerConfig::default()
        })
    }

    /// Imprime un resumen de la configuración
    pub fn print_summary(&self) {
        println!("╔══════════════════════════════════════════════════════════════╗");
        println!("║              HTTP/1.1 Server Configuration                   ║");
        println!("╚══════════════════════════════════════════════════════════════╝");
        println!();
        println!("🌐 Network:");
        println!("   Address:      {}", self.address());
        println!("   Backlog:      {}", self.backlog);
        println!("   Read timeout: {} s", self.read_timeout_secs);
        println!();
        println!("👷 Workers:      {}", self.workers);
        println!();
        println!("📁 Files:");
        println!("   Public dir:   {}", self.public_dir.display());
        println!("   Chat DB:      {}", self.db_path.display());
        println!("   Config file:  {}", self.config_file.display());
        println!();
        println!("═══════════════════════════════════════════════════════════════");
        println!();
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".to_string(),
            workers: 4,
            backlog: 100,
            read_timeout_secs: 5,
            public_dir: PathBuf::from("public"),
            db_path: PathBuf::from("chat_db.jsonl"),
            config_file: PathBuf::from("server.conf"),
        }
    }
}

/// Lee `server.conf`; `None` si no existe
fn read_conf_file(path: &Path) -> Result<Option<FileOverrides>, String> {
    match fs::read_to_string(path) {
        Ok(contents) => parse_conf_file(&contents)
            .map(Some)
            .map_err(|e| format!("{}: {}", path.display(), e)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(format!("could not read {}: {}", path.display(), e)),
    }
}

/// El valor no vino ni de la línea de comandos ni del entorno
fn is_default(matches: &ArgMatches, id: &str) -> bool {
    matches!(matches.value_source(id), None | Some(ValueSource::DefaultValue))
}
