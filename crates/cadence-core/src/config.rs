use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 54030;
pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const MAX_FRAME_BYTES: usize = 1024 * 1024; // 1 MiB hard cap per request frame
pub const REQUEST_READ_TIMEOUT_MS: u64 = 10_000; // drop connections that never send
pub const DISPATCH_QUEUE_CAPACITY: usize = 256;
pub const DEFAULT_SHELL: &str = "sh";
pub const DEFAULT_MAX_OUTPUT_CHARS: usize = 4_000;

/// Top-level config (cadence.toml + CADENCE_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CadenceConfig {
    #[serde(default)]
    pub daemon: DaemonConfig,
    #[serde(default)]
    pub exec: ExecConfig,
}

/// Listener and dispatch settings for `cadenced`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// How long a fresh connection may take to deliver its single request.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    /// Largest request frame accepted; values above `MAX_FRAME_BYTES` are
    /// clamped by the codec.
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
    /// Capacity of the dispatcher's command queue.
    #[serde(default = "default_dispatch_queue")]
    pub dispatch_queue: usize,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            read_timeout_ms: default_read_timeout_ms(),
            max_frame_bytes: default_max_frame_bytes(),
            dispatch_queue: default_dispatch_queue(),
        }
    }
}

impl DaemonConfig {
    /// `host:port` string suitable for `TcpListener::bind` / `TcpStream::connect`.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

/// How job commands are handed to the shell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecConfig {
    /// Interpreter invoked as `<shell> -c <command>`.
    #[serde(default = "default_shell")]
    pub shell: String,
    /// Per-stream cap on captured output before middle omission.
    #[serde(default = "default_max_output_chars")]
    pub max_output_chars: usize,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            shell: default_shell(),
            max_output_chars: default_max_output_chars(),
        }
    }
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_read_timeout_ms() -> u64 {
    REQUEST_READ_TIMEOUT_MS
}
fn default_max_frame_bytes() -> usize {
    MAX_FRAME_BYTES
}
fn default_dispatch_queue() -> usize {
    DISPATCH_QUEUE_CAPACITY
}
fn default_shell() -> String {
    DEFAULT_SHELL.to_string()
}
fn default_max_output_chars() -> usize {
    DEFAULT_MAX_OUTPUT_CHARS
}

impl CadenceConfig {
    /// Load config from a TOML file with CADENCE_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. `CADENCE_CONFIG` env var
    ///   3. ~/.cadence/cadence.toml
    ///
    /// A missing file is not an error; every field has a default. Nested
    /// keys use a double underscore, e.g. `CADENCE_DAEMON__PORT=6000`.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .or_else(|| std::env::var("CADENCE_CONFIG").ok())
            .unwrap_or_else(default_config_path);

        let config: CadenceConfig = Figment::from(Serialized::defaults(CadenceConfig::default()))
            .merge(Toml::file(&path))
            .merge(Env::prefixed("CADENCE_").ignore(&["CONFIG"]).split("__"))
            .extract()
            .map_err(|e| crate::error::CadenceError::Config(e.to_string()))?;

        tracing::debug!(path = %path, addr = %config.daemon.addr(), "configuration loaded");
        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.cadence/cadence.toml", home)
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_listen_on_loopback_54030() {
        let config = CadenceConfig::default();
        assert_eq!(config.daemon.port, 54030);
        assert_eq!(config.daemon.addr(), "127.0.0.1:54030");
        assert_eq!(config.exec.shell, "sh");
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        Jail::expect_with(|jail| {
            let path = jail.directory().join("absent.toml");
            let config = CadenceConfig::load(path.to_str()).expect("load");
            assert_eq!(config.daemon.port, DEFAULT_PORT);
            assert_eq!(config.daemon.read_timeout_ms, REQUEST_READ_TIMEOUT_MS);
            Ok(())
        });
    }

    #[test]
    fn toml_then_env_overrides() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "cadence.toml",
                r#"
                [daemon]
                port = 6000
                bind = "0.0.0.0"

                [exec]
                shell = "bash"
                "#,
            )?;
            jail.set_env("CADENCE_DAEMON__READ_TIMEOUT_MS", "250");

            let config = CadenceConfig::load(Some("cadence.toml")).expect("load");
            assert_eq!(config.daemon.addr(), "0.0.0.0:6000");
            assert_eq!(config.daemon.read_timeout_ms, 250);
            assert_eq!(config.exec.shell, "bash");
            assert_eq!(config.exec.max_output_chars, DEFAULT_MAX_OUTPUT_CHARS);
            Ok(())
        });
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        Jail::expect_with(|jail| {
            jail.create_file("cadence.toml", "[daemon]\nport = \"not a port\"\n")?;
            let err = CadenceConfig::load(Some("cadence.toml")).unwrap_err();
            assert_eq!(err.code(), "CONFIG_ERROR");
            Ok(())
        });
    }
}
