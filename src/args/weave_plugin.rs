use std::path::PathBuf;

use weave_plugin::{protocol::network::Scope, server::Endpoint};

use crate::common::logging::parse_log_level;

/// Socket serving global-scope networks
pub const DEFAULT_SOCKET: &str = "/run/docker/plugins/weave.sock";

/// Socket serving local-scope networks and IPAM
pub const DEFAULT_MESH_SOCKET: &str = "/run/docker/plugins/weavemesh.sock";

/// Where the allocator's HTTP API listens
pub const DEFAULT_ALLOCATOR: &str = "127.0.0.1:6784";

#[derive(clap::Parser)]
#[clap(
    name = "weave plugin",
    bin_name = "weave-plugin",
    author,
    version,
    about = "Docker network and IPAM plugin for weave",
    long_about = None
)]
pub struct Args {
    #[command(flatten)]
    config_data: Config,

    /// Path to a config file to read
    #[clap(short = 'c', long = "config", conflicts_with = "Config")]
    config_file: Option<PathBuf>,

    /// Enable verbose logging
    #[clap(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Read the configuration from the config file if one was given, otherwise from the CLI
    pub fn data(&self) -> Result<Config, Box<dyn std::error::Error>> {
        match self.config_file {
            Some(ref path) => {
                let file = std::fs::File::open(path).map_err(|error| {
                    format!("Unable to open config file {}: {}", path.display(), error)
                })?;
                Ok(serde_json::from_reader(file)?)
            }
            None => Ok(self.config_data.clone()),
        }
    }
}

/// Program configuration. Specifiable via either CLI args or a config file
#[derive(Debug, clap::Args, serde::Deserialize, Clone, PartialEq, Eq)]
#[group()]
#[serde(default)]
pub struct Config {
    /// Logging level (debug, info, warning, error)
    #[clap(long, default_value = "info", value_parser = parse_log_level)]
    #[serde(deserialize_with = "crate::common::logging::deserialize_log_level")]
    pub log_level: log::LevelFilter,

    /// Socket on which to listen. An empty path disables it
    #[clap(long = "socket", default_value = DEFAULT_SOCKET)]
    pub socket: String,

    /// Socket on which to listen in mesh mode. An empty path disables it
    #[clap(long = "meshsocket", default_value = DEFAULT_MESH_SOCKET)]
    #[serde(rename = "meshsocket")]
    pub mesh_socket: String,

    /// Do not add a multicast route to network endpoints
    #[clap(long)]
    pub no_multicast_route: bool,

    /// `host:port` of the allocator's HTTP API, looked up again on every call
    #[clap(long, default_value = DEFAULT_ALLOCATOR)]
    pub allocator: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: log::LevelFilter::Info,
            socket: DEFAULT_SOCKET.to_owned(),
            mesh_socket: DEFAULT_MESH_SOCKET.to_owned(),
            no_multicast_route: false,
            allocator: DEFAULT_ALLOCATOR.to_owned(),
        }
    }
}

impl Config {
    /// The endpoints to serve. Only the mesh endpoint answers IPAM calls
    pub fn endpoints(&self) -> Vec<Endpoint> {
        let mut endpoints = Vec::new();
        if !self.socket.is_empty() {
            endpoints.push(Endpoint::new(&self.socket, Scope::Global, false));
        }
        if !self.mesh_socket.is_empty() {
            endpoints.push(Endpoint::new(&self.mesh_socket, Scope::Local, true));
        }
        endpoints
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["weave-plugin"]).unwrap();
        let config = args.data().unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(
            config.endpoints(),
            vec![
                Endpoint::new(DEFAULT_SOCKET, Scope::Global, false),
                Endpoint::new(DEFAULT_MESH_SOCKET, Scope::Local, true),
            ]
        );
    }

    #[test]
    fn test_cli_overrides() {
        let args = Args::try_parse_from([
            "weave-plugin",
            "--log-level",
            "warning",
            "--socket",
            "",
            "--meshsocket",
            "/tmp/mesh.sock",
            "--no-multicast-route",
            "--allocator",
            "weave:6784",
            "-v",
        ])
        .unwrap();
        assert!(args.verbose);

        let config = args.data().unwrap();
        assert_eq!(config.log_level, log::LevelFilter::Warn);
        assert!(config.no_multicast_route);
        assert_eq!(config.allocator, "weave:6784");
        assert_eq!(
            config.endpoints(),
            vec![Endpoint::new("/tmp/mesh.sock", Scope::Local, true)]
        );
    }

    #[test]
    fn test_version() {
        let error = Args::try_parse_from(["weave-plugin", "--version"])
            .err()
            .unwrap();
        assert_eq!(error.kind(), clap::error::ErrorKind::DisplayVersion);
        assert_eq!(
            error.to_string().trim_end(),
            format!("weave plugin {}", env!("CARGO_PKG_VERSION"))
        );
    }

    #[test]
    fn test_bad_log_level() {
        assert!(Args::try_parse_from(["weave-plugin", "--log-level", "chatty"]).is_err());
    }

    #[test]
    fn test_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weave-plugin.json");
        std::fs::write(
            &path,
            r#"{"log_level": "debug", "meshsocket": "", "allocator": "10.0.0.1:6784"}"#,
        )
        .unwrap();

        let args =
            Args::try_parse_from(["weave-plugin", "-c", path.to_str().unwrap()]).unwrap();
        let config = args.data().unwrap();
        assert_eq!(config.log_level, log::LevelFilter::Debug);
        assert_eq!(config.socket, DEFAULT_SOCKET);
        assert_eq!(config.allocator, "10.0.0.1:6784");
        assert_eq!(
            config.endpoints(),
            vec![Endpoint::new(DEFAULT_SOCKET, Scope::Global, false)]
        );
    }

    #[test]
    fn test_missing_config_file() {
        let args = Args::try_parse_from(["weave-plugin", "-c", "/nonexistent/weave-plugin.json"])
            .unwrap();
        assert!(args.data().is_err());
    }

    #[test]
    fn test_config_file_conflicts_with_cli_settings() {
        assert!(Args::try_parse_from([
            "weave-plugin",
            "-c",
            "/etc/weave-plugin/weave-plugin.json",
            "--socket",
            "/tmp/weave.sock",
        ])
        .is_err());
    }
}
