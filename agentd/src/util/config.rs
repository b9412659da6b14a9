use std::path::PathBuf;

use agent_core::constants::AGENT_MAX_MSGLEN;
use log::LevelFilter;
use serde::Deserialize;

const SOCKET_VAR: &str = "SSH_AGENT_SOCKET";
const LOG_LEVEL_VAR: &str = "SSH_AGENT_LOG_LEVEL";
const MAX_MSGLEN_VAR: &str = "SSH_AGENT_MAX_MSGLEN";

/// The structure of the TOML config file. Any setting here can be overridden by the
/// corresponding environment variable.
#[derive(Deserialize, Default)]
struct TomlConfig {
	listener_config: Option<ListenerConfig>,
	log_config: Option<LogConfig>,
}

#[derive(Deserialize)]
struct ListenerConfig {
	socket_path: Option<PathBuf>,
	max_msglen: Option<u32>,
}

#[derive(Deserialize)]
struct LogConfig {
	level: Option<String>,
}

/// The result of reading both the environment and an optional config file.
pub(crate) struct Configuration {
	pub(crate) socket_path: PathBuf,
	pub(crate) log_level: LevelFilter,
	pub(crate) max_msglen: u32,
}

#[inline]
fn read_env(env_var: &str) -> Result<Option<String>, String> {
	match std::env::var(env_var) {
		Ok(env) => Ok(Some(env)),
		Err(std::env::VarError::NotPresent) => Ok(None),
		Err(e) => Err(format!("Failed to load the {} environment variable: {}", env_var, e)),
	}
}

fn default_socket_path() -> PathBuf {
	std::env::temp_dir().join(format!("agent.{}", std::process::id()))
}

pub(crate) fn load_configuration(config_file_path: Option<&str>) -> Result<Configuration, String> {
	let TomlConfig { listener_config, log_config } = match config_file_path {
		Some(path) => {
			let config_file = std::fs::read_to_string(path)
				.map_err(|e| format!("Failed to read configuration file: {}", e))?;
			toml::from_str(&config_file)
				.map_err(|e| format!("Failed to parse configuration file: {}", e))?
		},
		None => TomlConfig::default(),
	};

	let socket_env: Option<PathBuf> = read_env(SOCKET_VAR)?.map(PathBuf::from);
	let socket_config = listener_config.as_ref().and_then(|c| c.socket_path.clone());
	let socket_path = socket_env.or(socket_config).unwrap_or_else(default_socket_path);

	let log_level_env: Option<LevelFilter> = read_env(LOG_LEVEL_VAR)?
		.map(|level_str| {
			level_str.parse().map_err(|e| format!("Unable to parse {}: {}", LOG_LEVEL_VAR, e))
		})
		.transpose()?;
	let log_level_config: Option<LevelFilter> = log_config
		.and_then(|config| config.level)
		.map(|level_str| {
			level_str.parse().map_err(|e| format!("Unable to parse log level config value: {}", e))
		})
		.transpose()?;
	let log_level = log_level_env.or(log_level_config).unwrap_or(LevelFilter::Info);

	let max_msglen_env: Option<u32> = read_env(MAX_MSGLEN_VAR)?
		.map(|v| v.parse().map_err(|e| format!("Unable to parse {}: {}", MAX_MSGLEN_VAR, e)))
		.transpose()?;
	let max_msglen_config = listener_config.and_then(|c| c.max_msglen);
	// Configuration may only lower the ceiling, never raise it past the wire-fixed constant.
	let max_msglen = max_msglen_env.or(max_msglen_config).unwrap_or(AGENT_MAX_MSGLEN).min(AGENT_MAX_MSGLEN);

	Ok(Configuration { socket_path, log_level, max_msglen })
}
