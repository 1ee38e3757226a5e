/// Failures loading or validating supervisor settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings yaml in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid settings: {0}")]
    Settings(String),
    #[error("cannot locate settings: neither ${env} nor $HOME is set", env = super::CONFIG_PATH_ENV)]
    HomeDirectoryUnavailable,
}
