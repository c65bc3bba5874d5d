use std::path::PathBuf;

/// Get the annodb home directory
/// Checks ANNODB_HOME environment variable, falls back to ${HOME}/.annodb
pub fn annodb_home() -> PathBuf {
    if let Ok(path) = std::env::var("ANNODB_HOME") {
        PathBuf::from(path)
    } else {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".annodb")
    }
}

/// Directory holding generated or downloaded databases
pub fn databases_dir() -> PathBuf {
    annodb_home().join("databases")
}

/// Scratch directory for archives and extracted dumps
pub fn temp_dir() -> PathBuf {
    annodb_home().join("tmp")
}

/// Default location of the SQL database
pub fn default_sql_path() -> PathBuf {
    databases_dir().join("annodb_database.db")
}

/// Default location of the serialized database
pub fn default_serialized_path() -> PathBuf {
    databases_dir().join("annodb_database.bin")
}

/// Default location of the configuration file
pub fn default_config_path() -> PathBuf {
    annodb_home().join("config.toml")
}

/// Get a human-readable description of the current path configuration
pub fn describe_paths() -> String {
    format!(
        "annodb paths:\n  \
        Home: {}\n  \
        Databases: {}\n  \
        Temp: {}\n  \
        Custom: {}",
        annodb_home().display(),
        databases_dir().display(),
        temp_dir().display(),
        if std::env::var("ANNODB_HOME").is_ok() { "Yes" } else { "No (using defaults)" }
    )
}
