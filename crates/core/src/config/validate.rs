use super::{types::Config, ConfigError};
use crate::ingest::MIN_CHUNK_SIZE;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Ingest chunk size is at least `MIN_CHUNK_SIZE`
/// - Staged file name is a bare, non-empty file name
/// - Output prefix and extension are non-empty
/// - Temp and output directories differ
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.job.chunk_size < MIN_CHUNK_SIZE {
        return Err(ConfigError::ValidationError(format!(
            "job.chunk_size must be at least {} bytes",
            MIN_CHUNK_SIZE
        )));
    }

    let staged = &config.job.staged_file_name;
    if staged.is_empty() || staged.contains('/') || staged.contains('\\') || staged == ".." {
        return Err(ConfigError::ValidationError(
            "job.staged_file_name must be a plain file name".to_string(),
        ));
    }

    if config.job.output_prefix.is_empty() {
        return Err(ConfigError::ValidationError(
            "job.output_prefix cannot be empty".to_string(),
        ));
    }

    if config.job.output_extension.is_empty() || config.job.output_extension.starts_with('.') {
        return Err(ConfigError::ValidationError(
            "job.output_extension must be non-empty and without a leading dot".to_string(),
        ));
    }

    if config.storage.temp_dir == config.storage.output_dir {
        return Err(ConfigError::ValidationError(
            "storage.temp_dir and storage.output_dir must differ".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = Config::default();
        config.server.port = 0;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_small_chunk_fails() {
        let mut config = Config::default();
        config.job.chunk_size = 512;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_staged_name_with_separator_fails() {
        let mut config = Config::default();
        config.job.staged_file_name = "../input.mp4".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_extension_with_dot_fails() {
        let mut config = Config::default();
        config.job.output_extension = ".mp4".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_same_directories_fails() {
        let mut config = Config::default();
        config.storage.output_dir = config.storage.temp_dir.clone();
        assert!(validate_config(&config).is_err());
    }
}
