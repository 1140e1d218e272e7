pub mod config;
pub mod engine;
pub mod ingest;
pub mod metrics;
pub mod orchestrator;
pub mod status;
pub mod storage;
pub mod testing;

pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config,
    ConfigError, ServerConfig,
};
pub use engine::{EngineConfig, FfmpegEngine, TranscodeEngine, TranscodeInvoker};
pub use ingest::{FileSource, IngestError, SourceHandle, SourceIngestor, StagedFile};
pub use orchestrator::{JobConfig, JobFailure, JobOrchestrator, JobSnapshot, JobState, SubmitError};
pub use status::{
    BroadcastSink, ChannelSink, FanoutSink, LogSink, StatusDetail, StatusEvent, StatusSink,
};
pub use storage::{AccessGrant, FsStorageGate, StorageConfig, StorageDirs, StorageError, StorageGate};
