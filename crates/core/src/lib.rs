pub mod config;
pub mod media;
pub mod metrics;
pub mod migration;
pub mod pacing;
pub mod processor;
pub mod service;
pub mod testing;
pub mod worker;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use media::{
    CreateMediaRequest, DerivedArtifacts, MediaFilter, MediaItem, MediaStore, ProcessingStatus,
    SqliteMediaStore, StatusUpdate, StoreError,
};
pub use migration::{
    MigrationConfig, MigrationController, MigrationError, MigrationOptions, MigrationRun,
    MigrationState,
};
pub use pacing::{Clock, Pacer, TokioClock};
pub use processor::{
    BatchReport, BatchScheduler, ItemProcessor, ProcessOutcome, ProcessorConfig, ProcessorError,
    SchedulerConfig,
};
pub use service::ProcessingService;
pub use worker::{
    HttpTranscodeWorker, TranscodeError, TranscodeOptions, TranscodeOutput, TranscodeRequest,
    TranscodeWorker, WorkerConfig,
};
