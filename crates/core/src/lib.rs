pub mod config;
pub mod cycle;
pub mod metrics;
pub mod notifier;
pub mod sink;
pub mod source;
pub mod status;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use cycle::{
    BoundedTaskPool, CycleConfig, FetchBatch, FetchError, FetchStream, Getter, ImportCycle,
    NotifyError, Notifier, StoreError, Storer,
};
pub use notifier::{create_notifier, NoopNotifier, WebhookNotifier};
pub use sink::HttpStorer;
pub use source::HttpGetter;
pub use status::{
    ChildStatus, FetchStatus, NotifyStatus, SqliteStatusStore, StatusDocument, StatusError,
    StatusFilter, StatusStore,
};
