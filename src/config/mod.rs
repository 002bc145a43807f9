mod settings;

pub use settings::{PageConfig, Settings, TransportConfig, TransportKind};
