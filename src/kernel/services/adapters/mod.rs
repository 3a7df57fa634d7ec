//! Service adapters: OS/runtime specific implementations (IO/async).

pub mod dirs;
pub mod python;
pub mod runtime;
pub mod settings;

pub use dirs::{ensure_log_dir, get_app_data_dir, get_config_dir, get_log_dir};
pub use python::PythonGateway;
pub use runtime::{AsyncRuntime, TokioExecutor};
pub use settings::{
    get_settings_path, load_runtime_config, load_runtime_config_from, load_settings,
    load_settings_from, save_runtime_config_to, save_settings, save_settings_to,
};
