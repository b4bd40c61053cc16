mod source;

pub use source::{load_source, SourceError, WorkerSource};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CommandError;

/// Compatibility date sent with every worker upload.
pub const COMPATIBILITY_DATE: &str = "2024-04-01";

pub const WASM_CONTENT_TYPE: &str = "application/wasm";

/// The language family a proxy worker is written in.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum WorkerType {
    Python,
    Rust,
    Js,
    Ts,
}

impl WorkerType {
    pub const ALL: [WorkerType; 4] = [
        WorkerType::Python,
        WorkerType::Rust,
        WorkerType::Js,
        WorkerType::Ts,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WorkerType::Python => "python",
            WorkerType::Rust => "rust",
            WorkerType::Js => "js",
            WorkerType::Ts => "ts",
        }
    }

    /// How a worker of this type is laid out on disk and uploaded.
    pub fn meta(self) -> WorkerMeta {
        match self {
            WorkerType::Python => WorkerMeta {
                main_module: "worker.py",
                source_file: "worker.py",
                compatibility_flags: &["python_workers"],
                wasm_file: None,
            },
            WorkerType::Js => WorkerMeta {
                main_module: "worker.js",
                source_file: "worker.js",
                compatibility_flags: &[],
                wasm_file: None,
            },
            WorkerType::Rust => WorkerMeta {
                main_module: "worker.js",
                source_file: "index.js",
                compatibility_flags: &[],
                wasm_file: Some("index_bg.wasm"),
            },
            WorkerType::Ts => WorkerMeta {
                main_module: "worker.js",
                source_file: "dist/worker.js",
                compatibility_flags: &[],
                wasm_file: None,
            },
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            WorkerType::Python => "text/x-python",
            WorkerType::Rust | WorkerType::Js | WorkerType::Ts => "application/javascript+module",
        }
    }
}

impl Default for WorkerType {
    fn default() -> Self {
        WorkerType::Ts
    }
}

impl fmt::Display for WorkerType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for WorkerType {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "python" => Ok(WorkerType::Python),
            "rust" => Ok(WorkerType::Rust),
            "js" => Ok(WorkerType::Js),
            "ts" => Ok(WorkerType::Ts),
            _ => Err(CommandError::Config(format!(
                "Invalid worker type '{}'. Must be 'python', 'rust', 'js', or 'ts'.",
                s
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkerMeta {
    /// Module name the platform runs as the entrypoint.
    pub main_module: &'static str,
    /// Artifact path, relative to the worker type's directory.
    pub source_file: &'static str,
    pub compatibility_flags: &'static [&'static str],
    pub wasm_file: Option<&'static str>,
}
