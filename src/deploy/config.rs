use crate::worker::WorkerType;

/// Everything needed to deploy one worker. Built fresh for every attempt and
/// never persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct DeploymentConfig<'a> {
    pub name: String,
    pub script_content: &'a str,
    pub worker_type: WorkerType,
    pub wasm_content: Option<&'a [u8]>,
}
