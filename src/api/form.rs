use reqwest::multipart::{Form, Part};
use serde::Serialize;

use crate::deploy::DeploymentConfig;
use crate::worker::{COMPATIBILITY_DATE, WASM_CONTENT_TYPE};

#[derive(Serialize, Debug)]
struct Metadata<'a> {
    main_module: &'a str,
    compatibility_date: &'a str,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    compatibility_flags: &'a [&'a str],
}

/// The multipart body of a module worker upload: a `metadata` part first,
/// then one part per module.
pub(super) fn build_form(config: &DeploymentConfig<'_>) -> Result<Form, reqwest::Error> {
    let meta = config.worker_type.meta();

    let metadata_json = serde_json::json!(&Metadata {
        main_module: meta.main_module,
        compatibility_date: COMPATIBILITY_DATE,
        compatibility_flags: meta.compatibility_flags,
    });
    log::debug!("worker metadata for {}: {}", config.name, metadata_json);

    let metadata = Part::text(metadata_json.to_string())
        .file_name("metadata.json")
        .mime_str("application/json")?;

    let script = Part::text(config.script_content.to_string())
        .file_name(meta.main_module)
        .mime_str(config.worker_type.content_type())?;

    let mut form = Form::new()
        .part("metadata", metadata)
        .part(meta.main_module, script);

    if let (Some(wasm_file), Some(wasm)) = (meta.wasm_file, config.wasm_content) {
        let part = Part::bytes(wasm.to_vec())
            .file_name(wasm_file)
            .mime_str(WASM_CONTENT_TYPE)?;
        form = form.part(wasm_file, part);
    }

    Ok(form)
}
