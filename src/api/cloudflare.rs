use std::path::PathBuf;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

use super::form::build_form;
use super::{
    worker_name, ApiError, ApiErrorDetail, TokenApi, TokenDetails, TokenVerification, WorkersApi,
};
use crate::deploy::DeploymentConfig;
use crate::http::{self, CF_API_BASE};
use crate::settings::Settings;
use crate::worker::{load_source, SourceError, WorkerSource, WorkerType};

// Returned when an account has never registered a workers.dev subdomain.
const NO_SUBDOMAIN_CODE: u16 = 10007;

/// `WorkersApi` and `TokenApi` backed by the Cloudflare v4 REST API.
pub struct CloudflareClient {
    client: Client,
    base_url: String,
    account_id: String,
    worker_prefix: String,
    workers_dir: PathBuf,
    subdomain: OnceCell<String>,
}

#[derive(Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<ApiErrorDetail>,
    result: Option<T>,
}

#[derive(Serialize, Deserialize)]
struct Subdomain {
    subdomain: String,
}

#[derive(Deserialize)]
struct ScriptSummary {
    id: String,
}

impl CloudflareClient {
    pub fn new(settings: &Settings) -> Result<Self, ApiError> {
        CloudflareClient::with_base_url(settings, CF_API_BASE)
    }

    /// A client for an API served from `base_url` instead of
    /// api.cloudflare.com.
    pub(crate) fn with_base_url(
        settings: &Settings,
        base_url: impl Into<String>,
    ) -> Result<Self, ApiError> {
        Ok(CloudflareClient {
            client: http::auth_client(&settings.api_token)?,
            base_url: base_url.into(),
            account_id: settings.account_id.clone(),
            worker_prefix: settings.worker_prefix.clone(),
            workers_dir: settings.workers_dir.clone(),
            subdomain: OnceCell::new(),
        })
    }

    fn account_url(&self, path: &str) -> String {
        format!("{}/accounts/{}/{}", self.base_url, self.account_id, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Option<T>, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        log::debug!("Status Code: {}", status);
        log::trace!("Response: {}", text);

        let envelope: Envelope<T> = match serde_json::from_str(&text) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(ApiError::Api {
                    status,
                    errors: vec![],
                })
            }
            Err(e) => return Err(ApiError::Decode(e.to_string())),
        };

        if !status.is_success() || !envelope.success {
            return Err(ApiError::Api {
                status,
                errors: envelope.errors,
            });
        }
        Ok(envelope.result)
    }

    async fn get_subdomain(&self) -> Result<Option<String>, ApiError> {
        let request = self.client.get(&self.account_url("workers/subdomain"));
        match self.send::<Subdomain>(request).await {
            Ok(result) => Ok(result.map(|s| s.subdomain).filter(|s| !s.is_empty())),
            Err(e) if e.has_code(NO_SUBDOMAIN_CODE) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn register_subdomain(&self) -> Result<String, ApiError> {
        let name = worker_name(&self.worker_prefix);
        log::info!("Registering workers.dev subdomain {}", name);
        let request = self
            .client
            .put(&self.account_url("workers/subdomain"))
            .json(&Subdomain {
                subdomain: name.clone(),
            });
        let registered: Option<Subdomain> = self.send(request).await?;
        Ok(registered.map(|s| s.subdomain).unwrap_or(name))
    }

    async fn enable_workers_dev(&self, name: &str) -> Result<(), ApiError> {
        let request = self
            .client
            .post(&self.account_url(&format!("workers/scripts/{}/subdomain", name)))
            .json(&serde_json::json!({ "enabled": true }));
        self.send::<serde_json::Value>(request).await?;
        Ok(())
    }
}

#[async_trait]
impl WorkersApi for CloudflareClient {
    async fn generate_worker_name(&self) -> Result<String, ApiError> {
        Ok(worker_name(&self.worker_prefix))
    }

    async fn ensure_subdomain(&self) -> Result<String, ApiError> {
        let subdomain = self
            .subdomain
            .get_or_try_init(|| async {
                log::info!("checking that a workers.dev subdomain is registered");
                match self.get_subdomain().await? {
                    Some(subdomain) => Ok(subdomain),
                    None => self.register_subdomain().await,
                }
            })
            .await?;
        Ok(subdomain.clone())
    }

    fn get_worker_source(&self, worker_type: WorkerType) -> Result<WorkerSource, SourceError> {
        load_source(&self.workers_dir, worker_type)
    }

    async fn deploy_worker(&self, config: &DeploymentConfig<'_>) -> Result<String, ApiError> {
        let subdomain = self.ensure_subdomain().await?;

        log::info!("uploading worker {} ({})", config.name, config.worker_type);
        let request = self
            .client
            .put(&self.account_url(&format!("workers/scripts/{}", config.name)))
            .multipart(build_form(config)?);
        self.send::<serde_json::Value>(request).await?;

        self.enable_workers_dev(&config.name).await?;

        Ok(format!("https://{}.{}.workers.dev", config.name, subdomain))
    }

    async fn list_workers(&self) -> Result<Vec<String>, ApiError> {
        let request = self.client.get(&self.account_url("workers/scripts"));
        let scripts: Vec<ScriptSummary> = self.send(request).await?.unwrap_or_default();
        let prefix = format!("{}-", self.worker_prefix);
        Ok(scripts
            .into_iter()
            .map(|s| s.id)
            .filter(|id| id.starts_with(&prefix))
            .collect())
    }

    async fn delete_worker(&self, name: &str) -> Result<(), ApiError> {
        log::info!("deleting worker {}", name);
        let request = self
            .client
            .delete(&self.account_url(&format!("workers/scripts/{}", name)))
            .query(&[("force", "true")]);
        self.send::<serde_json::Value>(request).await?;
        Ok(())
    }
}

#[async_trait]
impl TokenApi for CloudflareClient {
    async fn verify(&self) -> Result<Option<TokenVerification>, ApiError> {
        let request = self
            .client
            .get(&format!("{}/user/tokens/verify", self.base_url));
        self.send(request).await
    }

    async fn get(&self, token_id: &str) -> Result<TokenDetails, ApiError> {
        let request = self
            .client
            .get(&format!("{}/user/tokens/{}", self.base_url, token_id));
        self.send(request)
            .await?
            .ok_or_else(|| ApiError::Decode(format!("no details returned for token {}", token_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use mockito::{Matcher, Server, ServerGuard};
    use reqwest::StatusCode;

    use crate::settings::ApiToken;

    fn settings() -> Settings {
        Settings {
            account_id: "acc".to_string(),
            api_token: ApiToken::new("secret"),
            worker_type: WorkerType::Js,
            worker_prefix: "pf".to_string(),
            concurrency: 5,
            workers_dir: PathBuf::from("workers"),
            worker_timeout: Duration::from_secs(10),
        }
    }

    fn client(server: &ServerGuard) -> CloudflareClient {
        CloudflareClient::with_base_url(&settings(), server.url()).unwrap()
    }

    fn ok(result: &str) -> String {
        format!(
            r#"{{"success": true, "errors": [], "messages": [], "result": {}}}"#,
            result
        )
    }

    fn failed(code: u16, message: &str) -> String {
        format!(
            r#"{{"success": false, "errors": [{{"code": {}, "message": "{}"}}], "messages": [], "result": null}}"#,
            code, message
        )
    }

    #[tokio::test]
    async fn it_authenticates_and_reads_the_verification() {
        let mut server = Server::new_async().await;
        let verify = server
            .mock("GET", "/user/tokens/verify")
            .match_header("authorization", "Bearer secret")
            .with_header("content-type", "application/json")
            .with_body(ok(r#"{"id": "tok", "status": "active"}"#))
            .create_async()
            .await;

        let verification = client(&server).verify().await.unwrap();

        assert_eq!(
            verification,
            Some(TokenVerification {
                id: "tok".to_string(),
                status: "active".to_string(),
            })
        );
        verify.assert_async().await;
    }

    #[tokio::test]
    async fn a_null_result_is_none() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/user/tokens/verify")
            .with_body(ok("null"))
            .create_async()
            .await;

        assert_eq!(client(&server).verify().await.unwrap(), None);
    }

    #[tokio::test]
    async fn token_details_are_required() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/user/tokens/tok")
            .with_body(ok("null"))
            .create_async()
            .await;

        let err = client(&server).get("tok").await.unwrap_err();

        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn an_unsuccessful_envelope_fails_even_with_a_200() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/accounts/acc/workers/scripts")
            .with_status(200)
            .with_body(failed(10000, "Authentication error"))
            .create_async()
            .await;

        let err = client(&server).list_workers().await.unwrap_err();

        assert!(err.has_code(10000));
        assert!(err.is_auth_error());
        assert!(err.to_string().contains("Code 10000: Authentication error"));
    }

    #[tokio::test]
    async fn a_non_json_error_body_keeps_the_status() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/accounts/acc/workers/scripts")
            .with_status(502)
            .with_body("<html>bad gateway</html>")
            .create_async()
            .await;

        let err = client(&server).list_workers().await.unwrap_err();

        match err {
            ApiError::Api { status, errors } => {
                assert_eq!(status, StatusCode::BAD_GATEWAY);
                assert!(errors.is_empty());
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn a_non_json_success_body_is_a_decode_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/accounts/acc/workers/scripts")
            .with_body("ok")
            .create_async()
            .await;

        let err = client(&server).list_workers().await.unwrap_err();

        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn an_existing_subdomain_is_reused() {
        let mut server = Server::new_async().await;
        let get = server
            .mock("GET", "/accounts/acc/workers/subdomain")
            .with_body(ok(r#"{"subdomain": "acme"}"#))
            .expect(1)
            .create_async()
            .await;
        let put = server
            .mock("PUT", "/accounts/acc/workers/subdomain")
            .expect(0)
            .create_async()
            .await;
        let client = client(&server);

        assert_eq!(client.ensure_subdomain().await.unwrap(), "acme");
        assert_eq!(client.ensure_subdomain().await.unwrap(), "acme");

        get.assert_async().await;
        put.assert_async().await;
    }

    #[tokio::test]
    async fn a_missing_subdomain_is_registered_once() {
        let mut server = Server::new_async().await;
        let get = server
            .mock("GET", "/accounts/acc/workers/subdomain")
            .with_status(404)
            .with_body(failed(10007, "This account does not have a workers.dev subdomain"))
            .expect(1)
            .create_async()
            .await;
        let put = server
            .mock("PUT", "/accounts/acc/workers/subdomain")
            .match_body(Matcher::Regex(r#"\{"subdomain":"pf-[a-z0-9]{8}"\}"#.to_string()))
            .with_body(ok(r#"{"subdomain": "pf-registered"}"#))
            .expect(1)
            .create_async()
            .await;
        let client = client(&server);

        assert_eq!(client.ensure_subdomain().await.unwrap(), "pf-registered");
        assert_eq!(client.ensure_subdomain().await.unwrap(), "pf-registered");

        get.assert_async().await;
        put.assert_async().await;
    }

    #[tokio::test]
    async fn other_subdomain_errors_are_not_a_missing_subdomain() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/accounts/acc/workers/subdomain")
            .with_status(403)
            .with_body(failed(10000, "Authentication error"))
            .create_async()
            .await;
        let put = server
            .mock("PUT", "/accounts/acc/workers/subdomain")
            .expect(0)
            .create_async()
            .await;

        let err = client(&server).ensure_subdomain().await.unwrap_err();

        assert!(err.is_auth_error());
        put.assert_async().await;
    }

    #[tokio::test]
    async fn it_lists_only_prefixed_scripts() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/accounts/acc/workers/scripts")
            .with_body(ok(
                r#"[{"id": "pf-aaa"}, {"id": "pfx-bbb"}, {"id": "other"}, {"id": "pf-ccc"}]"#,
            ))
            .create_async()
            .await;

        let names = client(&server).list_workers().await.unwrap();

        assert_eq!(names, vec!["pf-aaa", "pf-ccc"]);
    }

    #[tokio::test]
    async fn it_uploads_then_exposes_the_worker() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/accounts/acc/workers/subdomain")
            .with_body(ok(r#"{"subdomain": "acme"}"#))
            .create_async()
            .await;
        let upload = server
            .mock("PUT", "/accounts/acc/workers/scripts/pf-12345678")
            .match_header("content-type", Matcher::Regex("^multipart/form-data".to_string()))
            .match_body(Matcher::Regex("export default".to_string()))
            .with_body(ok(r#"{"id": "pf-12345678"}"#))
            .expect(1)
            .create_async()
            .await;
        let expose = server
            .mock("POST", "/accounts/acc/workers/scripts/pf-12345678/subdomain")
            .match_body(Matcher::Json(serde_json::json!({ "enabled": true })))
            .with_body(ok("null"))
            .expect(1)
            .create_async()
            .await;
        let config = DeploymentConfig {
            name: "pf-12345678".to_string(),
            script_content: "export default {}",
            worker_type: WorkerType::Js,
            wasm_content: None,
        };

        let url = client(&server).deploy_worker(&config).await.unwrap();

        assert_eq!(url, "https://pf-12345678.acme.workers.dev");
        upload.assert_async().await;
        expose.assert_async().await;
    }

    #[tokio::test]
    async fn a_rejected_upload_is_not_exposed() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/accounts/acc/workers/subdomain")
            .with_body(ok(r#"{"subdomain": "acme"}"#))
            .create_async()
            .await;
        server
            .mock("PUT", "/accounts/acc/workers/scripts/pf-12345678")
            .with_status(400)
            .with_body(failed(10021, "script syntax error"))
            .create_async()
            .await;
        let expose = server
            .mock("POST", "/accounts/acc/workers/scripts/pf-12345678/subdomain")
            .expect(0)
            .create_async()
            .await;
        let config = DeploymentConfig {
            name: "pf-12345678".to_string(),
            script_content: "export default {",
            worker_type: WorkerType::Js,
            wasm_content: None,
        };

        let err = client(&server).deploy_worker(&config).await.unwrap_err();

        assert!(err.has_code(10021));
        expose.assert_async().await;
    }

    #[tokio::test]
    async fn deletes_are_forced() {
        let mut server = Server::new_async().await;
        let delete = server
            .mock("DELETE", "/accounts/acc/workers/scripts/pf-a")
            .match_query(Matcher::UrlEncoded("force".to_string(), "true".to_string()))
            .with_body(ok("null"))
            .expect(1)
            .create_async()
            .await;

        client(&server).delete_worker("pf-a").await.unwrap();

        delete.assert_async().await;
    }
}
