// Platform client: the operations the CLI needs from the Scailable services,
// expressed as the `Platform` trait, plus `ApiClient`, a small blocking HTTP
// implementation of it.
//
// `ApiClient` signs in with the stored credentials on first use and keeps the
// token for the rest of the process. It does one request per operation and
// reports failures as `anyhow` errors; deciding what to print is left to the
// caller.

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::{multipart, Client, RequestBuilder};
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::{Endpoints, Profile};
use crate::credentials::CredentialStore;

/// Name of the conversion toolchain models are uploaded to.
const TOOLCHAIN_NAME: &str = "onnx2c";

/// An uploaded model (compute function).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Model {
    pub name: String,
    pub cfid: String,
}

/// A registered device.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub name: String,
    pub did: String,
    pub rid: String,
}

/// A model assigned to a device.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub model_name: String,
    pub device_name: String,
    pub aid: String,
}

/// Pagination window for list calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: u32,
    pub limit: u32,
}

impl Default for Page {
    fn default() -> Self {
        Page {
            offset: 0,
            limit: 20,
        }
    }
}

/// File and metadata sent with an upload or update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelUpload {
    pub file: PathBuf,
    pub name: String,
    pub docs: String,
    pub example: String,
    pub email: bool,
}

/// Everything the CLI asks of the platform. Each call either succeeds or
/// fails; the CLI does not look at why.
pub trait Platform {
    /// Point the client at the given services.
    fn configure(&mut self, endpoints: &Endpoints);

    /// Suppress the client's own progress output.
    fn set_silent(&mut self, silent: bool);

    fn upload_model(&mut self, upload: &ModelUpload) -> Result<()>;

    fn update_model(&mut self, cfid: &str, upload: &ModelUpload) -> Result<()>;

    fn models(&mut self, page: Page) -> Result<Vec<Model>>;

    fn devices(&mut self, page: Page) -> Result<Vec<Device>>;

    fn assignments(&mut self, page: Page) -> Result<Vec<Assignment>>;

    fn assign(&mut self, cfid: &str, did: &str, rid: &str) -> Result<()>;

    fn delete_model(&mut self, cfid: &str) -> Result<()>;

    fn delete_device(&mut self, did: &str) -> Result<()>;

    fn delete_assignment(&mut self, aid: &str) -> Result<()>;

    /// Forget the stored credentials. `Ok(false)` if there were none.
    fn remove_credentials(&mut self) -> Result<bool>;
}

/// Sign-in request payload.
#[derive(Serialize, Debug)]
struct SignInRequest<'a> {
    email: &'a str,
    pwd: &'a str,
}

/// Sign-in response. The user id comes back as a number or a string
/// depending on the server version, so it stays a `Value`.
#[derive(Deserialize, Debug)]
struct SignInResponse {
    token: Option<String>,
    uid: Option<Value>,
    error: Option<String>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct AssignRequest<'a> {
    model_id: &'a str,
    device_id: &'a str,
    registration_id: &'a str,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct UploadData<'a> {
    email: bool,
    package: &'a str,
    toolchain: &'a str,
    name: &'a str,
    docs: &'a str,
    example_input: &'a str,
    example_output: &'a str,
}

#[derive(Debug, Clone)]
struct Session {
    token: String,
    uid: String,
}

/// Blocking HTTP client for the three platform services.
pub struct ApiClient {
    client: Client,
    endpoints: Endpoints,
    credentials: CredentialStore,
    session: Option<Session>,
    silent: bool,
}

impl ApiClient {
    pub fn new(credentials: CredentialStore) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ApiClient {
            client,
            endpoints: Profile::default().endpoints(),
            credentials,
            session: None,
            silent: false,
        })
    }

    /// Client using the credentials file from `SCLBL_CREDENTIALS` or the
    /// user's config directory.
    pub fn from_env() -> Result<Self> {
        Self::new(CredentialStore::from_env())
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    fn spinner(&self, msg: &'static str) -> Option<ProgressBar> {
        if self.silent {
            return None;
        }
        let pb = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        pb.set_style(style);
        pb.set_message(msg);
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    }

    /// Run a request with a spinner on stderr unless silenced.
    fn with_spinner<T>(&self, msg: &'static str, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let spinner = self.spinner(msg);
        let result = f();
        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }
        result
    }

    /// Return the current session, signing in first if needed.
    fn session(&mut self) -> Result<Session> {
        if let Some(session) = &self.session {
            return Ok(session.clone());
        }
        let creds = self.credentials.load_or_prompt()?;
        if creds.username.is_empty() || creds.password.is_empty() {
            bail!("No username or password provided");
        }

        let url = format!("{}/user/signin/", self.endpoints.user_manager);
        debug!(%url, user = %creds.username, "signing in");
        let req = SignInRequest {
            email: &creds.username,
            pwd: &creds.password,
        };
        let res = self.with_spinner("Signing in...", || {
            self.client
                .post(&url)
                .json(&req)
                .send()
                .context("Failed to send sign-in request")
        })?;
        if !res.status().is_success() {
            let status = res.status();
            let txt = res.text().unwrap_or_default();
            bail!("Sign-in failed: {} - {}", status, txt);
        }
        let resp: SignInResponse = res.json().context("Parsing sign-in response json")?;

        if let Some(err) = resp.error.filter(|e| !e.is_empty()) {
            // Wrong credentials: forget them so the next run prompts again.
            if let Err(e) = self.credentials.remove() {
                warn!("could not remove rejected credentials: {e:#}");
            }
            bail!("Sign-in rejected by server: {}", err);
        }
        let (token, uid) = match (resp.token, resp.uid) {
            (Some(token), Some(uid)) => (token, uid),
            _ => bail!("Missing token or uid in sign-in response"),
        };
        let uid = match uid {
            Value::String(s) => s,
            other => other.to_string(),
        };
        let session = Session { token, uid };
        self.session = Some(session.clone());
        Ok(session)
    }

    fn send(&self, msg: &'static str, what: &str, req: RequestBuilder) -> Result<Value> {
        let res = self.with_spinner(msg, || {
            req.send()
                .with_context(|| format!("Failed to send {what} request"))
        })?;
        let status = res.status();
        let txt = res.text().unwrap_or_default();
        if !status.is_success() {
            bail!("{} failed: {} - {}", what, status, txt);
        }
        let value: Value = serde_json::from_str(&txt)
            .with_context(|| format!("Parsing {what} response json"))?;
        if let Some(err) = server_error(&value) {
            bail!("{} failed: server error: {}", what, err);
        }
        Ok(value)
    }

    fn list<T: DeserializeOwned>(&mut self, path: &str, what: &str, page: Page) -> Result<Vec<T>> {
        let session = self.session()?;
        let url = format!("{}/{}/{}", self.endpoints.user_manager, path, session.uid);
        debug!(%url, offset = page.offset, limit = page.limit, "listing {what}");
        let req = self
            .client
            .get(&url)
            .header(AUTHORIZATION, session.token.as_str())
            .query(&[("limit", page.limit), ("offset", page.offset)]);
        let value = self.send("Fetching...", what, req)?;
        parse_list(value).with_context(|| format!("Parsing {what} list"))
    }

    fn delete(&mut self, path: &str, id: &str, what: &str) -> Result<()> {
        let session = self.session()?;
        let url = format!(
            "{}/{}/{}/{}",
            self.endpoints.user_manager, path, session.uid, id
        );
        debug!(%url, "deleting {what}");
        let req = self
            .client
            .delete(&url)
            .header(AUTHORIZATION, session.token.as_str());
        self.send("Deleting...", what, req)?;
        Ok(())
    }

    fn upload_form(upload: &ModelUpload) -> Result<multipart::Form> {
        if upload.file.extension().and_then(|e| e.to_str()) != Some("onnx") {
            warn!("{} does not have an .onnx extension", upload.file.display());
        }
        let data = UploadData {
            email: upload.email,
            package: env!("CARGO_PKG_VERSION"),
            toolchain: TOOLCHAIN_NAME,
            name: &upload.name,
            docs: &upload.docs,
            example_input: &upload.example,
            example_output: "",
        };
        let form = multipart::Form::new()
            .text("data", serde_json::to_string(&data)?)
            .file("bundle", &upload.file)
            .with_context(|| format!("Failed to open model file {}", upload.file.display()))?;
        Ok(form)
    }
}

impl Platform for ApiClient {
    fn configure(&mut self, endpoints: &Endpoints) {
        if &self.endpoints != endpoints {
            // A session is only valid for the service that issued it.
            self.session = None;
        }
        self.endpoints = endpoints.clone();
    }

    fn set_silent(&mut self, silent: bool) {
        self.silent = silent;
    }

    fn upload_model(&mut self, upload: &ModelUpload) -> Result<()> {
        let form = Self::upload_form(upload)?;
        let session = self.session()?;
        let url = format!("{}/upload/{}", self.endpoints.toolchain, session.uid);
        debug!(%url, name = %upload.name, "uploading model");
        let req = self
            .client
            .post(&url)
            .header(AUTHORIZATION, session.token.as_str())
            .multipart(form);
        self.send("Uploading...", "upload", req)?;
        Ok(())
    }

    fn update_model(&mut self, cfid: &str, upload: &ModelUpload) -> Result<()> {
        let form = Self::upload_form(upload)?;
        let session = self.session()?;
        let url = format!(
            "{}/upload/{}/{}",
            self.endpoints.toolchain, session.uid, cfid
        );
        debug!(%url, name = %upload.name, "updating model");
        let req = self
            .client
            .put(&url)
            .header(AUTHORIZATION, session.token.as_str())
            .multipart(form);
        self.send("Uploading...", "update", req)?;
        Ok(())
    }

    fn models(&mut self, page: Page) -> Result<Vec<Model>> {
        self.list("compute-functions", "models", page)
    }

    fn devices(&mut self, page: Page) -> Result<Vec<Device>> {
        self.list("devices", "devices", page)
    }

    fn assignments(&mut self, page: Page) -> Result<Vec<Assignment>> {
        self.list("assignments/user", "assignments", page)
    }

    fn assign(&mut self, cfid: &str, did: &str, rid: &str) -> Result<()> {
        if cfid.is_empty() || did.is_empty() || rid.is_empty() {
            bail!("Model, device and registration ids are all required");
        }
        let session = self.session()?;
        let url = format!("{}/assign/{}", self.endpoints.user_manager, session.uid);
        debug!(%url, cfid, did, rid, "creating assignment");
        let body = AssignRequest {
            model_id: cfid,
            device_id: did,
            registration_id: rid,
        };
        let req = self
            .client
            .post(&url)
            .header(AUTHORIZATION, session.token.as_str())
            .json(&body);
        self.send("Assigning...", "assign", req)?;
        Ok(())
    }

    fn delete_model(&mut self, cfid: &str) -> Result<()> {
        self.delete("compute-function", cfid, "model delete")
    }

    fn delete_device(&mut self, did: &str) -> Result<()> {
        self.delete("device", did, "device delete")
    }

    fn delete_assignment(&mut self, aid: &str) -> Result<()> {
        self.delete("assign", aid, "assignment delete")
    }

    fn remove_credentials(&mut self) -> Result<bool> {
        self.session = None;
        let removed = self.credentials.remove()?;
        debug!(path = %self.credentials.path().display(), removed, "removing credentials");
        Ok(removed)
    }
}

/// The server reports failures in an `error` field; an empty string or null
/// means success.
fn server_error(value: &Value) -> Option<String> {
    match value.get("error")? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(false) => None,
        other => Some(other.to_string()),
    }
}

/// List endpoints answer with an array, or `null` when there is nothing.
fn parse_list<T: DeserializeOwned>(value: Value) -> Result<Vec<T>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(_) => Ok(serde_json::from_value(value)?),
        other => bail!("Expected a list, got {}", other),
    }
}
