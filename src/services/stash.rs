//! Stash GraphQL client for scene queries, scene deletion, and plugin
//! configuration lookup.
//!
//! The reconciler talks to the library through the [LibraryStore] trait so
//! tests can substitute an in-memory store; this module provides the real
//! HTTP-backed implementation.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

/// A file record attached to a scene
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneFile {
    pub path: String,
    pub basename: String,
}

/// A library scene with its associated file records
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    pub id: String,
    pub title: Option<String>,
    #[serde(default)]
    pub files: Vec<SceneFile>,
}

/// Slim scene view used in sibling listings and reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneSummary {
    pub id: String,
    pub title: Option<String>,
    pub path: String,
}

/// Read/delete access to the local scene library
#[async_trait]
pub trait LibraryStore: Send + Sync {
    /// Look up a scene by id; `None` when the library has no such scene
    async fn find_scene(&self, id: &str) -> Result<Option<Scene>>;

    /// Coarse server-side filter: scenes whose file path contains `fragment`
    /// as a substring. Callers apply the precise prefix filter themselves.
    async fn find_scenes_by_path(&self, fragment: &str) -> Result<Vec<Scene>>;

    /// Delete a scene record. Underlying files are kept; generated artifacts
    /// are removed.
    async fn destroy_scene(&self, id: &str) -> Result<()>;

    /// Read one value out of a plugin's stored configuration
    async fn plugin_setting(&self, plugin_id: &str, key: &str) -> Result<Option<String>>;
}

const FIND_SCENE_QUERY: &str = r#"
query FindScene($id: ID!) {
  findScene(id: $id) {
    id
    title
    files { path basename }
  }
}"#;

const FIND_SCENES_BY_PATH_QUERY: &str = r#"
query FindScenesByPath($path: String!) {
  findScenes(
    scene_filter: { path: { value: $path, modifier: INCLUDES } }
    filter: { per_page: -1 }
  ) {
    scenes {
      id
      title
      files { path basename }
    }
  }
}"#;

const SCENE_DESTROY_MUTATION: &str = r#"
mutation SceneDestroy($id: ID!) {
  sceneDestroy(input: { id: $id, delete_file: false, delete_generated: true })
}"#;

const CONFIGURATION_QUERY: &str = r#"
query Configuration {
  configuration {
    plugins
  }
}"#;

/// HTTP-backed Stash client
pub struct StashClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl StashClient {
    pub fn new(endpoint: String, api_key: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }

    /// Execute one GraphQL document and return its `data` payload
    async fn execute(&self, query: &str, variables: Value) -> Result<Value> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("ApiKey", &self.api_key)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
            .context("Stash request failed")?;

        let status = response.status();
        if !status.is_success() {
            bail!("Stash returned HTTP {}", status);
        }

        let body: Value = response
            .json()
            .await
            .context("Stash response was not valid JSON")?;

        if let Some(errors) = body.get("errors").and_then(Value::as_array) {
            if let Some(first) = errors.first() {
                let message = first
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error");
                bail!("Stash GraphQL error: {}", message);
            }
        }

        Ok(body.get("data").cloned().unwrap_or(Value::Null))
    }
}

#[async_trait]
impl LibraryStore for StashClient {
    async fn find_scene(&self, id: &str) -> Result<Option<Scene>> {
        let data = self
            .execute(FIND_SCENE_QUERY, json!({ "id": id }))
            .await?;

        let scene = data.get("findScene").cloned().unwrap_or(Value::Null);
        if scene.is_null() {
            return Ok(None);
        }

        let scene: Scene =
            serde_json::from_value(scene).context("Unexpected findScene response shape")?;
        debug!(scene_id = %scene.id, files = scene.files.len(), "Fetched scene");
        Ok(Some(scene))
    }

    async fn find_scenes_by_path(&self, fragment: &str) -> Result<Vec<Scene>> {
        let data = self
            .execute(FIND_SCENES_BY_PATH_QUERY, json!({ "path": fragment }))
            .await?;

        let scenes = data
            .get("findScenes")
            .and_then(|v| v.get("scenes"))
            .cloned()
            .unwrap_or_else(|| Value::Array(vec![]));

        let scenes: Vec<Scene> =
            serde_json::from_value(scenes).context("Unexpected findScenes response shape")?;
        debug!(fragment = %fragment, count = scenes.len(), "Path substring query returned scenes");
        Ok(scenes)
    }

    async fn destroy_scene(&self, id: &str) -> Result<()> {
        let data = self
            .execute(SCENE_DESTROY_MUTATION, json!({ "id": id }))
            .await?;

        match data.get("sceneDestroy").and_then(Value::as_bool) {
            Some(true) => Ok(()),
            _ => bail!("sceneDestroy returned false for scene {}", id),
        }
    }

    async fn plugin_setting(&self, plugin_id: &str, key: &str) -> Result<Option<String>> {
        let data = self.execute(CONFIGURATION_QUERY, json!({})).await?;

        let value = data
            .get("configuration")
            .and_then(|v| v.get("plugins"))
            .and_then(|v| v.get(plugin_id))
            .and_then(|v| v.get(key))
            .and_then(Value::as_str)
            .map(str::to_string);
        Ok(value)
    }
}
