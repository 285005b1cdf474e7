//! Objects API: receive a committed object and its closure.

use crate::client::SpeckleClient;
use crate::error::SpeckleResult;
use serde_json::{json, Value as JsonValue};
use speckle_core::{GraphError, ObjectGraph};
use tracing::debug;

/// Children requested per `getobjects` call
const CHILD_BATCH_SIZE: usize = 1000;

pub struct ObjectsApi<'a> {
    client: &'a SpeckleClient,
}

impl<'a> ObjectsApi<'a> {
    pub(crate) fn new(client: &'a SpeckleClient) -> Self {
        Self { client }
    }

    /// Download `object_id` and every object in its `__closure`, then
    /// assemble them into an [`ObjectGraph`] rooted at `object_id`.
    pub async fn receive(&self, project_id: &str, object_id: &str) -> SpeckleResult<ObjectGraph> {
        let root_text = self
            .client
            .http
            .get_text(&format!("/objects/{}/{}/single", project_id, object_id))
            .await?;
        let root: JsonValue = serde_json::from_str(&root_text)?;

        let children: Vec<String> = root
            .get("__closure")
            .and_then(JsonValue::as_object)
            .map(|closure| closure.keys().cloned().collect())
            .unwrap_or_default();

        let mut objects = Vec::with_capacity(children.len() + 1);
        objects.push((object_id.to_string(), root));

        for batch in children.chunks(CHILD_BATCH_SIZE) {
            let body = json!({ "objects": serde_json::to_string(batch)? });
            let text = self
                .client
                .http
                .post_text(&format!("/api/getobjects/{}", project_id), &body)
                .await?;
            objects.extend(parse_object_lines(&text)?);
        }

        debug!(
            project_id = %project_id,
            object_id = %object_id,
            children = children.len(),
            "Received object closure"
        );

        Ok(ObjectGraph::from_wire(object_id, objects)?)
    }
}

/// Parse the `id<TAB>json` lines returned by `getobjects`.
fn parse_object_lines(body: &str) -> SpeckleResult<Vec<(String, JsonValue)>> {
    body.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| -> SpeckleResult<(String, JsonValue)> {
            let (id, json) = line.split_once('\t').ok_or_else(|| {
                GraphError::InvalidWire(format!(
                    "expected '<id>\\t<json>', got '{}'",
                    line.chars().take(64).collect::<String>()
                ))
            })?;
            Ok((id.to_string(), serde_json::from_str(json)?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryConfig;
    use crate::error::SpeckleError;
    use speckle_core::Value;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> SpeckleClient {
        SpeckleClient::builder()
            .server_url(server.uri())
            .token("tok")
            .retry_config(RetryConfig::no_retry())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_receive_fetches_closure_and_links_children() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/objects/p1/root/single"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "root",
                "speckle_type": "Base",
                "@elements": [{"referencedId": "wall", "speckle_type": "reference"}],
                "__closure": {"wall": 1}
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/getobjects/p1"))
            .and(body_json(json!({"objects": "[\"wall\"]"})))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "wall\t{\"id\":\"wall\",\"speckle_type\":\"Objects.BuiltElements.Wall\",\"name\":\"W1\"}\n",
            ))
            .mount(&server)
            .await;

        let graph = client(&server).objects().receive("p1", "root").await.unwrap();
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.resolve("elements.0.name").unwrap(), &Value::from("W1"));
    }

    #[tokio::test]
    async fn test_receive_without_closure_skips_getobjects() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/objects/p1/leaf/single"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": "leaf", "speckle_type": "Base"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/getobjects/p1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let graph = client(&server).objects().receive("p1", "leaf").await.unwrap();
        assert_eq!(graph.root_id(), Some("leaf"));
    }

    #[tokio::test]
    async fn test_missing_object_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/objects/p1/gone/single"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Failed to find object gone."))
            .mount(&server)
            .await;

        let err = client(&server).objects().receive("p1", "gone").await.unwrap_err();
        assert!(matches!(err, SpeckleError::NotFound(_)));
    }

    #[test]
    fn test_parse_object_lines() {
        let parsed = parse_object_lines("a\t{\"id\":\"a\"}\n\nb\t{\"id\":\"b\"}").unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].0, "b");

        let err = parse_object_lines("no-tab-here").unwrap_err();
        assert!(matches!(err, SpeckleError::Graph(GraphError::InvalidWire(_))));
    }
}
