//! Simple example serving a small article/tag/user graph
//!
//! Try:
//! - `curl localhost:3000/jsonapi/node/article`
//! - `curl 'localhost:3000/jsonapi/node/article?include=uid,field_tags&fields[node--article]=title,uid,field_tags'`
//! - `curl -H 'x-user-id: <uuid>' -H 'x-user-roles: admin' localhost:3000/jsonapi/node/article`

use jsonapi::prelude::*;
use tracing_subscriber::EnvFilter;

const CONFIG: &str = r#"
base_url: http://localhost:3000
access_denied_message: "This resource is not available to you."
resource_types:
  - entity_type: node
    bundle: article
    fields:
      - name: title
      - name: body
      - name: created
        writable: false
      - name: revision_log
        internal: true
      - name: uid
        relationship:
          cardinality: one
          targets: [user--user]
      - name: field_tags
        relationship:
          targets: [taxonomy_term--tags]
  - entity_type: user
    bundle: user
    view: authenticated
    fields:
      - name: name
  - entity_type: taxonomy_term
    bundle: tags
    fields:
      - name: name
  - entity_type: node_type
    bundle: node_type
    kind: config
    fields:
      - name: name
      - name: description
"#;

fn seed(store: &InMemoryEntityStore) -> Result<()> {
    store.save(Entity::new("user", "user").with_id("1").with_attribute("name", "alice"))?;
    store.save(Entity::new("user", "user").with_id("2").with_attribute("name", "bob"))?;

    store.save(
        Entity::new("taxonomy_term", "tags")
            .with_id("1")
            .with_attribute("name", "rust"),
    )?;
    store.save(
        Entity::new("taxonomy_term", "tags")
            .with_id("2")
            .with_attribute("name", "drafts")
            .unpublished(),
    )?;

    store.save(
        Entity::new("node", "article")
            .with_id("1")
            .with_attribute("title", "Hello JSON:API")
            .with_attribute("body", "Normalized documents with includes.")
            .with_attribute("created", 1_700_000_000)
            .with_attribute("revision_log", "initial import")
            .with_references("uid", [EntityKey::new("user", "1")])
            .with_references(
                "field_tags",
                [
                    EntityKey::new("taxonomy_term", "1"),
                    EntityKey::new("taxonomy_term", "2"),
                ],
            ),
    )?;
    store.save(
        Entity::new("node", "article")
            .with_id("2")
            .with_attribute("title", "Work in progress")
            .with_references("uid", [EntityKey::new("user", "2")])
            .with_max_age(MaxAge::Seconds(300))
            .unpublished(),
    )?;

    store.save(
        Entity::new("node_type", "node_type")
            .with_id("article")
            .with_kind(EntityKind::Config)
            .with_attribute("name", "Article")
            .with_attribute("description", "Time-sensitive content"),
    )?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,jsonapi=debug")),
        )
        .init();

    let config = JsonApiConfig::from_yaml_str(CONFIG)?;

    let store = InMemoryEntityStore::new();
    seed(&store)?;
    tracing::info!(entities = store.len()?, "seeded store");

    ServerBuilder::new()
        .with_config(config)
        .with_store(store)
        .with_auth_provider(HeaderAuthProvider)
        .with_permissive_cors()
        .serve("127.0.0.1:3000")
        .await
}
