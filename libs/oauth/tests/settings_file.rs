//! Loading settings from disk and building a registry from them

use idgate_oauth::{OAuthError, OAuthProvider, ProviderRegistry, RequestContext, Settings};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_settings(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn test_load_and_build_with_discovery() {
    let mut server = mockito::Server::new_async().await;
    let issuer = server.url();
    let _discovery = server
        .mock("GET", "/.well-known/openid-configuration")
        .with_status(200)
        .with_body(
            serde_json::json!({
                "issuer": issuer,
                "authorization_endpoint": format!("{}/authorize", issuer),
                "token_endpoint": format!("{}/token", issuer)
            })
            .to_string(),
        )
        .create_async()
        .await;

    let file = write_settings(&format!(
        r#"
redirect-url = "https://rd.example.com/api/oauth/callback"

[github]
client-id = "gh-id"
client-secret = "gh-secret"

[[oidc]]
name = "corp-sso"
issuer = "{issuer}"
client-id = "oidc-id"
client-secret = "oidc-secret"
pkce-enabled = true

[ruijie-sid]
base-url = "https://sid.example.edu.cn/"
client-id = "sid-id"
client-secret = "sid-secret"
scopes = ["profile"]
"#
    ));

    let settings = Settings::load(file.path()).unwrap();
    let registry = ProviderRegistry::new();
    settings
        .build_registry(&registry, &RequestContext::new())
        .await
        .unwrap();

    assert_eq!(registry.list().await, vec!["corp-sso", "github", "ruijie_sid"]);
    assert_eq!(registry.get_by_type("oidc").await.len(), 1);

    let sso = registry.get("corp-sso").await.unwrap();
    assert!(sso.supports_pkce());
    assert!(!sso.supports_feature(idgate_oauth::Feature::UserInfo));

    let sid = registry.get("ruijie_sid").await.unwrap();
    assert_eq!(
        sid.config().endpoints.token_url,
        "https://sid.example.edu.cn/oauth2.0/accessToken"
    );
    assert!(registry.validate_all().await.is_empty());
}

#[tokio::test]
async fn test_rebuild_replaces_existing_providers() {
    let registry = ProviderRegistry::new();
    let ctx = RequestContext::new();

    let first = Settings::from_toml_str(
        r#"
redirect-url = "https://rd.example.com/cb"
[github]
client-id = "old"
client-secret = "secret"
"#,
    )
    .unwrap();
    first.build_registry(&registry, &ctx).await.unwrap();
    let before = registry.get("github").await.unwrap();

    let second = Settings::from_toml_str(
        r#"
redirect-url = "https://rd.example.com/cb"
[github]
client-id = "new"
client-secret = "secret"
"#,
    )
    .unwrap();
    second.build_registry(&registry, &ctx).await.unwrap();

    assert_eq!(before.config().client_id, "old");
    assert_eq!(registry.get("github").await.unwrap().config().client_id, "new");
    assert_eq!(registry.count().await, 1);
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = Settings::load(dir.path().join("absent.toml"));
    assert!(matches!(result, Err(OAuthError::IoError(_))));
}
