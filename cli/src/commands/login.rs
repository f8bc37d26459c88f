use anyhow::{Context, Result};
use idgate_oauth::pkce::{PkceChallenge, random_token};
use idgate_oauth::{OAuthProvider, ProviderRegistry, RequestContext};
use serde::Serialize;

pub async fn handle_auth_url(
    registry: &ProviderRegistry,
    name: &str,
    state: Option<String>,
    nonce: Option<&str>,
) -> Result<()> {
    let provider = registry.get(name).await?;
    let state = state.unwrap_or_else(random_token);

    let pkce = provider
        .supports_pkce()
        .then(|| PkceChallenge::from_verifier(random_token(), provider.pkce_method()));
    let url = provider.auth_url(
        &state,
        pkce.as_ref().map(|pkce| pkce.verifier.as_str()),
        nonce,
    );

    println!("{}", url);
    println!();
    println!("state:    {}", state);
    if let Some(pkce) = pkce {
        println!("verifier: {}", pkce.verifier);
    }
    Ok(())
}

pub async fn handle_exchange(
    registry: &ProviderRegistry,
    ctx: &RequestContext,
    name: &str,
    code: &str,
    verifier: Option<&str>,
) -> Result<()> {
    let provider = registry.get(name).await?;
    let token = provider
        .exchange_code(ctx, code, verifier)
        .await
        .with_context(|| format!("Code exchange with '{}' failed", name))?;
    print_json(&token)
}

pub async fn handle_user_info(
    registry: &ProviderRegistry,
    ctx: &RequestContext,
    name: &str,
    access_token: &str,
) -> Result<()> {
    let provider = registry.get(name).await?;
    let user = provider
        .user_info(ctx, access_token)
        .await
        .with_context(|| format!("User info from '{}' failed", name))?;
    print_json(&user)
}

pub async fn handle_introspect(
    registry: &ProviderRegistry,
    ctx: &RequestContext,
    name: &str,
    token: &str,
) -> Result<()> {
    let provider = registry.get(name).await?;
    let introspection = provider
        .introspect_token(ctx, token)
        .await
        .with_context(|| format!("Introspection at '{}' failed", name))?;
    print_json(&introspection)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
