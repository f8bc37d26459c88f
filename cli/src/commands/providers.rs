use anyhow::{Result, bail};
use idgate_oauth::{Feature, OAuthProvider, ProviderRegistry, RequestContext, Settings};

pub async fn handle_list(registry: &ProviderRegistry) -> Result<()> {
    let names = registry.list().await;
    if names.is_empty() {
        println!("No providers configured.");
        return Ok(());
    }

    for name in names {
        let provider = registry.get(&name).await?;
        println!("{}", describe(provider.as_ref()));
    }
    Ok(())
}

pub async fn handle_validate(settings: &Settings, ctx: &RequestContext) -> Result<()> {
    if settings.is_empty() {
        bail!("No providers configured");
    }

    let providers = settings.build_providers(ctx).await?;
    let mut failures = 0;
    for provider in &providers {
        match provider.validate() {
            Ok(()) => println!("ok      {}", provider.name()),
            Err(e) => {
                failures += 1;
                println!("invalid {}: {}", provider.name(), e);
            }
        }
    }

    if failures > 0 {
        bail!("{} of {} providers failed validation", failures, providers.len());
    }
    Ok(())
}

/// One line per provider: name, type and supported features
fn describe(provider: &dyn OAuthProvider) -> String {
    let features: Vec<&str> = Feature::ALL
        .into_iter()
        .filter(|feature| provider.supports_feature(*feature))
        .map(|feature| feature.as_str())
        .collect();

    format!(
        "{:<16} {:<12} [{}]",
        provider.name(),
        provider.provider_type(),
        features.join(", ")
    )
}
