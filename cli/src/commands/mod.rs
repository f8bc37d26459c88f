//! CLI subcommands
//!
//! Every command loads the settings file and builds a private registry from
//! it; nothing is persisted between runs.

mod login;
mod providers;

use anyhow::{Context, Result};
use clap::Subcommand;
use idgate_oauth::{ProviderRegistry, RequestContext, Settings};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

pub struct RunOptions {
    pub config_path: PathBuf,
    pub timeout: Duration,
}

impl RunOptions {
    /// Request context bounded by the timeout and cancelled on Ctrl-C
    fn context(&self) -> RequestContext {
        let ctx = RequestContext::with_timeout(self.timeout);
        let token = ctx.cancellation_token().clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                token.cancel();
            }
        });
        ctx
    }

    fn settings(&self) -> Result<Settings> {
        Settings::load(&self.config_path)
            .with_context(|| format!("Failed to load {}", self.config_path.display()))
    }
}

#[derive(Subcommand, PartialEq, Debug)]
pub enum Commands {
    /// List configured providers and their capabilities
    #[command(name = "list", alias = "ls")]
    List,

    /// Validate every configured provider and report each failure
    Validate,

    /// Print an authorization URL for a provider
    AuthUrl {
        /// Provider name (e.g., "github", "ruijie_sid")
        name: String,

        /// CSRF state; generated when omitted
        #[arg(long)]
        state: Option<String>,

        /// OIDC nonce
        #[arg(long)]
        nonce: Option<String>,
    },

    /// Exchange an authorization code for tokens
    Exchange {
        name: String,
        code: String,

        /// PKCE verifier printed by `auth-url`
        #[arg(long)]
        verifier: Option<String>,
    },

    /// Resolve an access token into a normalized user
    #[command(name = "userinfo")]
    UserInfo { name: String, access_token: String },

    /// Check whether a token is still active
    Introspect { name: String, token: String },
}

impl Commands {
    pub async fn run(self, options: RunOptions) -> Result<()> {
        let settings = options.settings()?;
        let ctx = options.context();

        match self {
            Commands::Validate => providers::handle_validate(&settings, &ctx).await,
            Commands::List => {
                let registry = load_registry(&settings, &ctx).await?;
                providers::handle_list(&registry).await
            }
            Commands::AuthUrl { name, state, nonce } => {
                let registry = load_registry(&settings, &ctx).await?;
                login::handle_auth_url(&registry, &name, state, nonce.as_deref()).await
            }
            Commands::Exchange {
                name,
                code,
                verifier,
            } => {
                let registry = load_registry(&settings, &ctx).await?;
                login::handle_exchange(&registry, &ctx, &name, &code, verifier.as_deref()).await
            }
            Commands::UserInfo { name, access_token } => {
                let registry = load_registry(&settings, &ctx).await?;
                login::handle_user_info(&registry, &ctx, &name, &access_token).await
            }
            Commands::Introspect { name, token } => {
                let registry = load_registry(&settings, &ctx).await?;
                login::handle_introspect(&registry, &ctx, &name, &token).await
            }
        }
    }
}

async fn load_registry(settings: &Settings, ctx: &RequestContext) -> Result<ProviderRegistry> {
    let registry = ProviderRegistry::new();
    let names = settings
        .build_registry(&registry, ctx)
        .await
        .context("Failed to build provider registry")?;
    debug!(?names, "providers ready");
    Ok(registry)
}
