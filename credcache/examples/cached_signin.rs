use std::{
    convert::Infallible,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use clap::Parser;
use credcache::{
    issuers::{AsyncTokenIssuer, CachingIssuer},
    AccessToken, ClientId, ClientIdRef, CredentialTokenCache, SecretId, SecretIdRef, TokenRecord,
    UserId,
};
use credcache_clock::{DurationSecs, System};
use tokio::time;

#[derive(Debug, Parser)]
#[command(about = "Serves simulated requests through a cached sign-in")]
struct Opts {
    /// The client ID of the connected application
    #[arg(short, long, env)]
    client_id: String,

    /// The ID of the client secret used to sign assertions
    #[arg(short, long, env)]
    secret_id: String,

    /// How long each simulated sign-in token stays valid, in seconds
    #[arg(short, long, env, default_value_t = 10)]
    lifetime: u64,

    /// Treat cached tokens with less than this many seconds left as missing
    #[arg(short, long, env, default_value_t = 2)]
    minimum_validity: u64,

    /// Seconds between simulated requests
    #[arg(short, long, env, default_value_t = 1)]
    interval: u64,

    /// Number of simulated requests to make
    #[arg(short, long, env, default_value_t = 30)]
    requests: u64,

    /// Pretend every Nth request is rejected downstream with a 401
    #[arg(long, env)]
    reject_every: Option<u64>,
}

/// Stands in for a real sign-in against the authority's REST API
#[derive(Debug)]
struct SimulatedSignIn {
    lifetime: DurationSecs,
    sign_ins: AtomicU64,
}

#[async_trait]
impl AsyncTokenIssuer for SimulatedSignIn {
    type Error = Infallible;

    async fn issue_token(
        &self,
        client_id: &ClientIdRef,
        _secret_id: &SecretIdRef,
    ) -> Result<TokenRecord, Self::Error> {
        time::sleep(Duration::from_millis(150)).await;
        let n = self.sign_ins.fetch_add(1, Ordering::SeqCst) + 1;

        Ok(TokenRecord::issued_now(
            AccessToken::new(format!("{}-session-{:04}", client_id, n)),
            UserId::new(format!("user-for-{}", client_id)),
            self.lifetime,
            &System,
        ))
    }
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    dotenvy::dotenv().ok();
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .pretty()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .init();

    let opts = Opts::parse();
    let client_id = ClientId::new(opts.client_id)?;
    let secret_id = SecretId::new(opts.secret_id)?;

    let cache = Arc::new(CredentialTokenCache::new());
    let issuer = CachingIssuer::new(
        Arc::clone(&cache),
        SimulatedSignIn {
            lifetime: DurationSecs(opts.lifetime),
            sign_ins: AtomicU64::new(0),
        },
    )
    .with_minimum_validity(DurationSecs(opts.minimum_validity));

    let mut interval = time::interval(Duration::from_secs(opts.interval.max(1)));
    for request in 1..=opts.requests {
        interval.tick().await;

        let token = issuer.token(&client_id, &secret_id).await?;
        tracing::info!(
            request,
            token = format_args!("{:#?}", token.access_token()),
            user_id = %token.user_id(),
            expiry = token.expiry().0,
            "using token"
        );

        if matches!(opts.reject_every, Some(n) if n > 0 && request % n == 0) {
            tracing::warn!(request, "downstream rejected token");
            issuer.invalidate(&client_id, &secret_id);
        }
    }

    tracing::info!(
        sign_ins = issuer_sign_ins(&issuer),
        cached = cache.len(),
        "done"
    );

    Ok(())
}

fn issuer_sign_ins(issuer: &CachingIssuer<SimulatedSignIn>) -> u64 {
    issuer.inner().sign_ins.load(Ordering::SeqCst)
}
