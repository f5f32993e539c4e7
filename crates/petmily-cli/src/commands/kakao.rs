//! Kakao login commands.

use super::Context;
use petmily_kakao::{ExchangeOutcome, KakaoBridge, RedirectExchange};

/// Interactive provider flow: open the authorization URL, wait for the
/// local callback, then hand the provider token to the session machine.
pub async fn login(ctx: &Context, no_remember: bool) -> Result<(), Box<dyn std::error::Error>> {
    let bridge = KakaoBridge::new(ctx.config.kakao_app_key.clone());
    let provider = bridge.ensure_initialized().await?;

    let attempt = provider.start_authorization();
    println!("Open this URL in your browser to continue:");
    println!("  {}", attempt.url());
    println!("Waiting for Kakao...");

    let provider_token = attempt.finish().await?;
    let session = ctx
        .session
        .login_with_kakao(&provider_token, Some(!no_remember))
        .await?;

    let user = session.user.expect("authenticated session carries a user");
    println!("Logged in as {} via Kakao", user.username);
    Ok(())
}

/// Redirect-exchange flow: the user pastes the query string from the
/// OAuth2 redirect URL.
pub async fn complete(ctx: &Context, query: &str) -> Result<(), Box<dyn std::error::Error>> {
    let exchange = RedirectExchange::new(ctx.api.clone(), ctx.store.clone());

    match exchange.complete(query).await? {
        ExchangeOutcome::RestartForRestore => {
            println!("Credential saved. Run `petmily status` to pick up the session.");
        }
    }
    Ok(())
}
