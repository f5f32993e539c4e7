//! Fetch the authenticated account.

use super::Context;

pub async fn run(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    // Goes out with the stored bearer; a revoked session lands in the
    // middleware's 401 policy and resets everything.
    let identity = ctx.api.me().await?;
    println!(
        "account_id: {}\nusername: {}\nrole: {}",
        identity.account_id, identity.username, identity.role
    );
    Ok(())
}
