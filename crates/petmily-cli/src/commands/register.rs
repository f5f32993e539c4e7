//! Registration command.

use super::Context;
use petmily_api::RegisterRequest;

pub async fn run(
    ctx: &Context,
    id: String,
    password: String,
    email: String,
    name: String,
    phone_number: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let request = RegisterRequest {
        id,
        password,
        email,
        name,
        phone_number,
    };

    ctx.session.register(&request).await?;

    // Registration never authenticates; the user logs in explicitly
    println!("Account created. Log in with `petmily login`.");
    Ok(())
}
