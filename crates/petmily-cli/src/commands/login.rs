//! Login command.

use super::Context;
use std::io::{BufRead, Write};

pub async fn run(
    ctx: &Context,
    username: Option<String>,
    password: Option<String>,
    remember: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    // Prefill from the last remembered login, like the login form does
    let username = match username {
        Some(u) => u,
        None => match ctx.store.saved_username()? {
            Some(saved) => {
                println!("Using saved username: {}", saved);
                saved
            }
            None => prompt("Username: ")?,
        },
    };

    let password = match password {
        Some(p) => p,
        None => prompt("Password: ")?,
    };

    let session = ctx.session.login(&username, &password, remember).await?;
    let user = session.user.expect("authenticated session carries a user");
    println!("Logged in as {} ({})", user.username, user.role);
    if !remember {
        println!("Session is ephemeral; it will not survive this process.");
    }
    Ok(())
}

fn prompt(label: &str) -> std::io::Result<String> {
    print!("{}", label);
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
