//! Session management commands.

use super::Stores;

/// Register a new account and sign in.
#[allow(clippy::print_stdout)]
pub async fn register(
    stores: &Stores,
    username: &str,
    email: &str,
    password: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let user = stores.session.register(username, email, password).await?;
    println!("Registered and signed in as {}", user.username);
    Ok(())
}

/// Sign in with username and password.
#[allow(clippy::print_stdout)]
pub async fn login(
    stores: &Stores,
    username: &str,
    password: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let user = stores.session.login(username, password).await?;
    println!("Signed in as {}", user.username);
    Ok(())
}

/// Sign out. Always clears the local session, even if the server call
/// fails.
#[allow(clippy::print_stdout)]
pub async fn logout(stores: &Stores) {
    stores.session.logout().await;
    println!("Signed out.");
}

/// Show who the saved session belongs to.
#[allow(clippy::print_stdout)]
pub async fn whoami(stores: &Stores) {
    match stores.session.check().await.user() {
        Some(user) => {
            let email = user.email.as_deref().unwrap_or("-");
            println!("{} (#{}, {email})", user.username, user.id);
        }
        None => println!("Not signed in."),
    }
}
