use std::io::{self, Write};

use anyhow::Result;

use crate::core::AppConfig;
use crate::google::GoogleEndpoints;
use crate::google::oauth::{CodePrompt, CredentialStore, authorize, run_authorization_flow};

/// Prints the consent URL and reads the code (or the whole redirected
/// URL) from stdin.
pub fn stdin_prompt() -> CodePrompt {
    Box::new(|url: &str| -> Result<String> {
        println!(
            "\nPlease open the following URL in your browser and authorize access:\n\n{}\n",
            url
        );
        print!("Paste the authorization code or the URL you were redirected to: ");
        io::stdout().flush()?;
        let mut answer = String::new();
        io::stdin().read_line(&mut answer)?;
        Ok(answer.trim().to_string())
    })
}

pub fn credential_store(config: &AppConfig) -> CredentialStore {
    CredentialStore::new(&config.token_path, &config.credentials_path)
}

pub async fn run(config: &AppConfig, force: bool) -> Result<()> {
    let store = credential_store(config);
    let endpoints = GoogleEndpoints::from(config);
    let prompt = stdin_prompt();

    if force {
        run_authorization_flow(&store, &endpoints, &prompt).await?;
    } else {
        authorize(&store, &endpoints, &prompt).await?;
    }
    println!("Credential saved to {}", store.token_path().display());

    Ok(())
}
