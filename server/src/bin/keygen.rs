//! Prints a fresh RSA key pair as `.env` lines for the payload cipher.

use smart_task_server::auth::{generate_key_pair, DEFAULT_KEY_BITS};

fn main() -> anyhow::Result<()> {
    let keys = generate_key_pair(DEFAULT_KEY_BITS)?;

    println!(
        "PUBLIC_KEY_FOR_ENCRYPTION=\"{}\"",
        keys.public_pem.trim_end().replace('\n', "\\n")
    );
    println!(
        "PRIVATE_KEY_FOR_ENCRYPTION=\"{}\"",
        keys.private_pem.trim_end().replace('\n', "\\n")
    );
    Ok(())
}
