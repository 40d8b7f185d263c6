//! Encrypt and decrypt commands

use crate::context::CliContext;
use crate::error::Result;

pub fn run_encrypt(ctx: &CliContext, plaintext: &str) -> Result<()> {
    let cipher = ctx.cipher(None)?;
    println!("{}", cipher.encrypt(plaintext)?);
    Ok(())
}

/// Decrypt a current or legacy token.
pub fn run_decrypt(ctx: &CliContext, token: &str) -> Result<()> {
    let cipher = ctx.cipher(None)?;
    println!("{}", cipher.decrypt(token)?);
    Ok(())
}
