//! `verify` command implementation
//!
//! Dispatches on the flags: `-a` prints the ABI, `-l` lists repositories,
//! otherwise the named package is verified against the selected repository.

use crate::cli::Cli;
use colored::Colorize;
use pkgverify::config::default_repos_dirs;
use pkgverify::{abi, verify_package, Config, Result, VerifyContext, VerifyError};
use std::path::Path;

/// Run the command described by `cli`.
pub fn run(cli: Cli) -> Result<()> {
    if cli.abi {
        return run_abi();
    }
    if cli.list {
        return run_list();
    }
    match cli.package.as_deref() {
        Some(package) => run_verify(&cli.repo, package, VerifyContext::new(cli.quiet)),
        None => Err(VerifyError::Config("no package given".to_string())),
    }
}

/// Print a failure to stderr.
pub fn report(err: &VerifyError) {
    eprintln!("{} {err}", "error:".red().bold());
    if let VerifyError::Untrusted { digest } = err {
        eprintln!("  Certificate SHA-256: {digest}");
    }
}

// ---------------------------------------------------------------------------
// -a
// ---------------------------------------------------------------------------

fn run_abi() -> Result<()> {
    println!("{}", abi::platform_abi()?);
    Ok(())
}

// ---------------------------------------------------------------------------
// -l
// ---------------------------------------------------------------------------

fn run_list() -> Result<()> {
    let config = Config::init(&default_repos_dirs(), None)?;
    if config.repo_count() == 0 {
        eprintln!("No repositories configured.");
        return Ok(());
    }
    let mut stdout = std::io::stdout().lock();
    config.print_repos(&mut stdout)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// verify
// ---------------------------------------------------------------------------

fn run_verify(repo: &str, package: &Path, ctx: VerifyContext) -> Result<()> {
    let config = Config::init(&default_repos_dirs(), Some(repo))?.with_env_overrides();
    if config.repo_count() != 1 {
        return Err(VerifyError::RepositoryNotFound(repo.to_string()));
    }

    tracing::debug!("verifying {} against repository {repo}", package.display());
    verify_package(&ctx, &config, package)?;

    if !ctx.quiet {
        eprintln!("{} {}", "VERIFIED".green(), package.display());
    }
    Ok(())
}
