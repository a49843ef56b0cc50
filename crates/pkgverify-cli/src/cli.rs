//! Command-line arguments

use clap::Parser;
use std::path::PathBuf;

/// Repository used when `-r` is not given.
pub const DEFAULT_REPO: &str = "default";

/// Verify a package archive against its repository's signing policy.
#[derive(Debug, Parser)]
#[command(name = "verify", version, about)]
pub struct Cli {
    /// Print the platform ABI string and exit
    #[arg(short = 'a', long = "abi")]
    pub abi: bool,

    /// List the configured repositories and exit
    #[arg(short = 'l', long = "list")]
    pub list: bool,

    /// Suppress progress output
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    /// Repository whose signing policy applies
    #[arg(short = 'r', long = "repo", value_name = "REPO", default_value = DEFAULT_REPO)]
    pub repo: String,

    /// Package archive to verify
    #[arg(value_name = "PACKAGE", required_unless_present_any = ["abi", "list"])]
    pub package: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn package_required_without_abi_or_list() {
        assert!(Cli::try_parse_from(["verify"]).is_err());
        assert!(Cli::try_parse_from(["verify", "-a"]).is_ok());
        assert!(Cli::try_parse_from(["verify", "-l"]).is_ok());
    }

    #[test]
    fn repo_defaults() {
        let cli = Cli::try_parse_from(["verify", "-q", "foo.pkg"]).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(cli.repo, DEFAULT_REPO);
        assert!(cli.quiet);
        assert_eq!(cli.package, Some(PathBuf::from("foo.pkg")));

        let cli = Cli::try_parse_from(["verify", "-r", "mirror", "foo.pkg"])
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(cli.repo, "mirror");
    }
}
