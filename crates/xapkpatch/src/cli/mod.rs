use clap::Parser;
use std::path::PathBuf;

pub mod program;

#[derive(Parser, Debug)]
#[command(
    name = "xapkpatch",
    version,
    about = "Recompile an XAPK with optional manifest patches"
)]
pub struct Cli {
    /// Input XAPK file
    pub input_xapk: PathBuf,

    /// Apply network security config patch
    #[arg(long)]
    pub network_fix: bool,

    /// Set extractNativeLibs to true
    #[arg(long)]
    pub extract_native_libs: bool,

    /// Pause after applying patches for manual edits before rebuilding
    #[arg(long)]
    pub pause: bool,

    /// Install patched APKs to the connected ADB device after packaging
    #[arg(long)]
    pub install: bool,

    /// Let the signer replace existing signatures (default from config)
    #[arg(long, overrides_with = "no_allow_resign")]
    pub allow_resign: bool,

    /// Refuse to re-sign already signed APKs
    #[arg(long, overrides_with = "allow_resign")]
    pub no_allow_resign: bool,

    /// Configuration file (defaults to ./xapkpatch.toml when present)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// The effective `--allowResign` switch, falling back to `configured`.
    pub fn allow_resign(&self, configured: bool) -> bool {
        if self.allow_resign {
            true
        } else if self.no_allow_resign {
            false
        } else {
            configured
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_flags() {
        let cli = Cli::try_parse_from([
            "xapkpatch",
            "app.xapk",
            "--network-fix",
            "--install",
            "-c",
            "custom.toml",
        ])
        .unwrap();

        assert_eq!(cli.input_xapk, PathBuf::from("app.xapk"));
        assert!(cli.network_fix);
        assert!(!cli.extract_native_libs);
        assert!(cli.install);
        assert!(!cli.pause);
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
    }

    #[test]
    fn resign_switch_overrides_config() {
        let cli = Cli::try_parse_from(["xapkpatch", "app.xapk"]).unwrap();
        assert!(cli.allow_resign(true));
        assert!(!cli.allow_resign(false));

        let cli = Cli::try_parse_from(["xapkpatch", "app.xapk", "--no-allow-resign"]).unwrap();
        assert!(!cli.allow_resign(true));

        let cli = Cli::try_parse_from([
            "xapkpatch",
            "app.xapk",
            "--no-allow-resign",
            "--allow-resign",
        ])
        .unwrap();
        assert!(cli.allow_resign(false));
    }

    #[test]
    fn input_is_required() {
        assert!(Cli::try_parse_from(["xapkpatch"]).is_err());
    }
}
