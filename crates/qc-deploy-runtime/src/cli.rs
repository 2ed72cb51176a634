//! Command-line arguments.

use clap::Parser;
use qc_deploy_orchestrator::domain::Address;
use std::path::PathBuf;

/// QC-Deploy: deploy and wire the registry, limiter and token ledger
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "qc-deploy")]
#[command(about = "Dependency-ordered deployment of the stable coin components")]
pub struct Args {
    /// TOML deployment plan (defaults to the standard token plan)
    #[arg(short, long)]
    pub plan: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Deployer address, overrides config and environment
    #[arg(short, long)]
    pub deployer: Option<Address>,

    /// Write a JSON address book to this path
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Skip pre-flight validation (unresolved references are still caught when reached)
    #[arg(long)]
    pub no_preflight: bool,

    /// Validate the plan and exit without deploying
    #[arg(long)]
    pub validate_only: bool,

    /// Retries for timed-out configuration calls
    #[arg(long)]
    pub max_retries: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let args = Args::parse_from([
            "qc-deploy",
            "--plan",
            "plan.toml",
            "--deployer",
            "0x1111111111111111111111111111111111111111",
            "--no-preflight",
            "--max-retries",
            "2",
        ]);
        assert_eq!(args.plan, Some(PathBuf::from("plan.toml")));
        assert_eq!(args.deployer, Some(Address::new([0x11; 20])));
        assert!(args.no_preflight);
        assert!(!args.validate_only);
        assert_eq!(args.max_retries, Some(2));
    }

    #[test]
    fn test_rejects_bad_deployer() {
        assert!(Args::try_parse_from(["qc-deploy", "--deployer", "0x12"]).is_err());
    }
}
