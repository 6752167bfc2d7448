use crate::app::Command;
use crate::domain::model::DomainName;
use clap::Parser;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Parser)]
#[command(name = "regfish")]
#[command(about = "Dump domains, DNS zones and contract data from the regfish.de customer portal")]
#[command(override_usage = "regfish [-v] [-c FILE] -l | -a | -d DOMAIN...")]
pub struct CliConfig {
    #[arg(short = 'l', help = "List domains")]
    pub list: bool,

    #[arg(short = 'a', help = "All domain data as JSON")]
    pub all: bool,

    #[arg(short = 'd', help = "Dump data of the given domains as JSON")]
    pub dump: bool,

    #[arg(short = 'v', help = "Verbose mode, log on STDERR")]
    pub verbose: bool,

    #[arg(short = 'c', long, help = "TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(value_name = "DOMAIN", help = "Domain names to dump, only accepted together with -d")]
    pub domains: Vec<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsageError {
    #[error("Need one of -l, -a or -d")]
    NoMode,

    #[error("Need domain name(s) as arguments for -d flag")]
    MissingDomains,

    #[error("Domain arguments require the -d flag")]
    DomainsWithoutDump,
}

impl CliConfig {
    /// `-l` wins over `-a`, which wins over `-d`.
    pub fn to_command(&self) -> Result<Command, UsageError> {
        if self.list {
            Ok(Command::List)
        } else if self.all {
            Ok(Command::All)
        } else if self.dump {
            if self.domains.is_empty() {
                return Err(UsageError::MissingDomains);
            }
            Ok(Command::Domains(
                self.domains.iter().map(|d| DomainName::new(d.trim())).collect(),
            ))
        } else if !self.domains.is_empty() {
            Err(UsageError::DomainsWithoutDump)
        } else {
            Err(UsageError::NoMode)
        }
    }
}
