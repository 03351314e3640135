use std::fs;
use std::path::PathBuf;

use argh::FromArgs;
use tracing::{info, instrument, warn};

use crate::command::Error;
use crate::policy::{self, PolicySecurityDetails};

#[derive(FromArgs, PartialEq, Debug)]
#[argh(
    subcommand,
    name = "inspect",
    description = "Print the token validation requirements of a policy document"
)]
pub struct Options {
    #[argh(positional)]
    /// path to the policy XML document
    pub file: PathBuf,

    #[argh(switch)]
    /// treat malformed documents as having no security details
    pub lenient: bool,
}

pub struct Command {
    options: Options,
}

impl Command {
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    #[instrument(skip(self), fields(file = %self.options.file.display()))]
    pub fn run(&self) -> Result<(), Error> {
        let document = fs::read_to_string(&self.options.file)?;
        let details = self.inspect(&document)?;

        if details.is_empty() {
            warn!("No token validation settings found in policy document");
        }

        info!(
            "Found {} application id(s), {} audience(s), {} required claim(s)",
            details.application_ids.len(),
            details.audiences.len(),
            details.required_claims.len()
        );

        println!("{}", serde_json::to_string_pretty(&details)?);
        Ok(())
    }

    fn inspect(&self, document: &str) -> Result<PolicySecurityDetails, Error> {
        if self.options.lenient {
            Ok(policy::parse_security_details_or_default(document))
        } else {
            Ok(policy::parse_security_details(document)?)
        }
    }
}
