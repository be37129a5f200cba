use clap::{Args, Subcommand};

#[derive(Args)]
pub struct PlanArgs {
    #[arg(long, help = "Source catalog file (JSON)")]
    pub catalog: String,

    #[arg(long, help = "Compose plan file (JSON)")]
    pub plan: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the SQL and bound parameters of a composed query
    Render {
        #[command(flatten)]
        plan: PlanArgs,

        /// SQL dialect: "mysql" or "postgres"
        #[arg(long, default_value = "mysql")]
        dialect: String,
    },
    /// Print the output fields of a composed query and their source columns
    Columns {
        #[command(flatten)]
        plan: PlanArgs,
    },
    /// Run a composed query and print the rows as JSON
    Fetch {
        #[command(flatten)]
        plan: PlanArgs,

        #[arg(long, env = "JOINERY_DATABASE_URL", help = "MySQL connection URL")]
        url: String,

        #[arg(
            long,
            value_name = "ATTR=PROP",
            help = "Expand a GROUP_CONCAT column into nested rows; repeatable"
        )]
        unzip: Vec<String>,

        #[arg(long, default_value = ",", help = "Separator used by --unzip")]
        separator: String,
    },
    /// Synchronize a many-to-many join table with a set of ids
    Sync {
        #[arg(long, env = "JOINERY_DATABASE_URL", help = "MySQL connection URL")]
        url: String,

        #[arg(long, help = "Join table to update")]
        table: String,

        #[arg(
            long,
            value_name = "COLUMN=VALUE",
            required = true,
            help = "Key value scoping the join table rows; repeatable"
        )]
        scope: Vec<String>,

        #[arg(long, help = "Column holding the remote id")]
        remote_field: String,

        #[arg(long, default_value = "", help = "Comma separated ids that should exist")]
        desired: String,

        #[arg(long, default_value = "", help = "Comma separated ids that exist now")]
        previous: String,
    },
    /// Print the next AUTO_INCREMENT value of a source's table
    NextId {
        #[arg(long, help = "Source catalog file (JSON)")]
        catalog: String,

        #[arg(long, help = "Source identifier")]
        source: String,

        #[arg(long, env = "JOINERY_DATABASE_URL", help = "MySQL connection URL")]
        url: String,
    },
}

/// Splits `NAME=VALUE` arguments, keeping their order.
pub fn parse_pairs(args: &[String]) -> Result<Vec<(String, String)>, crate::error::CliError> {
    args.iter()
        .map(|arg| match arg.split_once('=') {
            Some((name, value)) if !name.trim().is_empty() => {
                Ok((name.trim().to_string(), value.trim().to_string()))
            }
            _ => Err(crate::error::CliError::InvalidPair(arg.clone())),
        })
        .collect()
}
