use clap::{Args, Parser, Subcommand};

/// PartsDesk backend - admin back-office for auto-parts listings
#[derive(Parser, Clone)]
#[command(name = "partsdesk")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "PartsDesk API server and admin tooling")]
#[command(long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, default_value = ".env")]
    pub config: String,

    /// Server port override
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Server host override
    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Start the web server (default action)
    Serve,
    /// Database management commands
    Db {
        #[command(subcommand)]
        action: DbCommands,
    },
    /// Account management commands
    User {
        #[command(subcommand)]
        action: UserCommands,
    },
    /// Talk to a running instance through the caching client
    Remote {
        /// Base URL of the API server
        #[arg(long, env = "API_URL", default_value = "http://127.0.0.1:5001")]
        api: String,
        /// Client-side store for the session and the product snapshot
        #[arg(long, default_value = ".partsdesk_client")]
        store: String,
        #[command(subcommand)]
        action: RemoteCommands,
    },
}

#[derive(Subcommand, Clone)]
pub enum RemoteCommands {
    /// Create an account and persist the session
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign in and persist the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Drop the persisted session
    Logout,
    /// Show the identity behind the stored session
    Whoami,
    /// List the caller's products; serves the cached snapshot when offline
    Products,
    /// Show one product by id
    Show { id: String },
    /// Create a product
    Add(AddProductArgs),
    /// Update fields on a product
    Set(SetProductArgs),
    /// Delete a product
    Rm { id: String },
}

#[derive(Args, Clone)]
pub struct AddProductArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub price: f64,
    #[arg(long)]
    pub category: String,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub brand: Option<String>,
    #[arg(long, default_value_t = 0)]
    pub stock: u32,
}

#[derive(Args, Clone)]
pub struct SetProductArgs {
    pub id: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub price: Option<f64>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub stock: Option<u32>,
    #[arg(long)]
    pub in_stock: Option<bool>,
}

#[derive(Subcommand, Clone)]
pub enum DbCommands {
    /// Open the document store and report success
    Test,
}

#[derive(Subcommand, Debug, Clone)]
pub enum UserCommands {
    /// Create an admin account without going through registration
    AddAdmin(AddAdminArgs),
}

#[derive(Args, Debug, Clone)]
pub struct AddAdminArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub password: String,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn is_server_mode(&self) -> bool {
        matches!(self.command, None | Some(Commands::Serve))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["partsdesk"]);
        assert!(!cli.verbose);
        assert_eq!(cli.config, ".env");
        assert!(cli.is_server_mode());
    }

    #[test]
    fn test_db_test_command() {
        let cli = Cli::parse_from(["partsdesk", "db", "test"]);
        assert!(!cli.is_server_mode());
        match cli.command {
            Some(Commands::Db {
                action: DbCommands::Test,
            }) => {}
            _ => panic!("Expected db test command"),
        }
    }

    #[test]
    fn test_remote_products_command() {
        let cli = Cli::parse_from(["partsdesk", "remote", "--api", "http://10.0.0.2:5001", "products"]);
        match cli.command {
            Some(Commands::Remote { api, action: RemoteCommands::Products, .. }) => {
                assert_eq!(api, "http://10.0.0.2:5001");
            }
            _ => panic!("Expected remote products command"),
        }
    }

    #[test]
    fn test_remote_set_command() {
        let cli = Cli::parse_from([
            "partsdesk", "remote", "set", "abc-123", "--price", "19.5", "--in-stock", "false",
        ]);
        match cli.command {
            Some(Commands::Remote { action: RemoteCommands::Set(args), .. }) => {
                assert_eq!(args.id, "abc-123");
                assert_eq!(args.price, Some(19.5));
                assert_eq!(args.in_stock, Some(false));
                assert!(args.name.is_none());
            }
            _ => panic!("Expected remote set command"),
        }
    }

    #[test]
    fn test_add_admin_command() {
        let cli = Cli::parse_from([
            "partsdesk",
            "user",
            "add-admin",
            "--name",
            "Ops",
            "--email",
            "ops@example.com",
            "--password",
            "hunter2hunter2",
        ]);
        match cli.command {
            Some(Commands::User {
                action: UserCommands::AddAdmin(args),
            }) => {
                assert_eq!(args.email, "ops@example.com");
            }
            _ => panic!("Expected user add-admin command"),
        }
    }
}
