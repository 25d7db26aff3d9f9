//! AIC maintenance entry point: migrations, seeding, retention and
//! permission inspection against the production-tracking database.

use aic_access::{AccessConfig, AccessService, RequestContext};
use aic_core::authz;
use aic_core::models::account::CreateAccount;
use aic_core::repository::{PermissionRepository, RoleRepository, Store};
use aic_db::{DbConfig, DbManager, SurrealStore};
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use surrealdb::engine::remote::ws::Client;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Maintenance tasks for AIC production tracking
#[derive(Parser, Debug)]
#[command(name = "aic-maintenance", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// SurrealDB WebSocket endpoint
    #[arg(long, env = "AIC_DB_URL", global = true)]
    db_url: Option<String>,

    #[arg(long, env = "AIC_DB_NAMESPACE", global = true)]
    db_namespace: Option<String>,

    #[arg(long, env = "AIC_DB_DATABASE", global = true)]
    db_database: Option<String>,

    /// Root user
    #[arg(long, env = "AIC_DB_USER", global = true)]
    db_user: Option<String>,

    /// Root password
    #[arg(long, env = "AIC_DB_PASSWORD", global = true, hide_env_values = true)]
    db_password: Option<String>,
}

impl Cli {
    fn db_config(&self) -> DbConfig {
        let defaults = DbConfig::default();
        DbConfig {
            url: self.db_url.clone().unwrap_or(defaults.url),
            namespace: self.db_namespace.clone().unwrap_or(defaults.namespace),
            database: self.db_database.clone().unwrap_or(defaults.database),
            username: self.db_user.clone().unwrap_or(defaults.username),
            password: self.db_password.clone().unwrap_or(defaults.password),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply pending schema migrations
    Migrate,

    /// Create the default permissions and roles
    Seed {
        /// Only create the permission catalog
        #[arg(long, conflicts_with = "roles_only")]
        permissions_only: bool,

        /// Only create the default roles
        #[arg(long)]
        roles_only: bool,
    },

    /// Create an account, optionally holding a role
    CreateAccount(CreateAccountArgs),

    /// Delete stale notifications and activity entries
    Purge {
        /// Only count what would be deleted
        #[arg(long)]
        dry_run: bool,
    },

    /// List the permission catalog, or one role's permissions
    Permissions {
        /// Role name (case-insensitive)
        #[arg(long)]
        role: Option<String>,
    },
}

#[derive(Args, Debug)]
struct CreateAccountArgs {
    #[arg(long)]
    username: String,

    #[arg(long)]
    first_name: String,

    #[arg(long)]
    last_name: String,

    #[arg(long)]
    email: Option<String>,

    #[arg(long, env = "AIC_ACCOUNT_PASSWORD", hide_env_values = true)]
    password: String,

    /// Role name (case-insensitive)
    #[arg(long)]
    role: Option<String>,
}

impl CreateAccountArgs {
    fn to_input(&self, role_id: Option<Uuid>) -> CreateAccount {
        CreateAccount {
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
            role_id,
        }
    }
}

type Service = AccessService<SurrealStore<Client>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("aic=info")),
        )
        .json()
        .init();

    let cli = Cli::parse();
    let config = cli.db_config();
    tracing::debug!(?config, "Connecting");

    let manager = DbManager::connect(&config)
        .await
        .context("failed to connect to SurrealDB")?;

    if let Err(e) = run(&cli.command, &manager).await {
        tracing::error!(error = %e, "Maintenance task failed");
        return Err(e);
    }
    Ok(())
}

async fn run(command: &Command, manager: &DbManager) -> anyhow::Result<()> {
    let service: Service = AccessService::new(manager.store(), AccessConfig::default());

    match command {
        Command::Migrate => {
            manager.migrate().await.context("migration failed")?;
            println!("schema at version {}", aic_db::latest_version());
        }
        Command::Seed {
            permissions_only,
            roles_only,
        } => {
            if *permissions_only {
                let created = service.create_default_permissions().await?;
                println!("permissions created: {}", created.len());
            } else if *roles_only {
                let created = service.create_default_roles().await?;
                println!("roles created: {}", created.len());
            } else {
                let report = service.seed().await?;
                println!(
                    "permissions created: {}, roles created: {}",
                    report.permissions_created, report.roles_created
                );
            }
        }
        Command::CreateAccount(args) => {
            let role_id = match &args.role {
                Some(name) => Some(
                    service
                        .store()
                        .roles()
                        .get_by_name(name)
                        .await
                        .with_context(|| format!("unknown role {name}"))?
                        .id,
                ),
                None => None,
            };
            let account = service
                .create_account(&RequestContext::system(), args.to_input(role_id))
                .await?;
            println!("account {} created ({})", account.username, account.id);
        }
        Command::Purge { dry_run } => {
            let report = service.purge_stale(*dry_run).await?;
            let verb = if report.dry_run { "would delete" } else { "deleted" };
            println!(
                "{verb}: {} read, {} unread, {} expired notifications; {} activities",
                report.notifications.read,
                report.notifications.unread,
                report.notifications.expired,
                report.activities
            );
        }
        Command::Permissions { role } => print_permissions(&service, role.as_deref()).await?,
    }
    Ok(())
}

async fn print_permissions(service: &Service, role: Option<&str>) -> anyhow::Result<()> {
    let permissions = match role {
        Some(name) => {
            let role = service
                .store()
                .roles()
                .get_by_name(name)
                .await
                .with_context(|| format!("unknown role {name}"))?;
            println!("{} ({})", role.name, if role.is_active { "active" } else { "inactive" });
            service.store().roles().get_permissions(role.id).await?
        }
        None => service.store().permissions().list_all().await?,
    };

    for (module, actions) in authz::group_by_module(permissions.iter().map(|p| p.key())) {
        let actions: Vec<_> = actions.iter().map(|a| a.as_str()).collect();
        println!("{:<16} {}", module.label(), actions.join(", "));
    }
    Ok(())
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
    fn create_account_with_role() {
        let cli = Cli::try_parse_from([
            "aic-maintenance",
            "create-account",
            "--username",
            "jdupont",
            "--first-name",
            "Jean",
            "--last-name",
            "Dupont",
            "--password",
            "s3cret-pass",
            "--role",
            "Super Administrator",
        ])
        .unwrap();

        let Command::CreateAccount(args) = cli.command else {
            panic!("expected create-account");
        };
        assert_eq!(args.role.as_deref(), Some("Super Administrator"));

        let role_id = Uuid::new_v4();
        let input = args.to_input(Some(role_id));
        assert_eq!(input.username, "jdupont");
        assert_eq!(input.role_id, Some(role_id));
        assert!(input.email.is_none());
    }

    #[test]
    fn seed_flags_are_exclusive() {
        let cli = Cli::try_parse_from(["aic-maintenance", "seed", "--roles-only"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Seed {
                permissions_only: false,
                roles_only: true
            }
        ));

        let err = Cli::try_parse_from([
            "aic-maintenance",
            "seed",
            "--permissions-only",
            "--roles-only",
        ]);
        assert!(err.is_err());
    }
}
