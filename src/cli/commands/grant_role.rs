use anyhow::{anyhow, Context};
use clap::Args;
use serde_json::json;

use crate::auth::Role;
use crate::cli::{connect, utils::output_success, OutputFormat};
use crate::database::{OrganizationRepository, UserRepository};

#[derive(Args, Debug)]
pub struct GrantRoleArgs {
    #[arg(long, help = "E-mail of a user who has signed up")]
    pub email: String,

    #[arg(long, help = "Organization slug")]
    pub org: String,

    #[arg(long, help = "ADMIN, EDITOR or MEMBER")]
    pub role: Role,
}

pub async fn handle(args: GrantRoleArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let pool = connect().await?;
    let users = UserRepository::new(pool.clone());
    let organizations = OrganizationRepository::new(pool);

    let user = users
        .find_by_email(&args.email)
        .await?
        .ok_or_else(|| anyhow!("no user with e-mail {}", args.email))?;
    let org = organizations
        .get_by_slug(&args.org)
        .await
        .with_context(|| format!("organization {} not found", args.org))?;

    organizations
        .add_member(org.id, user.id, args.role)
        .await
        .with_context(|| format!("could not grant {} to {}", args.role, args.email))?;

    output_success(
        output_format,
        &format!("{} is now {} in {}", user.email, args.role, org.slug),
        Some(json!({ "user_id": user.id, "organization": org.slug, "role": args.role })),
    )
}
