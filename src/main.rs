use std::env;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use labkeeper::access::PermissionEvaluator;
use labkeeper::api::{ApiClient, ResourceKind};
use labkeeper::cli::{render_inspection, render_pending_admins, render_rules, render_status};
use labkeeper::config::ClientConfig;
use labkeeper::identity::{AuthClient, FileStorage, LoginRequest, RegisterRequest, Role, SessionGuard, SessionStore, ViewOrRedirect};
use labkeeper::screen::{InspectOutcome, MutationOutcome, ResourceScreen};

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {p} login <username> <password>\n  {p} register <username> <password> <confirm> [USER|ADMIN]\n  {p} logout\n  {p} status\n  {p} inspect <kind> <id>\n  {p} update <kind> <id> <json>\n  {p} delete <kind> <id>\n  {p} rules\n  {p} admins\n  {p} approve <id>\n\nKinds: coordinates, location, person, discipline, labwork\nEnvironment: LABKEEPER_API_URL, LABKEEPER_SESSION_FILE, LABKEEPER_FIELD_RULES, RUST_LOG",
        p = program
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .context("building log filter")?;
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let mut args: Vec<String> = env::args().collect();
    let program = args.remove(0);
    let Some(command) = args.first().cloned() else {
        print_usage(&program);
        std::process::exit(2);
    };
    let rest = &args[1..];
    if matches!(command.as_str(), "-h" | "--help" | "help") {
        print_usage(&program);
        return Ok(());
    }

    let cfg = ClientConfig::from_env()?;
    info!(target: "labkeeper::api", "api={} session_file={}", cfg.api_url, cfg.session_file.display());

    let store = SessionStore::with_system_clock(Arc::new(FileStorage::new(cfg.session_file.clone())));
    store.restore()?;

    match command.as_str() {
        "login" => {
            let [username, password] = take_args::<2>(rest, "login <username> <password>")?;
            let auth = AuthClient::new(cfg.api_url.clone(), store.clone());
            let session = auth.login(&LoginRequest { username, password }).await?;
            println!("Logged in as {} ({}), session expires at {}", session.principal_name, session.role, session.expires_at());
        }
        "register" => {
            if rest.len() < 3 || rest.len() > 4 {
                bail!("usage: register <username> <password> <confirm> [USER|ADMIN]");
            }
            let role = rest.get(3).map(|r| Role::parse(r)).unwrap_or_default();
            let auth = AuthClient::new(cfg.api_url.clone(), store.clone());
            auth.register(&RegisterRequest {
                username: rest[0].clone(),
                password: rest[1].clone(),
                confirm_password: rest[2].clone(),
                role,
            })
            .await?;
            println!("Registered {}. You can now log in.", rest[0]);
        }
        "logout" => {
            store.logout()?;
            println!("Logged out.");
        }
        "status" => {
            println!("{}", render_status(&store, store.valid_session().as_ref()));
        }
        "rules" => {
            println!("{}", render_rules(&cfg.field_rules));
        }
        "admins" => {
            let auth = AuthClient::new(cfg.api_url.clone(), store.clone());
            println!("{}", render_pending_admins(&auth.unconfirmed_admins().await?));
        }
        "approve" => {
            let [raw] = take_args::<1>(rest, "approve <id>")?;
            let id: i64 = raw.parse().with_context(|| format!("invalid id '{}'", raw))?;
            let auth = AuthClient::new(cfg.api_url.clone(), store.clone());
            println!("{}", auth.confirm_admin(id).await?);
        }
        "inspect" | "delete" | "update" => {
            let (kind, id) = parse_target(rest)?;
            let guard = Arc::new(SessionGuard::new(store.clone()));
            let backend = Arc::new(ApiClient::new(cfg.api_url.clone(), store.clone()));
            let evaluator = Arc::new(PermissionEvaluator::new(cfg.field_rules.clone()));
            let screen = ResourceScreen::new(kind, guard, backend.clone(), evaluator);

            if let ViewOrRedirect::Redirect(r) = screen.activate() {
                bail!("not logged in (redirect to {}); run `{} login`", r.to, program);
            }
            let record = backend.get(kind, id).await?;

            let outcome = match command.as_str() {
                "inspect" => {
                    match screen.inspect(&record).await {
                        InspectOutcome::Ready(i) => println!("{}", render_inspection(&i)),
                        InspectOutcome::Stale => println!("Selection changed; result discarded."),
                        InspectOutcome::Redirect(r) => bail!("session expired (redirect to {})", r.to),
                    }
                    return Ok(());
                }
                "delete" => screen.delete(&record).await?,
                _ => {
                    let raw = rest.get(2).ok_or_else(|| anyhow!("usage: update <kind> <id> <json>"))?;
                    let body: serde_json::Value = serde_json::from_str(raw).context("parsing update body")?;
                    screen.update(&record, &body).await?
                }
            };
            match outcome {
                MutationOutcome::Applied => println!("{} #{} {}d.", kind, id, command),
                MutationOutcome::Refused(msg) => println!("{}", msg),
                MutationOutcome::Stale => println!("Selection changed; nothing sent."),
                MutationOutcome::Redirect(r) => bail!("session expired (redirect to {})", r.to),
            }
        }
        other => {
            eprintln!("Unrecognized command: {}", other);
            print_usage(&program);
            std::process::exit(2);
        }
    }
    Ok(())
}

fn take_args<const N: usize>(rest: &[String], usage: &str) -> Result<[String; N]> {
    if rest.len() != N {
        bail!("usage: {}", usage);
    }
    let mut out: [String; N] = std::array::from_fn(|_| String::new());
    for (slot, v) in out.iter_mut().zip(rest) {
        *slot = v.clone();
    }
    Ok(out)
}

fn parse_target(rest: &[String]) -> Result<(ResourceKind, i64)> {
    let (Some(kind), Some(id)) = (rest.first(), rest.get(1)) else {
        bail!("expected <kind> <id>");
    };
    let kind = ResourceKind::parse(kind).ok_or_else(|| anyhow!("unknown resource kind '{}'", kind))?;
    let id: i64 = id.parse().with_context(|| format!("invalid id '{}'", id))?;
    Ok((kind, id))
}
