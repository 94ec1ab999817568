mod browse;
mod config;
mod render;

use std::{io, path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use client_core::{
    load_dashboard, ControllerEvent, ControllerOptions, FileStore, HttpCrmApi, ListController,
    LocalStore, ReloadOutcome, SessionContext, ThemeContext,
};
use shared::domain::{
    ClientId, ClientStatus, PaymentStatus, SortColumn, SortDirection, Theme, ToggleField,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{
    config::{load_settings, Settings, DEFAULT_CONFIG_FILE},
    render::{render_dashboard, render_detail, render_notice, render_table, Palette},
};

#[derive(Parser, Debug)]
#[command(name = "mini-crm", version, about = "Client list for the Mini CRM panel")]
struct Args {
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// Overrides `api_url` from the config file and environment.
    #[arg(long)]
    api_url: Option<String>,
    #[arg(long)]
    no_color: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        username: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    Dashboard,
    Theme {
        #[command(subcommand)]
        action: Option<ThemeAction>,
    },
    Clients {
        #[command(subcommand)]
        action: ClientsAction,
    },
}

#[derive(Subcommand, Debug)]
enum ThemeAction {
    Show,
    Toggle,
    Set { theme: Theme },
}

#[derive(ClapArgs, Debug, Default)]
struct FilterArgs {
    /// Search text.
    #[arg(long)]
    q: Option<String>,
    #[arg(long)]
    status: Option<ClientStatus>,
    #[arg(long)]
    payment: Option<PaymentStatus>,
    #[arg(long)]
    course: Option<String>,
    #[arg(long)]
    sort: Option<SortColumn>,
    #[arg(long)]
    order: Option<SortDirection>,
}

#[derive(Subcommand, Debug)]
enum ClientsAction {
    List {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Every field of one client.
    Show {
        id: ClientId,
    },
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        course: String,
        #[arg(long, default_value_t = ClientStatus::Active)]
        status: ClientStatus,
        #[arg(long, default_value_t = PaymentStatus::Unpaid)]
        payment: PaymentStatus,
    },
    Edit {
        id: ClientId,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        course: Option<String>,
        #[arg(long)]
        status: Option<ClientStatus>,
        #[arg(long)]
        payment: Option<PaymentStatus>,
    },
    /// Several ids are deleted concurrently.
    Delete {
        #[arg(required = true)]
        ids: Vec<ClientId>,
        #[arg(long)]
        yes: bool,
    },
    Toggle {
        id: ClientId,
        #[arg(default_value_t = ToggleField::Status)]
        field: ToggleField,
    },
    Export {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long, default_value = "clients.csv")]
        out: PathBuf,
    },
    Browse,
}

struct App {
    settings: Settings,
    session: Arc<SessionContext>,
    theme: ThemeContext,
    palette: Palette,
}

impl App {
    fn new(settings: Settings, no_color: bool) -> Self {
        let store: Arc<dyn LocalStore> = Arc::new(FileStore::new(settings.store_path.clone()));
        let session = Arc::new(SessionContext::new(store.clone()));
        let theme = ThemeContext::new(store, settings.theme);
        let palette = if no_color {
            Palette::plain()
        } else {
            Palette::for_theme(theme.current())
        };
        Self {
            settings,
            session,
            theme,
            palette,
        }
    }

    fn api(&self) -> Result<HttpCrmApi> {
        HttpCrmApi::new(&self.settings.api_url, self.session.clone())
            .with_context(|| format!("invalid api url '{}'", self.settings.api_url))
    }

    fn require_login(&self) -> Result<()> {
        let logged_in = self
            .session
            .is_logged_in()
            .with_context(|| format!("failed to read '{}'", self.settings.store_path.display()))?;
        if !logged_in {
            bail!("not logged in; run `mini-crm login <username> --password <password>` first");
        }
        Ok(())
    }

    fn controller(&self, page_size: Option<u32>) -> Result<Arc<ListController>> {
        let api = Arc::new(self.api()?);
        Ok(ListController::new(
            api,
            ControllerOptions {
                page_size: page_size.unwrap_or(self.settings.page_size),
                search_quiet_period: self.settings.search_quiet_period(),
            },
        ))
    }

    fn print_notices(&self, events: &mut broadcast::Receiver<ControllerEvent>) {
        while let Ok(event) = events.try_recv() {
            if let ControllerEvent::Notice(notice) = event {
                println!("{}", render_notice(&notice, &self.palette));
            }
        }
    }
}

/// Applies filters without reloading in between; the caller reloads once.
async fn apply_filters(controller: &ListController, filters: FilterArgs) {
    let FilterArgs {
        q,
        status,
        payment,
        course,
        sort,
        order,
    } = filters;
    controller
        .edit_query(|query| {
            if let Some(q) = &q {
                query.set_text(q);
            }
            query.set_status(status);
            query.set_payment(payment);
            if let Some(course) = &course {
                query.set_course(course);
            }
            if let Some(sort) = sort {
                query.set_sort(sort);
                query.set_order(sort.default_direction());
            }
            if let Some(order) = order {
                query.set_order(order);
            }
        })
        .await;
}

/// Walks pages of the current query until `id` is visible.
async fn locate(controller: &ListController, id: ClientId) -> Result<()> {
    if let ReloadOutcome::Failed(message) = controller.reload().await {
        bail!(message);
    }
    loop {
        if controller.snapshot().await.find(id).is_some() {
            return Ok(());
        }
        match controller.next_page().await {
            Some(ReloadOutcome::Failed(message)) => bail!(message),
            Some(_) => {}
            None => bail!("client {id} not found"),
        }
    }
}


async fn run_clients(app: App, action: ClientsAction) -> Result<()> {
    app.require_login()?;
    match action {
        ClientsAction::List {
            filters,
            page,
            limit,
        } => {
            let controller = app.controller(limit)?;
            let mut events = controller.subscribe_events();
            apply_filters(&controller, filters).await;
            let outcome = controller.reload().await;
            if page > 1 && matches!(outcome, ReloadOutcome::Applied { .. }) {
                controller.set_page(page).await;
            }
            app.print_notices(&mut events);
            let state = controller.snapshot().await;
            println!("{}", render_table(&state, &app.palette));
            if let Some(error) = state.error {
                bail!(error);
            }
        }
        ClientsAction::Show { id } => {
            let controller = app.controller(None)?;
            locate(&controller, id).await?;
            let state = controller.snapshot().await;
            let client = state
                .find(id)
                .with_context(|| format!("client {id} not found"))?;
            println!("{}", render_detail(client, &app.palette));
        }
        ClientsAction::Add {
            name,
            phone,
            course,
            status,
            payment,
        } => {
            let controller = app.controller(None)?;
            let mut events = controller.subscribe_events();
            controller.open_create().await;
            controller
                .edit_draft(|draft| {
                    draft.full_name = name;
                    draft.phone = phone;
                    draft.course = course;
                    draft.status = status;
                    draft.payment_status = payment;
                })
                .await?;
            let saved = controller.save().await;
            app.print_notices(&mut events);
            saved?;
        }
        ClientsAction::Edit {
            id,
            name,
            phone,
            course,
            status,
            payment,
        } => {
            let controller = app.controller(None)?;
            let mut events = controller.subscribe_events();
            locate(&controller, id).await?;
            controller.open_edit(id).await?;
            controller
                .edit_draft(|draft| {
                    if let Some(v) = name {
                        draft.full_name = v;
                    }
                    if let Some(v) = phone {
                        draft.phone = v;
                    }
                    if let Some(v) = course {
                        draft.course = v;
                    }
                    if let Some(v) = status {
                        draft.status = v;
                    }
                    if let Some(v) = payment {
                        draft.payment_status = v;
                    }
                })
                .await?;
            let saved = controller.save().await;
            app.print_notices(&mut events);
            saved?;
        }
        ClientsAction::Delete { ids, yes } => {
            if !yes {
                let mut lines = BufReader::new(tokio::io::stdin()).lines();
                let prompt = format!("Delete {} client(s)?", ids.len());
                if !browse::confirm(&mut lines, &prompt).await? {
                    println!("aborted");
                    return Ok(());
                }
            }
            let controller = app.controller(None)?;
            let mut events = controller.subscribe_events();
            if let [id] = ids.as_slice() {
                let deleted = controller.delete(*id).await;
                app.print_notices(&mut events);
                deleted?;
            } else {
                let report = controller.delete_many(&ids).await;
                app.print_notices(&mut events);
                for (id, reason) in &report.failed {
                    println!("  {id}: {reason}");
                }
                if !report.is_complete() {
                    bail!("{} of {} deletions failed", report.failed.len(), ids.len());
                }
            }
        }
        ClientsAction::Toggle { id, field } => {
            let controller = app.controller(None)?;
            let mut events = controller.subscribe_events();
            let toggled = controller.toggle_field(id, field).await;
            app.print_notices(&mut events);
            toggled?;
        }
        ClientsAction::Export { filters, out } => {
            let controller = app.controller(None)?;
            let mut events = controller.subscribe_events();
            apply_filters(&controller, filters).await;
            let exported = controller.export_csv().await;
            app.print_notices(&mut events);
            let bytes = exported?;
            tokio::fs::write(&out, &bytes)
                .await
                .with_context(|| format!("failed to write '{}'", out.display()))?;
            println!("wrote {} bytes to {}", bytes.len(), out.display());
        }
        ClientsAction::Browse => {
            let controller = app.controller(None)?;
            browse::run(controller, app.theme, app.palette).await?;
        }
    }
    Ok(())
}

async fn run(args: Args, settings: Settings) -> Result<()> {
    let app = App::new(settings, args.no_color);
    match args.command {
        Command::Login { username, password } => {
            app.api()?.login(&username, &password).await?;
            println!("logged in as {username}");
        }
        Command::Logout => {
            app.session.clear()?;
            println!("logged out");
        }
        Command::Dashboard => {
            app.require_login()?;
            let api = app.api()?;
            let summary = load_dashboard(&api).await;
            println!("{}", render_dashboard(&summary, &app.palette));
        }
        Command::Theme { action } => match action.unwrap_or(ThemeAction::Show) {
            ThemeAction::Show => println!("{}", app.theme.current()),
            ThemeAction::Toggle => println!("{}", app.theme.toggle()?),
            ThemeAction::Set { theme } => {
                app.theme.set(theme)?;
                println!("{theme}");
            }
        },
        Command::Clients { action } => run_clients(app, action).await?,
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = load_settings(&args.config)?;
    if let Some(api_url) = &args.api_url {
        settings.api_url = api_url.clone();
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
    info!(api_url = %settings.api_url, store = %settings.store_path.display(), "mini-crm starting");

    run(args, settings).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_with_store(store_path: PathBuf) -> Settings {
        Settings {
            store_path,
            ..Settings::default()
        }
    }

    #[test]
    fn require_login_reports_unreadable_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store_path = dir.path().join("store.json");
        std::fs::write(&store_path, "{ broken").expect("write");

        let app = App::new(settings_with_store(store_path), true);
        let err = app.require_login().expect_err("corrupt store");
        let message = format!("{err:#}");
        assert!(message.starts_with("failed to read"), "{message}");
        assert!(!message.contains("not logged in"), "{message}");
    }

    #[test]
    fn require_login_distinguishes_missing_token() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = App::new(settings_with_store(dir.path().join("store.json")), true);
        let err = app.require_login().expect_err("no token yet");
        assert!(err.to_string().starts_with("not logged in"));

        app.session.store_token("tok").expect("store");
        app.require_login().expect("logged in");
    }

    #[test]
    fn show_subcommand_takes_an_id() {
        let args = Args::try_parse_from(["mini-crm", "clients", "show", "12"]).expect("parse");
        assert!(matches!(
            args.command,
            Command::Clients {
                action: ClientsAction::Show { id: ClientId(12) }
            }
        ));
    }
}
