//! Interactive list view on stdin/stdout. Keystroke-level search is
//! approximated by `/text` lines, which go through the same debounce as
//! typing; `enter` confirms immediately.

use std::{
    io::{self, Write},
    path::PathBuf,
    sync::Arc,
};

use anyhow::Context;
use client_core::{ControllerEvent, ListController, ThemeContext};
use shared::domain::{
    ClientDraft, ClientId, ClientStatus, PaymentStatus, SortColumn, SortDirection, ToggleField,
};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines},
    sync::{broadcast::error::RecvError, Mutex},
    task::JoinHandle,
};
use tracing::debug;

use crate::render::{render_detail, render_notice, render_table, Palette};

const HELP: &str = "\
commands:
  /<text>             search (applied after the typing pause)
  enter               apply the search text now
  status <active|inactive|all>
  payment <paid|unpaid|all>
  course <text>       empty clears the filter
  sort <createdAt|fullName|status|paymentStatus>   click-style toggle
  order <asc|desc>    limit <n>    page <n>    next    prev    reset
  sel <id>...         selall    unselall    clear
  show <id>           details of a client on the current page
  del <id>            bulkdel   toggle <id> <status|paymentStatus>
  add key=value...    edit <id> key=value...    (keys: name phone course status payment)
  set key=value...    save      cancel
  export [file]       theme     refresh    help    quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Search(String),
    Enter,
    Status(Option<ClientStatus>),
    Payment(Option<PaymentStatus>),
    Course(String),
    Sort(SortColumn),
    Order(SortDirection),
    Limit(u32),
    Page(u32),
    Next,
    Prev,
    Reset,
    Select(Vec<ClientId>),
    SelectAll,
    UnselectAll,
    ClearSelection,
    Show(ClientId),
    Delete(ClientId),
    BulkDelete,
    Toggle(ClientId, ToggleField),
    Add(Vec<(String, String)>),
    Edit(ClientId, Vec<(String, String)>),
    Set(Vec<(String, String)>),
    Save,
    Cancel,
    Export(PathBuf),
    Theme,
    Refresh,
    Help,
    Quit,
}

fn parse_filter<T: std::str::FromStr<Err = String>>(arg: &str) -> Result<Option<T>, String> {
    match arg.trim() {
        "" | "all" | "any" => Ok(None),
        value => value.parse().map(Some),
    }
}

fn parse_fields<'a>(words: impl Iterator<Item = &'a str>) -> Result<Vec<(String, String)>, String> {
    words
        .map(|word| {
            word.split_once('=')
                .map(|(k, v)| (k.to_string(), v.replace('_', " ")))
                .ok_or_else(|| format!("expected key=value, got '{word}'"))
        })
        .collect()
}

fn one_arg<'a>(rest: &'a str, name: &str) -> Result<&'a str, String> {
    let rest = rest.trim();
    if rest.is_empty() {
        Err(format!("{name} needs an argument"))
    } else {
        Ok(rest)
    }
}

pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim_end_matches(['\r', '\n']);
    if let Some(text) = line.strip_prefix('/') {
        return Ok(Command::Search(text.to_string()));
    }
    let line = line.trim();
    let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
    let parse_u32 = |raw: &str| raw.trim().parse::<u32>().map_err(|e| e.to_string());
    let parse_id = |raw: &str| raw.parse::<ClientId>();

    match word {
        "" | "enter" => Ok(Command::Enter),
        "status" => Ok(Command::Status(parse_filter(rest)?)),
        "payment" => Ok(Command::Payment(parse_filter(rest)?)),
        "course" => Ok(Command::Course(rest.trim().to_string())),
        "sort" => Ok(Command::Sort(one_arg(rest, "sort")?.parse()?)),
        "order" => Ok(Command::Order(one_arg(rest, "order")?.parse()?)),
        "limit" => Ok(Command::Limit(parse_u32(one_arg(rest, "limit")?)?)),
        "page" => Ok(Command::Page(parse_u32(one_arg(rest, "page")?)?)),
        "next" | "n" => Ok(Command::Next),
        "prev" | "p" => Ok(Command::Prev),
        "reset" => Ok(Command::Reset),
        "sel" => {
            let ids = rest
                .split_whitespace()
                .map(parse_id)
                .collect::<Result<Vec<_>, _>>()?;
            if ids.is_empty() {
                return Err("sel needs at least one id".into());
            }
            Ok(Command::Select(ids))
        }
        "selall" => Ok(Command::SelectAll),
        "unselall" => Ok(Command::UnselectAll),
        "clear" => Ok(Command::ClearSelection),
        "show" => Ok(Command::Show(parse_id(one_arg(rest, "show")?)?)),
        "del" => Ok(Command::Delete(parse_id(one_arg(rest, "del")?)?)),
        "bulkdel" => Ok(Command::BulkDelete),
        "toggle" => {
            let mut parts = rest.split_whitespace();
            let id = parse_id(parts.next().ok_or("toggle needs an id")?)?;
            let field = parts.next().unwrap_or("status").parse()?;
            Ok(Command::Toggle(id, field))
        }
        "add" => Ok(Command::Add(parse_fields(rest.split_whitespace())?)),
        "edit" => {
            let mut parts = rest.split_whitespace();
            let id = parse_id(parts.next().ok_or("edit needs an id")?)?;
            Ok(Command::Edit(id, parse_fields(parts)?))
        }
        "set" => Ok(Command::Set(parse_fields(rest.split_whitespace())?)),
        "save" => Ok(Command::Save),
        "cancel" => Ok(Command::Cancel),
        "export" => {
            let file = rest.trim();
            let file = if file.is_empty() { "clients.csv" } else { file };
            Ok(Command::Export(PathBuf::from(file)))
        }
        "theme" => Ok(Command::Theme),
        "refresh" | "r" => Ok(Command::Refresh),
        "help" | "?" => Ok(Command::Help),
        "quit" | "q" | "exit" => Ok(Command::Quit),
        other => Err(format!("unknown command '{other}' (try 'help')")),
    }
}

/// Applies `key=value` pairs to a draft. Underscores in values stand for
/// spaces in the interactive form.
pub fn apply_fields(draft: &mut ClientDraft, fields: &[(String, String)]) -> Result<(), String> {
    for (key, value) in fields {
        match key.as_str() {
            "name" | "fullName" | "full_name" => draft.full_name = value.clone(),
            "phone" => draft.phone = value.clone(),
            "course" => draft.course = value.clone(),
            "status" => draft.status = value.parse()?,
            "payment" | "paymentStatus" => draft.payment_status = value.parse()?,
            other => return Err(format!("unknown field '{other}'")),
        }
    }
    Ok(())
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Asks a yes/no question and reads the answer from `lines`. End of input
/// counts as no.
pub async fn confirm<R>(lines: &mut Lines<R>, prompt: &str) -> io::Result<bool>
where
    R: AsyncBufRead + Unpin,
{
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;
    let answer = lines.next_line().await?.unwrap_or_default();
    Ok(is_yes(&answer))
}

fn spawn_event_printer(
    controller: Arc<ListController>,
    palette: Arc<Mutex<Palette>>,
) -> JoinHandle<()> {
    let mut events = controller.subscribe_events();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(ControllerEvent::PageApplied { request, .. }) => {
                    debug!(request, "browse: redraw");
                    let state = controller.snapshot().await;
                    println!("{}", render_table(&state, &*palette.lock().await));
                }
                Ok(ControllerEvent::Notice(notice)) => {
                    println!("{}", render_notice(&notice, &*palette.lock().await));
                }
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "browse: events lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    })
}

async fn redraw(controller: &ListController, palette: &Mutex<Palette>) {
    let state = controller.snapshot().await;
    println!("{}", render_table(&state, &*palette.lock().await));
}

async fn edit_and_save(
    controller: &ListController,
    fields: &[(String, String)],
) -> anyhow::Result<()> {
    let mut applied = Ok(());
    controller
        .edit_draft(|draft| applied = apply_fields(draft, fields))
        .await?;
    applied.map_err(anyhow::Error::msg)?;
    // failures are reported through the notice stream; the editor stays open
    let _ = controller.save().await;
    if controller.snapshot().await.editor.open {
        println!("editor still open: 'set key=value' to fix, then 'save' or 'cancel'");
    }
    Ok(())
}

async fn execute<R>(
    controller: &Arc<ListController>,
    theme: &ThemeContext,
    palette: &Mutex<Palette>,
    lines: &mut Lines<R>,
    command: Command,
) -> anyhow::Result<bool>
where
    R: AsyncBufRead + Unpin,
{
    match command {
        Command::Search(text) => controller.search_input(&text).await,
        Command::Enter => {
            controller.submit_search().await;
        }
        Command::Status(status) => {
            controller.set_status_filter(status).await;
        }
        Command::Payment(payment) => {
            controller.set_payment_filter(payment).await;
        }
        Command::Course(course) => {
            controller.set_course_filter(&course).await;
        }
        Command::Sort(column) => {
            controller.toggle_sort(column).await;
        }
        Command::Order(order) => {
            controller.set_order(order).await;
        }
        Command::Limit(limit) => {
            controller.set_page_size(limit).await;
        }
        Command::Page(page) => {
            controller.set_page(page).await;
        }
        Command::Next => {
            if controller.next_page().await.is_none() {
                println!("already on the last page");
            }
        }
        Command::Prev => {
            if controller.prev_page().await.is_none() {
                println!("already on the first page");
            }
        }
        Command::Reset => {
            controller.reset_all().await;
        }
        Command::Select(ids) => {
            for id in ids {
                if let Err(err) = controller.toggle_select(id).await {
                    println!("{err}");
                }
            }
            redraw(controller, palette).await;
        }
        Command::SelectAll => {
            controller.select_all_on_page().await;
            redraw(controller, palette).await;
        }
        Command::UnselectAll => {
            controller.unselect_all_on_page().await;
            redraw(controller, palette).await;
        }
        Command::ClearSelection => {
            controller.clear_selection().await;
            redraw(controller, palette).await;
        }
        Command::Show(id) => {
            let state = controller.snapshot().await;
            match state.find(id) {
                Some(client) => println!("{}", render_detail(client, &*palette.lock().await)),
                None => println!("client {id} is not on the current page"),
            }
        }
        Command::Delete(id) => {
            if confirm(lines, &format!("Delete client {id}?")).await? {
                let _ = controller.delete(id).await;
            } else {
                println!("aborted");
            }
        }
        Command::BulkDelete => {
            let count = controller.snapshot().await.selection.len();
            if count == 0 {
                println!("nothing selected");
            } else if confirm(lines, &format!("Delete {count} selected client(s)?")).await? {
                controller.bulk_delete().await;
            } else {
                println!("aborted");
            }
        }
        Command::Toggle(id, field) => {
            if controller.toggle_field(id, field).await.is_ok() {
                redraw(controller, palette).await;
            }
        }
        Command::Add(fields) => {
            controller.open_create().await;
            edit_and_save(controller, &fields).await?;
        }
        Command::Edit(id, fields) => {
            controller.open_edit(id).await?;
            edit_and_save(controller, &fields).await?;
        }
        Command::Set(fields) => {
            let mut applied = Ok(());
            controller
                .edit_draft(|draft| applied = apply_fields(draft, &fields))
                .await?;
            applied.map_err(anyhow::Error::msg)?;
        }
        Command::Save => {
            let _ = controller.save().await;
        }
        Command::Cancel => controller.close_editor().await,
        Command::Export(path) => {
            if let Ok(bytes) = controller.export_csv().await {
                tokio::fs::write(&path, &bytes)
                    .await
                    .with_context(|| format!("failed to write '{}'", path.display()))?;
                println!("wrote {} bytes to {}", bytes.len(), path.display());
            }
        }
        Command::Theme => {
            let next = theme.toggle()?;
            *palette.lock().await = Palette::for_theme(next);
            println!("theme: {next}");
            redraw(controller, palette).await;
        }
        Command::Refresh => {
            controller.reload().await;
        }
        Command::Help => println!("{HELP}"),
        Command::Quit => return Ok(false),
    }
    Ok(true)
}

pub async fn run(
    controller: Arc<ListController>,
    theme: ThemeContext,
    palette: Palette,
) -> anyhow::Result<()> {
    let palette = Arc::new(Mutex::new(palette));
    let listener = controller.spawn_search_listener().await;
    let printer = spawn_event_printer(controller.clone(), palette.clone());

    println!("{HELP}");
    controller.reload().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(err) => {
                println!("{err}");
                continue;
            }
        };
        match execute(&controller, &theme, &palette, &mut lines, command).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(err) => println!("{err:#}"),
        }
    }

    printer.abort();
    if let Some(listener) = listener {
        listener.abort();
    }
    Ok(())
}
