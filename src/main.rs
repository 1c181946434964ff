//! Terminal driver for the emoji deck.
//!
//! Signs in with credentials from the environment, mounts a session, and
//! exposes the edit operations as a small line-oriented command loop. The
//! clipboard sink prints the payload so it can be picked up from the
//! terminal.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use emoji_deck::remote::{DiscordCdn, FirebaseAuth, FirestoreStore, IdentityProvider};
use emoji_deck::services::{DocumentStore, Preferences, StdoutClipboard};
use emoji_deck::{Config, Session};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = match Config::default_path() {
        Some(path) => Config::load(&path),
        None => Config::default(),
    };
    config.apply_env();
    if config.project_id.is_empty() || config.api_key.is_empty() {
        bail!("project_id and api_key must be configured (config file or EMOJI_DECK_* env)");
    }

    let prefs_path = Preferences::default_path();
    let mut prefs = prefs_path
        .as_deref()
        .map(Preferences::load)
        .unwrap_or_default();

    let http = reqwest::Client::new();
    let auth = Arc::new(FirebaseAuth::new(http.clone(), config.api_key.clone()));

    let email = std::env::var("EMOJI_DECK_EMAIL").context("EMOJI_DECK_EMAIL not set")?;
    let password = std::env::var("EMOJI_DECK_PASSWORD").context("EMOJI_DECK_PASSWORD not set")?;
    let user = auth.sign_in(&email, &password).await?;
    info!(%user, "signed in");

    let store = Arc::new(FirestoreStore::new(
        http.clone(),
        config.project_id.clone(),
        auth.clone(),
    ));
    let probe = Arc::new(DiscordCdn::new(http, config.cdn_host.clone(), config.copy_size));
    let mut session = Session::new(user, store, probe, &config);
    session.mount().await?;

    let clipboard = StdoutClipboard;
    print_lists(&session, &prefs);
    println!(
        "commands: ls | add <tokens> | rm <i> | mv <a> <b> | name <i> <text> | \
         find <q> | copy <i> | copypub <i> | toggle <flag> | quit"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (cmd, rest) = line.split_once(' ').unwrap_or((line, ""));
        match cmd {
            "" => continue,
            "quit" | "exit" => break,
            "ls" => print_lists(&session, &prefs),
            "add" => {
                if !session.add_from_input(rest).await {
                    println!("nothing to add");
                }
                print_lists(&session, &prefs);
            }
            "rm" => match rest.parse() {
                Ok(index) => {
                    session.remove(index).await;
                    print_lists(&session, &prefs);
                }
                Err(_) => println!("usage: rm <index>"),
            },
            "mv" => match parse_pair(rest) {
                Some((from, to)) => {
                    session.reorder(from, to).await;
                    print_lists(&session, &prefs);
                }
                None => println!("usage: mv <from> <to>"),
            },
            "name" => match rest.split_once(' ') {
                Some((index, name)) => match index.parse() {
                    Ok(index) => {
                        session.rename(index, name.trim()).await;
                    }
                    Err(_) => println!("usage: name <index> <text>"),
                },
                None => println!("usage: name <index> <text>"),
            },
            "find" => {
                if prefs.show_search {
                    session.set_query(rest);
                    print_lists(&session, &prefs);
                } else {
                    println!("search is disabled (toggle search)");
                }
            }
            "copy" => match rest.parse() {
                Ok(index) => {
                    session.copy(index, &clipboard);
                }
                Err(_) => println!("usage: copy <index>"),
            },
            "copypub" => match rest.parse() {
                Ok(index) => {
                    session.copy_public(index, &clipboard);
                }
                Err(_) => println!("usage: copypub <index>"),
            },
            "toggle" => {
                match rest {
                    "edit" => prefs.show_edit_button = !prefs.show_edit_button,
                    "public" => prefs.show_public_emojis = !prefs.show_public_emojis,
                    "search" => prefs.show_search = !prefs.show_search,
                    _ => {
                        println!("usage: toggle <edit|public|search>");
                        continue;
                    }
                }
                if let Some(path) = prefs_path.as_deref() {
                    prefs.store(path)?;
                }
            }
            other => println!("unknown command: {other}"),
        }

        for message in session.notifications() {
            println!("* {message}");
        }
    }

    auth.sign_out();
    Ok(())
}

fn parse_pair(rest: &str) -> Option<(usize, usize)> {
    let (a, b) = rest.split_once(' ')?;
    Some((a.trim().parse().ok()?, b.trim().parse().ok()?))
}

fn print_lists<S: DocumentStore>(session: &Session<S>, prefs: &Preferences) {
    println!("-- your emoji --");
    for (index, entry) in session.own().filtered() {
        let name = if entry.name.is_empty() { "(unnamed)" } else { &entry.name };
        println!("{index:>3}  {}  {name}", entry.token);
    }
    if prefs.show_public_emojis {
        println!("-- public emoji --");
        for (index, entry) in session.public().filtered() {
            let name = if entry.name.is_empty() { "(unnamed)" } else { &entry.name };
            println!("{index:>3}  {}  {name}", entry.token);
        }
    }
}
