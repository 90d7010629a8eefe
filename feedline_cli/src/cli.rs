use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use feedline_client::app::AppEvent;
use feedline_client::feed::{FeedFilter, FetchOutcome, SortOrder};
use feedline_client::mentions::{self, Segment};
use feedline_client::models::Post;
use feedline_client::reactions::Reactions;
use feedline_client::time::format_relative_time;
use feedline_client::FeedApp;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Run the interactive feed shell until EOF or `quit`.
pub async fn run_shell(app: FeedApp) -> Result<()> {
    let mut session = CliSession { app };

    println!("Feedline ready. Type 'help' for a list of commands.");
    match session.app.session().username().map(str::to_string) {
        Some(username) => {
            println!("Signed in as {username}.");
            session.app.start();
            session.settle_and_report().await;
        }
        None => println!("Pick a username to get started: login <name>"),
    }

    let stdin = tokio::io::stdin();
    let mut reader = BufReader::new(stdin);

    loop {
        print!("feedline> ");
        io::stdout().flush()?;

        let mut line = String::new();
        let read = reader.read_line(&mut line).await?;
        if read == 0 {
            println!("Exiting");
            break;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let tokens = match shell_words::split(trimmed) {
            Ok(tokens) if !tokens.is_empty() => tokens,
            Ok(_) => continue,
            Err(err) => {
                println!("Unable to parse command: {err}");
                continue;
            }
        };

        match session.handle_command(&tokens).await {
            Ok(LoopAction::Continue) => {}
            Ok(LoopAction::Exit) => break,
            Err(err) => {
                println!("Error: {err:#}");
            }
        }
    }

    Ok(())
}

/// Fetch `pages` pages, print the visible feed once, and return.
pub async fn print_feed_once(
    mut app: FeedApp,
    sort: SortOrder,
    filter: FeedFilter,
    search: String,
    pages: usize,
) -> Result<()> {
    if !app.session().is_signed_in() {
        bail!("no username stored yet; run `feedline shell` and `login <name>` first");
    }
    app.set_sort(sort);
    app.set_filter(filter);
    app.set_search(search);

    app.start();
    app.settle().await;
    for _ in 1..pages {
        if !app.load_more() {
            break;
        }
        app.settle().await;
    }
    if let Some(error) = app.feed().error() {
        bail!("failed to load posts: {error}");
    }
    print_feed(&app, Utc::now());
    Ok(())
}

struct CliSession {
    app: FeedApp,
}

enum LoopAction {
    Continue,
    Exit,
}

impl CliSession {
    async fn handle_command(&mut self, tokens: &[String]) -> Result<LoopAction> {
        let command = tokens[0].as_str();
        match command {
            "help" => {
                print_help();
                Ok(LoopAction::Continue)
            }
            "login" | "signup" => {
                if tokens.len() < 2 {
                    println!("Usage: login <username>");
                    return Ok(LoopAction::Continue);
                }
                if let Some(current) = self.app.session().username() {
                    println!("Already signed in as {current}. Use 'logout' first.");
                    return Ok(LoopAction::Continue);
                }
                self.app.sign_in(&tokens[1..].join(" "))?;
                println!(
                    "Signed in as {}.",
                    self.app.session().username().unwrap_or_default()
                );
                self.settle_and_report().await;
                Ok(LoopAction::Continue)
            }
            "quit" | "exit" => Ok(LoopAction::Exit),
            "clear" => {
                print!("\x1B[2J\x1B[1;1H");
                Ok(LoopAction::Continue)
            }
            _ if !self.app.session().is_signed_in() => {
                println!("Sign in first: login <username>");
                Ok(LoopAction::Continue)
            }
            "logout" => {
                self.app.sign_out()?;
                println!("Signed out.");
                Ok(LoopAction::Continue)
            }
            "feed" | "posts" | "ls" => {
                self.app.process_messages();
                print_feed(&self.app, Utc::now());
                Ok(LoopAction::Continue)
            }
            "more" => {
                if self.app.load_more() {
                    self.settle_and_report().await;
                } else if self.app.feed().is_fetching_more() {
                    println!("Already loading.");
                } else {
                    println!("No more posts.");
                }
                Ok(LoopAction::Continue)
            }
            "refresh" => {
                self.app.refresh()?;
                self.settle_and_report().await;
                Ok(LoopAction::Continue)
            }
            "sort" => {
                let Some(raw) = tokens.get(1) else {
                    println!("Usage: sort newest|oldest");
                    return Ok(LoopAction::Continue);
                };
                self.app.set_sort(raw.parse()?);
                print_feed(&self.app, Utc::now());
                Ok(LoopAction::Continue)
            }
            "filter" | "show" => {
                let Some(raw) = tokens.get(1) else {
                    println!("Usage: filter all|mine");
                    return Ok(LoopAction::Continue);
                };
                self.app.set_filter(raw.parse()?);
                print_feed(&self.app, Utc::now());
                Ok(LoopAction::Continue)
            }
            "search" => {
                self.app.set_search(tokens[1..].join(" "));
                print_feed(&self.app, Utc::now());
                Ok(LoopAction::Continue)
            }
            "new" | "post" => {
                if tokens.len() < 3 {
                    println!("Usage: new \"title\" \"content\"");
                    return Ok(LoopAction::Continue);
                }
                self.app.create_post(&tokens[1], &tokens[2..].join(" "))?;
                self.settle_and_report().await;
                Ok(LoopAction::Continue)
            }
            "edit" => {
                if tokens.len() < 4 {
                    println!("Usage: edit <post_id> \"title\" \"content\"");
                    return Ok(LoopAction::Continue);
                }
                let post_id = parse_post_id(&tokens[1])?;
                self.app.begin_edit(post_id)?;
                if let Err(err) = self.app.submit_edit(&tokens[2], &tokens[3..].join(" ")) {
                    self.app.cancel_edit();
                    return Err(err);
                }
                self.settle_and_report().await;
                Ok(LoopAction::Continue)
            }
            "delete" | "rm" => {
                if tokens.len() < 2 {
                    println!("Usage: delete <post_id>");
                    return Ok(LoopAction::Continue);
                }
                let post_id = parse_post_id(&tokens[1])?;
                self.app.begin_delete(post_id)?;
                println!("Are you sure you want to delete post #{post_id}? Type 'confirm' or 'cancel'.");
                Ok(LoopAction::Continue)
            }
            "confirm" => {
                self.app.confirm_delete()?;
                self.settle_and_report().await;
                Ok(LoopAction::Continue)
            }
            "cancel" => {
                self.app.cancel_delete();
                self.app.cancel_edit();
                println!("Cancelled.");
                Ok(LoopAction::Continue)
            }
            "like" => {
                let Some(raw) = tokens.get(1) else {
                    println!("Usage: like <post_id>");
                    return Ok(LoopAction::Continue);
                };
                let post_id = parse_post_id(raw)?;
                let liked = self.app.toggle_like(post_id)?;
                println!(
                    "{} #{post_id} ({} likes)",
                    if liked { "Liked" } else { "Unliked" },
                    self.app.reactions().likes(post_id)
                );
                Ok(LoopAction::Continue)
            }
            "comment" => {
                if tokens.len() < 3 {
                    println!("Usage: comment <post_id> \"text\"");
                    return Ok(LoopAction::Continue);
                }
                let post_id = parse_post_id(&tokens[1])?;
                let count = self.app.add_comment(post_id, &tokens[2..].join(" "))?;
                println!("Comments ({count}) on #{post_id}");
                Ok(LoopAction::Continue)
            }
            "comments" => {
                let Some(raw) = tokens.get(1) else {
                    println!("Usage: comments <post_id>");
                    return Ok(LoopAction::Continue);
                };
                let post_id = parse_post_id(raw)?;
                match self.app.reactions().get(post_id) {
                    Some(entry) if !entry.comments.is_empty() => {
                        for comment in &entry.comments {
                            println!("  - {comment}");
                        }
                    }
                    _ => println!("No comments on #{post_id}."),
                }
                Ok(LoopAction::Continue)
            }
            "status" => {
                self.print_status();
                Ok(LoopAction::Continue)
            }
            other => {
                println!("Unknown command '{other}'. Type 'help' for a list of commands.");
                Ok(LoopAction::Continue)
            }
        }
    }

    async fn settle_and_report(&mut self) {
        let events = self.app.settle().await;
        let mut feed_changed = false;
        for event in events {
            match event {
                AppEvent::PageApplied(FetchOutcome::Merged { .. }) => feed_changed = true,
                AppEvent::PageApplied(FetchOutcome::Failed { first_page: true }) => {
                    println!("Failed to load posts. Please try again.");
                    if let Some(error) = self.app.feed().error() {
                        println!("  {error}");
                    }
                }
                AppEvent::PageApplied(FetchOutcome::Failed { first_page: false }) => {
                    println!(
                        "Could not load more posts: {}",
                        self.app.feed().load_more_error().unwrap_or("unknown error")
                    );
                }
                AppEvent::PageApplied(FetchOutcome::Stale) => {}
                AppEvent::PostCreated(post) => println!("Posted #{}.", post.id),
                AppEvent::PostUpdated(post) => println!("Saved changes to #{}.", post.id),
                AppEvent::PostDeleted(post_id) => println!("Deleted #{post_id}."),
                AppEvent::MutationFailed { operation, error } => {
                    println!("Could not {operation} post: {error}");
                }
            }
        }
        if feed_changed {
            print_feed(&self.app, Utc::now());
        }
    }

    fn print_status(&self) {
        let feed = self.app.feed();
        let view = self.app.view();
        println!(
            "User: {}",
            self.app.session().username().unwrap_or("(signed out)")
        );
        println!(
            "Loaded: {} posts in {} page(s){}",
            feed.posts().len(),
            feed.pages_loaded(),
            if feed.has_more() { ", more available" } else { "" }
        );
        println!(
            "View: sort={} filter={} search='{}'",
            view.sort, view.filter, view.search
        );
        if let Some(post) = self.app.session().editing() {
            println!("Editing: #{}", post.id);
        }
        if let Some(post) = self.app.session().deleting() {
            println!("Pending delete: #{} (confirm|cancel)", post.id);
        }
        if let Some(error) = feed.error() {
            println!("Last load error: {error}");
        }
    }
}

fn parse_post_id(raw: &str) -> Result<i64> {
    raw.trim_start_matches('#')
        .parse()
        .with_context(|| format!("'{raw}' is not a post id"))
}

fn print_feed(app: &FeedApp, now: DateTime<Utc>) {
    let feed = app.feed();
    if feed.is_pending() {
        println!("Loading posts...");
        return;
    }
    if feed.error().is_some() {
        println!("Failed to load posts. Please try again.");
        return;
    }

    let username = app.session().username().unwrap_or_default();
    let visible = app.visible_posts();
    if visible.is_empty() {
        println!("No posts found for the current filters.");
    }
    for post in &visible {
        println!("{}", render_post(post, username, app.reactions(), now));
    }
    let view = app.view();
    println!(
        "-- {} of {} loaded posts | sort: {} | show: {}{}",
        visible.len(),
        feed.posts().len(),
        view.sort,
        view.filter,
        if view.search.trim().is_empty() {
            String::new()
        } else {
            format!(" | search: '{}'", view.search.trim())
        }
    );
    if feed.has_more() {
        println!("-- type 'more' to load more");
    }
}

fn render_post(post: &Post, username: &str, reactions: &Reactions, now: DateTime<Utc>) -> String {
    let marker = if post.is_owned_by(username) {
        "  [yours: edit/delete]"
    } else {
        ""
    };
    let mut rendered = format!(
        "#{} {}\n    @{} · {}{}",
        post.id,
        post.title,
        post.username,
        format_relative_time(&post.created_datetime, now),
        marker
    );
    for line in post.content.lines() {
        rendered.push_str("\n    ");
        rendered.push_str(&highlight_mentions(line));
    }
    rendered.push_str(&format!(
        "\n    {} likes · Comments ({})",
        reactions.likes(post.id),
        reactions.comment_count(post.id)
    ));
    rendered
}

/// Brackets `@name` mentions so they stand out in plain terminal text.
fn highlight_mentions(line: &str) -> String {
    mentions::segments(line)
        .into_iter()
        .map(|segment| match segment {
            Segment::Text(text) => text.to_string(),
            Segment::Mention(name) => format!("[{name}]"),
        })
        .collect()
}

fn print_help() {
    println!("Available commands:");
    println!("  login <username>                 choose your display name");
    println!("  logout                           forget the username and the feed");
    println!("  feed                             show the feed");
    println!("  more                             load the next page");
    println!("  refresh                          reload from the first page");
    println!("  sort newest|oldest               order by creation time");
    println!("  filter all|mine                  show everyone's posts or only yours");
    println!("  search [text]                    match title, content or username");
    println!("  new \"title\" \"content\"            create a post");
    println!("  edit <id> \"title\" \"content\"      change one of your posts");
    println!("  delete <id>, then confirm|cancel remove one of your posts");
    println!("  like <id>                        like or unlike a post");
    println!("  comment <id> \"text\"              add a comment to a post");
    println!("  comments <id>                    list a post's comments");
    println!("  status                           show session and paging state");
    println!("  clear                            clear the screen");
    println!("  quit                             exit");
}
