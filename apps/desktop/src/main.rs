use std::{
    io::{self, Write},
    sync::Arc,
};

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use client_core::{HttpStoryService, Notifier, StoryController, StoryEntry, StoryView};
use shared::domain::{Segment, SegmentId, StoryId};

#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    server_url: String,
}

/// Presentation surface for a line-oriented shell. Input fields do not
/// persist between commands here, so the two clear-input hooks are no-ops.
struct TerminalView;

impl StoryView for TerminalView {
    fn render_story_list(&self, entries: &[StoryEntry]) {
        println!("--- stories ---");
        for entry in entries {
            let marker = if entry.selected { "*" } else { " " };
            println!("{marker} [{}] {}", entry.id, entry.title);
        }
    }

    fn show_story_list_empty(&self) {
        println!("No stories yet. Create one with: new <title>");
    }

    fn show_story_list_error(&self, message: &str) {
        println!("Error loading stories: {message}");
    }

    fn render_segments(&self, title: &str, segments: &[Segment]) {
        println!("--- {title} ---");
        if segments.is_empty() {
            println!("This story is empty. Be the first to contribute!");
            return;
        }
        for segment in segments {
            println!("[{}] {}", segment.id, segment.text);
        }
    }

    fn show_segment_error(&self, message: &str) {
        println!("Error loading segments: {message}");
    }

    fn show_no_selection(&self) {
        println!("Select a story to view its content.");
    }

    fn set_compose_enabled(&self, _enabled: bool) {}

    fn clear_segment_input(&self) {}

    fn clear_title_input(&self) {}
}

struct TerminalNotifier;

#[async_trait]
impl Notifier for TerminalNotifier {
    async fn confirm(&self, message: &str) -> bool {
        match read_line(&format!("{message} [y/N] ")).await {
            Some(answer) => matches!(answer.trim(), "y" | "Y" | "yes"),
            None => false,
        }
    }

    async fn alert(&self, message: &str) {
        println!("! {message}");
    }
}

async fn read_line(prompt: &str) -> Option<String> {
    print!("{prompt}");
    let _ = io::stdout().flush();
    tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        match io::stdin().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line),
        }
    })
    .await
    .ok()
    .flatten()
}

fn print_help() {
    println!("commands:");
    println!("  list               refresh the story list");
    println!("  open <id>          select a story and show its segments");
    println!("  new <title>        create a story");
    println!("  add <text>         append a segment to the selected story");
    println!("  rm <id>            delete a story");
    println!("  rmseg <id>         delete a segment of the selected story");
    println!("  help               show this help");
    println!("  quit               exit");
}

async fn dispatch(controller: &mut StoryController, line: &str) {
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    match command {
        "list" => controller.refresh_stories().await,
        "open" => match rest.parse::<i64>() {
            Ok(id) => {
                let story_id = StoryId(id);
                let title = controller
                    .stories()
                    .iter()
                    .find(|s| s.id == story_id)
                    .map(|s| s.title.clone());
                match title {
                    Some(title) => controller.select_story(story_id, &title).await,
                    None => println!("no story with id {id}; try 'list'"),
                }
            }
            Err(_) => println!("usage: open <id>"),
        },
        "new" => controller.create_story(rest).await,
        "add" => controller.add_segment(rest).await,
        "rm" => match rest.parse::<i64>() {
            Ok(id) => controller.delete_story(StoryId(id)).await,
            Err(_) => println!("usage: rm <id>"),
        },
        "rmseg" => match rest.parse::<i64>() {
            Ok(id) => controller.delete_segment(SegmentId(id)).await,
            Err(_) => println!("usage: rmseg <id>"),
        },
        "help" => print_help(),
        "" => {}
        other => println!("unknown command '{other}'; try 'help'"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let service = Arc::new(HttpStoryService::new(&args.server_url)?);
    let mut controller =
        StoryController::new(service, Arc::new(TerminalView), Arc::new(TerminalNotifier));

    println!("StoryWeaver shell, connected to {}", args.server_url);
    print_help();
    controller.init().await;

    loop {
        let Some(line) = read_line("storyweaver> ").await else {
            break;
        };
        let line = line.trim();
        if line == "quit" || line == "exit" {
            break;
        }
        dispatch(&mut controller, line).await;
    }

    Ok(())
}
