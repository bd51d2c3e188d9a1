//! CLI for PopFeed
//!
//! Subcommands:
//! - `topics`: list the topics the backend knows about
//! - `watch`: select topics and follow their live feed interactively
//! - `publish`: write a message to a topic (useful for smoke tests)

use std::time::Duration;

use clap::Parser;
use popfeed::catalog::{Backend, MessageWriter, TopicCatalog};
use popfeed::config::{Settings, load_config};
use popfeed::controller::{Command, ControllerEvent, SubscriptionController};
use popfeed::feed::sse::SseTransport;
use popfeed::feed::{ConnectionStatus, FeedBuffer, FeedConnection};
use popfeed::utils::logging;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

#[derive(Parser)]
#[command(name = "popfeed")]
enum Cli {
    /// List the topics known to the backend
    Topics,
    /// Follow the live feed of the selected topics
    Watch {
        /// Topic to select at start-up (repeatable)
        #[arg(long = "topic")]
        topics: Vec<String>,
        /// Keep the shorter feed used by compact views
        #[arg(long)]
        compact: bool,
    },
    /// Write a message to a topic
    Publish {
        #[arg(long)]
        topic: String,
        /// Message body; parsed as JSON when possible, otherwise sent as text
        #[arg(long)]
        message: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let settings = match load_config() {
        Ok(settings) => settings,
        Err(e) => {
            logging::init("info");
            error!("Failed to load configuration: {}", e);
            return;
        }
    };
    logging::init(&settings.log.level);

    let result = match cli {
        Cli::Topics => run_topics(&settings).await,
        Cli::Watch { topics, compact } => run_watch(&settings, topics, compact).await,
        Cli::Publish { topic, message } => run_publish(&settings, &topic, &message).await,
    };

    if let Err(e) = result {
        error!("popfeed failed: {}", e);
    }
}

async fn run_topics(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = TopicCatalog::new(Backend::new(&settings.backend)?);
    print_topics(&catalog).await;
    Ok(())
}

async fn run_publish(
    settings: &Settings,
    topic: &str,
    message: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let writer = MessageWriter::new(Backend::new(&settings.backend)?);
    let body = serde_json::from_str(message)
        .unwrap_or_else(|_| serde_json::Value::String(message.to_string()));

    let response = writer.write_message(topic, &body).await?;
    match response.error {
        Some(err) => error!("Backend rejected message: {}", err),
        None => println!("Published to {}: {}", topic, response.message.unwrap_or_default()),
    }
    Ok(())
}

async fn run_watch(
    settings: &Settings,
    topics: Vec<String>,
    compact: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let backend = Backend::new(&settings.backend)?;
    let catalog = TopicCatalog::new(backend.clone());

    let transport = SseTransport::new(Duration::from_millis(settings.feed.retry_ms));
    let (connection, signals) = FeedConnection::new(transport, backend.stream_endpoint()?);
    let capacity = if compact {
        settings.feed.compact_capacity
    } else {
        settings.feed.capacity
    };

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let controller = SubscriptionController::new(connection, FeedBuffer::new(capacity), events_tx);
    let (commands, commands_rx) = mpsc::unbounded_channel();
    let controller_task = tokio::spawn(controller.run(commands_rx, signals));
    let render_task = tokio::spawn(render(events_rx));

    print_topics(&catalog).await;
    println!("Type a topic name to toggle it; :feed, :selected, :topics, :clear, :quit");
    for topic in topics {
        commands.send(Command::Toggle(topic))?;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !handle_input(line.trim(), &commands, &catalog).await? {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received. Exiting gracefully.");
                break;
            }
        }
    }

    let _ = commands.send(Command::Shutdown);
    controller_task.await?;
    render_task.abort();
    Ok(())
}

/// Applies one line of operator input. Returns `false` when the operator quits.
async fn handle_input(
    input: &str,
    commands: &mpsc::UnboundedSender<Command>,
    catalog: &TopicCatalog,
) -> Result<bool, Box<dyn std::error::Error>> {
    match input {
        "" => {}
        ":quit" | ":q" => return Ok(false),
        ":clear" => commands.send(Command::ResetFeed)?,
        ":topics" => print_topics(catalog).await,
        ":feed" => {
            let (reply, feed) = oneshot::channel();
            commands.send(Command::Feed(reply))?;
            let feed = feed.await?;
            println!("-- feed ({} entries) --", feed.len());
            for event in feed {
                println!("{event}");
            }
        }
        ":selected" => {
            let (reply, selected) = oneshot::channel();
            commands.send(Command::Selected(reply))?;
            println!("Selected: {}", selected.await?.join(", "));
        }
        topic => commands.send(Command::Toggle(topic.to_string()))?,
    }
    Ok(true)
}

/// Prints the topic list; a failed fetch shows an empty list.
async fn print_topics(catalog: &TopicCatalog) {
    let topics = catalog.fetch_topics().await.unwrap_or_else(|e| {
        error!("Failed to fetch topics: {}", e);
        Vec::new()
    });

    println!("Topics ({}):", topics.len());
    for topic in topics {
        println!("  {topic}");
    }
}

async fn render(mut events: mpsc::UnboundedReceiver<ControllerEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            ControllerEvent::Selection(change) => {
                let marker = if change.selected { "[x]" } else { "[ ]" };
                println!("{marker} {}", change.topic);
            }
            ControllerEvent::Pending(true) => println!("... connecting to feed"),
            ControllerEvent::Pending(false) => {}
            ControllerEvent::FeedUpdated(event) => println!("{event}"),
            ControllerEvent::StatusChanged(ConnectionStatus::Failed) => {
                println!("!! feed connection failed; toggle a topic to reconnect")
            }
            ControllerEvent::StatusChanged(status) => debug!("Feed status: {:?}", status),
        }
    }
}
