use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use storefront_chat::config::{AppConfig, TOKEN_ENV, URL_ENV};
use storefront_chat::utils::display_time;
use storefront_chat::{
    ApiClient, ContactId, ConversationView, MessagingApi, MessagingSession, MountOutcome, SendOutcome,
};

/// Terminal client for the storefront messaging page.
///
/// The server URL and token are read from the config file, then from
/// environment variables, then from the flags below.
#[derive(Parser, Debug)]
#[command(name = "storefront-chat", version, about)]
struct Cli {
    /// Server base URL [env: STOREFRONT_CHAT_URL]
    #[arg(long, global = true)]
    url: Option<String>,

    /// Bearer token [env: STOREFRONT_CHAT_TOKEN]
    #[arg(long, global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List contacts with the size of each conversation
    Contacts,
    /// Print the conversation with one contact
    Show { contact_id: ContactId },
    /// Send a message to one contact
    Send { contact_id: ContactId, text: String },
    /// Save a token to the config file
    Login { token: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::load();
    config.apply_overrides(cli.url, cli.token);

    let query = match cli.command {
        Command::Login { token } => return login(config, token),
        Command::Contacts => Query::Contacts,
        Command::Show { contact_id } => Query::Show(contact_id),
        Command::Send { contact_id, text } => Query::Send(contact_id, text),
    };
    run(config, query).await
}

/// Subcommands that talk to the server.
enum Query {
    Contacts,
    Show(ContactId),
    Send(ContactId, String),
}

fn login(mut config: AppConfig, token: String) -> ExitCode {
    if token.trim().is_empty() {
        eprintln!("Token must not be blank.");
        return ExitCode::FAILURE;
    }
    config.token = Some(token);
    match config.save() {
        Ok(()) => {
            println!("Token saved.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Failed to save config: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: AppConfig, query: Query) -> ExitCode {
    let Some(server) = config.server_url() else {
        eprintln!("No server configured. Pass --url or set {}.", URL_ENV);
        return ExitCode::FAILURE;
    };
    let client = match ApiClient::new(&server) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Invalid server URL {}: {}", server, e);
            return ExitCode::FAILURE;
        }
    };

    let mut session = MessagingSession::new(Arc::new(client), config.credential());
    if session.mount().await == MountOutcome::AuthenticationRequired {
        eprintln!("Please log in: storefront-chat login <token> (or set {}).", TOKEN_ENV);
        return ExitCode::FAILURE;
    }
    session.sync_all().await;

    match query {
        Query::Contacts => print_contacts(&session),
        Query::Show(contact_id) => {
            if !session.directory().contains(contact_id) {
                return unknown_contact(contact_id);
            }
            session.select(Some(contact_id));
            print_view(session.view());
        }
        Query::Send(contact_id, text) => {
            if !session.directory().contains(contact_id) {
                return unknown_contact(contact_id);
            }
            session.select(Some(contact_id));
            session.set_draft(text);
            match session.send().await {
                SendOutcome::Sent(_) => print_view(session.view()),
                SendOutcome::Skipped => println!("Nothing to send."),
                SendOutcome::InFlight => println!("A message is already being sent."),
                SendOutcome::Unauthenticated => {
                    eprintln!("Please log in first.");
                    return ExitCode::FAILURE;
                }
                SendOutcome::Failed { reason } => {
                    eprintln!("Message not sent ({}). Draft kept: {}", reason, session.draft());
                    return ExitCode::FAILURE;
                }
            }
        }
    }
    ExitCode::SUCCESS
}

fn unknown_contact(contact_id: ContactId) -> ExitCode {
    eprintln!("Unknown contact {}. Run `storefront-chat contacts` to list them.", contact_id);
    ExitCode::FAILURE
}

fn print_contacts<A: MessagingApi>(session: &MessagingSession<A>) {
    if session.contacts().is_empty() {
        println!("No contacts yet.");
        return;
    }
    for contact in session.contacts() {
        match session.store().get(contact.id) {
            Some(messages) => println!("{}\t{}\t{} message(s)", contact.id, contact.display_name, messages.len()),
            None => println!("{}\t{}\t(not loaded)", contact.id, contact.display_name),
        }
    }
}

fn print_view(view: ConversationView<'_>) {
    match view {
        ConversationView::Loading => println!("Loading..."),
        ConversationView::NoContacts => println!("No contacts yet."),
        ConversationView::ChooseContact => println!("Choose a contact to view messages."),
        ConversationView::NoMessagesYet { display_name, .. } => {
            println!("No messages with {} yet.", display_name)
        }
        ConversationView::Conversation { display_name, messages, .. } => {
            println!("Conversation with {}", display_name);
            for message in messages {
                let who = if message.is_from_current_user { "me" } else { display_name };
                println!("[{}] {}: {}", display_time(&message.created_at), who, message.body);
            }
        }
    }
}
