//! `gmailer` - send email through the Gmail API from the command line.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use gmailer_core::{
    Attachment, GmailTransport, InitializeOptions, Mailer, MailerConfig, SendEmailRequest,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "gmailer", version)]
#[command(about = "Send email through the Gmail API with a service account", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one email
    Send(SendArgs),
}

#[derive(clap::Args)]
struct SendArgs {
    /// Recipient address
    #[arg(long)]
    to: String,

    /// Sender address (defaults to GMAIL_MAILER_SENDER_EMAIL)
    #[arg(long)]
    from: Option<String>,

    /// Sender display name
    #[arg(long)]
    name: Option<String>,

    /// Subject line
    #[arg(long)]
    subject: Option<String>,

    /// Message body; HTML is detected automatically
    #[arg(long, conflicts_with = "message_file", required_unless_present = "message_file")]
    message: Option<String>,

    /// Read the message body from a file
    #[arg(long)]
    message_file: Option<PathBuf>,

    /// Attach a file, optionally with its MIME type: `path[:type]`
    #[arg(long = "attach", value_name = "PATH[:TYPE]")]
    attachments: Vec<String>,

    /// Service account JSON file
    #[arg(long)]
    service_account: Option<PathBuf>,

    /// Print the assembled MIME message instead of sending it
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gmailer=info,gmailer_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match Cli::parse().command {
        Commands::Send(args) => send(args).await,
    }
}

async fn send(args: SendArgs) -> Result<ExitCode> {
    let request = build_request(&args)?;
    let config = MailerConfig::from_env();

    if args.dry_run {
        let mailer = Mailer::<GmailTransport>::new(config)?;
        let message = mailer.build_message(&request)?;
        println!("{message}");
        return Ok(ExitCode::SUCCESS);
    }

    let options = InitializeOptions {
        sender_email: args.from.clone(),
        service_account_path: args.service_account.clone(),
        ..InitializeOptions::default()
    };
    let mailer = Mailer::initialize(config, options).await?;

    let result = mailer.send_email(&request).await;
    println!("{}", serde_json::to_string_pretty(&result)?);

    if result.sent {
        info!(to = %args.to, "Done");
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn build_request(args: &SendArgs) -> Result<SendEmailRequest> {
    let message = match (&args.message, &args.message_file) {
        (Some(message), _) => message.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("reading message from {}", path.display()))?,
        (None, None) => bail!("either --message or --message-file is required"),
    };

    let mut request = SendEmailRequest::new(&args.to, message);
    request.subject.clone_from(&args.subject);
    request.sender_email.clone_from(&args.from);
    request.sender_name.clone_from(&args.name);

    for arg in &args.attachments {
        request = request.with_attachment(read_attachment(arg)?);
    }
    Ok(request)
}

fn read_attachment(arg: &str) -> Result<Attachment> {
    let (path, mime_type) = match arg.rsplit_once(':') {
        Some((path, mime)) if mime.contains('/') => (Path::new(path), mime.to_string()),
        _ => (Path::new(arg), guess_mime_type(Path::new(arg))),
    };

    let data =
        std::fs::read(path).with_context(|| format!("reading attachment {}", path.display()))?;
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("attachment path has no file name: {}", path.display()))?;

    Ok(Attachment::from_bytes(filename, mime_type, &data))
}

fn guess_mime_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_send() {
        let cli = Cli::try_parse_from([
            "gmailer",
            "send",
            "--to",
            "to@example.com",
            "--message",
            "<p>Hi</p>",
            "--attach",
            "report.csv",
            "--attach",
            "notes.bin:text/plain",
            "--dry-run",
        ])
        .unwrap();

        let Commands::Send(args) = cli.command;
        assert_eq!(args.to, "to@example.com");
        assert_eq!(args.attachments, vec!["report.csv", "notes.bin:text/plain"]);
        assert!(args.dry_run);
    }

    #[test]
    fn test_message_and_file_conflict() {
        let parsed = Cli::try_parse_from([
            "gmailer",
            "send",
            "--to",
            "a@b.co",
            "--message",
            "x",
            "--message-file",
            "m.txt",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_body_is_required() {
        assert!(Cli::try_parse_from(["gmailer", "send", "--to", "a@b.co"]).is_err());
    }

    #[test]
    fn test_guess_mime_type() {
        assert_eq!(guess_mime_type(Path::new("a.PDF")), "application/pdf");
        assert_eq!(
            guess_mime_type(Path::new("report.docx")),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        );
        assert_eq!(guess_mime_type(Path::new("logo.svg")), "image/svg+xml");
        assert_eq!(guess_mime_type(Path::new("invite.ics")), "text/calendar");
        assert_eq!(guess_mime_type(Path::new("a")), "application/octet-stream");
    }

    #[test]
    fn test_read_attachment_with_type() {
        let path = std::env::temp_dir().join(format!("gmailer-attach-{}.dat", std::process::id()));
        std::fs::write(&path, b"hello").unwrap();

        let arg = format!("{}:text/plain", path.display());
        let attachment = read_attachment(&arg).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(attachment.mime_type, "text/plain");
        assert_eq!(attachment.content, "aGVsbG8=");
        assert!(attachment.filename.starts_with("gmailer-attach-"));
    }
}
