use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Lines, Stdin};

use formfill::{
    ai_gateway::{credentials::EnvCredentialProvider, gateway::AIGateway},
    cli::args_from_env,
    config::Config,
    interview::{
        CompletionGateway, FormCatalog, FormEntry, Session, adapters::ai_gateway::AIGatewayOracle,
    },
    logging::init_tracing,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = args_from_env()?;
    let config = Config::load(&args.config_path)
        .with_context(|| format!("failed to load config from {}", args.config_path.display()))?;
    let catalog = FormCatalog::new(&config.interview.forms_dir, &config.interview.output_dir);

    let mut stdout = tokio::io::stdout();
    if args.list_forms {
        for entry in catalog.list()? {
            say(&mut stdout, &entry.display_name).await?;
        }
        return Ok(());
    }

    let logging_guard = init_tracing(&config.logging)?;

    let gateway = Arc::new(
        AIGateway::new(config.ai_gateway.clone(), Arc::new(EnvCredentialProvider))
            .context("failed to construct ai gateway")?,
    );
    gateway
        .check_credentials()
        .context("oracle credential is not available; set it in the environment or .env")?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let entry = match args.form.as_deref() {
        Some(selector) => catalog.resolve(selector)?,
        None => choose_form(&catalog, &mut lines, &mut stdout).await?,
    };
    let form = entry
        .load()
        .with_context(|| format!("failed to load form {}", entry.path.display()))?;

    let oracle = Arc::new(AIGatewayOracle::new(Arc::clone(&gateway), None));
    let completion = CompletionGateway::new(oracle, gateway.default_model());
    let mut session = Session::new(
        form,
        completion,
        catalog.session_paths(&entry),
        config.interview.session_options(),
    );

    tracing::info!(
        target: "interview",
        run_id = %logging_guard.run_id(),
        form = %entry.display_name,
        "interview_opened"
    );
    let banner = format!(
        "Filling out '{}'. Press Enter on an empty line to stop.",
        entry.display_name
    );
    say(&mut stdout, &banner).await?;
    say(&mut stdout, &session.start()).await?;

    while let Some(line) = lines.next_line().await? {
        let utterance = line.trim();
        if utterance.is_empty() {
            break;
        }

        let outcome = match session.handle_turn(utterance).await {
            Ok(outcome) => outcome,
            Err(err) => {
                if let Err(end_err) = session.end() {
                    tracing::warn!(target: "interview", error = %end_err, "session_end_failed");
                }
                return Err(err).context("interview turn failed");
            }
        };
        say(&mut stdout, &outcome.reply).await?;
        if outcome.state.is_terminal() {
            break;
        }
    }

    if !session.is_finished() {
        let outcome = session.end()?;
        say(&mut stdout, &outcome.reply).await?;
    }

    eprintln!(
        "answers saved to {}; transcript saved to {}",
        session.paths().answers.display(),
        session.paths().chat_log.display()
    );
    Ok(())
}

async fn choose_form(
    catalog: &FormCatalog,
    lines: &mut Lines<BufReader<Stdin>>,
    out: &mut (impl AsyncWrite + Unpin),
) -> Result<FormEntry> {
    let forms = catalog.list()?;
    if forms.is_empty() {
        return Err(anyhow!("no forms found in {}", catalog.forms_dir().display()));
    }

    say(out, "Available forms:").await?;
    for (index, entry) in forms.iter().enumerate() {
        say(out, &format!("  {}. {}", index + 1, entry.display_name)).await?;
    }

    loop {
        say(out, "Which form would you like to fill out?").await?;
        let Some(line) = lines.next_line().await? else {
            return Err(anyhow!("stdin closed before a form was chosen"));
        };
        let choice = line.trim();

        let by_number = choice
            .parse::<usize>()
            .ok()
            .and_then(|number| number.checked_sub(1))
            .and_then(|index| forms.get(index));
        if let Some(entry) = by_number {
            return Ok(entry.clone());
        }
        match catalog.resolve(choice) {
            Ok(entry) => return Ok(entry),
            Err(_) => say(out, &format!("No form called '{choice}'.")).await?,
        }
    }
}

async fn say(out: &mut (impl AsyncWrite + Unpin), text: &str) -> Result<()> {
    out.write_all(text.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await?;
    Ok(())
}
