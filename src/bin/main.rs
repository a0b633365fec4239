use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;
use welfare_compass::{
    catalog::CatalogCache,
    config::AppConfig,
    conversational::{Compass, ConversationContext, WELCOME_MESSAGE},
    extractor::GeminiExtractor,
    models::{text, MatchedProgram},
    responder::GeminiResponder,
};

const CARDS_SHOWN: usize = 3;

fn print_cards(programs: &[MatchedProgram]) {
    println!();
    for (i, matched) in programs.iter().take(CARDS_SHOWN).enumerate() {
        let program = &matched.program;
        println!("  [{}] {} ({})", i + 1, program.program_name, program.category_key());
        println!("      지원내용: {}", text(&program.support_amount));
        println!("      신청방법: {}", text(&program.how_to_apply));
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let config = AppConfig::from_env()?;
    let catalog = Arc::new(CatalogCache::new(config.catalog_candidates()));

    let compass = match config.gemini_api_key.clone() {
        Some(api_key) => Compass::new(
            catalog,
            Arc::new(GeminiExtractor::new(api_key.clone(), config.extraction_model.clone())?),
            Arc::new(GeminiResponder::new(api_key, config.generation_model.clone())?),
        ),
        None => Compass::offline(catalog),
    };

    info!(llm = config.uses_llm(), "Welfare compass terminal session starting");

    let mut context = ConversationContext::new(Uuid::new_v4());
    println!("{}\n", WELCOME_MESSAGE);
    println!("(/reset 대화 초기화, /quit 종료)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all("\n> ".as_bytes()).await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let message = line.trim();

        match message {
            "" => continue,
            "/quit" => break,
            "/reset" => {
                context = ConversationContext::new(Uuid::new_v4());
                println!("{}", WELCOME_MESSAGE);
                continue;
            }
            _ => {}
        }

        let (next, outcome) = compass.process_turn(&context, message).await;
        context = next;

        println!("\n{}", outcome.reply);
        if outcome.show_cards {
            print_cards(&outcome.matched_programs);
        }
    }

    Ok(())
}
