use std::sync::Arc;

use teloxide::prelude::*;
use tracing::{error, info};
use tracing_subscriber::prelude::*;

use airbot::air::openweather::Client as OpenWeatherClient;
use airbot::air::commands::Dispatcher as CommandDispatcher;
use airbot::air::{buttons_for, resolve, resolve_callback, Action, TelegramClient};
use airbot::config::Config;

struct BotState {
    dispatcher: CommandDispatcher<OpenWeatherClient>,
    telegram: TelegramClient,
    bot_username: Option<String>,
}

impl BotState {
    async fn new(config: Config, bot: &Bot) -> Result<Self, reqwest::Error> {
        let source = OpenWeatherClient::new(
            config.openweather_api_key,
            config.openweather_base_url,
            config.location.clone(),
            config.request_timeout,
        )?;
        let dispatcher = CommandDispatcher::new(source, config.location, config.thresholds, config.timezone);

        let telegram = TelegramClient::new(bot.clone());
        let bot_username = telegram.username().await;
        if telegram.set_commands(&CommandDispatcher::<OpenWeatherClient>::command_list()).await.is_ok() {
            info!("Command menu registered");
        }

        Ok(Self {
            dispatcher,
            telegram,
            bot_username,
        })
    }
}

#[tokio::main]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "airbot.json".to_string());
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let bot = Bot::new(&config.telegram_bot_token);

    // Setup logging
    let log_dir = config.data_dir.join("logs");
    std::fs::create_dir_all(&log_dir).ok();
    let log_file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("airbot.log"))
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Failed to open log file: {e}");
            std::process::exit(1);
        }
    };
    let (non_blocking, _guard) = tracing_appender::non_blocking(log_file);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .init();

    info!("🤖 Starting air quality bot...");
    info!("Loaded config from {config_path}");
    info!(
        "Location: {} ({}, {}), timezone {}",
        config.location.name, config.location.lat, config.location.lon, config.timezone
    );

    let state = match BotState::new(config, &bot).await {
        Ok(state) => Arc::new(state),
        Err(e) => {
            error!("Failed to build HTTP client: {e}");
            std::process::exit(1);
        }
    };

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(handle_message))
        .branch(Update::filter_callback_query().endpoint(handle_callback));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn handle_message(msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let text = match msg.text() {
        Some(t) => t,
        None => return Ok(()),
    };

    let Some(action) = resolve(text, state.bot_username.as_deref()) else {
        return Ok(());
    };

    let chat_id = msg.chat.id.0;
    let username = msg
        .from
        .as_ref()
        .map(|u| u.username.as_deref().unwrap_or(&u.first_name).to_string())
        .unwrap_or_else(|| "unknown".to_string());
    info!("📨 {:?} from {} in chat {}", action, username, chat_id);

    // The loading placeholder only matters while the fetch is in flight
    let loading = if action == Action::CurrentReport {
        let text = airbot::air::report::loading(state.dispatcher.location());
        state.telegram.send_html(chat_id, &text, None, &[]).await.ok()
    } else {
        None
    };

    let reply = state.dispatcher.execute(action).await;

    if let Some(loading_id) = loading {
        state.telegram.delete_message(chat_id, loading_id).await.ok();
    }
    state
        .telegram
        .send_html(chat_id, &reply, None, buttons_for(action))
        .await
        .ok();

    Ok(())
}

/// Inline buttons: the reply replaces the message the button was on.
async fn handle_callback(query: CallbackQuery, state: Arc<BotState>) -> ResponseResult<()> {
    state.telegram.answer_callback(&query.id).await;

    let Some(action) = query.data.as_deref().and_then(resolve_callback) else {
        return Ok(());
    };
    let Some(msg) = query.regular_message() else {
        return Ok(());
    };

    let chat_id = msg.chat.id.0;
    let message_id = msg.id.0 as i64;
    info!("🔘 {:?} from {} in chat {}", action, query.from.first_name, chat_id);

    if action == Action::CurrentReport {
        let text = airbot::air::report::loading(state.dispatcher.location());
        state.telegram.edit_html(chat_id, message_id, &text, &[]).await.ok();
    }

    let reply = state.dispatcher.execute(action).await;
    state
        .telegram
        .edit_html(chat_id, message_id, &reply, buttons_for(action))
        .await
        .ok();

    Ok(())
}
