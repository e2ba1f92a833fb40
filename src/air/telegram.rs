//! Telegram client using teloxide.

use teloxide::prelude::*;
use teloxide::types::{
    BotCommand, CallbackQueryId, InlineKeyboardButton, InlineKeyboardMarkup, MessageId, ParseMode, ReplyParameters,
};
use tracing::{info, warn};

/// One button per row, or `None` when there are no buttons.
pub fn keyboard(buttons: &[(&str, &str)]) -> Option<InlineKeyboardMarkup> {
    if buttons.is_empty() {
        return None;
    }
    let rows = buttons
        .iter()
        .map(|(label, data)| vec![InlineKeyboardButton::callback(*label, *data)]);
    Some(InlineKeyboardMarkup::new(rows))
}

/// Thin wrapper over the bot handle for the calls the air bot makes.
pub struct TelegramClient {
    bot: Bot,
}

impl TelegramClient {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    /// Send an HTML message, optionally as a reply and with inline buttons.
    /// Returns the new message ID.
    pub async fn send_html(
        &self,
        chat_id: i64,
        text: &str,
        reply_to_message_id: Option<i64>,
        buttons: &[(&str, &str)],
    ) -> Result<i64, String> {
        let mut request = self
            .bot
            .send_message(ChatId(chat_id), text)
            .parse_mode(ParseMode::Html);

        if let Some(msg_id) = reply_to_message_id {
            let reply_params = ReplyParameters::new(MessageId(msg_id as i32));
            request = request.reply_parameters(reply_params);
        }
        if let Some(markup) = keyboard(buttons) {
            request = request.reply_markup(markup);
        }

        request.await.map(|msg| msg.id.0 as i64).map_err(|e| {
            let msg = format!("Failed to send: {e}");
            warn!("{}", msg);
            msg
        })
    }

    /// Replace the text (and buttons) of a message the bot sent earlier.
    pub async fn edit_html(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        buttons: &[(&str, &str)],
    ) -> Result<(), String> {
        let mut request = self
            .bot
            .edit_message_text(ChatId(chat_id), MessageId(message_id as i32), text)
            .parse_mode(ParseMode::Html);
        if let Some(markup) = keyboard(buttons) {
            request = request.reply_markup(markup);
        }

        request.await.map_err(|e| {
            let msg = format!("Failed to edit message: {e}");
            warn!("{}", msg);
            msg
        })?;

        Ok(())
    }

    /// Stop the client's spinner on a pressed button.
    pub async fn answer_callback(&self, query_id: &CallbackQueryId) {
        if let Err(e) = self.bot.answer_callback_query(query_id.clone()).await {
            warn!("Failed to answer callback query: {e}");
        }
    }

    pub async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), String> {
        self.bot
            .delete_message(ChatId(chat_id), MessageId(message_id as i32))
            .await
            .map_err(|e| {
                let msg = format!("Failed to delete message: {e}");
                warn!("{}", msg);
                msg
            })?;

        Ok(())
    }

    /// Register the command menu shown in Telegram clients.
    pub async fn set_commands(&self, commands: &[(&str, &str)]) -> Result<(), String> {
        let commands: Vec<BotCommand> = commands
            .iter()
            .map(|(name, description)| BotCommand::new(*name, *description))
            .collect();
        info!("Registering {} bot commands", commands.len());

        self.bot.set_my_commands(commands).await.map_err(|e| {
            let msg = format!("Failed to set commands: {e}");
            warn!("{}", msg);
            msg
        })?;

        Ok(())
    }

    /// Username of the bot itself, without `@`.
    pub async fn username(&self) -> Option<String> {
        match self.bot.get_me().await {
            Ok(me) => {
                info!("Bot user ID: {}, username: @{}", me.id, me.username());
                Some(me.username().to_string())
            }
            Err(e) => {
                warn!("Failed to get bot info: {e}");
                None
            }
        }
    }
}
