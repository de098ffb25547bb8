//! Inbound operations: the minimal text command surface the engine needs.
//!
//! Every malformed input turns into a plain rejection message back to the
//! user; only store failures surface as errors.

use super::{format_minute, Engine};
use chrono::{DateTime, Utc};
use minder_core::{
    error::MinderError,
    localtime::{self, LocalStamp},
    message::{GenKind, GenRequest},
};
use tracing::{info, warn};

const HELP_TEXT: &str = "I understand:\n\
    tz +HH:MM - set your timezone offset\n\
    plan HH:MM <task> - plan a task for today\n\
    doing <text> - tell me what you're doing\n\
    list - show today's tasks\n\
    stuck <text> - get help with a task you're stuck on";

impl Engine {
    /// Handle one inbound text message and reply through the channel.
    ///
    /// A first message from an unknown chat creates the user row. Returns
    /// the reply text so the trigger surface can echo it.
    pub async fn handle_inbound(
        &self,
        chat_id: &str,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<String, MinderError> {
        self.store.ensure_user(chat_id).await?;
        let user = self
            .store
            .get_user(chat_id)
            .await?
            .ok_or_else(|| MinderError::Store(format!("user {chat_id} missing after ensure")))?;
        let stamp = localtime::resolve(now, user.utc_offset_min);

        let trimmed = text.trim();
        let (command, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((c, r)) => (c, r.trim()),
            None => (trimmed, ""),
        };

        let reply = match command.to_lowercase().as_str() {
            "tz" => self.cmd_tz(chat_id, rest).await?,
            "plan" => self.cmd_plan(chat_id, &stamp, rest).await?,
            "doing" => self.cmd_doing(chat_id, &stamp, rest).await?,
            "list" => self.cmd_list(chat_id, &stamp).await?,
            "stuck" => self.cmd_stuck(chat_id, &stamp, rest).await?,
            _ => HELP_TEXT.to_string(),
        };

        if let Err(e) = self.channel.send(chat_id, &reply).await {
            warn!("inbound reply to {chat_id} failed: {e}");
        }
        Ok(reply)
    }

    async fn cmd_tz(&self, chat_id: &str, rest: &str) -> Result<String, MinderError> {
        let Some(offset) = parse_offset(rest) else {
            return Ok("I couldn't read that offset. Try something like: tz +05:30".to_string());
        };
        if !localtime::offset_in_range(offset) {
            return Ok("That offset is outside the supported range (-12:00 to +14:00).".to_string());
        }
        self.store.set_utc_offset(chat_id, offset).await?;
        info!("{chat_id} set offset to {offset} minutes");
        Ok(format!(
            "Timezone set: UTC{}{}.",
            if offset < 0 { "-" } else { "+" },
            format_minute(offset.abs() as i64)
        ))
    }

    async fn cmd_plan(
        &self,
        chat_id: &str,
        stamp: &LocalStamp,
        rest: &str,
    ) -> Result<String, MinderError> {
        let parsed = rest
            .split_once(char::is_whitespace)
            .map(|(time, name)| (parse_clock(time), name.trim()));
        let Some((Some(minutes), name)) = parsed else {
            return Ok("I couldn't read that. Try: plan 09:00 Study Go".to_string());
        };
        if name.is_empty() {
            return Ok("The task needs a name. Try: plan 09:00 Study Go".to_string());
        }
        self.store
            .create_task(chat_id, &stamp.date_key(), minutes, name)
            .await?;
        Ok(format!(
            "Planned for {}: {name}. I'll remind you.",
            format_minute(minutes as i64)
        ))
    }

    async fn cmd_doing(
        &self,
        chat_id: &str,
        stamp: &LocalStamp,
        rest: &str,
    ) -> Result<String, MinderError> {
        if rest.is_empty() {
            return Ok("Tell me what you're doing, like: doing writing the report".to_string());
        }
        match self
            .store
            .record_response(chat_id, &stamp.date_key(), rest)
            .await?
        {
            Some(name) => Ok(format!("Noted for '{name}'. I'll check in soon.")),
            None => Ok("No reminded task is waiting for a reply right now.".to_string()),
        }
    }

    async fn cmd_list(&self, chat_id: &str, stamp: &LocalStamp) -> Result<String, MinderError> {
        let tasks = self
            .store
            .tasks_for_date(chat_id, &stamp.date_key())
            .await?;
        if tasks.is_empty() {
            return Ok("Nothing planned for today yet. Add one with: plan 09:00 Study Go".to_string());
        }
        let mut lines = vec!["Today's plan:".to_string()];
        for task in tasks {
            let status = if task.praised {
                "done"
            } else if task.scolded {
                "missed"
            } else if task.reminder_sent {
                "reminded"
            } else {
                "planned"
            };
            lines.push(format!(
                "{} {} [{status}]",
                format_minute(task.time_minutes),
                task.name
            ));
        }
        Ok(lines.join("\n"))
    }

    async fn cmd_stuck(
        &self,
        chat_id: &str,
        stamp: &LocalStamp,
        rest: &str,
    ) -> Result<String, MinderError> {
        if rest.is_empty() {
            return Ok("What are you stuck on? Try: stuck can't start the report".to_string());
        }
        let today = stamp.date_key();
        if !self
            .store
            .reserve_help_call(chat_id, &today, self.config.help_daily_limit)
            .await?
        {
            return Ok("You've used today's help budget. Pick the smallest next step and just start it.".to_string());
        }
        let request = GenRequest::new(GenKind::StuckHelp, format!("The user is stuck on: {rest}"));
        match self.provider.generate(&request).await {
            Ok(text) => Ok(text),
            Err(e) => {
                warn!("stuck help generation for {chat_id} failed: {e}");
                self.store.rollback_help_call(chat_id).await?;
                Ok("Can't reach the helper right now. Try shrinking the task to a two-minute first step.".to_string())
            }
        }
    }
}

/// Parse a UTC offset: `+05:30`, `-03:00`, or raw minutes like `120`.
fn parse_offset(s: &str) -> Option<i32> {
    if s.is_empty() {
        return None;
    }
    if let Ok(minutes) = s.parse::<i32>() {
        return Some(minutes);
    }
    let (sign, rest) = match s.strip_prefix('-') {
        Some(r) => (-1, r),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let (h, m) = rest.split_once(':')?;
    let h: i32 = h.parse().ok()?;
    let m: i32 = m.parse().ok()?;
    if m >= 60 {
        return None;
    }
    Some(sign * (h * 60 + m))
}

/// Parse `HH:MM` into minutes since midnight.
fn parse_clock(s: &str) -> Option<u32> {
    let (h, m) = s.split_once(':')?;
    let h: u32 = h.parse().ok()?;
    let m: u32 = m.parse().ok()?;
    if h >= 24 || m >= 60 {
        return None;
    }
    Some(h * 60 + m)
}
