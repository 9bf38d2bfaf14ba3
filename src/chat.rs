//! `gqa ask` and the interactive `gqa chat` shell.
//!
//! The shell reads one question per line. Lines starting with `/` are
//! commands:
//!
//! | Command | Effect |
//! |---------|--------|
//! | `/clear` | forget the displayed history |
//! | `/history` | print the conversation so far |
//! | `/exit` | quit (EOF also quits) |
//!
//! A failed answer is printed as an error line and the shell keeps going.

use anyhow::Result;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::warn;

use crate::config::Config;
use crate::conversation::{Conversation, Role};
use crate::pipeline::Pipeline;

/// Answer one question and print the reply.
pub async fn run_ask(config: &Config, question: &str, show_context: bool) -> Result<()> {
    let pipeline = Pipeline::open(config).await?;
    let answer = pipeline.answer(question).await?;

    if show_context {
        println!("{}", answer.context);
    }
    println!("{}", answer.text);
    Ok(())
}

/// Run the interactive shell on stdin/stdout.
pub async fn run_chat(config: &Config) -> Result<()> {
    let pipeline = Pipeline::open(config).await?;
    let mut conversation = Conversation::with_capacity(config.conversation.max_turns);

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();

    writeln!(
        stdout,
        "Ask a question about your documents. /clear resets, /history shows the log, /exit quits."
    )?;
    chat_loop(&pipeline, &mut conversation, stdin, &mut stdout).await
}

/// Drive the shell over any line source and sink.
pub async fn chat_loop<R, W>(
    pipeline: &Pipeline,
    conversation: &mut Conversation,
    input: R,
    out: &mut W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();

    loop {
        write!(out, "> ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line {
            "/exit" | "/quit" => break,
            "/clear" => {
                conversation.clear();
                writeln!(out, "(history cleared)")?;
            }
            "/history" => {
                if conversation.is_empty() {
                    writeln!(out, "(no history)")?;
                }
                for turn in conversation.turns() {
                    writeln!(out, "{}: {}", turn.role, turn.content)?;
                }
            }
            question => {
                conversation.push(Role::User, question);
                match pipeline.answer(question).await {
                    Ok(answer) => {
                        writeln!(out, "{}", answer.text)?;
                        conversation.push(Role::Assistant, answer.text);
                    }
                    Err(e) => {
                        warn!(error = %e, "answer failed");
                        writeln!(out, "error: {}", e)?;
                    }
                }
            }
        }
    }

    Ok(())
}
