//! Interactive console game loop.

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Notify;
use tracing::debug;

use chaant_agent::ChesscomAgent;
use chaant_protocols::{AgentFailure, AgentState, BotProfile, ChessAgent, TimeControl};

const MODES: [&str; 5] = ["Vs. Computer", "Rapid", "Blitz", "Bullet", "30 min"];

/// How a prompt or a game ended.
enum Outcome {
    Quit,
    GameOver,
}

pub(crate) struct Console {
    lines: Lines<BufReader<Stdin>>,
    agent: Arc<ChesscomAgent>,
    bots: Vec<BotProfile>,
    game_over: Arc<Notify>,
}

impl Console {
    pub(crate) fn new(agent: Arc<ChesscomAgent>, bots: Vec<BotProfile>) -> Self {
        let game_over = Arc::new(Notify::new());
        let notify = game_over.clone();
        agent.set_game_over_handler(Arc::new(move || notify.notify_waiters()));
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            agent,
            bots,
            game_over,
        }
    }

    /// Play games until the user quits or the page is lost.
    pub(crate) async fn run(&mut self) -> Result<()> {
        loop {
            let Some(mode) = self.choose_mode().await? else {
                break;
            };
            let state = match self.start(mode).await? {
                Some(state) => state,
                None => break,
            };
            let state = match state {
                Ok(state) => state,
                Err(failure) if failure.is_unreachable() => {
                    eprintln!("Browser out of reach: {}", failure);
                    break;
                }
                Err(failure) => {
                    eprintln!("Could not start the game: {}", failure);
                    continue;
                }
            };
            debug!("Game started in state {}", state);

            match self.play_game().await {
                Ok(Outcome::GameOver) => {
                    println!("----------");
                    println!("Game Ends.");
                    println!("----------");
                }
                Ok(Outcome::Quit) => break,
                Err(failure) => {
                    eprintln!("Browser out of reach: {}", failure);
                    break;
                }
            }
        }
        println!("Quitting...");
        Ok(())
    }

    /// Read one answer. `None` on `quit` or end of input.
    async fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        print!("{}", prompt);
        std::io::stdout().flush()?;
        let Some(line) = self.lines.next_line().await? else {
            return Ok(None);
        };
        let answer = line.trim().to_string();
        if answer.eq_ignore_ascii_case("quit") {
            return Ok(None);
        }
        Ok(Some(answer))
    }

    /// Ask until `parse` accepts the answer.
    async fn ask_until<T>(
        &mut self,
        prompt: &str,
        parse: impl Fn(&str) -> Result<T, String>,
    ) -> Result<Option<T>> {
        loop {
            let Some(answer) = self.ask(prompt).await? else {
                return Ok(None);
            };
            match parse(&answer) {
                Ok(value) => return Ok(Some(value)),
                Err(reason) => eprintln!("Invalid input! Reason: {}", reason),
            }
        }
    }

    async fn choose_mode(&mut self) -> Result<Option<usize>> {
        println!("========================");
        println!("Chess game automation");
        println!("========================");
        for (idx, mode) in MODES.iter().enumerate() {
            println!("{}. {}", idx + 1, mode);
        }
        println!();
        self.ask_until("Choose match: ", |ans| pick(ans, MODES.len()))
            .await
    }

    /// Start the chosen game. Outer `None` means the user quit while choosing.
    async fn start(&mut self, mode: usize) -> Result<Option<Result<AgentState, AgentFailure>>> {
        let agent = self.agent.clone();
        let result = match mode {
            0 => {
                let Some(bot) = self.choose_bot().await? else {
                    return Ok(None);
                };
                let Some(as_black) = self.ask_until("Play as black (y/n)? ", yes_no).await? else {
                    return Ok(None);
                };
                println!(
                    "Playing against {}, rating: {}, as {}",
                    bot.name,
                    bot.elo,
                    if as_black { "black" } else { "white" }
                );
                agent.play_computer(&bot, as_black).await
            }
            1 => agent.play_online(TimeControl::Rapid).await,
            2 => agent.play_online(TimeControl::Blitz).await,
            3 => agent.play_online(TimeControl::Bullet).await,
            _ => agent.play_online(TimeControl::Classical).await,
        };
        Ok(Some(result))
    }

    async fn choose_bot(&mut self) -> Result<Option<BotProfile>> {
        println!("Available bots");
        println!("========================");
        for (idx, bot) in self.bots.iter().enumerate() {
            println!("{}. {}. Rating: {}", idx + 1, bot.name, bot.elo);
        }
        println!();
        let count = self.bots.len();
        let Some(idx) = self
            .ask_until("Choose bot to play against: ", |ans| pick(ans, count))
            .await?
        else {
            return Ok(None);
        };
        Ok(self.bots.get(idx).cloned())
    }

    /// Alternate turn waits and move prompts until the game ends.
    async fn play_game(&mut self) -> Result<Outcome, AgentFailure> {
        let agent = self.agent.clone();
        let game_over = self.game_over.clone();
        loop {
            if !agent.play_state().is_playing() {
                return Ok(Outcome::GameOver);
            }
            match agent.wait_turn().await {
                Ok(AgentState::TakingTurn) => {}
                Ok(_) => continue,
                Err(failure) if failure.is_unreachable() => return Err(failure),
                Err(failure) => {
                    eprintln!("{}", failure);
                    continue;
                }
            }

            let answer = tokio::select! {
                answer = self.ask("Your move: ") => answer,
                _ = game_over.notified() => return Ok(Outcome::GameOver),
            };
            let notation = match answer {
                Ok(Some(notation)) => notation,
                Ok(None) => return Ok(Outcome::Quit),
                Err(e) => {
                    eprintln!("Console error: {}", e);
                    return Ok(Outcome::Quit);
                }
            };

            if let Err(failure) = agent.move_piece(&notation).await {
                if failure.is_unreachable() {
                    return Err(failure);
                }
                eprintln!("Invalid move! Reason: {}", failure);
            }
        }
    }
}

/// 1-based menu choice to a 0-based index.
fn pick(answer: &str, count: usize) -> Result<usize, String> {
    match answer.parse::<usize>() {
        Ok(n) if (1..=count).contains(&n) => Ok(n - 1),
        _ => Err("Invalid choice. Choose one of the listed options".to_string()),
    }
}

fn yes_no(answer: &str) -> Result<bool, String> {
    match answer.to_ascii_lowercase().chars().next() {
        Some('y') => Ok(true),
        Some('n') => Ok(false),
        _ => Err("Can't infer answer".to_string()),
    }
}
